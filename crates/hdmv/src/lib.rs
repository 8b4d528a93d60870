//! A pure Rust decoder and compliance checker for HDMV graphics streams:
//! Interactive Graphics (IGS, menus) and Presentation Graphics (PGS, subtitles).
//!
//! This crate reads raw segment-framed (or MNU-wrapped) HDMV byte streams,
//! reassembles fragmented ODS/ICS sequences, accumulates and validates each
//! Display Set against its epoch's carried-over palettes/objects/windows, and
//! reconstructs DTS/PTS timing from the HDMV buffer model.
//!
//! ## Notable features
//!
//! - Safe parsing and building of PDS/ODS/PCS/WDS/ICS payload syntax.
//! - Display Set reference-closure and layout validation, surfaced as
//!   [`diagnostics::Diagnostic`]s rather than panics.
//! - Buffer-model timing reconstruction (`DECODE_DURATION`, `TRANSFER_DURATION`,
//!   `INITIALIZATION_DURATION`) and the Decoded Object Buffer size check.
//!
//! ## License
//!
//! This project is licensed under the [MIT](./LICENSE.MIT) or [Apache-2.0](./LICENSE.Apache-2.0) license.
//! You can choose between one of them if you use this work.
//!
//! `SPDX-License-Identifier: MIT OR Apache-2.0`
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(unsafe_code)]

mod composition;
mod decoder;
mod epoch;
mod interactive_composition;
mod object;
mod palette;
mod segment;
mod sequence;
mod timing;
mod video_descriptor;
mod window;

pub use composition::{CompositionDescriptor, CompositionObject, CompositionState, ObjectCropping, PresentationComposition};
pub use decoder::{decode_hdmv_stream, HdmvDecodeError, HdmvOptions};
pub use epoch::{
    check_and_build_display_set, DisplaySet, DisplaySetOutcome, EpochDefinitions, HdmvStreamType, ReferenceOrdering,
};
pub use interactive_composition::{
    Button, ButtonOverlapGroup, ButtonState, EffectInfo, EffectSequence, InteractiveComposition, NavigationCommand,
    NeighborInfo, OutOfMuxTimeouts, Page, StreamModel, UserInterfaceModel,
};
pub use object::{split_fragment, FirstFragmentDimensions, ObjectDefinition, ObjectFragmentHeader};
pub use palette::{PaletteDefinition, PaletteEntry};
pub use segment::{looks_like_raw_segment, scan_segments, FramingError, MnuHeader, RawSegment, SegmentType};
pub use sequence::{SequenceDescriptor, SequenceError, SequenceTracker};
pub use timing::{
    check_decoded_object_buffer, compute_buffer_model, decode_duration, force_retime_display_set, plane_clear_time,
    transfer_duration, EpochBufferModel, SegmentTiming, DB_SIZE_IGS, DB_SIZE_PGS,
};
pub use video_descriptor::VideoDescriptor;
pub use window::{WindowDefinition, WindowInfo};
