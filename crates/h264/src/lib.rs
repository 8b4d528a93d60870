//! A pure Rust H.264 (Annex B) bitstream parser, semantic validator, and
//! Blu-ray compliance checker.
//!
//! This crate reads raw elementary-stream NAL units (start-code delimited,
//! not packaged in an MP4 `avcC`/`hvcC` box), reconstructs access units and
//! their presentation/decoding timing, and checks the result against the
//! BDMV profile's constraints (Annex A level limits, the HRD/CPB/DPB model,
//! and the handful of Blu-ray-specific restrictions layered on top of the
//! base standard).
//!
//! ## Notable features
//!
//! - Safe parsing and building of SPS/PPS/SEI/slice-header syntax structures,
//!   including emulation-prevention byte handling.
//! - Picture-order-count and DTS/PTS reconstruction across an access-unit
//!   stream, surfaced as [`diagnostics::Diagnostic`]s rather than panics.
//! - An HRD (CPB/DPB) verifier that can be driven incrementally as access
//!   units are decoded.
//!
//! ## License
//!
//! This project is licensed under the [MIT](./LICENSE.MIT) or [Apache-2.0](./LICENSE.Apache-2.0) license.
//! You can choose between one of them if you use this work.
//!
//! `SPDX-License-Identifier: MIT OR Apache-2.0`
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(unsafe_code)]

mod access_unit;
mod aud;
mod compliance;
mod dec_ref_pic_marking;
mod enums;
mod hrd;
mod io;
mod nal;
mod patch;
mod poc;
mod pps;
mod pred_weight_table;
mod rbsp;
mod ref_pic_list_modification;
mod sei;
mod slice_header;
mod sps;
mod timing;

pub use access_unit::{AccessUnit, AccessUnitBuilder, NalDescriptor, slice_starts_new_access_unit};
pub use aud::AccessUnitDelimiter;
pub use compliance::{
    BD_MAX_LEVEL_IDC, BD_MIN_LEVEL_IDC, LEVEL_TABLE, LevelLimits, cpb_br_factors, level_limits, max_dpb_frames, min_slice_rate, validate_pps, validate_sps,
};
pub use dec_ref_pic_marking::{DecRefPicMarking, MemoryManagementControlOp};
pub use enums::*;
pub use hrd::{CpbArrival, CpbArrivalEntry, DpbEntry, HrdVerifier, PreviousAuParameters, ReferenceUsage, VerifierMode, H264_MAX_AU_IN_CPB, H264_MAX_DPB_SIZE};
pub use io::EmulationPreventionIo;
pub use nal::{NalError, NalUnit, scan_nal_units};
pub use patch::{LevelOverrideOutcome, NORMALIZED_CPB_REMOVAL_DELAY_BITS, PatchPool, SpsPatchOptions, emit_patch, patch_sps};
pub use poc::{Field, PicOrderCnt, PicOrderCountState, PocError, Type0Inputs};
pub use pps::{Pps, PpsExtension, SliceGroupInfo, SliceGroupMapType};
pub use pred_weight_table::{PredWeightTable, WeightOffset};
pub use rbsp::MoreRbspData;
pub use ref_pic_list_modification::RefPicListModification;
pub use sei::{
    BufferingPeriod, ClockTimestamp, CpbRemovalDelay, MAX_USER_DATA_PAYLOAD, PictureTiming, RecoveryPoint, SeiMessage,
    UserDataUnregistered, parse_sei_rbsp,
};
pub use slice_header::SliceHeader;
pub use sps::*;
pub use timing::{AccessUnitTiming, MAIN_CLOCK_27MHZ, TimingReconstructor};
