//! The combined H.264/HDMV elementary-stream compliance checker and
//! timing-reconstruction core: the crate that ties `h264` and `hdmv`
//! together into the two pipelines a caller actually drives, plus the shared
//! options/error surface described in the design's §6/§10.
//!
//! This crate contains no bitstream parsing of its own. Each pipeline is a
//! thin, sequential driver over its codec crate: [`H264Pipeline`] scans NAL
//! units, resolves active SPS/PPS, reassembles access units, runs the HRD
//! verifier, and reconstructs timing; [`HdmvPipeline`] scans segment framing
//! and delegates the rest to [`hdmv::decode_hdmv_stream`]. Both report
//! findings through a [`diagnostics::DiagnosticSink`] and emit a
//! [`script::ScriptCommand`] stream rather than writing bytes directly.
//!
//! ## License
//!
//! This project is licensed under the [MIT](./LICENSE.MIT) or [Apache-2.0](./LICENSE.Apache-2.0) license.
//! You can choose between one of them if you use this work.
//!
//! `SPDX-License-Identifier: MIT OR Apache-2.0`
#![deny(missing_docs)]
#![deny(unsafe_code)]

mod error;
mod h264_pipeline;
mod hdmv_pipeline;
mod options;

pub use error::EsCoreError;
pub use h264_pipeline::H264Pipeline;
pub use hdmv_pipeline::HdmvPipeline;
pub use options::{EsCoreOptions, EsCoreOptionsBuilder, FrameRateCode, HdmvConfig};
