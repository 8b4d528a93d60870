//! Thin translation layer between [`EsCoreOptions`] and
//! [`hdmv::HdmvOptions`], plus the stream-type sniff needed to pick which of
//! `order_igs_segments_by_value`/`order_pgs_segments_by_value` applies before
//! the HDMV core itself has seen a PCS or ICS.

use bytes::Bytes;
use diagnostics::DiagnosticSink;
use hdmv::{scan_segments, HdmvOptions, ReferenceOrdering, SegmentType};
use script::ScriptSink;

use crate::error::EsCoreError;
use crate::options::EsCoreOptions;

/// Looks at the first composition-bearing segment (PCS or ICS) to decide
/// whether this is a PGS or IGS stream, so the right
/// `order_*_segments_by_value` option can be applied. Defaults to PGS
/// ordering when no composition segment is found at all (an empty or
/// malformed stream, which the decode itself will go on to reject).
fn sniff_ordering(data: &Bytes, options: &EsCoreOptions) -> ReferenceOrdering {
    let is_igs = scan_segments(data)
        .map(|(segments, _mnu_framed)| segments.iter().any(|s| s.segment_type == SegmentType::Ics))
        .unwrap_or(false);

    let by_value = if is_igs { options.order_igs_segments_by_value } else { options.order_pgs_segments_by_value };

    if by_value {
        ReferenceOrdering::ByAscendingId
    } else {
        ReferenceOrdering::AsReferenced
    }
}

/// Drives one HDMV (IGS or PGS) elementary stream end to end.
pub struct HdmvPipeline {
    options: EsCoreOptions,
}

impl HdmvPipeline {
    /// Creates a pipeline for the given configuration.
    pub fn new(options: EsCoreOptions) -> Self {
        Self { options }
    }

    /// Runs the pipeline over `data`, reporting findings through `sink` and
    /// the patch/copy script through `script`.
    pub fn run(&self, data: &Bytes, sink: &mut dyn DiagnosticSink, script: &mut dyn ScriptSink) -> Result<(), EsCoreError> {
        let ordering = sniff_ordering(data, &self.options);
        let hdmv_options = HdmvOptions {
            initial_timestamp: self.options.hdmv.initial_timestamp,
            force_retiming: self.options.hdmv.force_retiming,
            ordering,
        };
        hdmv::decode_hdmv_stream(data, &hdmv_options, sink, script)?;
        Ok(())
    }
}
