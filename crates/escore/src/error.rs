//! The top-level error returned by the two pipelines.

/// Failures that can abort an `escore` run outright. Compliance-level
/// findings never appear here; they are reported through a
/// [`diagnostics::DiagnosticSink`] instead and only escalate to an `Err` when
/// the caller is running in strict mode.
#[derive(Debug, thiserror::Error)]
pub enum EsCoreError {
    /// Underlying I/O failure while parsing or rebuilding a bitstream structure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Annex-B NAL unit framing could not be scanned.
    #[error(transparent)]
    H264Nal(#[from] h264::NalError),
    /// A slice's picture order count could not be computed.
    #[error(transparent)]
    H264Poc(#[from] h264::PocError),
    /// The HDMV segment decoder failed outright (parser-level, not compliance-level).
    #[error(transparent)]
    Hdmv(#[from] hdmv::HdmvDecodeError),
    /// A slice referenced a `pic_parameter_set_id`/`seq_parameter_set_id` that
    /// was never defined earlier in the stream.
    #[error("slice at offset {offset} references undefined {what} id {id}")]
    UndefinedParameterSet {
        /// The undefined id's kind (`"pps"` or `"sps"`).
        what: &'static str,
        /// The undefined id itself.
        id: u64,
        /// Byte offset of the referencing NAL.
        offset: u64,
    },
    /// A `ComplianceError`-severity diagnostic was raised while running in
    /// strict mode.
    #[error("compliance check failed in strict mode: {0}")]
    ComplianceFailure(String),
    /// A recoverable mismatch in parsing-mode assumptions; the caller must
    /// restart the pipeline with adjusted options rather than treating this
    /// as a terminal error.
    #[error("restart requested: {0}")]
    RestartRequest(&'static str),
}
