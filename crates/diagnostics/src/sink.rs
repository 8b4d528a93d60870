use crate::Diagnostic;

/// A destination for diagnostics emitted while parsing or validating a stream.
///
/// Kept as a trait (rather than a concrete `Vec`) so a caller embedding this
/// core can forward diagnostics into its own reporting surface (a log file, a
/// GUI panel, a test harness) without the parser knowing about it.
pub trait DiagnosticSink {
    /// Records one diagnostic.
    fn report(&mut self, diagnostic: Diagnostic);
}

/// A [`DiagnosticSink`] that discards everything. Useful when a caller only
/// cares about the `Result` of a parse and not the accumulated diagnostic trail.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&mut self, _diagnostic: Diagnostic) {}
}

/// A [`DiagnosticSink`] that collects every diagnostic into a `Vec`, in order.
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    diagnostics: Vec<Diagnostic>,
}

impl CollectingSink {
    /// Creates an empty collecting sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every diagnostic collected so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Consumes the sink, returning the collected diagnostics.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}
