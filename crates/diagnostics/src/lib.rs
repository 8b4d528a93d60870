//! Shared diagnostic vocabulary for the H.264 and HDMV elementary-stream checkers.
//!
//! Both codec crates report through the same four-way taxonomy: a parse failure
//! is fatal and carries no recovery path, a compliance failure means the stream
//! is syntactically valid but violates the chosen profile, a warning is a latched
//! non-fatal deviation, and a restart request asks the caller to re-instantiate
//! the parser with adjusted options rather than treating the condition as an error.
//!
//! ## License
//!
//! This project is licensed under the [MIT](./LICENSE.MIT) or [Apache-2.0](./LICENSE.Apache-2.0) license.
//! You can choose between one of them if you use this work.
//!
//! `SPDX-License-Identifier: MIT OR Apache-2.0`
#![deny(missing_docs)]
#![deny(unsafe_code)]

mod sink;
mod warn_once;

pub use sink::{CollectingSink, DiagnosticSink, NullSink};
pub use warn_once::{WarnOnceKey, WarnOnceSet};

use std::fmt;

/// The severity bucket a [`Diagnostic`] falls into.
///
/// `RestartRequest` is deliberately not layered as a `Warning` or an `Error`: it
/// is a distinct, recoverable condition that the caller must act on explicitly,
/// never a flag checked opportunistically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// The bitstream itself is malformed; parsing cannot continue.
    ParserError,
    /// The bitstream parses cleanly but violates the selected compliance profile.
    ComplianceError,
    /// A non-fatal deviation. Latched so a given class fires at most once per stream.
    Warning,
    /// A recoverable mismatch in parsing-mode assumptions; the caller must restart
    /// the parse with adjusted options.
    RestartRequest,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::ParserError => "parser error",
            Severity::ComplianceError => "compliance error",
            Severity::Warning => "warning",
            Severity::RestartRequest => "restart request",
        };
        f.write_str(s)
    }
}

/// A single structured diagnostic.
///
/// Every fatal path is expected to produce one of these before returning `Err`,
/// carrying the byte offset of the offending NAL/segment and the value or enum
/// label that failed validation, so no failure is silently swallowed.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// The severity bucket.
    pub severity: Severity,
    /// A stable, kebab-case-ish identifier for the diagnostic class, used for the
    /// warn-once latch and for machine-readable reporting (e.g. `"sps.level-idc"`).
    pub code: &'static str,
    /// Human-readable detail, including the offending value.
    pub message: String,
    /// Byte offset into the source elementary stream where the failing unit began,
    /// when known.
    pub file_offset: Option<u64>,
}

impl Diagnostic {
    /// Creates a new diagnostic with no known file offset.
    pub fn new(severity: Severity, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            file_offset: None,
        }
    }

    /// Attaches a file offset to this diagnostic.
    #[must_use]
    pub fn at_offset(mut self, offset: u64) -> Self {
        self.file_offset = Some(offset);
        self
    }

    /// Emits this diagnostic to the `tracing` facade at the level matching its severity,
    /// in addition to whatever a [`DiagnosticSink`] does with it.
    pub fn trace(&self) {
        match self.severity {
            Severity::ParserError | Severity::ComplianceError => {
                tracing::error!(code = self.code, offset = ?self.file_offset, "{}", self.message)
            }
            Severity::Warning => {
                tracing::warn!(code = self.code, offset = ?self.file_offset, "{}", self.message)
            }
            Severity::RestartRequest => {
                tracing::debug!(code = self.code, offset = ?self.file_offset, "{}", self.message)
            }
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.file_offset {
            Some(off) => write!(f, "[{}] {} (offset {off}): {}", self.severity, self.code, self.message),
            None => write!(f, "[{}] {}: {}", self.severity, self.code, self.message),
        }
    }
}

/// The verdict returned by a pure compliance-checking predicate: either the
/// structure being checked is acceptable, or a list of diagnostics explains why
/// not. A verdict can carry only `Warning`-severity diagnostics and still be
/// considered passing by the caller; it is the caller's job to decide whether
/// any `ComplianceError` present should be fatal or (in lax mode) downgraded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Verdict {
    /// All diagnostics raised while checking one structure.
    pub diagnostics: Vec<Diagnostic>,
}

impl Verdict {
    /// An empty, passing verdict.
    pub fn ok() -> Self {
        Self::default()
    }

    /// Pushes a diagnostic onto this verdict.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// True if no diagnostic at `ParserError` or `ComplianceError` severity is present.
    pub fn is_fatal_free(&self) -> bool {
        !self
            .diagnostics
            .iter()
            .any(|d| matches!(d.severity, Severity::ParserError | Severity::ComplianceError))
    }

    /// Merges another verdict's diagnostics into this one.
    pub fn extend(&mut self, other: Verdict) {
        self.diagnostics.extend(other.diagnostics);
    }
}
