//! Sequence reassembly for the two fragmentable segment types (ODS, ICS).
//!
//! PDS, PCS, WDS, and END segments are self-contained and never pass through
//! a [`SequenceTracker`]; only ODS and ICS payloads carry a
//! [`SequenceDescriptor`] and may be split across several physical segments.

use bytes::Bytes;
use thiserror::Error;

/// `first_in_sequence`/`last_in_sequence`, the one-byte descriptor prefixing
/// every ODS and ICS fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceDescriptor {
    /// Set on the first fragment of a sequence.
    pub first_in_sequence: bool,
    /// Set on the last fragment of a sequence.
    pub last_in_sequence: bool,
}

impl SequenceDescriptor {
    /// Reads the descriptor from its packed byte (`first` in bit 7, `last` in bit 6).
    pub fn from_byte(byte: u8) -> Self {
        Self {
            first_in_sequence: byte & 0x80 != 0,
            last_in_sequence: byte & 0x40 != 0,
        }
    }

    /// A single-fragment sequence descriptor (`first && last`).
    pub fn singleton() -> Self {
        Self { first_in_sequence: true, last_in_sequence: true }
    }
}

/// Failures reassembling a fragmented ODS/ICS sequence.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SequenceError {
    /// A `first_in_sequence` fragment arrived while the previous sequence of
    /// the same type was still open.
    #[error("first_in_sequence received while a previous sequence is still open")]
    UnterminatedPreviousSequence,
    /// A non-first fragment arrived with no sequence currently open.
    #[error("continuation fragment received with no sequence open")]
    NoSequenceOpen,
}

/// Accumulates fragments of one segment type (ODS or ICS) into a defragmented
/// payload buffer.
///
/// Grounded on `hdmv_seq_indexer`'s chained-sequence bookkeeping: a sequence
/// is simply the concatenation of every fragment's bytes between a
/// `first_in_sequence` and the matching `last_in_sequence`.
#[derive(Debug, Default)]
pub struct SequenceTracker {
    open: Option<Vec<u8>>,
}

impl SequenceTracker {
    /// A tracker with no sequence currently open.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one fragment into the tracker. Returns the reassembled payload
    /// once `last_in_sequence` completes it, `None` while still accumulating.
    pub fn push(&mut self, descriptor: SequenceDescriptor, fragment: &[u8]) -> Result<Option<Bytes>, SequenceError> {
        if descriptor.first_in_sequence {
            if self.open.is_some() {
                return Err(SequenceError::UnterminatedPreviousSequence);
            }
            self.open = Some(Vec::new());
        } else if self.open.is_none() {
            return Err(SequenceError::NoSequenceOpen);
        }

        let buf = self.open.as_mut().expect("checked above");
        buf.extend_from_slice(fragment);

        if descriptor.last_in_sequence {
            Ok(Some(Bytes::from(self.open.take().expect("checked above"))))
        } else {
            Ok(None)
        }
    }

    /// True while a sequence is open (received `first_in_sequence` without a
    /// matching `last_in_sequence` yet).
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_fragment_sequence_completes_immediately() {
        let mut tracker = SequenceTracker::new();
        let result = tracker.push(SequenceDescriptor::singleton(), &[1, 2, 3]).unwrap();
        assert_eq!(result, Some(Bytes::from_static(&[1, 2, 3])));
        assert!(!tracker.is_open());
    }

    #[test]
    fn multi_fragment_sequence_concatenates_in_order() {
        let mut tracker = SequenceTracker::new();
        let first = SequenceDescriptor { first_in_sequence: true, last_in_sequence: false };
        let middle = SequenceDescriptor { first_in_sequence: false, last_in_sequence: false };
        let last = SequenceDescriptor { first_in_sequence: false, last_in_sequence: true };

        assert_eq!(tracker.push(first, &[1, 2]).unwrap(), None);
        assert_eq!(tracker.push(middle, &[3, 4]).unwrap(), None);
        let result = tracker.push(last, &[5]).unwrap();
        assert_eq!(result, Some(Bytes::from_static(&[1, 2, 3, 4, 5])));
    }

    #[test]
    fn rejects_first_while_open() {
        let mut tracker = SequenceTracker::new();
        let first = SequenceDescriptor { first_in_sequence: true, last_in_sequence: false };
        tracker.push(first, &[1]).unwrap();
        let err = tracker.push(first, &[2]).unwrap_err();
        assert_eq!(err, SequenceError::UnterminatedPreviousSequence);
    }

    #[test]
    fn rejects_continuation_with_nothing_open() {
        let mut tracker = SequenceTracker::new();
        let middle = SequenceDescriptor { first_in_sequence: false, last_in_sequence: false };
        let err = tracker.push(middle, &[1]).unwrap_err();
        assert_eq!(err, SequenceError::NoSequenceOpen);
    }
}
