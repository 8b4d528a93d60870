//! ODS payload: per-fragment header plus the reassembled `object_data()`.
//!
//! Every ODS fragment opens with `{object_id(16), object_version_number(8),
//! sequence_descriptor(8)}`; only the first fragment of a sequence also
//! carries `{object_data_length(24), object_width(16), object_height(16)}`.
//! Everything after that header, across every fragment of the sequence, is
//! the run-length-coded bitmap (`run_length_data`), treated here as an
//! opaque byte slice per §4.4.3.

use std::io;

use bytes::Bytes;

use crate::sequence::SequenceDescriptor;

const FRAGMENT_HEADER_LEN: usize = 4;
const FIRST_FRAGMENT_DIMS_LEN: usize = 7;

/// The per-fragment header common to every ODS fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectFragmentHeader {
    /// `object_id`.
    pub object_id: u16,
    /// `object_version_number`.
    pub object_version_number: u8,
    /// The fragment's sequencing descriptor.
    pub sequence_descriptor: SequenceDescriptor,
}

/// `object_width`/`object_height` plus the declared `object_data_length`,
/// present only in a sequence's first fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirstFragmentDimensions {
    /// Declared total length, in bytes, of `run_length_data` across every
    /// fragment of this sequence.
    pub object_data_length: u32,
    /// Object width in pixels.
    pub object_width: u16,
    /// Object height in pixels.
    pub object_height: u16,
}

/// Splits one raw ODS fragment payload into its header, optional first-fragment
/// dimensions, and the raw bitmap bytes carried by this fragment alone.
pub fn split_fragment(payload: &Bytes) -> io::Result<(ObjectFragmentHeader, Option<FirstFragmentDimensions>, Bytes)> {
    if payload.len() < FRAGMENT_HEADER_LEN {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "ODS fragment shorter than its header"));
    }
    let object_id = u16::from_be_bytes([payload[0], payload[1]]);
    let object_version_number = payload[2];
    let sequence_descriptor = SequenceDescriptor::from_byte(payload[3]);
    let header = ObjectFragmentHeader { object_id, object_version_number, sequence_descriptor };

    let mut offset = FRAGMENT_HEADER_LEN;
    let dims = if sequence_descriptor.first_in_sequence {
        if payload.len() < offset + FIRST_FRAGMENT_DIMS_LEN {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "ODS first fragment shorter than its dimensions"));
        }
        let object_data_length = u32::from_be_bytes([0, payload[offset], payload[offset + 1], payload[offset + 2]]);
        let object_width = u16::from_be_bytes([payload[offset + 3], payload[offset + 4]]);
        let object_height = u16::from_be_bytes([payload[offset + 5], payload[offset + 6]]);
        offset += FIRST_FRAGMENT_DIMS_LEN;
        Some(FirstFragmentDimensions { object_data_length, object_width, object_height })
    } else {
        None
    };

    Ok((header, dims, payload.slice(offset..)))
}

/// A fully reassembled Object Definition: an ODS sequence's header plus its
/// defragmented bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDefinition {
    /// `object_id`.
    pub object_id: u16,
    /// `object_version_number`.
    pub object_version_number: u8,
    /// Object width in pixels.
    pub object_width: u16,
    /// Object height in pixels.
    pub object_height: u16,
    /// The run-length-coded bitmap, concatenated across every fragment.
    pub data: Bytes,
}

impl ObjectDefinition {
    /// Assembles the final [`ObjectDefinition`] once a sequence completes.
    pub fn new(header: ObjectFragmentHeader, dims: FirstFragmentDimensions, data: Bytes) -> Self {
        Self {
            object_id: header.object_id,
            object_version_number: header.object_version_number,
            object_width: dims.object_width,
            object_height: dims.object_height,
            data,
        }
    }

    /// Pixel area (`object_width * object_height`), used by the decode/transfer
    /// duration formulas in §4.4.6. Zero for an empty object.
    pub fn area(&self) -> u64 {
        self.object_width as u64 * self.object_height as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_single_fragment_object() {
        let mut bytes = vec![0x00, 0x01, 0x05, 0xC0]; // id=1, version=5, first+last
        bytes.extend(3u32.to_be_bytes()[1..].iter()); // object_data_length = 3
        bytes.extend(10u16.to_be_bytes());
        bytes.extend(20u16.to_be_bytes());
        bytes.extend([0xAA, 0xBB, 0xCC]);

        let (header, dims, data) = split_fragment(&Bytes::from(bytes)).unwrap();
        assert_eq!(header.object_id, 1);
        assert!(header.sequence_descriptor.first_in_sequence && header.sequence_descriptor.last_in_sequence);
        let dims = dims.unwrap();
        assert_eq!(dims.object_width, 10);
        assert_eq!(dims.object_height, 20);
        assert_eq!(data.as_ref(), &[0xAA, 0xBB, 0xCC]);
    }

    #[test]
    fn continuation_fragment_has_no_dimensions() {
        let mut bytes = vec![0x00, 0x01, 0x05, 0x00]; // neither first nor last
        bytes.extend([0xDD, 0xEE]);
        let (_, dims, data) = split_fragment(&Bytes::from(bytes)).unwrap();
        assert!(dims.is_none());
        assert_eq!(data.as_ref(), &[0xDD, 0xEE]);
    }
}
