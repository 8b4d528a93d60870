//! Segment framing: the `segment_type`/`segment_length` header shared by
//! every PDS/ODS/PCS/WDS/ICS/END segment, and the optional MNU wrapper
//! (`{"MN", pts, dts}`) used when the input is a menu-compiled file rather
//! than a raw PES.

use bytes::Bytes;
use thiserror::Error;

const MNU_MAGIC: u16 = 0x4D4E;
const SEGMENT_HEADER_LEN: usize = 3;
const MNU_HEADER_LEN: usize = 10;

/// The six segment types an HDMV (IGS/PGS) stream is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentType {
    /// Palette Definition Segment (`0x14`).
    Pds,
    /// Object Definition Segment (`0x15`).
    Ods,
    /// Presentation Composition Segment (`0x16`).
    Pcs,
    /// Window Definition Segment (`0x17`).
    Wds,
    /// Interactive Composition Segment (`0x18`).
    Ics,
    /// End of Display Set segment (`0x80`).
    End,
}

impl SegmentType {
    /// Maps a raw `segment_type` byte to a [`SegmentType`], or `None` if unknown.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x14 => Some(Self::Pds),
            0x15 => Some(Self::Ods),
            0x16 => Some(Self::Pcs),
            0x17 => Some(Self::Wds),
            0x18 => Some(Self::Ics),
            0x80 => Some(Self::End),
            _ => None,
        }
    }

    /// True for ODS and ICS, the two segment types that may be fragmented
    /// across several physical segments sharing a [`crate::sequence::SequenceDescriptor`].
    pub fn is_fragmentable(self) -> bool {
        matches!(self, Self::Ods | Self::Ics)
    }
}

/// Failures while scanning segment/MNU framing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FramingError {
    /// `segment_type` did not match any of the six known values.
    #[error("unrecognized segment_type {byte:#04x} at offset {offset}")]
    UnknownSegmentType {
        /// The offending byte.
        byte: u8,
        /// Offset of the segment_type byte.
        offset: u64,
    },
    /// The MNU wrapper's magic did not read `"MN"`.
    #[error("invalid MNU magic at offset {offset}")]
    InvalidMnuMagic {
        /// Offset where the magic was expected.
        offset: u64,
    },
    /// The buffer ended before a complete segment header/payload could be read.
    #[error("unexpected end of stream while reading segment framing at offset {offset}")]
    UnexpectedEof {
        /// Offset where the stream ran out of bytes.
        offset: u64,
    },
}

/// The MNU wrapper header: `{"MN", pts, dts}` in 90 kHz ticks, prefixed to
/// each segment when the input is a menu-compiled file rather than a raw PES.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MnuHeader {
    /// 90 kHz PTS supplied by the wrapper.
    pub pts: u32,
    /// 90 kHz DTS supplied by the wrapper.
    pub dts: u32,
}

/// One segment located within an HDMV byte stream: its type, its declared
/// length, the MNU timing attached to it (if the stream is MNU-wrapped), and
/// its raw payload bytes.
#[derive(Debug, Clone)]
pub struct RawSegment {
    /// The segment's type.
    pub segment_type: SegmentType,
    /// Byte offset of the `segment_type` byte within the original stream
    /// (excludes any MNU wrapper bytes, which are never copied to the output).
    pub input_file_offset: u64,
    /// `segment_length` as declared by the header.
    pub segment_length: u16,
    /// MNU-supplied timing, present only for MNU-wrapped streams.
    pub mnu: Option<MnuHeader>,
    /// The segment's payload (`segment_length` bytes, not including the
    /// 3-byte header).
    pub payload: Bytes,
}

/// Looks at the first byte of `data` and reports whether it already matches
/// one of the six known `segment_type` values, i.e. whether the stream is
/// raw rather than MNU-wrapped.
pub fn looks_like_raw_segment(data: &[u8]) -> bool {
    data.first().copied().and_then(SegmentType::from_byte).is_some()
}

/// Splits an HDMV byte stream into its constituent segments.
///
/// Detects MNU-vs-raw framing once, from the very first byte, per §4.4.1:
/// if the stream does not already look like a raw segment, every segment is
/// assumed to carry the 10-byte MNU wrapper. The caller (`decoder.rs`) uses
/// the returned `bool` to pick its timing path: a raw stream carries no
/// timing of its own and is always force-retimed from the buffer model,
/// while an MNU-wrapped stream supplies its own PTS/DTS and is only
/// force-retimed when explicitly requested.
pub fn scan_segments(data: &Bytes) -> Result<(Vec<RawSegment>, bool), FramingError> {
    let mnu_framed = !looks_like_raw_segment(data);
    let mut segments = Vec::new();
    let mut offset = 0usize;

    while offset < data.len() {
        let mnu = if mnu_framed {
            if offset + MNU_HEADER_LEN > data.len() {
                return Err(FramingError::UnexpectedEof { offset: offset as u64 });
            }
            let magic = u16::from_be_bytes([data[offset], data[offset + 1]]);
            if magic != MNU_MAGIC {
                return Err(FramingError::InvalidMnuMagic { offset: offset as u64 });
            }
            let pts = u32::from_be_bytes(data[offset + 2..offset + 6].try_into().unwrap());
            let dts = u32::from_be_bytes(data[offset + 6..offset + 10].try_into().unwrap());
            offset += MNU_HEADER_LEN;
            Some(MnuHeader { pts, dts })
        } else {
            None
        };

        if offset + SEGMENT_HEADER_LEN > data.len() {
            return Err(FramingError::UnexpectedEof { offset: offset as u64 });
        }

        let header_offset = offset as u64;
        let type_byte = data[offset];
        let segment_type = SegmentType::from_byte(type_byte)
            .ok_or(FramingError::UnknownSegmentType { byte: type_byte, offset: header_offset })?;
        let segment_length = u16::from_be_bytes([data[offset + 1], data[offset + 2]]);
        let payload_start = offset + SEGMENT_HEADER_LEN;
        let payload_end = payload_start + segment_length as usize;
        if payload_end > data.len() {
            return Err(FramingError::UnexpectedEof { offset: header_offset });
        }

        segments.push(RawSegment {
            segment_type,
            input_file_offset: header_offset,
            segment_length,
            mnu,
            payload: data.slice(payload_start..payload_end),
        });

        offset = payload_end;
    }

    Ok((segments, mnu_framed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pds(payload: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0x14, 0x00, payload.len() as u8];
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn scans_raw_segments() {
        let mut data = pds(&[1, 2, 3]);
        data.extend(vec![0x80, 0x00, 0x00]);
        let (segments, mnu_framed) = scan_segments(&Bytes::from(data)).unwrap();
        assert!(!mnu_framed);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].segment_type, SegmentType::Pds);
        assert_eq!(segments[0].payload.as_ref(), &[1, 2, 3]);
        assert_eq!(segments[1].segment_type, SegmentType::End);
    }

    #[test]
    fn scans_mnu_wrapped_segments() {
        let mut data = vec![0x4D, 0x4E];
        data.extend(100u32.to_be_bytes());
        data.extend(90u32.to_be_bytes());
        data.extend(pds(&[9]));
        let (segments, mnu_framed) = scan_segments(&Bytes::from(data)).unwrap();
        assert!(mnu_framed);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].mnu, Some(MnuHeader { pts: 100, dts: 90 }));
    }

    #[test]
    fn rejects_unknown_segment_type() {
        let data = Bytes::from_static(&[0x99, 0x00, 0x00]);
        let err = scan_segments(&data).unwrap_err();
        assert!(matches!(err, FramingError::UnknownSegmentType { byte: 0x99, offset: 0 }));
    }
}
