use std::fmt;

use bytes::Bytes;

use crate::NALUnitType;

/// Failures that can occur while scanning an Annex-B byte stream for NAL units.
///
/// Grounded on `initNal`'s leading-byte scan in the reference implementation's
/// H.264 parser: every byte before a start code must be `0x00`, and reaching
/// the end of the buffer without ever finding `0x000001` is itself an error.
#[derive(Debug, thiserror::Error)]
pub enum NalError {
    /// A byte other than `0x00` appeared before a `0x000001`/`0x00000001` start code.
    #[error("invalid start code: byte {byte:#04x} at offset {offset} is not part of a start code prefix")]
    InvalidStartCode {
        /// The offending byte.
        byte: u8,
        /// Its offset into the buffer.
        offset: usize,
    },
    /// The buffer ended while still scanning for a start code, or a NAL unit's
    /// header could not be read because fewer than 2 bytes remained after it.
    #[error("unexpected end of stream while scanning for a NAL unit")]
    UnexpectedEof,
    /// The `nal_unit_type` field (5 bits) did not map to any known type.
    #[error("invalid nal_unit_type at offset {offset}: {source}")]
    InvalidNalUnitType {
        /// Offset of the NAL unit's header byte.
        offset: usize,
        /// The underlying conversion error.
        #[source]
        source: std::io::Error,
    },
}

/// One NAL unit located within an Annex-B byte stream.
///
/// `payload` is the raw slice *including* its one-byte NAL header and any
/// emulation-prevention bytes still in place; callers that need the RBSP proper
/// wrap it in [`crate::EmulationPreventionIo`].
#[derive(Debug, Clone)]
pub struct NalUnit {
    /// Byte offset of this NAL unit's first payload byte (the header byte),
    /// i.e. immediately after its start code, within the original stream.
    pub offset: u64,
    /// Whether this unit was introduced by a 4-byte start code
    /// (`0x00000001`, a `zero_byte` followed by the 3-byte prefix).
    pub four_byte_start_code: bool,
    /// The header's `nal_ref_idc` field.
    pub nal_ref_idc: u8,
    /// The NAL unit's type.
    pub nal_unit_type: NALUnitType,
    /// The full payload (header byte + RBSP bytes with emulation prevention
    /// still applied), not including the start code.
    pub payload: Bytes,
}

impl fmt::Display for NalUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NAL({:?}, ref_idc={}, offset={}, len={})",
            self.nal_unit_type,
            self.nal_ref_idc,
            self.offset,
            self.payload.len()
        )
    }
}

/// Splits an Annex-B byte stream into its constituent NAL units.
///
/// This performs no RBSP-level validation of any unit's contents; it only
/// locates start codes and slices the bytes between them, per clause B.1's
/// byte stream format.
pub fn scan_nal_units(data: &Bytes) -> Result<Vec<NalUnit>, NalError> {
    let mut units = Vec::new();
    let (_, mut header_offset) = find_start_code(data, 0, true)?;

    while header_offset < data.len() {
        // header_offset-3..header_offset is the "00 00 01" prefix; a 4-byte
        // start code has one more zero_byte immediately before that.
        let four_byte = header_offset >= 4 && data[header_offset - 4] == 0x00;

        let (end, next_header_offset) = match find_start_code(data, header_offset, false) {
            Ok((end, next)) => (end, next),
            Err(NalError::UnexpectedEof) => (data.len(), data.len()),
            Err(other) => return Err(other),
        };

        if end <= header_offset {
            return Err(NalError::UnexpectedEof);
        }

        let payload = data.slice(header_offset..end);
        let header = payload[0];
        let nal_ref_idc = (header >> 5) & 0x03;
        let nal_unit_type_raw = header & 0x1F;
        let nal_unit_type = NALUnitType::try_from(nal_unit_type_raw)
            .map_err(|source| NalError::InvalidNalUnitType { offset: header_offset, source })?;

        units.push(NalUnit {
            offset: header_offset as u64,
            four_byte_start_code: four_byte,
            nal_ref_idc,
            nal_unit_type,
            payload,
        });

        header_offset = next_header_offset;
    }

    Ok(units)
}

/// Scans for a `0x000001` start code at or after `from`.
///
/// Returns `(trimmed_end, header_offset)`: `trimmed_end` is `from` trimmed
/// forward only by any zero bytes that belong to the found start code's own
/// leading run (so callers slicing `[previous_header..trimmed_end]` exclude
/// them), and `header_offset` is the index of the first byte after the
/// 3-byte prefix, where the NAL header lives.
///
/// When `strict_leading` is set (used only for the very first start code),
/// any non-`0x00` byte encountered before the prefix is a [`NalError::InvalidStartCode`].
fn find_start_code(data: &[u8], from: usize, strict_leading: bool) -> Result<(usize, usize), NalError> {
    let mut i = from;
    while i + 3 <= data.len() {
        if data[i] == 0x00 && data[i + 1] == 0x00 && data[i + 2] == 0x01 {
            let mut trim = i;
            while trim > from && data[trim - 1] == 0x00 {
                trim -= 1;
            }
            return Ok((trim, i + 3));
        }
        if strict_leading && data[i] != 0x00 {
            return Err(NalError::InvalidStartCode { byte: data[i], offset: i });
        }
        i += 1;
    }
    Err(NalError::UnexpectedEof)
}
