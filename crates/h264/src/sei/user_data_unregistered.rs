use std::io;

use bitstream::BitReader;

/// Upper bound on the opaque payload captured by [`UserDataUnregistered`],
/// beyond which bytes are dropped rather than buffered without limit.
pub const MAX_USER_DATA_PAYLOAD: usize = 4096;

/// `user_data_unregistered()` SEI payload (payloadType 5).
/// ISO/IEC-14496-10-2022 - D.1.7
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDataUnregistered {
    /// `uuid_iso_iec_11578`, 128 bits.
    pub uuid: [u8; 16],
    /// The remaining payload bytes, truncated to [`MAX_USER_DATA_PAYLOAD`].
    pub data: Vec<u8>,
    /// True if `data` was truncated relative to `payload_size - 16`.
    pub truncated: bool,
}

impl UserDataUnregistered {
    /// Parses a `user_data_unregistered()` payload given the SEI message's
    /// `payload_size` (the UUID's 16 bytes count against it).
    pub fn parse<T: io::Read>(bit_reader: &mut BitReader<T>, payload_size: usize) -> io::Result<Self> {
        let mut uuid = [0u8; 16];
        for byte in &mut uuid {
            *byte = bit_reader.read_bits(8)? as u8;
        }

        let remaining = payload_size.saturating_sub(16);
        let capped = remaining.min(MAX_USER_DATA_PAYLOAD);
        let mut data = Vec::with_capacity(capped);
        for _ in 0..capped {
            data.push(bit_reader.read_bits(8)? as u8);
        }
        for _ in capped..remaining {
            bit_reader.read_bits(8)?;
        }

        Ok(Self {
            uuid,
            data,
            truncated: remaining > capped,
        })
    }
}
