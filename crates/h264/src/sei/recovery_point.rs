use std::io;

use bitstream::BitReader;
use expgolomb::BitReaderExpGolombExt;

/// `recovery_point()` SEI payload (payloadType 6).
/// ISO/IEC-14496-10-2022 - D.1.8
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryPoint {
    /// `recovery_frame_cnt`, must be `< MaxFrameNum`.
    pub recovery_frame_cnt: u64,
    /// `exact_match_flag`.
    pub exact_match_flag: bool,
    /// `broken_link_flag`. BD-conformant streams must not set this.
    pub broken_link_flag: bool,
    /// `changing_slice_group_idc`, 2 bits. BD forbids FMO, so only `0` is accepted
    /// by the compliance layer; `1`/`2` parse but are flagged downstream.
    pub changing_slice_group_idc: u8,
}

impl RecoveryPoint {
    /// Parses a `recovery_point()` payload.
    pub fn parse<T: io::Read>(bit_reader: &mut BitReader<T>) -> io::Result<Self> {
        Ok(Self {
            recovery_frame_cnt: bit_reader.read_exp_golomb()?,
            exact_match_flag: bit_reader.read_bit()?,
            broken_link_flag: bit_reader.read_bit()?,
            changing_slice_group_idc: bit_reader.read_bits(2)? as u8,
        })
    }
}
