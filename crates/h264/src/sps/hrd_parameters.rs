use std::io;

use bitstream::{BitReader, BitWriter};
use expgolomb::{BitReaderExpGolombExt, BitWriterExpGolombExt, size_of_exp_golomb};

/// One `SchedSelIdx` entry of an [`HrdParameters`] table.
/// ISO/IEC-14496-10-2022 - E.1.2
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpbEntry {
    /// `bit_rate_value_minus1[SchedSelIdx]`.
    pub bit_rate_value_minus1: u64,
    /// `cpb_size_value_minus1[SchedSelIdx]`.
    pub cpb_size_value_minus1: u64,
    /// `cbr_flag[SchedSelIdx]`.
    pub cbr_flag: bool,
}

impl CpbEntry {
    /// `BitRate[SchedSelIdx] = (bit_rate_value_minus1 + 1) << (6 + bit_rate_scale)`.
    pub fn bit_rate(self, bit_rate_scale: u8) -> u64 {
        (self.bit_rate_value_minus1 + 1) << (6 + bit_rate_scale)
    }

    /// `CpbSize[SchedSelIdx] = (cpb_size_value_minus1 + 1) << (4 + cpb_size_scale)`.
    pub fn cpb_size(self, cpb_size_scale: u8) -> u64 {
        (self.cpb_size_value_minus1 + 1) << (4 + cpb_size_scale)
    }
}

/// HRD parameters, shared syntax for both `nal_hrd_parameters()` and `vcl_hrd_parameters()`.
/// ISO/IEC-14496-10-2022 - E.1.2
#[derive(Debug, Clone, PartialEq)]
pub struct HrdParameters {
    /// `cpb_cnt_minus1`, ≤ 31.
    pub cpb_cnt_minus1: u64,
    /// `bit_rate_scale`, 4 bits.
    pub bit_rate_scale: u8,
    /// `cpb_size_scale`, 4 bits.
    pub cpb_size_scale: u8,
    /// One entry per `SchedSelIdx` in `[0, cpb_cnt_minus1]`.
    ///
    /// Invariant: `bit_rate_value_minus1` is strictly increasing and
    /// `cpb_size_value_minus1` is non-increasing across entries (E.2.2).
    pub entries: Vec<CpbEntry>,
    /// `initial_cpb_removal_delay_length_minus1`, 5 bits.
    pub initial_cpb_removal_delay_length_minus1: u8,
    /// `cpb_removal_delay_length_minus1`, 5 bits.
    pub cpb_removal_delay_length_minus1: u8,
    /// `dpb_output_delay_length_minus1`, 5 bits.
    pub dpb_output_delay_length_minus1: u8,
    /// `time_offset_length`, 5 bits.
    pub time_offset_length: u8,
}

impl HrdParameters {
    /// Parses `hrd_parameters()`.
    pub fn parse<T: io::Read>(bit_reader: &mut BitReader<T>) -> io::Result<Self> {
        let cpb_cnt_minus1 = bit_reader.read_exp_golomb()?;
        if cpb_cnt_minus1 > 31 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "cpb_cnt_minus1 must be <= 31"));
        }
        let bit_rate_scale = bit_reader.read_bits(4)? as u8;
        let cpb_size_scale = bit_reader.read_bits(4)? as u8;

        let mut entries = Vec::with_capacity(cpb_cnt_minus1 as usize + 1);
        for _ in 0..=cpb_cnt_minus1 {
            let bit_rate_value_minus1 = bit_reader.read_exp_golomb()?;
            let cpb_size_value_minus1 = bit_reader.read_exp_golomb()?;
            let cbr_flag = bit_reader.read_bit()?;
            entries.push(CpbEntry {
                bit_rate_value_minus1,
                cpb_size_value_minus1,
                cbr_flag,
            });
        }

        let initial_cpb_removal_delay_length_minus1 = bit_reader.read_bits(5)? as u8;
        let cpb_removal_delay_length_minus1 = bit_reader.read_bits(5)? as u8;
        let dpb_output_delay_length_minus1 = bit_reader.read_bits(5)? as u8;
        let time_offset_length = bit_reader.read_bits(5)? as u8;

        Ok(Self {
            cpb_cnt_minus1,
            bit_rate_scale,
            cpb_size_scale,
            entries,
            initial_cpb_removal_delay_length_minus1,
            cpb_removal_delay_length_minus1,
            dpb_output_delay_length_minus1,
            time_offset_length,
        })
    }

    /// Builds `hrd_parameters()`.
    pub fn build<W: io::Write>(&self, bit_writer: &mut BitWriter<W>) -> io::Result<()> {
        bit_writer.write_exp_golomb(self.cpb_cnt_minus1)?;
        bit_writer.write_bits(self.bit_rate_scale as u64, 4)?;
        bit_writer.write_bits(self.cpb_size_scale as u64, 4)?;
        for entry in &self.entries {
            bit_writer.write_exp_golomb(entry.bit_rate_value_minus1)?;
            bit_writer.write_exp_golomb(entry.cpb_size_value_minus1)?;
            bit_writer.write_bit(entry.cbr_flag)?;
        }
        bit_writer.write_bits(self.initial_cpb_removal_delay_length_minus1 as u64, 5)?;
        bit_writer.write_bits(self.cpb_removal_delay_length_minus1 as u64, 5)?;
        bit_writer.write_bits(self.dpb_output_delay_length_minus1 as u64, 5)?;
        bit_writer.write_bits(self.time_offset_length as u64, 5)?;
        Ok(())
    }

    /// Returns the total bits of the `hrd_parameters()` syntax.
    pub fn bitsize(&self) -> u64 {
        size_of_exp_golomb(self.cpb_cnt_minus1) +
        4 + // bit_rate_scale
        4 + // cpb_size_scale
        self.entries.iter().map(|entry| {
            size_of_exp_golomb(entry.bit_rate_value_minus1)
                + size_of_exp_golomb(entry.cpb_size_value_minus1)
                + 1 // cbr_flag
        }).sum::<u64>() +
        5 + // initial_cpb_removal_delay_length_minus1
        5 + // cpb_removal_delay_length_minus1
        5 + // dpb_output_delay_length_minus1
        5 // time_offset_length
    }
}

/// `bitstream_restriction()`, read when `bitstream_restriction_flag` is set.
/// ISO/IEC-14496-10-2022 - E.1.1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitstreamRestriction {
    /// `motion_vectors_over_pic_boundaries_flag`.
    pub motion_vectors_over_pic_boundaries_flag: bool,
    /// `max_bytes_per_pic_denom`.
    pub max_bytes_per_pic_denom: u64,
    /// `max_bits_per_mb_denom`.
    pub max_bits_per_mb_denom: u64,
    /// `log2_max_mv_length_horizontal`.
    pub log2_max_mv_length_horizontal: u64,
    /// `log2_max_mv_length_vertical`.
    pub log2_max_mv_length_vertical: u64,
    /// `max_num_reorder_frames`.
    pub max_num_reorder_frames: u64,
    /// `max_dec_frame_buffering`.
    pub max_dec_frame_buffering: u64,
}

impl BitstreamRestriction {
    /// Parses `bitstream_restriction()`.
    pub fn parse<T: io::Read>(bit_reader: &mut BitReader<T>) -> io::Result<Self> {
        Ok(Self {
            motion_vectors_over_pic_boundaries_flag: bit_reader.read_bit()?,
            max_bytes_per_pic_denom: bit_reader.read_exp_golomb()?,
            max_bits_per_mb_denom: bit_reader.read_exp_golomb()?,
            log2_max_mv_length_horizontal: bit_reader.read_exp_golomb()?,
            log2_max_mv_length_vertical: bit_reader.read_exp_golomb()?,
            max_num_reorder_frames: bit_reader.read_exp_golomb()?,
            max_dec_frame_buffering: bit_reader.read_exp_golomb()?,
        })
    }

    /// Builds `bitstream_restriction()`.
    pub fn build<W: io::Write>(&self, bit_writer: &mut BitWriter<W>) -> io::Result<()> {
        bit_writer.write_bit(self.motion_vectors_over_pic_boundaries_flag)?;
        bit_writer.write_exp_golomb(self.max_bytes_per_pic_denom)?;
        bit_writer.write_exp_golomb(self.max_bits_per_mb_denom)?;
        bit_writer.write_exp_golomb(self.log2_max_mv_length_horizontal)?;
        bit_writer.write_exp_golomb(self.log2_max_mv_length_vertical)?;
        bit_writer.write_exp_golomb(self.max_num_reorder_frames)?;
        bit_writer.write_exp_golomb(self.max_dec_frame_buffering)?;
        Ok(())
    }

    /// Returns the total bits of the `bitstream_restriction()` syntax.
    pub fn bitsize(&self) -> u64 {
        1 + // motion_vectors_over_pic_boundaries_flag
        size_of_exp_golomb(self.max_bytes_per_pic_denom) +
        size_of_exp_golomb(self.max_bits_per_mb_denom) +
        size_of_exp_golomb(self.log2_max_mv_length_horizontal) +
        size_of_exp_golomb(self.log2_max_mv_length_vertical) +
        size_of_exp_golomb(self.max_num_reorder_frames) +
        size_of_exp_golomb(self.max_dec_frame_buffering)
    }
}
