use std::io;

use bitstream::{BitReader, BitWriter};
use expgolomb::{BitReaderExpGolombExt, BitWriterExpGolombExt};

/// One reference index's luma, and optionally chroma, weight/offset pair.
/// ISO/IEC-14496-10-2022 - 7.3.3.2
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightOffset {
    /// Explicit weight, or `None` when the default (`1 << luma_log2_weight_denom`) applies.
    pub luma_weight: Option<i64>,
    /// `luma_offset`, defaults to 0 when `luma_weight` is `None`.
    pub luma_offset: i64,
    /// Per-component (Cb, Cr) explicit weight, or `None` for the default.
    pub chroma_weight: Option<[i64; 2]>,
    /// Per-component (Cb, Cr) `chroma_offset`, defaults to 0 when `chroma_weight` is `None`.
    pub chroma_offset: [i64; 2],
}

impl WeightOffset {
    fn parse<T: io::Read>(bit_reader: &mut BitReader<T>, has_chroma: bool) -> io::Result<Self> {
        let luma_weight_flag = bit_reader.read_bit()?;
        let (luma_weight, luma_offset) = if luma_weight_flag {
            (Some(bit_reader.read_signed_exp_golomb()?), bit_reader.read_signed_exp_golomb()?)
        } else {
            (None, 0)
        };

        let (chroma_weight, chroma_offset) = if has_chroma {
            let chroma_weight_flag = bit_reader.read_bit()?;
            if chroma_weight_flag {
                let mut weight = [0i64; 2];
                let mut offset = [0i64; 2];
                for i in 0..2 {
                    weight[i] = bit_reader.read_signed_exp_golomb()?;
                    offset[i] = bit_reader.read_signed_exp_golomb()?;
                }
                (Some(weight), offset)
            } else {
                (None, [0, 0])
            }
        } else {
            (None, [0, 0])
        };

        Ok(Self { luma_weight, luma_offset, chroma_weight, chroma_offset })
    }

    fn build<W: io::Write>(&self, bit_writer: &mut BitWriter<W>, has_chroma: bool) -> io::Result<()> {
        bit_writer.write_bit(self.luma_weight.is_some())?;
        if let Some(weight) = self.luma_weight {
            bit_writer.write_signed_exp_golomb(weight)?;
            bit_writer.write_signed_exp_golomb(self.luma_offset)?;
        }

        if has_chroma {
            bit_writer.write_bit(self.chroma_weight.is_some())?;
            if let Some(weight) = self.chroma_weight {
                for i in 0..2 {
                    bit_writer.write_signed_exp_golomb(weight[i])?;
                    bit_writer.write_signed_exp_golomb(self.chroma_offset[i])?;
                }
            }
        }

        Ok(())
    }
}

/// `pred_weight_table()`, read when `(weighted_pred_flag && P/SP slice) ||
/// (weighted_bipred_idc == 1 && B slice)`.
/// ISO/IEC-14496-10-2022 - 7.3.3.2
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredWeightTable {
    /// `luma_log2_weight_denom`.
    pub luma_log2_weight_denom: u64,
    /// `chroma_log2_weight_denom`, present iff `ChromaArrayType != 0`.
    pub chroma_log2_weight_denom: Option<u64>,
    /// One entry per active reference index in list 0.
    pub list0: Vec<WeightOffset>,
    /// One entry per active reference index in list 1; empty outside B slices.
    pub list1: Vec<WeightOffset>,
}

impl PredWeightTable {
    /// Parses `pred_weight_table()`.
    ///
    /// `num_ref_idx_l0_active`/`num_ref_idx_l1_active` must already reflect any
    /// `num_ref_idx_active_override_flag` override. `chroma_array_type` comes
    /// from the active SPS; pass `0` for monochrome streams.
    pub fn parse<T: io::Read>(
        bit_reader: &mut BitReader<T>,
        num_ref_idx_l0_active: u64,
        num_ref_idx_l1_active: u64,
        is_b_slice: bool,
        chroma_array_type: u8,
    ) -> io::Result<Self> {
        let has_chroma = chroma_array_type != 0;
        let luma_log2_weight_denom = bit_reader.read_exp_golomb()?;
        let chroma_log2_weight_denom = if has_chroma { Some(bit_reader.read_exp_golomb()?) } else { None };

        let list0 = (0..num_ref_idx_l0_active).map(|_| WeightOffset::parse(bit_reader, has_chroma)).collect::<io::Result<_>>()?;
        let list1 = if is_b_slice {
            (0..num_ref_idx_l1_active).map(|_| WeightOffset::parse(bit_reader, has_chroma)).collect::<io::Result<_>>()?
        } else {
            Vec::new()
        };

        Ok(Self { luma_log2_weight_denom, chroma_log2_weight_denom, list0, list1 })
    }

    /// Builds `pred_weight_table()`.
    pub fn build<W: io::Write>(&self, bit_writer: &mut BitWriter<W>) -> io::Result<()> {
        let has_chroma = self.chroma_log2_weight_denom.is_some();
        bit_writer.write_exp_golomb(self.luma_log2_weight_denom)?;
        if let Some(denom) = self.chroma_log2_weight_denom {
            bit_writer.write_exp_golomb(denom)?;
        }
        for entry in &self.list0 {
            entry.build(bit_writer, has_chroma)?;
        }
        for entry in &self.list1 {
            entry.build(bit_writer, has_chroma)?;
        }
        Ok(())
    }
}
