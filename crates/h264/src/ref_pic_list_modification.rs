use std::io;

use bitstream::{BitReader, BitWriter};
use expgolomb::{BitReaderExpGolombExt, BitWriterExpGolombExt};

/// One `ref_pic_list_modification()` entry, `modification_of_pic_nums_idc` 0-2.
/// ISO/IEC-14496-10-2022 - 7.3.3.1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefPicListModification {
    /// idc 0: subtract from the predicted picture number.
    SubtractAbsDiff {
        /// `abs_diff_pic_num_minus1`.
        abs_diff_pic_num_minus1: u64,
    },
    /// idc 1: add to the predicted picture number.
    AddAbsDiff {
        /// `abs_diff_pic_num_minus1`.
        abs_diff_pic_num_minus1: u64,
    },
    /// idc 2: reorder to a specific long-term picture number.
    LongTerm {
        /// `long_term_pic_num`.
        long_term_pic_num: u64,
    },
}

const MAX_MODIFICATIONS: usize = 32;

impl RefPicListModification {
    fn parse<T: io::Read>(bit_reader: &mut BitReader<T>, idc: u64) -> io::Result<Self> {
        match idc {
            0 => Ok(Self::SubtractAbsDiff { abs_diff_pic_num_minus1: bit_reader.read_exp_golomb()? }),
            1 => Ok(Self::AddAbsDiff { abs_diff_pic_num_minus1: bit_reader.read_exp_golomb()? }),
            2 => Ok(Self::LongTerm { long_term_pic_num: bit_reader.read_exp_golomb()? }),
            other => Err(io::Error::new(io::ErrorKind::InvalidData, format!("invalid modification_of_pic_nums_idc {other}"))),
        }
    }

    fn idc(self) -> u64 {
        match self {
            Self::SubtractAbsDiff { .. } => 0,
            Self::AddAbsDiff { .. } => 1,
            Self::LongTerm { .. } => 2,
        }
    }

    fn build<W: io::Write>(self, bit_writer: &mut BitWriter<W>) -> io::Result<()> {
        bit_writer.write_exp_golomb(self.idc())?;
        match self {
            Self::SubtractAbsDiff { abs_diff_pic_num_minus1 } | Self::AddAbsDiff { abs_diff_pic_num_minus1 } => {
                bit_writer.write_exp_golomb(abs_diff_pic_num_minus1)?;
            }
            Self::LongTerm { long_term_pic_num } => {
                bit_writer.write_exp_golomb(long_term_pic_num)?;
            }
        }
        Ok(())
    }

    /// Parses one `ref_pic_list_modification()` list, up to 32 entries, terminated
    /// by `modification_of_pic_nums_idc == 3`.
    pub fn parse_list<T: io::Read>(bit_reader: &mut BitReader<T>) -> io::Result<Vec<Self>> {
        let mut modifications = Vec::new();
        loop {
            let idc = bit_reader.read_exp_golomb()?;
            if idc == 3 {
                break;
            }
            if modifications.len() >= MAX_MODIFICATIONS {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "too many ref_pic_list_modification entries"));
            }
            modifications.push(Self::parse(bit_reader, idc)?);
        }
        Ok(modifications)
    }

    /// Builds a `ref_pic_list_modification()` list, including the terminator.
    pub fn build_list<W: io::Write>(modifications: &[Self], bit_writer: &mut BitWriter<W>) -> io::Result<()> {
        for modification in modifications {
            modification.build(bit_writer)?;
        }
        bit_writer.write_exp_golomb(3)?;
        Ok(())
    }
}
