use std::io;

use bitstream::{BitReader, BitWriter};
use expgolomb::{BitReaderExpGolombExt, BitWriterExpGolombExt};

/// One `memory_management_control_operation`, ops 1-6 (op 0 is the list terminator
/// and is not represented as an entry).
/// ISO/IEC-14496-10-2022 - 7.3.3.3, 8.2.5.4
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryManagementControlOp {
    /// op 1: mark a short-term picture as "unused for reference".
    MarkShortTermUnused {
        /// `difference_of_pic_nums_minus1`.
        difference_of_pic_nums_minus1: u64,
    },
    /// op 2: mark a long-term picture as "unused for reference".
    MarkLongTermUnused {
        /// `long_term_pic_num`.
        long_term_pic_num: u64,
    },
    /// op 3: promote a short-term picture to long-term at the given index.
    AssignLongTerm {
        /// `difference_of_pic_nums_minus1`.
        difference_of_pic_nums_minus1: u64,
        /// `long_term_frame_idx`.
        long_term_frame_idx: u64,
    },
    /// op 4: set the max long-term frame index and evict anything above it.
    SetMaxLongTermFrameIdx {
        /// `max_long_term_frame_idx_plus1`.
        max_long_term_frame_idx_plus1: u64,
    },
    /// op 5: mark all reference pictures "unused for reference" (an explicit reset).
    ResetAll,
    /// op 6: mark the current picture as used-for-long-term at the given index.
    MarkCurrentLongTerm {
        /// `long_term_frame_idx`.
        long_term_frame_idx: u64,
    },
}

impl MemoryManagementControlOp {
    fn parse<T: io::Read>(bit_reader: &mut BitReader<T>, op: u64) -> io::Result<Self> {
        match op {
            1 => Ok(Self::MarkShortTermUnused {
                difference_of_pic_nums_minus1: bit_reader.read_exp_golomb()?,
            }),
            2 => Ok(Self::MarkLongTermUnused {
                long_term_pic_num: bit_reader.read_exp_golomb()?,
            }),
            3 => Ok(Self::AssignLongTerm {
                difference_of_pic_nums_minus1: bit_reader.read_exp_golomb()?,
                long_term_frame_idx: bit_reader.read_exp_golomb()?,
            }),
            4 => Ok(Self::SetMaxLongTermFrameIdx {
                max_long_term_frame_idx_plus1: bit_reader.read_exp_golomb()?,
            }),
            5 => Ok(Self::ResetAll),
            6 => Ok(Self::MarkCurrentLongTerm {
                long_term_frame_idx: bit_reader.read_exp_golomb()?,
            }),
            other => Err(io::Error::new(io::ErrorKind::InvalidData, format!("invalid memory_management_control_operation {other}"))),
        }
    }

    fn op_code(self) -> u64 {
        match self {
            Self::MarkShortTermUnused { .. } => 1,
            Self::MarkLongTermUnused { .. } => 2,
            Self::AssignLongTerm { .. } => 3,
            Self::SetMaxLongTermFrameIdx { .. } => 4,
            Self::ResetAll => 5,
            Self::MarkCurrentLongTerm { .. } => 6,
        }
    }

    fn build<W: io::Write>(self, bit_writer: &mut BitWriter<W>) -> io::Result<()> {
        bit_writer.write_exp_golomb(self.op_code())?;
        match self {
            Self::MarkShortTermUnused { difference_of_pic_nums_minus1 } => {
                bit_writer.write_exp_golomb(difference_of_pic_nums_minus1)?;
            }
            Self::MarkLongTermUnused { long_term_pic_num } => {
                bit_writer.write_exp_golomb(long_term_pic_num)?;
            }
            Self::AssignLongTerm { difference_of_pic_nums_minus1, long_term_frame_idx } => {
                bit_writer.write_exp_golomb(difference_of_pic_nums_minus1)?;
                bit_writer.write_exp_golomb(long_term_frame_idx)?;
            }
            Self::SetMaxLongTermFrameIdx { max_long_term_frame_idx_plus1 } => {
                bit_writer.write_exp_golomb(max_long_term_frame_idx_plus1)?;
            }
            Self::ResetAll => {}
            Self::MarkCurrentLongTerm { long_term_frame_idx } => {
                bit_writer.write_exp_golomb(long_term_frame_idx)?;
            }
        }
        Ok(())
    }

    /// Whether this operation sets `presenceOfMemManCtrlOp5` on the current
    /// picture, used to wrap `prevPicOrderCntMsb` back to zero afterward.
    pub fn is_reset_all(self) -> bool {
        matches!(self, Self::ResetAll)
    }
}

/// `adaptive_ref_pic_marking_mode_flag`'s payload: `dec_ref_pic_marking()`.
/// ISO/IEC-14496-10-2022 - 7.3.3.3
///
/// Read only when `nal_ref_idc != 0`. For IDR pictures the first two flags
/// (`no_output_of_prior_pics_flag`, `long_term_reference_flag`) replace the op
/// list entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecRefPicMarking {
    /// IDR picture form.
    Idr {
        /// `no_output_of_prior_pics_flag`.
        no_output_of_prior_pics_flag: bool,
        /// `long_term_reference_flag`.
        long_term_reference_flag: bool,
    },
    /// Non-IDR picture form: `adaptive_ref_pic_marking_mode_flag` plus, if set,
    /// the operation list (terminated by op 0, at most 16 entries per picture).
    NonIdr {
        /// The decoded operation list, in the order they must be applied.
        /// Empty when `adaptive_ref_pic_marking_mode_flag` is 0.
        operations: Vec<MemoryManagementControlOp>,
    },
}

const MAX_MMCO_OPS: usize = 16;

impl DecRefPicMarking {
    /// Parses `dec_ref_pic_marking()`.
    pub fn parse<T: io::Read>(bit_reader: &mut BitReader<T>, idr_pic_flag: bool) -> io::Result<Self> {
        if idr_pic_flag {
            return Ok(Self::Idr {
                no_output_of_prior_pics_flag: bit_reader.read_bit()?,
                long_term_reference_flag: bit_reader.read_bit()?,
            });
        }

        let adaptive_ref_pic_marking_mode_flag = bit_reader.read_bit()?;
        let mut operations = Vec::new();
        if adaptive_ref_pic_marking_mode_flag {
            loop {
                let op = bit_reader.read_exp_golomb()?;
                if op == 0 {
                    break;
                }
                if operations.len() >= MAX_MMCO_OPS {
                    return Err(io::Error::new(io::ErrorKind::InvalidData, "too many memory_management_control_operations"));
                }
                operations.push(MemoryManagementControlOp::parse(bit_reader, op)?);
            }
        }

        Ok(Self::NonIdr { operations })
    }

    /// Builds `dec_ref_pic_marking()`.
    pub fn build<W: io::Write>(&self, bit_writer: &mut BitWriter<W>) -> io::Result<()> {
        match self {
            Self::Idr { no_output_of_prior_pics_flag, long_term_reference_flag } => {
                bit_writer.write_bit(*no_output_of_prior_pics_flag)?;
                bit_writer.write_bit(*long_term_reference_flag)?;
            }
            Self::NonIdr { operations } => {
                bit_writer.write_bit(!operations.is_empty())?;
                for op in operations {
                    op.build(bit_writer)?;
                }
                if !operations.is_empty() {
                    bit_writer.write_exp_golomb(0)?;
                }
            }
        }
        Ok(())
    }
}
