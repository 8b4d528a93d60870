use std::io;

use bitstream::BitReader;

use crate::HrdParameters;

/// One `SchedSelIdx` entry of a [`BufferingPeriod`], read at the field widths
/// carried by the active SPS's HRD parameters.
/// ISO/IEC-14496-10-2022 - D.1.2
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpbRemovalDelay {
    /// `initial_cpb_removal_delay[SchedSelIdx]`.
    pub initial_cpb_removal_delay: u64,
    /// `initial_cpb_removal_delay_offset[SchedSelIdx]`.
    pub initial_cpb_removal_delay_offset: u64,
}

/// `buffering_period()` SEI payload (payloadType 0).
/// ISO/IEC-14496-10-2022 - D.1.2
#[derive(Debug, Clone, PartialEq)]
pub struct BufferingPeriod {
    /// `seq_parameter_set_id`, identifies the active SPS whose HRD parameters
    /// give the field widths below.
    pub seq_parameter_set_id: u64,
    /// One entry per `SchedSelIdx` of `nal_hrd_parameters`, empty if absent.
    pub nal_hrd: Vec<CpbRemovalDelay>,
    /// One entry per `SchedSelIdx` of `vcl_hrd_parameters`, empty if absent.
    pub vcl_hrd: Vec<CpbRemovalDelay>,
}

impl BufferingPeriod {
    /// Parses a `buffering_period()` payload given the active SPS's HRD tables.
    pub fn parse<T: io::Read>(
        bit_reader: &mut BitReader<T>,
        seq_parameter_set_id: u64,
        nal_hrd_parameters: Option<&HrdParameters>,
        vcl_hrd_parameters: Option<&HrdParameters>,
    ) -> io::Result<Self> {
        let nal_hrd = match nal_hrd_parameters {
            Some(hrd) => Self::read_delays(bit_reader, hrd)?,
            None => Vec::new(),
        };
        let vcl_hrd = match vcl_hrd_parameters {
            Some(hrd) => Self::read_delays(bit_reader, hrd)?,
            None => Vec::new(),
        };

        Ok(Self {
            seq_parameter_set_id,
            nal_hrd,
            vcl_hrd,
        })
    }

    fn read_delays<T: io::Read>(bit_reader: &mut BitReader<T>, hrd: &HrdParameters) -> io::Result<Vec<CpbRemovalDelay>> {
        let delay_len = hrd.initial_cpb_removal_delay_length_minus1 + 1;
        (0..=hrd.cpb_cnt_minus1)
            .map(|_| {
                Ok(CpbRemovalDelay {
                    initial_cpb_removal_delay: bit_reader.read_bits(delay_len)?,
                    initial_cpb_removal_delay_offset: bit_reader.read_bits(delay_len)?,
                })
            })
            .collect()
    }
}
