use std::io;

use bitstream::BitReader;

use crate::{HrdParameters, PicStruct};

/// One of the up to 3 `clock_timestamp()` records a [`PictureTiming`] may carry.
/// ISO/IEC-14496-10-2022 - D.1.3, D.2.3
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTimestamp {
    /// `ct_type`, 2 bits.
    pub ct_type: u8,
    /// `nuit_field_based_flag`.
    pub nuit_field_based_flag: bool,
    /// `counting_type`, 5 bits.
    pub counting_type: u8,
    /// `full_timestamp_flag`.
    pub full_timestamp_flag: bool,
    /// `discontinuity_flag`.
    pub discontinuity_flag: bool,
    /// `cnt_dropped_flag`.
    pub cnt_dropped_flag: bool,
    /// `n_frames`, 8 bits.
    pub n_frames: u8,
    /// `seconds_value`, present when the timestamp is fully or partially specified.
    pub seconds_value: Option<u8>,
    /// `minutes_value`, present together with `seconds_value` when given.
    pub minutes_value: Option<u8>,
    /// `hours_value`, present together with `minutes_value` when given.
    pub hours_value: Option<u8>,
    /// `time_offset`, signed, width from `time_offset_length`.
    pub time_offset: i64,
}

impl ClockTimestamp {
    fn parse<T: io::Read>(bit_reader: &mut BitReader<T>, time_offset_length: u8) -> io::Result<Self> {
        let ct_type = bit_reader.read_bits(2)? as u8;
        let nuit_field_based_flag = bit_reader.read_bit()?;
        let counting_type = bit_reader.read_bits(5)? as u8;
        let full_timestamp_flag = bit_reader.read_bit()?;
        let discontinuity_flag = bit_reader.read_bit()?;
        let cnt_dropped_flag = bit_reader.read_bit()?;
        let n_frames = bit_reader.read_bits(8)? as u8;

        let (seconds_value, minutes_value, hours_value) = if full_timestamp_flag {
            let seconds_value = bit_reader.read_bits(6)? as u8;
            let minutes_value = bit_reader.read_bits(6)? as u8;
            let hours_value = bit_reader.read_bits(5)? as u8;
            (Some(seconds_value), Some(minutes_value), Some(hours_value))
        } else {
            let mut seconds_value = None;
            let mut minutes_value = None;
            let mut hours_value = None;
            if bit_reader.read_bit()? {
                seconds_value = Some(bit_reader.read_bits(6)? as u8);
                if bit_reader.read_bit()? {
                    minutes_value = Some(bit_reader.read_bits(6)? as u8);
                    if bit_reader.read_bit()? {
                        hours_value = Some(bit_reader.read_bits(5)? as u8);
                    }
                }
            }
            (seconds_value, minutes_value, hours_value)
        };

        let time_offset = if time_offset_length > 0 {
            let raw = bit_reader.read_bits(time_offset_length)?;
            let sign_bit = 1u64 << (time_offset_length - 1);
            if raw & sign_bit != 0 {
                (raw as i64) - (1i64 << time_offset_length)
            } else {
                raw as i64
            }
        } else {
            0
        };

        Ok(Self {
            ct_type,
            nuit_field_based_flag,
            counting_type,
            full_timestamp_flag,
            discontinuity_flag,
            cnt_dropped_flag,
            n_frames,
            seconds_value,
            minutes_value,
            hours_value,
            time_offset,
        })
    }
}

/// `pic_timing()` SEI payload (payloadType 1).
/// ISO/IEC-14496-10-2022 - D.1.3
#[derive(Debug, Clone, PartialEq)]
pub struct PictureTiming {
    /// `cpb_removal_delay`, present iff `CpbDpbDelaysPresentFlag`.
    pub cpb_removal_delay: Option<u64>,
    /// `dpb_output_delay`, present iff `CpbDpbDelaysPresentFlag`.
    pub dpb_output_delay: Option<u64>,
    /// `pic_struct`, present iff `pic_struct_present_flag`.
    pub pic_struct: Option<PicStruct>,
    /// Up to 3 `clock_timestamp()` records, gated per-entry by `clock_timestamp_flag`.
    pub clock_timestamps: Vec<ClockTimestamp>,
}

impl PictureTiming {
    /// Parses a `pic_timing()` payload.
    ///
    /// `cpb_dpb_delays_present` and the two delay-length widths come from the
    /// active SPS's HRD parameters (either table; D.1.3 treats them as shared
    /// once either one is present). `pic_struct_present` comes from the active
    /// SPS's `pic_struct_present_flag`.
    pub fn parse<T: io::Read>(
        bit_reader: &mut BitReader<T>,
        hrd: Option<&HrdParameters>,
        pic_struct_present: bool,
    ) -> io::Result<Self> {
        let (cpb_removal_delay, dpb_output_delay) = match hrd {
            Some(hrd) => {
                let cpb = bit_reader.read_bits(hrd.cpb_removal_delay_length_minus1 + 1)?;
                let dpb = bit_reader.read_bits(hrd.dpb_output_delay_length_minus1 + 1)?;
                (Some(cpb), Some(dpb))
            }
            None => (None, None),
        };

        let mut pic_struct = None;
        let mut clock_timestamps = Vec::new();
        if pic_struct_present {
            let raw = bit_reader.read_bits(4)? as u8;
            let parsed = PicStruct::try_from(raw).map_err(|value| {
                io::Error::new(io::ErrorKind::InvalidData, format!("invalid pic_struct {value}"))
            })?;
            let num_clock_ts = match parsed {
                PicStruct::Frame | PicStruct::TopField | PicStruct::BottomField => 1,
                PicStruct::TopBottom | PicStruct::BottomTop => 2,
                _ => 3,
            };
            pic_struct = Some(parsed);

            let time_offset_length = hrd.map_or(0, |hrd| hrd.time_offset_length);
            for _ in 0..num_clock_ts {
                if bit_reader.read_bit()? {
                    clock_timestamps.push(ClockTimestamp::parse(bit_reader, time_offset_length)?);
                }
            }
        }

        Ok(Self {
            cpb_removal_delay,
            dpb_output_delay,
            pic_struct,
            clock_timestamps,
        })
    }
}
