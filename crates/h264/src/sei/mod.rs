//! `sei_rbsp()` parsing (ISO/IEC-14496-10-2022 clause 7.3.2.3).
//!
//! Only the four payload types this checker cares about are parsed into
//! structured form; every other `payloadType` is byte-skipped and surfaced
//! as [`SeiMessage::Unknown`].

mod buffering_period;
mod picture_timing;
mod recovery_point;
mod user_data_unregistered;

pub use buffering_period::{BufferingPeriod, CpbRemovalDelay};
pub use picture_timing::{ClockTimestamp, PictureTiming};
pub use recovery_point::RecoveryPoint;
pub use user_data_unregistered::{MAX_USER_DATA_PAYLOAD, UserDataUnregistered};

use std::io;

use bitstream::BitReader;

use crate::rbsp::MoreRbspData;
use crate::sps::Sps;

const SEI_TYPE_BUFFERING_PERIOD: u64 = 0;
const SEI_TYPE_PIC_TIMING: u64 = 1;
const SEI_TYPE_RECOVERY_POINT: u64 = 6;
const SEI_TYPE_USER_DATA_UNREGISTERED: u64 = 5;

/// One decoded `sei_message()`.
#[derive(Debug, Clone, PartialEq)]
pub enum SeiMessage {
    /// payloadType 0.
    BufferingPeriod(BufferingPeriod),
    /// payloadType 1.
    PictureTiming(PictureTiming),
    /// payloadType 5.
    UserDataUnregistered(UserDataUnregistered),
    /// payloadType 6.
    RecoveryPoint(RecoveryPoint),
    /// Any other `payloadType`; the payload bytes are skipped without interpretation.
    Unknown {
        /// The unrecognized `payloadType`.
        payload_type: u64,
        /// The payload's byte length, as declared by the message header.
        payload_size: u64,
    },
}

/// Reads the `ff_byte` run + terminating byte used for both `payloadType` and
/// `payloadSize` in `sei_message()` (7.3.2.3.1).
fn read_sei_size<T: io::Read>(bit_reader: &mut BitReader<T>) -> io::Result<u64> {
    let mut value = 0u64;
    loop {
        let byte = bit_reader.read_bits(8)?;
        value += byte;
        if byte != 0xFF {
            break;
        }
    }
    Ok(value)
}

/// Parses `sei_rbsp()`: a sequence of `sei_message()`s followed by
/// `rbsp_trailing_bits()`.
///
/// `active_sps` supplies the HRD field widths and `pic_struct_present_flag`
/// needed to parse buffering-period and picture-timing payloads; without it
/// those two payload types degrade to [`SeiMessage::Unknown`] since their
/// field widths cannot be determined.
pub fn parse_sei_rbsp<T: io::Read + io::Seek>(
    bit_reader: &mut BitReader<T>,
    active_sps: Option<&Sps>,
) -> io::Result<Vec<SeiMessage>> {
    let mut messages = Vec::new();
    while bit_reader.more_rbsp_data()? {
        let payload_type = read_sei_size(bit_reader)?;
        let payload_size = read_sei_size(bit_reader)?;

        let message = match payload_type {
            SEI_TYPE_BUFFERING_PERIOD if active_sps.is_some() => {
                let sps = active_sps.unwrap();
                SeiMessage::BufferingPeriod(BufferingPeriod::parse(
                    bit_reader,
                    sps.seq_parameter_set_id,
                    sps.nal_hrd_parameters.as_ref(),
                    sps.vcl_hrd_parameters.as_ref(),
                )?)
            }
            SEI_TYPE_PIC_TIMING if active_sps.is_some() => {
                let sps = active_sps.unwrap();
                let hrd = sps.nal_hrd_parameters.as_ref().or(sps.vcl_hrd_parameters.as_ref());
                SeiMessage::PictureTiming(PictureTiming::parse(bit_reader, hrd, sps.pic_struct_present_flag)?)
            }
            SEI_TYPE_RECOVERY_POINT => SeiMessage::RecoveryPoint(RecoveryPoint::parse(bit_reader)?),
            SEI_TYPE_USER_DATA_UNREGISTERED => {
                SeiMessage::UserDataUnregistered(UserDataUnregistered::parse(bit_reader, payload_size as usize)?)
            }
            _ => {
                for _ in 0..payload_size {
                    bit_reader.read_bits(8)?;
                }
                SeiMessage::Unknown { payload_type, payload_size }
            }
        };
        messages.push(message);
    }
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn skips_unknown_payload_type() {
        // payloadType 42, payloadSize 3, then 3 arbitrary bytes, then stop bit.
        let data = vec![42, 3, 0xAA, 0xBB, 0xCC, 0b1000_0000];
        let mut bit_reader = BitReader::new(Cursor::new(data));
        let messages = parse_sei_rbsp(&mut bit_reader, None).unwrap();
        assert_eq!(messages, vec![SeiMessage::Unknown { payload_type: 42, payload_size: 3 }]);
    }

    #[test]
    fn parses_recovery_point() {
        // payloadType 6, payloadSize 1.
        // recovery_frame_cnt=ue(0)->'1', exact_match_flag=0, broken_link_flag=0,
        // changing_slice_group_idc=00 -> bits: 1 0 0 00 then pad to byte: 1000 0000.
        let data = vec![6, 1, 0b1000_0000, 0b1000_0000];
        let mut bit_reader = BitReader::new(Cursor::new(data));
        let messages = parse_sei_rbsp(&mut bit_reader, None).unwrap();
        assert_eq!(
            messages,
            vec![SeiMessage::RecoveryPoint(RecoveryPoint {
                recovery_frame_cnt: 0,
                exact_match_flag: false,
                broken_link_flag: false,
                changing_slice_group_idc: 0,
            })]
        );
    }
}
