use std::io;

use bitstream::BitReader;

/// Extends [`BitReader`] with `more_rbsp_data()` (clause 7.2), used to decide
/// whether an optional RBSP tail (a PPS extension, a slice header's
/// `dec_ref_pic_marking`, ...) is present before the `rbsp_trailing_bits()`.
///
/// Requires a seekable reader so the remaining bytes can be peeked and the
/// position restored; every NAL payload in this crate is parsed from an
/// in-memory `Bytes` slice via `io::Cursor`, which satisfies this.
pub trait MoreRbspData {
    /// True iff any bit other than the `rbsp_trailing_bits()` pattern (a
    /// single `1` stop bit followed only by `0` padding to the next byte
    /// boundary, with no further bytes) remains.
    fn more_rbsp_data(&mut self) -> io::Result<bool>;
}

impl<T: io::Read + io::Seek> MoreRbspData for BitReader<T> {
    fn more_rbsp_data(&mut self) -> io::Result<bool> {
        // Deliberately avoids BitReader's generic io::Read impl: when
        // unaligned, that impl reads bit-by-bit to fill the caller's buffer
        // and has no way to report a short read, so it surfaces a spurious
        // UnexpectedEof on any RBSP tail shorter than the probe buffer
        // read_to_end uses. Scanning bit-by-bit against a seek-derived end
        // position sidesteps that entirely.
        let start_bits = self.bit_stream_position()?;
        let total_bytes = io::Seek::seek(self, io::SeekFrom::End(0))?;
        let remaining_bits = (total_bytes * 8).saturating_sub(start_bits) as i64;
        self.seek_bits(-remaining_bits)?;

        let mut last_one_bit_offset = None;
        for offset in 0..remaining_bits {
            if self.read_bit()? {
                last_one_bit_offset = Some(offset);
            }
        }
        self.seek_bits(-remaining_bits)?;

        match last_one_bit_offset {
            None => Ok(false),
            Some(0) => Ok(false),
            Some(_) => Ok(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn no_more_data_when_only_stop_bit_remains() {
        let mut reader = BitReader::new(Cursor::new(vec![0b1000_0000u8]));
        assert!(!reader.more_rbsp_data().unwrap());
    }

    #[test]
    fn more_data_when_payload_precedes_stop_bit() {
        let mut reader = BitReader::new(Cursor::new(vec![0xAB, 0b1000_0000]));
        assert!(reader.more_rbsp_data().unwrap());
        // Position must be restored so a subsequent read sees the same byte.
        assert_eq!(reader.read_bits(8).unwrap(), 0xAB);
    }

    #[test]
    fn no_more_data_after_consuming_up_to_stop_bit() {
        let mut reader = BitReader::new(Cursor::new(vec![0xAB, 0b1000_0000]));
        let _ = reader.read_bits(8).unwrap();
        assert!(!reader.more_rbsp_data().unwrap());
    }

    #[test]
    fn unaligned_call_does_not_error_and_restores_position() {
        // A non-byte-aligned read, matching how a real PPS/slice-header
        // parser lands mid-byte before probing for an optional tail.
        let mut reader = BitReader::new(Cursor::new(vec![0xAB, 0b1000_0000]));
        let _ = reader.read_bits(3).unwrap();
        assert!(reader.more_rbsp_data().unwrap());
        assert_eq!(reader.read_bits(5).unwrap(), 0b01011);
    }
}
