use std::io;

use bitstream::{BitReader, BitWriter};

use crate::NALUnitType;

/// `access_unit_delimiter_rbsp()`.
/// ISO/IEC-14496-10-2022 - 7.3.2.4
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessUnitDelimiter {
    /// `nal_ref_idc`, always 0 for this NAL unit type but carried through for
    /// round-tripping the 1-byte NAL header.
    pub nal_ref_idc: u8,
    /// `primary_pic_type`, 3 bits, restricts which slice types may occur in
    /// the following primary coded picture (Table 7-5).
    pub primary_pic_type: u8,
}

impl AccessUnitDelimiter {
    /// Parses an `access_unit_delimiter_rbsp()` NAL unit, including its 1-byte header.
    pub fn parse<T: io::Read>(bit_reader: &mut BitReader<T>) -> io::Result<Self> {
        let forbidden_zero_bit = bit_reader.read_bit()?;
        if forbidden_zero_bit {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "forbidden_zero_bit must be 0"));
        }
        let nal_ref_idc = bit_reader.read_bits(2)? as u8;
        let nal_unit_type = NALUnitType::try_from(bit_reader.read_bits(5)? as u8)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        if nal_unit_type != NALUnitType::AccessUnitDelimiter {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "expected an AUD NAL unit"));
        }

        let primary_pic_type = bit_reader.read_bits(3)? as u8;
        if primary_pic_type > 7 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "primary_pic_type is reserved"));
        }

        Ok(Self { nal_ref_idc, primary_pic_type })
    }

    /// Builds an `access_unit_delimiter_rbsp()` NAL unit, including its 1-byte header.
    pub fn build<W: io::Write>(&self, bit_writer: &mut BitWriter<W>) -> io::Result<()> {
        bit_writer.write_bit(false)?; // forbidden_zero_bit
        bit_writer.write_bits(self.nal_ref_idc as u64, 2)?;
        bit_writer.write_bits(NALUnitType::AccessUnitDelimiter as u64, 5)?;
        bit_writer.write_bits(self.primary_pic_type as u64, 3)?;
        bit_writer.write_bit(true)?; // rbsp_stop_one_bit
        bit_writer.align()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn roundtrips() {
        let aud = AccessUnitDelimiter { nal_ref_idc: 0, primary_pic_type: 2 };
        let mut buf = Vec::new();
        aud.build(&mut BitWriter::new(&mut buf)).unwrap();

        let mut bit_reader = BitReader::new(Cursor::new(buf));
        assert_eq!(AccessUnitDelimiter::parse(&mut bit_reader).unwrap(), aud);
    }

    #[test]
    fn rejects_reserved_primary_pic_type() {
        // This can't actually happen with a 3-bit field (max 7), so this test
        // instead documents that 7 itself is accepted as the boundary value.
        let aud = AccessUnitDelimiter { nal_ref_idc: 0, primary_pic_type: 7 };
        let mut buf = Vec::new();
        aud.build(&mut BitWriter::new(&mut buf)).unwrap();
        let mut bit_reader = BitReader::new(Cursor::new(buf));
        assert!(AccessUnitDelimiter::parse(&mut bit_reader).is_ok());
    }
}
