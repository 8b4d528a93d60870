//! `video_descriptor()`: the video-plane dimensions every PCS and ICS opens with.

use std::io;

use bitstream::{BitReader, BitWriter};

/// `video_width`, `video_height`, `frame_rate_id` as carried by every PCS and
/// ICS payload's leading `video_descriptor()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoDescriptor {
    /// Video plane width in pixels.
    pub video_width: u16,
    /// Video plane height in pixels.
    pub video_height: u16,
    /// `frame_rate_id`, a 4-bit code; the low nibble of byte 5.
    pub frame_rate_id: u8,
}

impl VideoDescriptor {
    /// Reads `video_descriptor()`: `width(16)`, `height(16)`, `frame_rate_id(4)`, `reserved(4)`.
    pub fn parse<T: io::Read>(reader: &mut BitReader<T>) -> io::Result<Self> {
        let video_width = reader.read_bits(16)? as u16;
        let video_height = reader.read_bits(16)? as u16;
        let frame_rate_id = reader.read_bits(4)? as u8;
        let _reserved = reader.read_bits(4)?;
        Ok(Self { video_width, video_height, frame_rate_id })
    }

    /// Writes `video_descriptor()` back out, with `reserved` set to zero.
    pub fn build<W: io::Write>(&self, writer: &mut BitWriter<W>) -> io::Result<()> {
        writer.write_bits(self.video_width as u64, 16)?;
        writer.write_bits(self.video_height as u64, 16)?;
        writer.write_bits(self.frame_rate_id as u64, 4)?;
        writer.write_bits(0, 4)?;
        Ok(())
    }

    /// Pixel area, used by the Plane Clear Time formula in §4.4.6.
    pub fn area(&self) -> u64 {
        self.video_width as u64 * self.video_height as u64
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn round_trips() {
        let vd = VideoDescriptor { video_width: 1920, video_height: 1080, frame_rate_id: 0x7 };
        let mut writer = BitWriter::new(Vec::new());
        vd.build(&mut writer).unwrap();
        let bytes = writer.finish().unwrap();

        let mut reader = BitReader::new(Cursor::new(bytes));
        let parsed = VideoDescriptor::parse(&mut reader).unwrap();
        assert_eq!(parsed, vd);
    }
}
