//! PDS payload: `palette()`, a YCrCbT table of up to 256 entries.

use std::io;

use bitstream::BitWriter;

/// One `palette_entry()`: a YCrCb colour plus alpha (`T`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteEntry {
    /// `palette_entry_id`.
    pub id: u8,
    /// Luma.
    pub y: u8,
    /// Cr (red-difference) chroma.
    pub cr: u8,
    /// Cb (blue-difference) chroma.
    pub cb: u8,
    /// Alpha (transparency).
    pub t: u8,
}

/// A Palette Definition Segment payload: `palette_id`, `palette_version_number`,
/// and up to 256 [`PaletteEntry`] records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteDefinition {
    /// `palette_id`.
    pub palette_id: u8,
    /// `palette_version_number`.
    pub palette_version_number: u8,
    /// The palette's entries, in the order they appeared.
    pub entries: Vec<PaletteEntry>,
}

impl PaletteDefinition {
    /// Parses a PDS payload: a two-byte header followed by 5-byte entries
    /// until the payload is exhausted.
    pub fn parse(data: &[u8]) -> io::Result<Self> {
        if data.len() < 2 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "PDS payload shorter than its header"));
        }
        let palette_id = data[0];
        let palette_version_number = data[1];
        let mut entries = Vec::new();
        for chunk in data[2..].chunks(5) {
            if chunk.len() < 5 {
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "truncated palette_entry()"));
            }
            entries.push(PaletteEntry { id: chunk[0], y: chunk[1], cr: chunk[2], cb: chunk[3], t: chunk[4] });
        }
        Ok(Self { palette_id, palette_version_number, entries })
    }

    /// Rebuilds the PDS payload bytes.
    pub fn build<W: io::Write>(&self, writer: &mut BitWriter<W>) -> io::Result<()> {
        writer.write_bits(self.palette_id as u64, 8)?;
        writer.write_bits(self.palette_version_number as u64, 8)?;
        for entry in &self.entries {
            writer.write_bits(entry.id as u64, 8)?;
            writer.write_bits(entry.y as u64, 8)?;
            writer.write_bits(entry.cr as u64, 8)?;
            writer.write_bits(entry.cb as u64, 8)?;
            writer.write_bits(entry.t as u64, 8)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_entries() {
        let data = [0x01, 0x02, /* entry */ 0x00, 0x10, 0x20, 0x30, 0xFF];
        let pds = PaletteDefinition::parse(&data).unwrap();
        assert_eq!(pds.palette_id, 1);
        assert_eq!(pds.palette_version_number, 2);
        assert_eq!(pds.entries, vec![PaletteEntry { id: 0, y: 0x10, cr: 0x20, cb: 0x30, t: 0xFF }]);
    }

    #[test]
    fn rejects_truncated_entry() {
        let data = [0x01, 0x02, 0x00, 0x10];
        assert!(PaletteDefinition::parse(&data).is_err());
    }
}
