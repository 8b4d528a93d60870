//! WDS payload: `window()`, the list of rectangles composition objects are
//! placed and cropped into.

use std::io;

use bitstream::{BitReader, BitWriter};

/// One declared window: `{id, x, y, width, height}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowInfo {
    /// `window_id`, unique within the Window Definition Segment.
    pub id: u8,
    /// Horizontal offset of the window's top-left corner, in the video plane.
    pub x: u16,
    /// Vertical offset of the window's top-left corner, in the video plane.
    pub y: u16,
    /// Window width.
    pub width: u16,
    /// Window height.
    pub height: u16,
}

impl WindowInfo {
    fn parse<T: io::Read>(reader: &mut BitReader<T>) -> io::Result<Self> {
        let id = reader.read_bits(8)? as u8;
        let x = reader.read_bits(16)? as u16;
        let y = reader.read_bits(16)? as u16;
        let width = reader.read_bits(16)? as u16;
        let height = reader.read_bits(16)? as u16;
        Ok(Self { id, x, y, width, height })
    }

    fn build<W: io::Write>(&self, writer: &mut BitWriter<W>) -> io::Result<()> {
        writer.write_bits(self.id as u64, 8)?;
        writer.write_bits(self.x as u64, 16)?;
        writer.write_bits(self.y as u64, 16)?;
        writer.write_bits(self.width as u64, 16)?;
        writer.write_bits(self.height as u64, 16)?;
        Ok(())
    }

    /// True if this window lies entirely within a `video_width`×`video_height` plane.
    pub fn fits_in_plane(&self, video_width: u16, video_height: u16) -> bool {
        self.x as u32 + self.width as u32 <= video_width as u32 && self.y as u32 + self.height as u32 <= video_height as u32
    }
}

/// A Window Definition Segment payload: `num_windows` followed by that many
/// [`WindowInfo`] records.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WindowDefinition {
    /// The declared windows, in stream order.
    pub windows: Vec<WindowInfo>,
}

impl WindowDefinition {
    /// Parses `{num_windows(8), window()*num_windows}`.
    pub fn parse<T: io::Read>(reader: &mut BitReader<T>) -> io::Result<Self> {
        let num_windows = reader.read_bits(8)?;
        let mut windows = Vec::with_capacity(num_windows as usize);
        for _ in 0..num_windows {
            windows.push(WindowInfo::parse(reader)?);
        }
        Ok(Self { windows })
    }

    /// Rebuilds the WDS payload.
    pub fn build<W: io::Write>(&self, writer: &mut BitWriter<W>) -> io::Result<()> {
        writer.write_bits(self.windows.len() as u64, 8)?;
        for window in &self.windows {
            window.build(writer)?;
        }
        Ok(())
    }

    /// Looks up a window by id.
    pub fn get(&self, id: u8) -> Option<&WindowInfo> {
        self.windows.iter().find(|w| w.id == id)
    }

    /// True if every declared `window_id` is unique.
    pub fn has_unique_ids(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        self.windows.iter().all(|w| seen.insert(w.id))
    }
}
