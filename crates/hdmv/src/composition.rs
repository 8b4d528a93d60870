//! PCS payload: `composition_descriptor()`, `composition_object()`, and the
//! full `PresentationComposition` tree. [`CompositionObject`] is also reused
//! by the ICS effects payload (`interactive_composition.rs`), since both
//! carry the same structure.

use std::io;

use bitstream::{BitReader, BitWriter};

use crate::video_descriptor::VideoDescriptor;

/// `composition_state`, the 2-bit field distinguishing a fresh epoch from a
/// mid-epoch update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositionState {
    /// No definitions changed since the previous composition.
    Normal,
    /// A new acquisition point; palettes/objects may have changed.
    AcquisitionPoint,
    /// The first composition of a new epoch; all prior definitions are discarded.
    EpochStart,
    /// A continuation composition within an epoch that is itself a restart point.
    EpochContinue,
}

impl CompositionState {
    fn from_bits(bits: u64) -> Self {
        match bits {
            0 => Self::Normal,
            1 => Self::AcquisitionPoint,
            2 => Self::EpochStart,
            _ => Self::EpochContinue,
        }
    }

    fn to_bits(self) -> u64 {
        match self {
            Self::Normal => 0,
            Self::AcquisitionPoint => 1,
            Self::EpochStart => 2,
            Self::EpochContinue => 3,
        }
    }

    /// True for [`CompositionState::EpochStart`], the state every epoch's
    /// first DS must open with (invariant 7 in §3.3).
    pub fn is_epoch_start(self) -> bool {
        matches!(self, Self::EpochStart)
    }
}

/// `composition_number` plus `composition_state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositionDescriptor {
    /// `composition_number`, incremented for every DS.
    pub composition_number: u16,
    /// The composition's state.
    pub composition_state: CompositionState,
}

impl CompositionDescriptor {
    pub(crate) fn parse<T: io::Read>(reader: &mut BitReader<T>) -> io::Result<Self> {
        let composition_number = reader.read_bits(16)? as u16;
        let composition_state = CompositionState::from_bits(reader.read_bits(2)?);
        let _reserved = reader.read_bits(6)?;
        Ok(Self { composition_number, composition_state })
    }

    pub(crate) fn build<W: io::Write>(&self, writer: &mut BitWriter<W>) -> io::Result<()> {
        writer.write_bits(self.composition_number as u64, 16)?;
        writer.write_bits(self.composition_state.to_bits(), 2)?;
        writer.write_bits(0, 6)?;
        Ok(())
    }
}

/// An optional crop window applied to a composition object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectCropping {
    /// Crop rectangle's horizontal offset within the object.
    pub cropping_x: u16,
    /// Crop rectangle's vertical offset within the object.
    pub cropping_y: u16,
    /// Crop rectangle width.
    pub cropping_width: u16,
    /// Crop rectangle height.
    pub cropping_height: u16,
}

impl ObjectCropping {
    /// True if this crop rectangle fits entirely within an object of the
    /// given dimensions (invariant/testable property 5 in §8).
    pub fn fits_in_object(&self, object_width: u16, object_height: u16) -> bool {
        self.cropping_x as u32 + self.cropping_width as u32 <= object_width as u32
            && self.cropping_y as u32 + self.cropping_height as u32 <= object_height as u32
    }
}

/// `composition_object()`: one object's placement (and optional crop) within
/// a window, shared by the PCS and by every ICS effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositionObject {
    /// The object this composition object draws from.
    pub object_id_ref: u16,
    /// The window this composition object is placed into.
    pub window_id_ref: u8,
    /// Horizontal placement within the window's containing video plane.
    pub object_horizontal_position: u16,
    /// Vertical placement within the window's containing video plane.
    pub object_vertical_position: u16,
    /// The crop rectangle, if `object_cropped_flag` was set.
    pub cropping: Option<ObjectCropping>,
}

impl CompositionObject {
    /// Parses one `composition_object()`.
    pub fn parse<T: io::Read>(reader: &mut BitReader<T>) -> io::Result<Self> {
        let object_id_ref = reader.read_bits(16)? as u16;
        let window_id_ref = reader.read_bits(8)? as u8;
        let object_cropped_flag = reader.read_bit()?;
        let _reserved = reader.read_bits(7)?;
        let object_horizontal_position = reader.read_bits(16)? as u16;
        let object_vertical_position = reader.read_bits(16)? as u16;
        let cropping = if object_cropped_flag {
            Some(ObjectCropping {
                cropping_x: reader.read_bits(16)? as u16,
                cropping_y: reader.read_bits(16)? as u16,
                cropping_width: reader.read_bits(16)? as u16,
                cropping_height: reader.read_bits(16)? as u16,
            })
        } else {
            None
        };
        Ok(Self { object_id_ref, window_id_ref, object_horizontal_position, object_vertical_position, cropping })
    }

    /// Rebuilds one `composition_object()`.
    pub fn build<W: io::Write>(&self, writer: &mut BitWriter<W>) -> io::Result<()> {
        writer.write_bits(self.object_id_ref as u64, 16)?;
        writer.write_bits(self.window_id_ref as u64, 8)?;
        writer.write_bit(self.cropping.is_some())?;
        writer.write_bits(0, 7)?;
        writer.write_bits(self.object_horizontal_position as u64, 16)?;
        writer.write_bits(self.object_vertical_position as u64, 16)?;
        if let Some(crop) = self.cropping {
            writer.write_bits(crop.cropping_x as u64, 16)?;
            writer.write_bits(crop.cropping_y as u64, 16)?;
            writer.write_bits(crop.cropping_width as u64, 16)?;
            writer.write_bits(crop.cropping_height as u64, 16)?;
        }
        Ok(())
    }

    /// True if this object's footprint (position plus crop size, or position
    /// plus the object's own size when uncropped) fits inside `window`.
    pub fn fits_in_window(&self, window: &crate::window::WindowInfo, object_width: u16, object_height: u16) -> bool {
        let (w, h) = match self.cropping {
            Some(crop) => (crop.cropping_width, crop.cropping_height),
            None => (object_width, object_height),
        };
        self.object_horizontal_position >= window.x
            && self.object_vertical_position >= window.y
            && self.object_horizontal_position as u32 + w as u32 <= window.x as u32 + window.width as u32
            && self.object_vertical_position as u32 + h as u32 <= window.y as u32 + window.height as u32
    }
}

/// A Presentation Composition Segment payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentationComposition {
    /// The PCS's video plane dimensions.
    pub video_descriptor: VideoDescriptor,
    /// `composition_number`/`composition_state`.
    pub composition_descriptor: CompositionDescriptor,
    /// Set when `palette_id_ref` points at a newly updated palette.
    pub palette_update_flag: bool,
    /// The palette this composition references.
    pub palette_id_ref: u8,
    /// The composition's placed objects.
    pub composition_objects: Vec<CompositionObject>,
}

impl PresentationComposition {
    /// Parses a full PCS payload.
    pub fn parse<T: io::Read>(reader: &mut BitReader<T>) -> io::Result<Self> {
        let video_descriptor = VideoDescriptor::parse(reader)?;
        let composition_descriptor = CompositionDescriptor::parse(reader)?;
        let palette_update_flag = reader.read_bit()?;
        let _reserved = reader.read_bits(7)?;
        let palette_id_ref = reader.read_bits(8)? as u8;
        let number_of_composition_objects = reader.read_bits(8)?;
        let mut composition_objects = Vec::with_capacity(number_of_composition_objects as usize);
        for _ in 0..number_of_composition_objects {
            composition_objects.push(CompositionObject::parse(reader)?);
        }
        Ok(Self { video_descriptor, composition_descriptor, palette_update_flag, palette_id_ref, composition_objects })
    }

    /// Rebuilds the PCS payload.
    pub fn build<W: io::Write>(&self, writer: &mut BitWriter<W>) -> io::Result<()> {
        self.video_descriptor.build(writer)?;
        self.composition_descriptor.build(writer)?;
        writer.write_bit(self.palette_update_flag)?;
        writer.write_bits(0, 7)?;
        writer.write_bits(self.palette_id_ref as u64, 8)?;
        writer.write_bits(self.composition_objects.len() as u64, 8)?;
        for object in &self.composition_objects {
            object.build(writer)?;
        }
        Ok(())
    }
}
