/// The `pic_struct` field of an SEI picture-timing message (Table D-1).
///
/// Describes how the current picture should be interpreted as one or more
/// fields for display, which in turn drives the output-order DTS increment
/// between consecutive pictures (frame doubling/tripling and the two
/// field-pairing variants advance the clock by more than one frame duration).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PicStruct {
    /// 0: progressive frame.
    Frame,
    /// 1: top field.
    TopField,
    /// 2: bottom field.
    BottomField,
    /// 3: top field, bottom field, in that order.
    TopBottom,
    /// 4: bottom field, top field, in that order.
    BottomTop,
    /// 5: top field, bottom field, top field repeated, in that order.
    TopBottomTop,
    /// 6: bottom field, top field, bottom field repeated, in that order.
    BottomTopBottom,
    /// 7: frame doubling.
    FrameDoubling,
    /// 8: frame tripling.
    FrameTripling,
}

impl TryFrom<u8> for PicStruct {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Frame),
            1 => Ok(Self::TopField),
            2 => Ok(Self::BottomField),
            3 => Ok(Self::TopBottom),
            4 => Ok(Self::BottomTop),
            5 => Ok(Self::TopBottomTop),
            6 => Ok(Self::BottomTopBottom),
            7 => Ok(Self::FrameDoubling),
            8 => Ok(Self::FrameTripling),
            other => Err(other),
        }
    }
}

impl PicStruct {
    /// The number of field durations this picture occupies in output order,
    /// expressed as a multiple of a half frame duration (so `Frame` is 2,
    /// a single field is 1, and the repeated-field variants are 3).
    pub fn half_frame_durations(self) -> u32 {
        match self {
            Self::TopField | Self::BottomField => 1,
            Self::Frame | Self::TopBottom | Self::BottomTop => 2,
            Self::TopBottomTop | Self::BottomTopBottom => 3,
            Self::FrameDoubling => 4,
            Self::FrameTripling => 6,
        }
    }
}
