/// The `slice_type` field of a slice header (clause 7.4.3, Table 7-6).
///
/// Values 5 through 9 carry the same meaning as 0 through 4 but additionally
/// assert that every slice in the containing picture shares this type; both
/// forms are kept distinct here rather than folded together, since the
/// stronger assertion is itself a piece of information a checker can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceType {
    /// 0: P.
    P,
    /// 1: B.
    B,
    /// 2: I.
    I,
    /// 3: SP.
    Sp,
    /// 4: SI.
    Si,
    /// 5: P, all slices in picture are P.
    PAll,
    /// 6: B, all slices in picture are B.
    BAll,
    /// 7: I, all slices in picture are I.
    IAll,
    /// 8: SP, all slices in picture are SP.
    SpAll,
    /// 9: SI, all slices in picture are SI.
    SiAll,
}

impl TryFrom<u64> for SliceType {
    type Error = u64;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::P),
            1 => Ok(Self::B),
            2 => Ok(Self::I),
            3 => Ok(Self::Sp),
            4 => Ok(Self::Si),
            5 => Ok(Self::PAll),
            6 => Ok(Self::BAll),
            7 => Ok(Self::IAll),
            8 => Ok(Self::SpAll),
            9 => Ok(Self::SiAll),
            other => Err(other),
        }
    }
}

impl SliceType {
    /// Collapses the "all slices in picture" variants onto their base type,
    /// for comparisons that don't care about the stronger assertion.
    pub fn base(self) -> Self {
        match self {
            Self::P | Self::PAll => Self::P,
            Self::B | Self::BAll => Self::B,
            Self::I | Self::IAll => Self::I,
            Self::Sp | Self::SpAll => Self::Sp,
            Self::Si | Self::SiAll => Self::Si,
        }
    }

    /// True for `I` and `SI` slices, which never reference other pictures.
    pub fn is_intra(self) -> bool {
        matches!(self.base(), Self::I | Self::Si)
    }
}
