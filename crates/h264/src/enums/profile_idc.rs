/// The `profile_idc` value carried by an SPS, interpreted against the published
/// H.264 profile codes (Rec. ITU-T H.264 Annex A).
///
/// Several `profile_idc` values are shared by more than one named profile; telling
/// them apart additionally requires the SPS's constraint flags, so this type is
/// constructed with [`ProfileIdc::from_idc`] alone (the raw numeric profile) and
/// refined into a human-readable label via [`ProfileIdc::describe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileIdc {
    /// 66
    Baseline,
    /// 77
    Main,
    /// 88
    Extended,
    /// 100
    High,
    /// 110
    High10,
    /// 122
    High422,
    /// 244
    High444Predictive,
    /// 44
    Cavlc444Intra,
    /// 83
    ScalableBaseline,
    /// 86
    ScalableHigh,
    /// 118
    MultiviewHigh,
    /// 128
    StereoHigh,
    /// 134
    MfcHigh,
    /// 135
    MfcDepthHigh,
    /// 138
    MultiviewDepthHigh,
    /// 139
    EnhancedMultiviewDepthHigh,
    /// Any value not among the above.
    Unknown(u8),
}

impl ProfileIdc {
    /// Maps a raw `profile_idc` byte to its named profile.
    pub fn from_idc(idc: u8) -> Self {
        match idc {
            66 => Self::Baseline,
            77 => Self::Main,
            88 => Self::Extended,
            100 => Self::High,
            110 => Self::High10,
            122 => Self::High422,
            244 => Self::High444Predictive,
            44 => Self::Cavlc444Intra,
            83 => Self::ScalableBaseline,
            86 => Self::ScalableHigh,
            118 => Self::MultiviewHigh,
            128 => Self::StereoHigh,
            134 => Self::MfcHigh,
            135 => Self::MfcDepthHigh,
            138 => Self::MultiviewDepthHigh,
            139 => Self::EnhancedMultiviewDepthHigh,
            other => Self::Unknown(other),
        }
    }

    /// The raw `profile_idc` byte.
    pub fn idc(self) -> u8 {
        match self {
            Self::Baseline => 66,
            Self::Main => 77,
            Self::Extended => 88,
            Self::High => 100,
            Self::High10 => 110,
            Self::High422 => 122,
            Self::High444Predictive => 244,
            Self::Cavlc444Intra => 44,
            Self::ScalableBaseline => 83,
            Self::ScalableHigh => 86,
            Self::MultiviewHigh => 118,
            Self::StereoHigh => 128,
            Self::MfcHigh => 134,
            Self::MfcDepthHigh => 135,
            Self::MultiviewDepthHigh => 138,
            Self::EnhancedMultiviewDepthHigh => 139,
            Self::Unknown(v) => v,
        }
    }

    /// A human-readable profile label that takes the constraint-set flags into
    /// account where the base profile alone is ambiguous, matching the naming
    /// used by the reference implementation's `H264ProfileIdcValueStr`.
    pub fn describe(self, constraint_set1: bool, constraint_set4: bool) -> &'static str {
        match self {
            Self::Baseline if constraint_set1 => "Constrained Baseline",
            Self::Baseline => "Baseline",
            Self::Main => "Main",
            Self::Extended => "Extended",
            Self::High if constraint_set4 && constraint_set1 => "Constrained High",
            Self::High if constraint_set4 => "Progressive High",
            Self::High => "High",
            Self::High10 if constraint_set4 => "Progressive High 10",
            Self::High10 => "High 10",
            Self::High422 => "High 4:2:2",
            Self::High444Predictive => "High 4:4:4 Predictive",
            Self::Cavlc444Intra => "CAVLC 4:4:4 Intra",
            Self::ScalableBaseline => "Scalable Baseline",
            Self::ScalableHigh => "Scalable High",
            Self::MultiviewHigh => "Multiview High",
            Self::StereoHigh => "Stereo High",
            Self::MfcHigh => "MFC High",
            Self::MfcDepthHigh => "MFC Depth High",
            Self::MultiviewDepthHigh => "Multiview Depth High",
            Self::EnhancedMultiviewDepthHigh => "Enhanced Multiview Depth High",
            Self::Unknown(_) => "Unknown",
        }
    }

    /// Whether this profile is accepted by the Blu-ray profile (Main, or High
    /// with `constraint_set4_flag == 0`, i.e. not the "Progressive/Constrained
    /// High" variants).
    pub fn is_bd_allowed(self, constraint_set4: bool) -> bool {
        matches!(self, Self::Main) || (matches!(self, Self::High) && !constraint_set4)
    }
}
