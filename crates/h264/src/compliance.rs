//! Static Annex A / Blu-ray profile tables and the predicates that check a
//! parsed SPS/PPS/slice header against them.
//!
//! Grounded on Rec. ITU-T H.264 Annex A (Tables A-1, A-2, A-4); `profile_idc`
//! itself is interpreted via [`crate::ProfileIdc::is_bd_allowed`].

use diagnostics::{Diagnostic, Severity, Verdict};

use crate::{AspectRatioIdc, Pps, ProfileIdc, SliceGroupMapType, Sps};

/// One row of Rec. ITU-T H.264 Table A-1.
#[derive(Debug, Clone, Copy)]
pub struct LevelLimits {
    /// `level_idc`, ten times the nominal level number (30 for level 3.0).
    /// Level "1b" shares `level_idc == 11` with level 1.1 and is told apart
    /// only by `constraint_set3_flag` at the call site.
    pub level_idc: u8,
    /// `constraint_set3_flag` required for this row to mean level "1b" rather
    /// than level 1.1. `None` for every other row, where the flag is ignored.
    pub is_level_1b: bool,
    /// MaxMBPS, macroblocks/sec.
    pub max_mbps: u32,
    /// MaxFS, macroblocks.
    pub max_fs: u32,
    /// MaxDpbMbs, macroblocks.
    pub max_dpb_mbs: u32,
    /// MaxBR, in units of 1000 bits/sec before the profile factor is applied.
    pub max_br: u32,
    /// MaxCPB, in units of 1000 bits before the profile factor is applied.
    pub max_cpb: u32,
    /// MaxVmvR, quarter luma samples.
    pub max_vmv_r: u32,
    /// MinCR.
    pub min_cr: u8,
    /// MaxMvsPer2Mb, informational/diagnostic only (`None` below level 3).
    pub max_mvs_per_2mb: Option<u16>,
}

/// Table A-1, every level the standard defines. Blu-ray only ever uses
/// `3.0..=4.1`; the rest are kept so `parse_sps`'s raw `level_idc` validity
/// check ("one of the 20 known values") has a complete table to check against.
pub const LEVEL_TABLE: &[LevelLimits] = &[
    LevelLimits { level_idc: 10, is_level_1b: false, max_mbps: 1485, max_fs: 99, max_dpb_mbs: 396, max_br: 64, max_cpb: 175, max_vmv_r: 64, min_cr: 2, max_mvs_per_2mb: None },
    LevelLimits { level_idc: 11, is_level_1b: true, max_mbps: 1485, max_fs: 99, max_dpb_mbs: 396, max_br: 128, max_cpb: 350, max_vmv_r: 64, min_cr: 2, max_mvs_per_2mb: None },
    LevelLimits { level_idc: 11, is_level_1b: false, max_mbps: 3000, max_fs: 396, max_dpb_mbs: 900, max_br: 192, max_cpb: 500, max_vmv_r: 128, min_cr: 2, max_mvs_per_2mb: None },
    LevelLimits { level_idc: 12, is_level_1b: false, max_mbps: 6000, max_fs: 396, max_dpb_mbs: 2376, max_br: 384, max_cpb: 1000, max_vmv_r: 128, min_cr: 2, max_mvs_per_2mb: None },
    LevelLimits { level_idc: 13, is_level_1b: false, max_mbps: 11880, max_fs: 396, max_dpb_mbs: 2376, max_br: 768, max_cpb: 2000, max_vmv_r: 128, min_cr: 2, max_mvs_per_2mb: None },
    LevelLimits { level_idc: 20, is_level_1b: false, max_mbps: 11880, max_fs: 396, max_dpb_mbs: 2376, max_br: 2000, max_cpb: 2000, max_vmv_r: 128, min_cr: 2, max_mvs_per_2mb: None },
    LevelLimits { level_idc: 21, is_level_1b: false, max_mbps: 19800, max_fs: 792, max_dpb_mbs: 4752, max_br: 4000, max_cpb: 4000, max_vmv_r: 256, min_cr: 2, max_mvs_per_2mb: None },
    LevelLimits { level_idc: 22, is_level_1b: false, max_mbps: 20250, max_fs: 1620, max_dpb_mbs: 8100, max_br: 4000, max_cpb: 4000, max_vmv_r: 256, min_cr: 2, max_mvs_per_2mb: None },
    LevelLimits { level_idc: 30, is_level_1b: false, max_mbps: 40500, max_fs: 1620, max_dpb_mbs: 8100, max_br: 10000, max_cpb: 10000, max_vmv_r: 256, min_cr: 2, max_mvs_per_2mb: Some(32) },
    LevelLimits { level_idc: 31, is_level_1b: false, max_mbps: 108000, max_fs: 3600, max_dpb_mbs: 18000, max_br: 14000, max_cpb: 14000, max_vmv_r: 512, min_cr: 4, max_mvs_per_2mb: Some(16) },
    LevelLimits { level_idc: 32, is_level_1b: false, max_mbps: 216000, max_fs: 5120, max_dpb_mbs: 20480, max_br: 20000, max_cpb: 20000, max_vmv_r: 512, min_cr: 4, max_mvs_per_2mb: Some(16) },
    LevelLimits { level_idc: 40, is_level_1b: false, max_mbps: 245760, max_fs: 8192, max_dpb_mbs: 32768, max_br: 20000, max_cpb: 25000, max_vmv_r: 512, min_cr: 4, max_mvs_per_2mb: Some(16) },
    LevelLimits { level_idc: 41, is_level_1b: false, max_mbps: 245760, max_fs: 8192, max_dpb_mbs: 32768, max_br: 50000, max_cpb: 62500, max_vmv_r: 512, min_cr: 2, max_mvs_per_2mb: Some(16) },
    LevelLimits { level_idc: 42, is_level_1b: false, max_mbps: 522240, max_fs: 8704, max_dpb_mbs: 34816, max_br: 50000, max_cpb: 62500, max_vmv_r: 512, min_cr: 2, max_mvs_per_2mb: Some(16) },
    LevelLimits { level_idc: 50, is_level_1b: false, max_mbps: 589824, max_fs: 22080, max_dpb_mbs: 110400, max_br: 135000, max_cpb: 135000, max_vmv_r: 512, min_cr: 2, max_mvs_per_2mb: Some(16) },
    LevelLimits { level_idc: 51, is_level_1b: false, max_mbps: 983040, max_fs: 36864, max_dpb_mbs: 184320, max_br: 240000, max_cpb: 240000, max_vmv_r: 512, min_cr: 2, max_mvs_per_2mb: Some(16) },
    LevelLimits { level_idc: 52, is_level_1b: false, max_mbps: 2073600, max_fs: 36864, max_dpb_mbs: 184320, max_br: 240000, max_cpb: 240000, max_vmv_r: 512, min_cr: 2, max_mvs_per_2mb: Some(16) },
    LevelLimits { level_idc: 60, is_level_1b: false, max_mbps: 4177920, max_fs: 139264, max_dpb_mbs: 696320, max_br: 240000, max_cpb: 240000, max_vmv_r: 8192, min_cr: 2, max_mvs_per_2mb: Some(16) },
    LevelLimits { level_idc: 61, is_level_1b: false, max_mbps: 8355840, max_fs: 139264, max_dpb_mbs: 696320, max_br: 480000, max_cpb: 480000, max_vmv_r: 8192, min_cr: 2, max_mvs_per_2mb: Some(16) },
    LevelLimits { level_idc: 62, is_level_1b: false, max_mbps: 16711680, max_fs: 139264, max_dpb_mbs: 696320, max_br: 800000, max_cpb: 800000, max_vmv_r: 8192, min_cr: 2, max_mvs_per_2mb: Some(16) },
];

/// Looks up `level_idc`'s row, disambiguating level "1b" from 1.1 via
/// `constraint_set3_flag` as both share `level_idc == 11`.
pub fn level_limits(level_idc: u8, constraint_set3_flag: bool) -> Option<&'static LevelLimits> {
    LEVEL_TABLE.iter().find(|row| row.level_idc == level_idc && row.is_level_1b == (level_idc == 11 && constraint_set3_flag))
}

/// The lowest and highest `level_idc` Blu-ray accepts.
pub const BD_MIN_LEVEL_IDC: u8 = 30;
/// The lowest and highest `level_idc` Blu-ray accepts.
pub const BD_MAX_LEVEL_IDC: u8 = 41;

/// Table A-2's `cpbBrVclFactor`/`cpbBrNalFactor`, keyed by profile.
pub fn cpb_br_factors(profile: ProfileIdc) -> (u32, u32) {
    match profile {
        ProfileIdc::High10 => (3000, 3600),
        ProfileIdc::High422 | ProfileIdc::High444Predictive | ProfileIdc::Cavlc444Intra => (4000, 4800),
        ProfileIdc::High => (1250, 1500),
        _ => (1000, 1200),
    }
}

/// Table A-4's minimum slice count, used only as an informational
/// cross-check and never independently enforced.
pub fn min_slice_rate(level_idc: u8) -> Option<u32> {
    match level_idc {
        10 | 11 => Some(1),
        12 | 13 | 20 => Some(1),
        21 | 22 | 30 => Some(1),
        31 => Some(2),
        32 => Some(3),
        40 | 41 | 42 => Some(4),
        50 => Some(10),
        51 | 52 => Some(10),
        _ => None,
    }
}

/// `MaxDpbFrames = min(floor(MaxDpbMbs / (PicWidthInMbs * FrameHeightInMbs)), 16)`.
pub fn max_dpb_frames(max_dpb_mbs: u32, pic_width_in_mbs: u64, frame_height_in_mbs: u64) -> u64 {
    let pic_size = (pic_width_in_mbs * frame_height_in_mbs).max(1);
    ((max_dpb_mbs as u64) / pic_size).min(16)
}

/// The `(width, height) -> allowed aspect_ratio_idc` table from the BD-profile
/// SAR matrix.
fn allowed_sar_idc(width: u64, height: u64) -> &'static [AspectRatioIdc] {
    match (width, height) {
        (1920, _) | (1280, _) => &[AspectRatioIdc::Square],
        (1440, _) => &[AspectRatioIdc::Aspect4_3],
        (720, 576) => &[AspectRatioIdc::Aspect12_11, AspectRatioIdc::Aspect16_11],
        (720, 480) => &[AspectRatioIdc::Aspect10_11, AspectRatioIdc::Aspect40_33],
        _ => &[AspectRatioIdc::Aspect12_11, AspectRatioIdc::Aspect16_11],
    }
}

/// Checks one parsed SPS against the Blu-ray profile, per the BD-compliance
/// table. Returns every violation found; an empty [`Verdict`] means the SPS
/// is fully conformant.
pub fn validate_sps(sps: &Sps) -> Verdict {
    let mut verdict = Verdict::ok();
    let profile = ProfileIdc::from_idc(sps.profile_idc);

    if !profile.is_bd_allowed(sps.constraint_set4_flag) {
        verdict.push(Diagnostic::new(
            Severity::ComplianceError,
            "sps.profile-idc",
            format!("profile_idc {} ({}) is not Main or constraint-free High", sps.profile_idc, profile.describe(sps.constraint_set1_flag, sps.constraint_set4_flag)),
        ));
    }

    let level_row = level_limits(sps.level_idc, sps.constraint_set3_flag);
    if level_row.is_none() {
        verdict.push(Diagnostic::new(Severity::ComplianceError, "sps.level-idc-unknown", format!("level_idc {} is not one of the known Annex A levels", sps.level_idc)));
    }
    if !(BD_MIN_LEVEL_IDC..=BD_MAX_LEVEL_IDC).contains(&sps.level_idc) {
        verdict.push(Diagnostic::new(
            Severity::ComplianceError,
            "sps.level-idc-range",
            format!("level {:.1} not in {{3.0..4.1}}", sps.level_idc as f64 / 10.0),
        ));
    }

    if let Some(ext) = &sps.ext {
        let chroma_allowed = match profile {
            ProfileIdc::High422 => matches!(ext.chroma_format_idc, 0 | 1 | 2),
            ProfileIdc::High444Predictive | ProfileIdc::Cavlc444Intra => matches!(ext.chroma_format_idc, 0..=3),
            _ => ext.chroma_format_idc == 1,
        };
        if !chroma_allowed {
            verdict.push(Diagnostic::new(Severity::ComplianceError, "sps.chroma-format-idc", format!("chroma_format_idc {} not allowed for this profile", ext.chroma_format_idc)));
        }

        let bit_depth_max = match profile {
            ProfileIdc::High10 | ProfileIdc::High422 => 2,
            ProfileIdc::High444Predictive | ProfileIdc::Cavlc444Intra => 6,
            _ => 0,
        };
        if ext.bit_depth_luma_minus8 > bit_depth_max || ext.bit_depth_chroma_minus8 > bit_depth_max {
            verdict.push(Diagnostic::new(
                Severity::ParserError,
                "sps.bit-depth",
                format!("bit_depth_luma/chroma_minus8 {}/{} exceeds profile max {bit_depth_max}", ext.bit_depth_luma_minus8, ext.bit_depth_chroma_minus8),
            ));
        }

        if ext.qpprime_y_zero_transform_bypass_flag && !matches!(profile, ProfileIdc::High444Predictive) {
            verdict.push(Diagnostic::new(Severity::ComplianceError, "sps.qpprime-y-zero-transform-bypass", "qpprime_y_zero_transform_bypass_flag set on a profile that forbids it"));
        }
    }

    if sps.log2_max_frame_num_minus4 > 12 {
        verdict.push(Diagnostic::new(Severity::ParserError, "sps.log2-max-frame-num", format!("log2_max_frame_num_minus4 {} exceeds 12", sps.log2_max_frame_num_minus4)));
    }

    if sps.pic_order_cnt_type > 2 {
        verdict.push(Diagnostic::new(Severity::ParserError, "sps.pic-order-cnt-type", format!("pic_order_cnt_type {} not in {{0,1,2}}", sps.pic_order_cnt_type)));
    }

    if sps.gaps_in_frame_num_value_allowed_flag {
        verdict.push(Diagnostic::new(Severity::ComplianceError, "sps.gaps-in-frame-num", "gaps_in_frame_num_value_allowed_flag must be 0"));
    }

    if let Some(row) = level_row {
        let pic_width_in_mbs = sps.pic_width_in_mbs();
        let frame_height_in_mbs = sps.frame_height_in_mbs();

        let max_dpb_frames = max_dpb_frames(row.max_dpb_mbs, pic_width_in_mbs, frame_height_in_mbs);
        if sps.max_num_ref_frames as u64 > max_dpb_frames {
            verdict.push(Diagnostic::new(
                Severity::ComplianceError,
                "sps.max-num-ref-frames",
                format!("max_num_ref_frames {} exceeds MaxDpbFrames {max_dpb_frames}", sps.max_num_ref_frames),
            ));
        }

        let sqrt_8_max_fs = ((row.max_fs as f64 * 8.0).sqrt()).floor() as u64;
        if sqrt_8_max_fs < pic_width_in_mbs || sqrt_8_max_fs < frame_height_in_mbs {
            verdict.push(Diagnostic::new(
                Severity::ComplianceError,
                "sps.max-fs-dimension",
                format!("sqrt(MaxFS*8) = {sqrt_8_max_fs} smaller than PicWidthInMbs {pic_width_in_mbs} or FrameHeightInMbs {frame_height_in_mbs}"),
            ));
        }
        if (row.max_fs as u64) < pic_width_in_mbs * frame_height_in_mbs {
            verdict.push(Diagnostic::new(
                Severity::ComplianceError,
                "sps.max-fs",
                format!("PicWidthInMbs * FrameHeightInMbs {} exceeds MaxFS {}", pic_width_in_mbs * frame_height_in_mbs, row.max_fs),
            ));
        }
    }

    let interlace_forbidden = matches!(profile, ProfileIdc::High) && sps.constraint_set4_flag;
    if !sps.frame_mbs_only_flag() && interlace_forbidden {
        verdict.push(Diagnostic::new(Severity::ComplianceError, "sps.frame-mbs-only", "frame_mbs_only_flag must be 1 for this profile/constraint combination"));
    }

    match &sps.timing_info {
        None => verdict.push(Diagnostic::new(Severity::ComplianceError, "sps.vui-timing-info", "vui_parameters_present_flag must carry timing_info")),
        Some(_) => {}
    }
    if sps.sample_aspect_ratio.is_none() {
        verdict.push(Diagnostic::new(Severity::ComplianceError, "sps.vui-aspect-ratio-info", "vui_parameters_present_flag must carry aspect_ratio_info"));
    }
    match (&sps.nal_hrd_parameters, &sps.vcl_hrd_parameters, sps.low_delay_hrd_flag) {
        (None, None, _) => verdict.push(Diagnostic::new(Severity::ComplianceError, "sps.vui-hrd-parameters", "at least one of nal_hrd_parameters/vcl_hrd_parameters must be present")),
        (_, _, Some(true)) => verdict.push(Diagnostic::new(Severity::ComplianceError, "sps.low-delay-hrd-flag", "low_delay_hrd_flag must be 0")),
        _ => {}
    }

    if let Some(sar) = &sps.sample_aspect_ratio {
        let width = sps.width();
        let height = sps.height();
        let allowed = allowed_sar_idc(width, height);
        if !allowed.contains(&sar.aspect_ratio_idc) {
            verdict.push(Diagnostic::new(
                Severity::ComplianceError,
                "sps.sar-idc",
                format!("aspect_ratio_idc {:?} not allowed for {width}x{height} (allowed: {allowed:?})", sar.aspect_ratio_idc),
            ));
        }
    }

    if let Some(loc) = &sps.chroma_sample_loc {
        if !matches!(loc.chroma_sample_loc_type_top_field, 0 | 2) || !matches!(loc.chroma_sample_loc_type_bottom_field, 0 | 2) {
            verdict.push(Diagnostic::new(Severity::ComplianceError, "sps.chroma-sample-loc", "chroma_sample_loc_type_top/bottom_field must be 0 or 2"));
        }
    }

    verdict
}

/// Checks one parsed PPS against the Blu-ray profile.
///
/// Blu-ray forbids FMO entirely (`num_slice_groups_minus1` must be 0); the
/// other checks mirror what the HDMV buffer model and slice-header parser
/// assume is true of every PPS they're handed.
pub fn validate_pps(pps: &Pps) -> Verdict {
    let mut verdict = Verdict::ok();

    if pps.num_slice_groups_minus1 != 0 {
        verdict.push(Diagnostic::new(Severity::ComplianceError, "pps.num-slice-groups", format!("num_slice_groups_minus1 {} != 0, FMO is forbidden", pps.num_slice_groups_minus1)));
    }
    if let Some(info) = &pps.slice_group_info {
        if info.slice_group_map_type != SliceGroupMapType::Interleaved {
            verdict.push(Diagnostic::new(Severity::ComplianceError, "pps.slice-group-map-type", "slice_group_map_type must be Interleaved when FMO is present at all"));
        }
    }
    if pps.num_ref_idx_l0_default_active_minus1 > 31 || pps.num_ref_idx_l1_default_active_minus1 > 31 {
        verdict.push(Diagnostic::new(Severity::ParserError, "pps.num-ref-idx-default", "num_ref_idx_l0/l1_default_active_minus1 exceeds 31"));
    }

    verdict
}
