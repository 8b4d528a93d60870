//! In-place SPS/SEI rewriting and the de-duplication pool that lets repeated
//! patches share one script data block.

use std::collections::HashMap;
use std::num::NonZeroU32;

use script::{PatchMode, ScriptCommand};

use crate::sps::{SarDimensions, TimingInfo};
use crate::{AspectRatioIdc, ColorConfig, Sps, VideoFormat};

/// What the patcher should override on a rebuilt SPS, beyond the mandatory
/// VUI normalization it always performs.
#[derive(Debug, Clone, Default)]
pub struct SpsPatchOptions {
    /// Overrides the VUI timing info to the given frame rate (one of the
    /// `fps_change` values from the configuration surface).
    pub frame_rate: Option<f64>,
    /// Overrides `aspect_ratio_idc`.
    pub aspect_ratio_idc: Option<AspectRatioIdc>,
    /// Overrides `level_idc`. A value below the SPS's current level is still
    /// applied, but the caller should surface [`LevelOverrideOutcome::Downgrade`]
    /// as a warning.
    pub level_idc: Option<u8>,
}

/// The outcome of applying an `SpsPatchOptions::level_idc` override, so the
/// caller can decide whether to warn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelOverrideOutcome {
    /// No override was requested.
    Unchanged,
    /// The override raised or kept the level the same.
    Unchanged0rRaised,
    /// The override lowered `level_idc` below the measured value.
    Downgrade,
}

/// Picks the BD-mandated colour primaries/transfer/matrix defaults for a
/// frame of the given height, per the table in §6.3: 576 lines → BT.470BG (5),
/// 480 lines → SMPTE 170M (6), otherwise BT.709 (1).
fn default_color_config(frame_height: u64) -> ColorConfig {
    let code = match frame_height {
        576 => 5,
        480 => 6,
        _ => 1,
    };
    ColorConfig {
        video_format: VideoFormat::Unspecified,
        video_full_range_flag: false,
        color_primaries: code,
        transfer_characteristics: code,
        matrix_coefficients: code,
    }
}

fn timing_info_for_frame_rate(frame_rate: f64) -> TimingInfo {
    let (num_units_in_tick, time_scale) = match frame_rate {
        r if (r - 23.976).abs() < 0.001 => (2002, 48000),
        r if (r - 24.0).abs() < 0.001 => (1, 48),
        r if (r - 25.0).abs() < 0.001 => (1, 50),
        r if (r - 29.970).abs() < 0.001 => (1001, 60000),
        r if (r - 50.0).abs() < 0.001 => (1, 100),
        r if (r - 59.940).abs() < 0.001 => (1001, 120000),
        r => (1000, (r * 2000.0).round() as u32),
    };
    TimingInfo {
        num_units_in_tick: NonZeroU32::new(num_units_in_tick).unwrap_or(NonZeroU32::MIN),
        time_scale: NonZeroU32::new(time_scale).unwrap_or(NonZeroU32::MIN),
    }
}

/// `initial_cpb_removal_delay_length_minus1 + 1` normalized to 18 bits, as
/// the patcher always enforces on both HRD configurations.
pub const NORMALIZED_CPB_REMOVAL_DELAY_BITS: u8 = 18;

/// Rebuilds an SPS's VUI per the patching rules, applying whichever
/// overrides `options` requests. Returns the rebuilt SPS and the level
/// override's outcome.
pub fn patch_sps(original: &Sps, options: &SpsPatchOptions) -> (Sps, LevelOverrideOutcome) {
    let mut sps = original.clone();

    let frame_height = sps.height();
    sps.color_config = Some(default_color_config(frame_height));

    if let Some(frame_rate) = options.frame_rate {
        sps.timing_info = Some(timing_info_for_frame_rate(frame_rate));
    }

    if let Some(aspect_ratio_idc) = options.aspect_ratio_idc {
        let existing = sps.sample_aspect_ratio.take();
        sps.sample_aspect_ratio = Some(SarDimensions {
            aspect_ratio_idc,
            sar_width: existing.as_ref().map_or(0, |s| s.sar_width),
            sar_height: existing.as_ref().map_or(0, |s| s.sar_height),
        });
    }

    let mut outcome = LevelOverrideOutcome::Unchanged;
    if let Some(level_idc) = options.level_idc {
        outcome = if level_idc < sps.level_idc { LevelOverrideOutcome::Downgrade } else { LevelOverrideOutcome::Unchanged0rRaised };
        sps.level_idc = level_idc;
    }

    if let Some(hrd) = &mut sps.nal_hrd_parameters {
        hrd.initial_cpb_removal_delay_length_minus1 = NORMALIZED_CPB_REMOVAL_DELAY_BITS - 1;
    }
    if let Some(hrd) = &mut sps.vcl_hrd_parameters {
        hrd.initial_cpb_removal_delay_length_minus1 = NORMALIZED_CPB_REMOVAL_DELAY_BITS - 1;
    }

    (sps, outcome)
}

/// A de-duplication pool for rebuilt SPS/SEI payloads. Distinct NALs whose
/// rebuilt bytes are identical share one script data block instead of each
/// emitting its own `add_data`.
#[derive(Debug, Default)]
pub struct PatchPool {
    blocks: Vec<Vec<u8>>,
    index: HashMap<Vec<u8>, u32>,
}

impl PatchPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `bytes`, returning its block index and whether this is the
    /// first time this exact payload has been seen.
    pub fn intern(&mut self, bytes: Vec<u8>) -> (u32, bool) {
        if let Some(&idx) = self.index.get(&bytes) {
            return (idx, false);
        }
        let idx = self.blocks.len() as u32;
        self.index.insert(bytes.clone(), idx);
        self.blocks.push(bytes);
        (idx, true)
    }

    /// The bytes stored at `block_idx`, if any.
    pub fn block(&self, block_idx: u32) -> Option<&[u8]> {
        self.blocks.get(block_idx as usize).map(Vec::as_slice)
    }
}

/// Emits the script command(s) for one rebuilt NAL's bytes at `dst_offset`,
/// routing through `pool` so repeated identical payloads share one block.
/// Per the patching contract, the original source bytes in that region are
/// never referenced again regardless of which command is chosen.
pub fn emit_patch(pool: &mut PatchPool, dst_offset: u64, bytes: Vec<u8>) -> ScriptCommand {
    let (block_idx, is_new) = pool.intern(bytes.clone());
    if is_new {
        ScriptCommand::AddData { dst_offset, mode: PatchMode::Overwrite, bytes }
    } else {
        ScriptCommand::AddDataBlock { dst_offset, mode: PatchMode::Overwrite, block_idx }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_payloads_share_a_block() {
        let mut pool = PatchPool::new();
        let first = emit_patch(&mut pool, 0, vec![1, 2, 3]);
        let second = emit_patch(&mut pool, 100, vec![1, 2, 3]);
        assert!(matches!(first, ScriptCommand::AddData { .. }));
        assert!(matches!(second, ScriptCommand::AddDataBlock { block_idx: 0, .. }));
    }

    #[test]
    fn distinct_payloads_each_get_their_own_block() {
        let mut pool = PatchPool::new();
        let first = emit_patch(&mut pool, 0, vec![1, 2, 3]);
        let second = emit_patch(&mut pool, 100, vec![4, 5, 6]);
        assert!(matches!(first, ScriptCommand::AddData { .. }));
        assert!(matches!(second, ScriptCommand::AddData { .. }));
    }

    #[test]
    fn color_config_defaults_follow_frame_height() {
        assert_eq!(default_color_config(576).color_primaries, 5);
        assert_eq!(default_color_config(480).color_primaries, 6);
        assert_eq!(default_color_config(1080).color_primaries, 1);
    }
}
