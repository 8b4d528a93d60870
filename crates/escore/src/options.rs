//! Configuration surface for the two pipelines: one struct per elementary
//! stream type, built the way `pipeline-common::PipelineConfig` is — a
//! `Default`-implementing config plus a separate chainable builder.

use h264::AspectRatioIdc;

/// One of the frame rates a Blu-ray-conformant H.264 stream can be retimed
/// to, matched against the same frequencies `h264::patch_sps` recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRateCode {
    /// 23.976 fps (NTSC film).
    Film23_976,
    /// 24 fps (film).
    Film24,
    /// 25 fps (PAL).
    Pal25,
    /// 29.970 fps (NTSC).
    Ntsc29_970,
    /// 50 fps (PAL double).
    Pal50,
    /// 59.940 fps (NTSC double).
    Ntsc59_940,
}

impl FrameRateCode {
    /// The frame rate this code stands for, in frames/sec.
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Film23_976 => 23.976,
            Self::Film24 => 24.0,
            Self::Pal25 => 25.0,
            Self::Ntsc29_970 => 29.970,
            Self::Pal50 => 50.0,
            Self::Ntsc59_940 => 59.940,
        }
    }
}

/// HDMV-specific options, nested under [`EsCoreOptions::hdmv`].
#[derive(Debug, Clone, Copy)]
pub struct HdmvConfig {
    /// Base PTS offset applied to every reconstructed HDMV timestamp.
    pub initial_timestamp: i64,
    /// Ignore MNU-supplied PTS/DTS and always recompute from the buffer model.
    pub force_retiming: bool,
    /// The input is an `.ass`-derived stream rather than a real PES capture,
    /// relaxing the framing sniff that otherwise assumes a raw PES source.
    pub ass_input: bool,
}

impl Default for HdmvConfig {
    fn default() -> Self {
        Self { initial_timestamp: 0, force_retiming: false, ass_input: false }
    }
}

/// Top-level configuration for one `escore` run.
#[derive(Debug, Clone)]
pub struct EsCoreOptions {
    /// Build a script even when no fix would otherwise change the output
    /// (useful for round-trip testing the script format itself).
    pub force_script_building: bool,
    /// Skip SPS/SEI rewriting entirely; every NAL is copied through verbatim.
    pub disable_fixes: bool,
    /// Skip HRD (CPB/DPB) simulation; only parser- and profile-level checks run.
    pub disable_hrd_verifier: bool,
    /// Drop every SEI NAL from the output instead of copying or rebuilding it.
    pub discard_sei: bool,
    /// Re-emit SEI payloads even when `disable_fixes` would otherwise leave
    /// them untouched (the buffering-period delay values themselves are never
    /// recomputed; see `h264_pipeline`).
    pub force_rebuild_sei: bool,
    /// Only run the compliance/timing checks; do not emit a patch script.
    pub extract_core: bool,
    /// Overrides the VUI frame rate on every rewritten SPS.
    pub fps_change: Option<FrameRateCode>,
    /// Overrides `aspect_ratio_idc` on every rewritten SPS.
    pub ar_change: Option<AspectRatioIdc>,
    /// Overrides `level_idc` on every rewritten SPS.
    pub level_change: Option<u8>,
    /// Orders IGS link queues by ascending id rather than reference order.
    pub order_igs_segments_by_value: bool,
    /// Orders PGS link queues by ascending id rather than reference order.
    pub order_pgs_segments_by_value: bool,
    /// HDMV-specific options.
    pub hdmv: HdmvConfig,
    /// When `true` (the default), any `ComplianceError` diagnostic aborts the
    /// run; when `false`, compliance errors are logged and parsing continues.
    pub strict: bool,
}

impl Default for EsCoreOptions {
    fn default() -> Self {
        Self {
            force_script_building: false,
            disable_fixes: false,
            disable_hrd_verifier: false,
            discard_sei: false,
            force_rebuild_sei: false,
            extract_core: false,
            fps_change: None,
            ar_change: None,
            level_change: None,
            order_igs_segments_by_value: false,
            order_pgs_segments_by_value: false,
            hdmv: HdmvConfig::default(),
            strict: true,
        }
    }
}

impl EsCoreOptions {
    /// Starts building an [`EsCoreOptions`] from the defaults.
    pub fn builder() -> EsCoreOptionsBuilder {
        EsCoreOptionsBuilder::default()
    }
}

/// Chainable builder for [`EsCoreOptions`].
#[derive(Debug, Clone, Default)]
pub struct EsCoreOptionsBuilder {
    options: EsCoreOptions,
}

impl EsCoreOptionsBuilder {
    /// See [`EsCoreOptions::force_script_building`].
    pub fn force_script_building(mut self, value: bool) -> Self {
        self.options.force_script_building = value;
        self
    }

    /// See [`EsCoreOptions::disable_fixes`].
    pub fn disable_fixes(mut self, value: bool) -> Self {
        self.options.disable_fixes = value;
        self
    }

    /// See [`EsCoreOptions::disable_hrd_verifier`].
    pub fn disable_hrd_verifier(mut self, value: bool) -> Self {
        self.options.disable_hrd_verifier = value;
        self
    }

    /// See [`EsCoreOptions::discard_sei`].
    pub fn discard_sei(mut self, value: bool) -> Self {
        self.options.discard_sei = value;
        self
    }

    /// See [`EsCoreOptions::force_rebuild_sei`].
    pub fn force_rebuild_sei(mut self, value: bool) -> Self {
        self.options.force_rebuild_sei = value;
        self
    }

    /// See [`EsCoreOptions::extract_core`].
    pub fn extract_core(mut self, value: bool) -> Self {
        self.options.extract_core = value;
        self
    }

    /// See [`EsCoreOptions::fps_change`].
    pub fn fps_change(mut self, value: FrameRateCode) -> Self {
        self.options.fps_change = Some(value);
        self
    }

    /// See [`EsCoreOptions::ar_change`].
    pub fn ar_change(mut self, value: AspectRatioIdc) -> Self {
        self.options.ar_change = Some(value);
        self
    }

    /// See [`EsCoreOptions::level_change`].
    pub fn level_change(mut self, value: u8) -> Self {
        self.options.level_change = Some(value);
        self
    }

    /// See [`EsCoreOptions::order_igs_segments_by_value`].
    pub fn order_igs_segments_by_value(mut self, value: bool) -> Self {
        self.options.order_igs_segments_by_value = value;
        self
    }

    /// See [`EsCoreOptions::order_pgs_segments_by_value`].
    pub fn order_pgs_segments_by_value(mut self, value: bool) -> Self {
        self.options.order_pgs_segments_by_value = value;
        self
    }

    /// See [`EsCoreOptions::hdmv`].
    pub fn hdmv(mut self, value: HdmvConfig) -> Self {
        self.options.hdmv = value;
        self
    }

    /// See [`EsCoreOptions::strict`].
    pub fn strict(mut self, value: bool) -> Self {
        self.options.strict = value;
        self
    }

    /// Finishes the builder.
    pub fn build(self) -> EsCoreOptions {
        self.options
    }
}
