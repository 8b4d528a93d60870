//! CPB/DPB verifier (ISO/IEC-14496-10-2022 Annex C, restricted to the
//! subset of the HRD model a Blu-ray-conformant stream can exercise).

use diagnostics::{Diagnostic, Severity};

use crate::{DecRefPicMarking, MemoryManagementControlOp};

/// Capacity of the CPB arrival-time ring buffer. A power of two so index
/// wraparound is a bitmask, mirroring the reference implementation's
/// statically-sized `H264CpbHrdAU[1024]`.
pub const H264_MAX_AU_IN_CPB: usize = 1024;

/// Capacity of the DPB ring buffer (`H264DpbHrdPic[32]`). Exceeding this is a
/// fatal verifier error; it cannot happen for a BD-conformant stream since
/// `MaxDpbFrames <= 16`.
pub const H264_MAX_DPB_SIZE: usize = 32;

/// How one DPB entry is currently marked for reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceUsage {
    /// Output only, not usable as a reference.
    NotUsed,
    /// Usable as a short-term reference.
    ShortTerm,
    /// Usable as a long-term reference, at the carried index.
    LongTerm,
}

/// One arrival in the CPB ring buffer.
#[derive(Debug, Clone, Copy)]
pub struct CpbArrivalEntry {
    /// Monotonically increasing access-unit index.
    pub au_index: u64,
    /// Size of the access unit in bits.
    pub length_in_bits: u64,
    /// `t_r(n)`, the nominal CPB removal time, in 90 kHz ticks.
    pub nominal_removal_time: u64,
}

/// One picture currently held in the DPB.
#[derive(Debug, Clone, Copy)]
pub struct DpbEntry {
    /// Display order index, used to break ties and compute output order.
    pub frame_display_num: u64,
    /// `frame_num` carried by this picture's slice headers.
    pub frame_num: u32,
    /// `field_pic_flag`.
    pub field_pic_flag: bool,
    /// `bottom_field_flag`, only meaningful when `field_pic_flag`.
    pub bottom_field_flag: bool,
    /// Reconstructed output (presentation) time, in 90 kHz ticks.
    pub output_time: i64,
    /// Current reference usage.
    pub reference_usage: ReferenceUsage,
    /// `long_term_frame_idx`, present iff `reference_usage == LongTerm`.
    pub long_term_frame_idx: Option<u64>,
}

/// The previous access unit's parameters, kept only for diagnostic context
/// on the next failure ("nMinusOneAUParameters" in the reference implementation).
#[derive(Debug, Clone, Copy)]
pub struct PreviousAuParameters {
    /// `frame_num`.
    pub frame_num: u32,
    /// `PicSizeInMbs`.
    pub pic_size_in_mbs: u64,
    /// `level_idc` in force for this AU.
    pub level_idc: u8,
    /// CPB removal time, in 90 kHz ticks.
    pub removal_time: u64,
    /// Reconstructed PTS, in 27 MHz ticks.
    pub pts: i64,
    /// Reconstructed DTS, in 27 MHz ticks.
    pub dts: i64,
    /// `initial_cpb_removal_delay` from the buffering-period SEI in force.
    pub initial_cpb_removal_delay: u64,
    /// `initial_cpb_removal_delay_offset` from the same SEI.
    pub initial_cpb_removal_delay_offset: u64,
}

/// Whether the verifier aborts on the first violation or keeps going and
/// accumulates diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifierMode {
    /// Stop at the first fatal or compliance violation.
    Strict,
    /// Log every violation as a diagnostic and continue.
    LogAndContinue,
}

/// Per-AU inputs the verifier needs that aren't already implied by its own
/// running state.
#[derive(Debug, Clone, Copy)]
pub struct CpbArrival {
    /// Size of the access unit in bits.
    pub length_in_bits: u64,
    /// `initial_cpb_removal_delay`, present when this AU carries a
    /// buffering-period SEI.
    pub initial_cpb_removal_delay: Option<u64>,
}

/// Simulates the CPB and DPB across an access-unit stream, flagging
/// overflow/underflow and arrival-rate violations as they occur.
#[derive(Debug)]
pub struct HrdVerifier {
    cpb: Box<[Option<CpbArrivalEntry>; H264_MAX_AU_IN_CPB]>,
    cpb_head: usize,
    cpb_len: usize,
    next_au_index: u64,

    dpb: Vec<DpbEntry>,
    max_dpb_frames: usize,

    bit_rate: u64,
    cpb_size_bits: u64,
    cbr_flag: bool,

    clock_ticks_per_au: u64,
    clock_t: u64,

    prev_au: Option<PreviousAuParameters>,
    mode: VerifierMode,
}

impl HrdVerifier {
    /// Creates a verifier for a stream whose active HRD parameters give
    /// `bit_rate` bits/sec and `cpb_size_bits` bits of CPB capacity, allowing
    /// at most `max_dpb_frames` pictures in the DPB at once.
    pub fn new(bit_rate: u64, cpb_size_bits: u64, cbr_flag: bool, max_dpb_frames: usize, clock_ticks_per_au: u64, mode: VerifierMode) -> Self {
        Self {
            cpb: Box::new([None; H264_MAX_AU_IN_CPB]),
            cpb_head: 0,
            cpb_len: 0,
            next_au_index: 0,
            dpb: Vec::with_capacity(max_dpb_frames.min(H264_MAX_DPB_SIZE)),
            max_dpb_frames: max_dpb_frames.min(H264_MAX_DPB_SIZE),
            bit_rate,
            cpb_size_bits,
            cbr_flag,
            clock_ticks_per_au,
            clock_t: 0,
            prev_au: None,
            mode,
        }
    }

    fn cpb_occupied_bits(&self) -> u64 {
        self.cpb.iter().filter_map(|e| e.as_ref()).map(|e| e.length_in_bits).sum()
    }

    fn report(&self, sink: &mut dyn diagnostics::DiagnosticSink, severity: Severity, code: &'static str, message: impl Into<String>) -> bool {
        let stops_parsing = matches!(severity, Severity::ParserError | Severity::ComplianceError) && self.mode == VerifierMode::Strict;
        sink.report(Diagnostic::new(severity, code, message));
        !stops_parsing
    }

    /// Admits one access unit's arrival into the CPB, advancing the
    /// simulated clock and checking overflow/underflow/CBR-arrival-rate
    /// constraints. Returns `false` if a fatal violation should stop parsing
    /// (only possible in [`VerifierMode::Strict`]).
    pub fn admit_au(&mut self, arrival: CpbArrival, sink: &mut dyn diagnostics::DiagnosticSink) -> bool {
        if self.cpb_len >= H264_MAX_AU_IN_CPB {
            return self.report(sink, Severity::ParserError, "hrd.cpb-ring-overflow", "CPB ring buffer exceeded H264_MAX_AU_IN_CPB");
        }

        if let Some(initial_delay) = arrival.initial_cpb_removal_delay {
            let max_delay = self.cpb_size_bits.saturating_mul(90_000) / self.bit_rate.max(1);
            if initial_delay > max_delay {
                if !self.report(
                    sink,
                    Severity::ComplianceError,
                    "hrd.initial-cpb-removal-delay-overflow",
                    format!("initial_cpb_removal_delay {initial_delay} exceeds CpbSize/BitRate * 90000 ({max_delay})"),
                ) {
                    return false;
                }
            }
            self.clock_t = initial_delay;
        }

        let nominal_removal_time = self.clock_t;
        self.clock_t += self.clock_ticks_per_au;

        if !self.drain_due(nominal_removal_time, sink) {
            return false;
        }

        let occupied_before = self.cpb_occupied_bits();
        if occupied_before + arrival.length_in_bits > self.cpb_size_bits {
            if !self.report(
                sink,
                Severity::ComplianceError,
                "hrd.cpb-overflow",
                format!("CPB occupancy {occupied_before} + {} exceeds CpbSize {}", arrival.length_in_bits, self.cpb_size_bits),
            ) {
                return false;
            }
        }

        if self.cbr_flag {
            let expected_bits = self.bit_rate * self.clock_ticks_per_au / 90_000;
            if arrival.length_in_bits != expected_bits {
                if !self.report(
                    sink,
                    Severity::ComplianceError,
                    "hrd.cbr-arrival-rate",
                    format!("CBR stream AU size {} bits does not match expected {expected_bits} bits", arrival.length_in_bits),
                ) {
                    return false;
                }
            }
        }

        let index = (self.cpb_head + self.cpb_len) & (H264_MAX_AU_IN_CPB - 1);
        self.cpb[index] = Some(CpbArrivalEntry { au_index: self.next_au_index, length_in_bits: arrival.length_in_bits, nominal_removal_time });
        self.cpb_len += 1;
        self.next_au_index += 1;
        true
    }

    /// Drains every CPB entry whose nominal removal time has already passed
    /// as of `now`, the current AU's own scheduled removal time. Called from
    /// [`Self::admit_au`] on every AU so occupancy reflects only what is
    /// actually still buffered, rather than accumulating every AU ever seen.
    fn drain_due(&mut self, now: u64, sink: &mut dyn diagnostics::DiagnosticSink) -> bool {
        while self.cpb_len > 0 {
            let due = self.cpb[self.cpb_head].as_ref().is_some_and(|entry| entry.nominal_removal_time <= now);
            if !due {
                break;
            }
            if !self.remove_oldest(sink) {
                return false;
            }
        }
        true
    }

    /// Removes the oldest CPB entry once its removal time has passed,
    /// checking for underflow (the bits must have actually arrived by then).
    pub fn remove_oldest(&mut self, sink: &mut dyn diagnostics::DiagnosticSink) -> bool {
        if self.cpb_len == 0 {
            return self.report(sink, Severity::ParserError, "hrd.cpb-underflow", "CPB removal requested with no AU present");
        }
        self.cpb[self.cpb_head] = None;
        self.cpb_head = (self.cpb_head + 1) & (H264_MAX_AU_IN_CPB - 1);
        self.cpb_len -= 1;
        true
    }

    /// Applies one slice's `dec_ref_pic_marking()` to the DPB, per clause
    /// 8.2.5.4. `current` is the picture this marking belongs to.
    pub fn apply_marking(&mut self, marking: &DecRefPicMarking, current: DpbEntry, sink: &mut dyn diagnostics::DiagnosticSink) -> bool {
        match marking {
            DecRefPicMarking::Idr { .. } => {
                self.dpb.clear();
            }
            DecRefPicMarking::NonIdr { operations } => {
                for op in operations {
                    match *op {
                        MemoryManagementControlOp::MarkShortTermUnused { difference_of_pic_nums_minus1 } => {
                            let target_frame_num = current.frame_num.wrapping_sub(difference_of_pic_nums_minus1 as u32 + 1);
                            self.mark_unused_by_frame_num(target_frame_num, ReferenceUsage::ShortTerm);
                        }
                        MemoryManagementControlOp::MarkLongTermUnused { long_term_pic_num } => {
                            self.mark_unused_by_long_term_idx(long_term_pic_num);
                        }
                        MemoryManagementControlOp::AssignLongTerm { difference_of_pic_nums_minus1, long_term_frame_idx } => {
                            let target_frame_num = current.frame_num.wrapping_sub(difference_of_pic_nums_minus1 as u32 + 1);
                            if let Some(entry) = self.dpb.iter_mut().find(|e| e.frame_num == target_frame_num && e.reference_usage == ReferenceUsage::ShortTerm) {
                                entry.reference_usage = ReferenceUsage::LongTerm;
                                entry.long_term_frame_idx = Some(long_term_frame_idx);
                            } else if !self.report(
                                sink,
                                Severity::ComplianceError,
                                "hrd.mmco3-missing-short-term",
                                format!("mmco 3 references frame_num {target_frame_num} not found as a short-term reference"),
                            ) {
                                return false;
                            }
                        }
                        MemoryManagementControlOp::SetMaxLongTermFrameIdx { max_long_term_frame_idx_plus1 } => {
                            let max_idx = max_long_term_frame_idx_plus1.checked_sub(1);
                            self.dpb.retain(|e| match (e.reference_usage, max_idx, e.long_term_frame_idx) {
                                (ReferenceUsage::LongTerm, Some(max_idx), Some(idx)) => idx <= max_idx,
                                (ReferenceUsage::LongTerm, None, _) => false,
                                _ => true,
                            });
                        }
                        MemoryManagementControlOp::ResetAll => {
                            self.dpb.clear();
                        }
                        MemoryManagementControlOp::MarkCurrentLongTerm { long_term_frame_idx } => {
                            let mut marked = current;
                            marked.reference_usage = ReferenceUsage::LongTerm;
                            marked.long_term_frame_idx = Some(long_term_frame_idx);
                            if !self.push_dpb_entry(marked, sink) {
                                return false;
                            }
                            return true;
                        }
                    }
                }
            }
        }
        self.push_dpb_entry(current, sink)
    }

    fn mark_unused_by_frame_num(&mut self, frame_num: u32, usage: ReferenceUsage) {
        if let Some(entry) = self.dpb.iter_mut().find(|e| e.frame_num == frame_num && e.reference_usage == usage) {
            entry.reference_usage = ReferenceUsage::NotUsed;
        }
    }

    fn mark_unused_by_long_term_idx(&mut self, long_term_pic_num: u64) {
        if let Some(entry) = self.dpb.iter_mut().find(|e| e.long_term_frame_idx == Some(long_term_pic_num)) {
            entry.reference_usage = ReferenceUsage::NotUsed;
        }
    }

    fn push_dpb_entry(&mut self, entry: DpbEntry, sink: &mut dyn diagnostics::DiagnosticSink) -> bool {
        if self.dpb.len() >= H264_MAX_DPB_SIZE {
            return self.report(sink, Severity::ParserError, "hrd.dpb-ring-overflow", "DPB exceeded H264_MAX_DPB_SIZE");
        }
        if self.dpb.len() >= self.max_dpb_frames {
            if let Some(pos) = self.dpb.iter().position(|e| e.reference_usage == ReferenceUsage::NotUsed) {
                self.dpb.remove(pos);
            } else if !self.report(sink, Severity::ComplianceError, "hrd.dpb-overflow", "DPB occupancy exceeds MaxDpbFrames with no evictable entry") {
                return false;
            }
        }
        self.dpb.push(entry);
        true
    }

    /// The pictures currently held in the DPB.
    pub fn dpb(&self) -> &[DpbEntry] {
        &self.dpb
    }

    /// Latches this AU's parameters as `nMinusOneAUParameters` for the next
    /// diagnostic.
    pub fn remember_au(&mut self, params: PreviousAuParameters) {
        self.prev_au = Some(params);
    }

    /// The previous AU's parameters, if one has been processed.
    pub fn previous_au(&self) -> Option<&PreviousAuParameters> {
        self.prev_au.as_ref()
    }
}
