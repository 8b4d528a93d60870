//! Drives the H.264 half of the data-flow: NAL scanning, access-unit
//! reassembly, SPS/PPS compliance checking, HRD simulation, timing
//! reconstruction, and (unless disabled) SPS/SEI patching, all in one
//! sequential pass over the source bytes.

use std::collections::HashMap;
use std::io;

use bitstream::BitReader;
use bytes::Bytes;
use diagnostics::{Diagnostic, DiagnosticSink, Severity, Verdict};
use expgolomb::BitReaderExpGolombExt;
use h264::{
    scan_nal_units, AccessUnitBuilder, AccessUnitDelimiter, CpbArrival, DpbEntry, EmulationPreventionIo, Field, HrdVerifier, NALUnitType,
    PicOrderCountState, PicStruct, Pps, PreviousAuParameters, ReferenceUsage, SeiMessage, SliceHeader, Sps, TimingReconstructor, Type0Inputs,
    VerifierMode,
};
use script::{ScriptCommand, ScriptSink};

use crate::error::EsCoreError;
use crate::options::EsCoreOptions;

/// Buffers and strips emulation-prevention bytes from a raw NAL payload
/// (header byte included), handing back a bit reader over the clean RBSP.
fn de_escape(payload: &[u8]) -> io::Result<BitReader<io::Cursor<Vec<u8>>>> {
    let mut rbsp = Vec::new();
    io::Read::read_to_end(&mut EmulationPreventionIo::new(io::Cursor::new(payload)), &mut rbsp)?;
    Ok(BitReader::new(io::Cursor::new(rbsp)))
}

/// Reads just enough of a slice NAL to resolve which PPS (and, through it,
/// which SPS) its full parse needs, without committing to that parse yet.
fn peek_pic_parameter_set_id(payload: &[u8]) -> io::Result<u64> {
    let mut reader = de_escape(payload)?;
    let _forbidden_zero_bit = reader.read_bit()?;
    let _nal_ref_idc = reader.read_bits(2)?;
    let _nal_unit_type = reader.read_bits(5)?;
    let _first_mb_in_slice = reader.read_exp_golomb()?;
    let _slice_type = reader.read_exp_golomb()?;
    reader.read_exp_golomb()
}

fn copy_through(nal: &h264::NalUnit, script: &mut dyn ScriptSink) {
    script.emit(ScriptCommand::CopyPesPayload { src_idx: 0, dst_offset: nal.offset, src_offset: nal.offset, length: nal.payload.len() as u64 });
}

/// Drives one H.264 elementary stream end to end.
pub struct H264Pipeline {
    options: EsCoreOptions,
}

impl H264Pipeline {
    /// Creates a pipeline for the given configuration.
    pub fn new(options: EsCoreOptions) -> Self {
        Self { options }
    }

    fn report(&self, sink: &mut dyn DiagnosticSink, diagnostic: Diagnostic) -> Result<(), EsCoreError> {
        diagnostic.trace();
        let fatal = self.options.strict && diagnostic.severity == Severity::ComplianceError;
        let message = diagnostic.to_string();
        sink.report(diagnostic);
        if fatal {
            return Err(EsCoreError::ComplianceFailure(message));
        }
        Ok(())
    }

    fn report_verdict(&self, sink: &mut dyn DiagnosticSink, verdict: Verdict) -> Result<(), EsCoreError> {
        for diagnostic in verdict.diagnostics {
            self.report(sink, diagnostic)?;
        }
        Ok(())
    }

    /// Runs the pipeline over `data`, reporting findings through `sink` and
    /// the patch/copy script through `script`.
    pub fn run(&self, data: &Bytes, sink: &mut dyn DiagnosticSink, script: &mut dyn ScriptSink) -> Result<(), EsCoreError> {
        let nal_units = scan_nal_units(data)?;

        script.emit(ScriptCommand::SetSourceFile { path: "h264.es".to_string() });

        let mut sps_table: HashMap<u64, Sps> = HashMap::new();
        let mut pps_table: HashMap<u64, Pps> = HashMap::new();
        let mut active_sps_id: Option<u64> = None;

        let mut au_builder: Option<AccessUnitBuilder> = None;
        let mut hrd: Option<HrdVerifier> = None;
        let mut timing: Option<TimingReconstructor> = None;

        let mut patch_pool = h264::PatchPool::new();
        let mut poc_state = PicOrderCountState::default();
        let mut frame_display_num: u64 = 0;
        let mut pending_initial_cpb_delay: Option<u64> = None;
        let mut pending_pic_struct: Option<PicStruct> = None;
        let mut prev_has_mmco5 = false;
        let mut prev_pic_struct: Option<PicStruct> = None;

        for nal in &nal_units {
            match nal.nal_unit_type {
                NALUnitType::SPS => {
                    let sps = Sps::parse_with_emulation_prevention(io::Cursor::new(nal.payload.as_ref()))?;
                    self.report_verdict(sink, h264::validate_sps(&sps))?;

                    if au_builder.is_none() {
                        au_builder = Some(AccessUnitBuilder::new(sps.pic_order_cnt_type));
                    }

                    if !self.options.disable_hrd_verifier {
                        if let Some(hrd_params) = sps.nal_hrd_parameters.as_ref().or(sps.vcl_hrd_parameters.as_ref()) {
                            if let Some(entry) = hrd_params.entries.first() {
                                let max_dpb_frames = h264::level_limits(sps.level_idc, sps.constraint_set3_flag)
                                    .map_or(16, |row| h264::max_dpb_frames(row.max_dpb_mbs, sps.pic_width_in_mbs(), sps.frame_height_in_mbs()));
                                let clock_ticks_per_au = (90_000.0 / sps.frame_rate().unwrap_or(24.0)).round().max(1.0) as u64;
                                hrd = Some(HrdVerifier::new(
                                    entry.bit_rate(hrd_params.bit_rate_scale),
                                    entry.cpb_size(hrd_params.cpb_size_scale),
                                    entry.cbr_flag,
                                    max_dpb_frames.max(1) as usize,
                                    clock_ticks_per_au,
                                    if self.options.strict { VerifierMode::Strict } else { VerifierMode::LogAndContinue },
                                ));
                            }
                        }
                    }

                    let nb_pics = sps.bitstream_restriction.as_ref().map_or(1, |r| r.max_num_reorder_frames.max(1) as u32);
                    timing = Some(TimingReconstructor::new(sps.frame_rate().unwrap_or(24.0), nb_pics));

                    let sps_id = sps.seq_parameter_set_id as u64;
                    active_sps_id = Some(sps_id);
                    sps_table.insert(sps_id, sps);

                    if self.options.disable_fixes {
                        copy_through(nal, script);
                    } else {
                        let sps_ref = &sps_table[&active_sps_id.unwrap()];
                        let (patched, outcome) = h264::patch_sps(
                            sps_ref,
                            &h264::SpsPatchOptions {
                                frame_rate: self.options.fps_change.map(|c| c.as_f64()),
                                aspect_ratio_idc: self.options.ar_change,
                                level_idc: self.options.level_change,
                            },
                        );
                        if outcome == h264::LevelOverrideOutcome::Downgrade {
                            self.report(sink, Diagnostic::new(Severity::Warning, "h264.level-downgrade", "level_idc override lowered the measured level").at_offset(nal.offset))?;
                        }
                        let mut rebuilt = Vec::new();
                        patched.build_with_emulation_prevention(&mut rebuilt)?;
                        script.emit(h264::emit_patch(&mut patch_pool, nal.offset, rebuilt));
                    }

                    if let Some(completed) = au_builder.as_mut().and_then(|b| b.push_non_vcl(descriptor(nal))) {
                        let _ = completed;
                    }
                }
                NALUnitType::PPS => {
                    let pps = Pps::parse_with_emulation_prevention(io::Cursor::new(nal.payload.as_ref()))?;
                    self.report_verdict(sink, h264::validate_pps(&pps))?;
                    pps_table.insert(pps.pic_parameter_set_id, pps);

                    copy_through(nal, script);
                    if let Some(completed) = au_builder.as_mut().and_then(|b| b.push_non_vcl(descriptor(nal))) {
                        let _ = completed;
                    }
                }
                NALUnitType::AccessUnitDelimiter => {
                    let mut reader = de_escape(nal.payload.as_ref())?;
                    if AccessUnitDelimiter::parse(&mut reader).is_err() {
                        self.report(sink, Diagnostic::new(Severity::ParserError, "h264.aud-malformed", "access_unit_delimiter_rbsp() failed to parse").at_offset(nal.offset))?;
                    }
                    copy_through(nal, script);
                    if let Some(completed) = au_builder.as_mut().and_then(|b| b.push_non_vcl(descriptor(nal))) {
                        let _ = completed;
                    }
                }
                NALUnitType::SEI => {
                    let active_sps = active_sps_id.and_then(|id| sps_table.get(&id));
                    let mut reader = de_escape(nal.payload.as_ref())?;
                    let _nal_header = reader.read_bits(8)?;
                    let messages = h264::parse_sei_rbsp(&mut reader, active_sps)?;
                    for message in &messages {
                        match message {
                            SeiMessage::BufferingPeriod(bp) => {
                                pending_initial_cpb_delay = bp.nal_hrd.first().or(bp.vcl_hrd.first()).map(|e| e.initial_cpb_removal_delay);
                            }
                            SeiMessage::PictureTiming(pt) => {
                                pending_pic_struct = pt.pic_struct;
                            }
                            SeiMessage::RecoveryPoint(rp) if rp.broken_link_flag => {
                                self.report(sink, Diagnostic::new(Severity::ComplianceError, "h264.sei-broken-link", "recovery_point SEI sets broken_link_flag").at_offset(nal.offset))?;
                            }
                            _ => {}
                        }
                    }

                    // force_rebuild_sei never recomputes buffering-period delay
                    // values (see DESIGN.md), so rebuilding and copying produce
                    // byte-identical output; both paths just copy the original.
                    if !self.options.discard_sei {
                        copy_through(nal, script);
                    }
                    if let Some(completed) = au_builder.as_mut().and_then(|b| b.push_non_vcl(descriptor(nal))) {
                        let _ = completed;
                    }
                }
                NALUnitType::NonIDRSliceLayerWithoutPartitioning | NALUnitType::IDRSliceLayerWithoutPartitioning => {
                    let pic_parameter_set_id = peek_pic_parameter_set_id(nal.payload.as_ref())?;
                    let pps = pps_table
                        .get(&pic_parameter_set_id)
                        .ok_or(EsCoreError::UndefinedParameterSet { what: "pps", id: pic_parameter_set_id, offset: nal.offset })?
                        .clone();
                    let sps = sps_table
                        .get(&pps.seq_parameter_set_id)
                        .ok_or(EsCoreError::UndefinedParameterSet { what: "sps", id: pps.seq_parameter_set_id, offset: nal.offset })?;

                    let reader = de_escape(nal.payload.as_ref())?;
                    let header = SliceHeader::parse(reader, sps, &pps)?;

                    let field = match (header.field_pic_flag, header.bottom_field_flag) {
                        (true, false) => Some(Field::Top),
                        (true, true) => Some(Field::Bottom),
                        (false, _) => None,
                    };
                    let pic_order_cnt = match sps.pic_order_cnt_type {
                        0 => poc_state
                            .compute_type0(
                                sps.max_pic_order_cnt_lsb().unwrap_or(1 << 8) as i64,
                                Type0Inputs {
                                    pic_order_cnt_lsb: header.pic_order_cnt_lsb.unwrap_or(0),
                                    delta_pic_order_cnt_bottom: header.delta_pic_order_cnt_bottom.unwrap_or(0),
                                    idr_pic_flag: header.idr_pic_flag(),
                                    prev_has_mmco5,
                                    field,
                                },
                            )
                            .pic_order_cnt,
                        1 => poc_state
                            .compute_type1(
                                sps.pic_order_cnt_type1.as_ref().expect("pic_order_cnt_type 1 without pic_order_cnt_type1 params"),
                                sps.max_frame_num(),
                                header.frame_num,
                                header.idr_pic_flag(),
                                prev_has_mmco5,
                                header.delta_pic_order_cnt.unwrap_or([0, 0]),
                                field,
                            )?
                            .pic_order_cnt,
                        _ => {
                            if header.idr_pic_flag() {
                                0
                            } else {
                                2 * header.frame_num as i64 - (header.nal_ref_idc == 0) as i64
                            }
                        }
                    };

                    prev_has_mmco5 = matches!(
                        &header.dec_ref_pic_marking,
                        Some(h264::DecRefPicMarking::NonIdr { operations }) if operations.iter().any(|op| op.is_reset_all())
                    );

                    let au_timing = timing.as_mut().map(|t| t.next(pic_order_cnt, header.field_pic_flag, prev_pic_struct));
                    prev_pic_struct = pending_pic_struct.take();

                    if let Some(hrd) = hrd.as_mut() {
                        let arrival = CpbArrival { length_in_bits: nal.payload.len() as u64 * 8, initial_cpb_removal_delay: pending_initial_cpb_delay.take() };
                        if !hrd.admit_au(arrival, sink) {
                            return Err(EsCoreError::ComplianceFailure("HRD verifier reported a fatal CPB violation".to_string()));
                        }
                        if let Some(marking) = &header.dec_ref_pic_marking {
                            let entry = DpbEntry {
                                frame_display_num,
                                frame_num: header.frame_num,
                                field_pic_flag: header.field_pic_flag,
                                bottom_field_flag: header.bottom_field_flag,
                                output_time: 0,
                                reference_usage: ReferenceUsage::ShortTerm,
                                long_term_frame_idx: None,
                            };
                            if !hrd.apply_marking(marking, entry, sink) {
                                return Err(EsCoreError::ComplianceFailure("HRD verifier reported a fatal DPB violation".to_string()));
                            }
                        }
                        hrd.remember_au(PreviousAuParameters {
                            frame_num: header.frame_num,
                            pic_size_in_mbs: header.pic_size_in_mbs(sps),
                            level_idc: sps.level_idc,
                            removal_time: 0,
                            pts: au_timing.map_or(0, |t| t.pts),
                            dts: au_timing.map_or(0, |t| t.dts),
                            initial_cpb_removal_delay: 0,
                            initial_cpb_removal_delay_offset: 0,
                        });
                    }
                    frame_display_num += 1;

                    copy_through(nal, script);

                    let builder = au_builder.get_or_insert_with(|| AccessUnitBuilder::new(sps.pic_order_cnt_type));
                    if let Some(_completed) = builder.push_vcl(descriptor(nal), &header) {
                        // The previous access unit just closed; its timing was
                        // already emitted for the slice that opened it below.
                    }

                    if let Some(au_timing) = au_timing {
                        script.emit(ScriptCommand::StartFrame { pts: au_timing.pts, dts: Some(au_timing.dts) });
                    }
                }
                _ => {
                    copy_through(nal, script);
                    if let Some(completed) = au_builder.as_mut().and_then(|b| b.push_non_vcl(descriptor(nal))) {
                        let _ = completed;
                    }
                }
            }
        }

        if let Some(builder) = au_builder.as_mut() {
            let _ = builder.finish();
        }

        script.emit(ScriptCommand::EndMarker);
        Ok(())
    }
}

fn descriptor(nal: &h264::NalUnit) -> h264::NalDescriptor {
    h264::NalDescriptor { nal_unit_type: nal.nal_unit_type, file_start_offset: nal.offset, byte_length: nal.payload.len() as u64 }
}
