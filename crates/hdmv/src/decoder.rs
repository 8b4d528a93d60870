//! The single-pass driver tying segment framing (`segment.rs`), sequence
//! reassembly (`sequence.rs`), per-segment payload parsing, Display Set
//! validation (`epoch.rs`), and timing reconstruction (`timing.rs`) together:
//! the HDMV half of §2's data-flow diagram, from raw bytes to a
//! [`script::ScriptCommand`] stream.

use bitstream::BitReader;
use bytes::Bytes;
use diagnostics::{Diagnostic, DiagnosticSink, Severity};
use script::{ScriptCommand, ScriptSink};

use crate::composition::PresentationComposition;
use crate::epoch::{check_and_build_display_set, DisplaySet, EpochDefinitions, HdmvStreamType, ReferenceOrdering};
use crate::interactive_composition::InteractiveComposition;
use crate::object::{split_fragment, FirstFragmentDimensions, ObjectDefinition, ObjectFragmentHeader};
use crate::palette::PaletteDefinition;
use crate::segment::{scan_segments, FramingError, RawSegment, SegmentType};
use crate::sequence::{SequenceDescriptor, SequenceTracker};
use crate::timing::{check_decoded_object_buffer, force_retime_display_set, SegmentTiming};
use crate::video_descriptor::VideoDescriptor;
use crate::window::WindowDefinition;

/// 90 kHz -> 27 MHz mux clock conversion factor (§4.4.7).
const TICKS_90K_TO_27M: i64 = 300;

/// Options controlling the HDMV decode driver (§6.5's `hdmv.*` options).
#[derive(Debug, Clone, Copy)]
pub struct HdmvOptions {
    /// Base PTS offset applied to every reconstructed timestamp (`hdmv.initial_timestamp`).
    pub initial_timestamp: i64,
    /// Ignore MNU-supplied PTS/DTS and always recompute from the buffer model.
    pub force_retiming: bool,
    /// How `check_and_build_display_set` orders its PDS/ODS link queue.
    pub ordering: ReferenceOrdering,
}

impl Default for HdmvOptions {
    fn default() -> Self {
        Self { initial_timestamp: 0, force_retiming: false, ordering: ReferenceOrdering::AsReferenced }
    }
}

/// Failures that can abort the HDMV decode driver outright (parser-level,
/// not compliance-level: those are reported through `sink` instead).
#[derive(Debug, thiserror::Error)]
pub enum HdmvDecodeError {
    /// Segment/MNU framing could not be scanned.
    #[error(transparent)]
    Framing(#[from] FramingError),
    /// A segment payload could not be parsed as its declared type.
    #[error("failed to parse {segment_type:?} payload at offset {offset}: {source}")]
    PayloadParse {
        /// The segment type being parsed.
        segment_type: SegmentType,
        /// Offset of the segment's header byte.
        offset: u64,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// One physical segment pending emission, tagged with the logical timing
/// group it belongs to (all fragments of one reassembled ODS/ICS share a
/// group so they share one DTS/PTS, per §4.4.6).
struct PendingSegment {
    raw: RawSegment,
    group: usize,
}

/// Accumulates the current Display Set's raw segments, reassembly state, and
/// decoded payloads between two END segments.
#[derive(Default)]
struct DsAccumulator {
    ds: DisplaySet,
    pending: Vec<PendingSegment>,
    ods_tracker: SequenceTracker,
    ods_pending_header: Option<(ObjectFragmentHeader, FirstFragmentDimensions)>,
    ics_tracker: SequenceTracker,
    group_kinds: Vec<SegmentType>,
}

impl DsAccumulator {
    fn group_for(&mut self, segment_type: SegmentType, is_new_group: bool) -> usize {
        if is_new_group || self.group_kinds.is_empty() || *self.group_kinds.last().unwrap() != segment_type {
            self.group_kinds.push(segment_type);
        }
        self.group_kinds.len() - 1
    }
}

/// Decodes one HDMV (IGS or PGS) elementary stream in full: scans segment
/// framing, reassembles fragmented sequences, validates every Display Set,
/// reconstructs timing, and emits the resulting script commands.
///
/// `video_area_hint` seeds the video plane area used by `PLANE_CLEAR_TIME`
/// before the first PCS/ICS establishes the real `video_descriptor()` (only
/// matters for a malformed stream whose first DS carries no composition).
pub fn decode_hdmv_stream(
    data: &Bytes,
    options: &HdmvOptions,
    sink: &mut dyn DiagnosticSink,
    script: &mut dyn ScriptSink,
) -> Result<(), HdmvDecodeError> {
    let (raw_segments, mnu_framed) = scan_segments(data)?;
    // Raw (non-MNU) streams carry no relative timing of their own, so the
    // buffer model always supplies it; MNU-framed streams carry their own
    // DTS/PTS and are only force-retimed when explicitly requested.
    let force_retiming = options.force_retiming || !mnu_framed;

    script.emit(ScriptCommand::SetSourceFile { path: "hdmv.es".to_string() });

    let mut epoch = EpochDefinitions::default();
    let mut acc = DsAccumulator::default();
    let mut stream_type: Option<HdmvStreamType> = None;
    let mut reference_clock: Option<u64> = None;
    let mut last_video = VideoDescriptor { video_width: 0, video_height: 0, frame_rate_id: 0 };

    for raw in raw_segments {
        match raw.segment_type {
            SegmentType::Pds => {
                let payload = PaletteDefinition::parse(&raw.payload)
                    .map_err(|source| HdmvDecodeError::PayloadParse { segment_type: raw.segment_type, offset: raw.input_file_offset, source })?;
                acc.ds.pds.push(payload);
                let group = acc.group_for(SegmentType::Pds, true);
                acc.pending.push(PendingSegment { raw, group });
            }
            SegmentType::Pcs => {
                stream_type.get_or_insert(HdmvStreamType::Pgs);
                let mut reader = BitReader::new_from_slice(raw.payload.clone());
                let payload = PresentationComposition::parse(&mut reader)
                    .map_err(|source| HdmvDecodeError::PayloadParse { segment_type: raw.segment_type, offset: raw.input_file_offset, source })?;
                last_video = payload.video_descriptor;
                acc.ds.pcs = Some(payload);
                let group = acc.group_for(SegmentType::Pcs, true);
                acc.pending.push(PendingSegment { raw, group });
            }
            SegmentType::Wds => {
                let mut reader = BitReader::new_from_slice(raw.payload.clone());
                let payload = WindowDefinition::parse(&mut reader)
                    .map_err(|source| HdmvDecodeError::PayloadParse { segment_type: raw.segment_type, offset: raw.input_file_offset, source })?;
                acc.ds.wds = Some(payload);
                let group = acc.group_for(SegmentType::Wds, true);
                acc.pending.push(PendingSegment { raw, group });
            }
            SegmentType::Ics => {
                stream_type.get_or_insert(HdmvStreamType::Igs);
                if raw.payload.is_empty() {
                    return Err(HdmvDecodeError::PayloadParse {
                        segment_type: raw.segment_type,
                        offset: raw.input_file_offset,
                        source: std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "empty ICS fragment"),
                    });
                }
                let descriptor = SequenceDescriptor::from_byte(raw.payload[0]);
                let is_first = descriptor.first_in_sequence;
                let fragment = raw.payload.slice(1..);
                let completed = acc.ics_tracker.push(descriptor, &fragment).map_err(|source| HdmvDecodeError::PayloadParse {
                    segment_type: raw.segment_type,
                    offset: raw.input_file_offset,
                    source: std::io::Error::new(std::io::ErrorKind::InvalidData, source.to_string()),
                })?;
                let group = acc.group_for(SegmentType::Ics, is_first);
                acc.pending.push(PendingSegment { raw, group });
                if let Some(full) = completed {
                    let mut reader = BitReader::new_from_slice(full);
                    let ics = InteractiveComposition::parse(&mut reader).map_err(|source| HdmvDecodeError::PayloadParse {
                        segment_type: SegmentType::Ics,
                        offset: 0,
                        source,
                    })?;
                    last_video = ics.video_descriptor;
                    acc.ds.ics = Some(ics);
                }
            }
            SegmentType::Ods => {
                let (header, dims, fragment) = split_fragment(&raw.payload).map_err(|source| HdmvDecodeError::PayloadParse {
                    segment_type: raw.segment_type,
                    offset: raw.input_file_offset,
                    source,
                })?;
                let is_first = header.sequence_descriptor.first_in_sequence;
                if let Some(dims) = dims {
                    acc.ods_pending_header = Some((header, dims));
                }
                let completed = acc.ods_tracker.push(header.sequence_descriptor, &fragment).map_err(|source| HdmvDecodeError::PayloadParse {
                    segment_type: raw.segment_type,
                    offset: raw.input_file_offset,
                    source: std::io::Error::new(std::io::ErrorKind::InvalidData, source.to_string()),
                })?;
                let group = acc.group_for(SegmentType::Ods, is_first);
                acc.pending.push(PendingSegment { raw, group });
                if let Some(full) = completed {
                    let Some((header, dims)) = acc.ods_pending_header.take() else {
                        return Err(HdmvDecodeError::PayloadParse {
                            segment_type: SegmentType::Ods,
                            offset: 0,
                            source: std::io::Error::new(std::io::ErrorKind::InvalidData, "ODS sequence completed with no first-fragment dimensions"),
                        });
                    };
                    acc.ds.ods.push(ObjectDefinition::new(header, dims, full));
                }
            }
            SegmentType::End => {
                acc.ds.end_count += 1;
                let group = acc.group_for(SegmentType::End, true);
                acc.pending.push(PendingSegment { raw, group });

                let current_stream_type = stream_type.unwrap_or(HdmvStreamType::Pgs);
                let outcome = check_and_build_display_set(&mut epoch, &acc.ds, options.ordering, sink);
                if !outcome.ok {
                    sink.report(Diagnostic::new(Severity::ComplianceError, "hdmv.ds.invalid", "display set failed reference-closure validation"));
                }
                if let Some(diag) = check_decoded_object_buffer(&acc.ds, current_stream_type) {
                    sink.report(diag);
                }

                emit_display_set(&acc, current_stream_type, last_video, force_retiming, options, &mut reference_clock, script);

                acc = DsAccumulator::default();
            }
        }
    }

    script.emit(ScriptCommand::EndMarker);
    Ok(())
}

fn emit_display_set(
    acc: &DsAccumulator,
    stream_type: HdmvStreamType,
    video: VideoDescriptor,
    force_retiming: bool,
    options: &HdmvOptions,
    reference_clock: &mut Option<u64>,
    script: &mut dyn ScriptSink,
) {
    let group_timings = if force_retiming {
        let mut ods_areas = acc.ds.ods.iter().map(|ods| ods.area());
        let group_entries: Vec<(SegmentType, u64)> = acc
            .group_kinds
            .iter()
            .map(|&kind| {
                let area = if kind == SegmentType::Ods { ods_areas.next().unwrap_or(0) } else { 0 };
                (kind, area)
            })
            .collect();
        force_retime_display_set(&group_entries, video.area(), stream_type)
    } else {
        acc.group_kinds
            .iter()
            .map(|_| SegmentTiming { dts: 0, pts: 0 })
            .collect()
    };

    for pending in &acc.pending {
        let timing = if force_retiming {
            group_timings[pending.group]
        } else if let Some(mnu) = pending.raw.mnu {
            let reference = *reference_clock.get_or_insert(if mnu.dts != 0 { mnu.dts as u64 } else { mnu.pts as u64 });
            SegmentTiming {
                dts: (mnu.dts as u64).saturating_sub(reference),
                pts: (mnu.pts as u64).saturating_sub(reference),
            }
        } else {
            group_timings[pending.group]
        };

        let dts_27mhz = timing.dts as i64 * TICKS_90K_TO_27M + options.initial_timestamp;
        let pts_27mhz = timing.pts as i64 * TICKS_90K_TO_27M + options.initial_timestamp;

        script.emit(ScriptCommand::StartFrame { pts: pts_27mhz, dts: Some(dts_27mhz) });
        script.emit(ScriptCommand::CopyPesPayload {
            src_idx: 0,
            dst_offset: pending.raw.input_file_offset,
            src_offset: pending.raw.input_file_offset,
            length: pending.raw.segment_length as u64 + 3,
        });
    }
}
