//! The HDMV buffer model: per-object decode/transfer durations, epoch
//! initialization timing, the Decoded Object Buffer size check, and
//! `process_epoch_timing`'s force-retiming DTS/PTS assignment (§4.4.5/§4.4.6).

use diagnostics::{Diagnostic, Severity};

use crate::epoch::DisplaySet;
use crate::segment::SegmentType;

/// `DB_size(IGS)`, in bytes (§4.4.5).
pub const DB_SIZE_IGS: u64 = 16 * 1024 * 1024;
/// `DB_size(PGS)`, in bytes (§4.4.5).
pub const DB_SIZE_PGS: u64 = 4 * 1024 * 1024;

/// One segment's reconstructed timing, in 90 kHz ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentTiming {
    /// Decode timestamp, when distinct from `pts` (always present for
    /// ODS/PCS/WDS/ICS per §6.4).
    pub dts: u64,
    /// Presentation timestamp.
    pub pts: u64,
}

/// `DECODE_DURATION(ODS_i)`, in 90 kHz ticks. Zero for an empty object.
///
/// IGS divides by 800, PGS by 1600 — the same pixel-rate constant scaled for
/// PGS's lighter subtitle-only decode path.
pub fn decode_duration(object_area: u64, stream_type: crate::epoch::HdmvStreamType) -> u64 {
    if object_area == 0 {
        return 0;
    }
    let divisor = match stream_type {
        crate::epoch::HdmvStreamType::Igs => 800,
        crate::epoch::HdmvStreamType::Pgs => 1600,
    };
    (9 * object_area).div_ceil(divisor)
}

/// `TRANSFER_DURATION(ODS_i) = 9 * DECODE_DURATION(ODS_i)`.
pub fn transfer_duration(decode_duration: u64) -> u64 {
    9 * decode_duration
}

/// `PLANE_CLEAR_TIME = ceil(9 * video_width * video_height / 1600)`.
pub fn plane_clear_time(video_area: u64) -> u64 {
    (9 * video_area).div_ceil(1600)
}

/// The per-epoch buffer-model quantities computed from a DS's object list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EpochBufferModel {
    /// Sum of every object's `DECODE_DURATION` plus every non-last object's
    /// `TRANSFER_DURATION`.
    pub epoch_decoding_duration: u64,
    /// `ceil(9 * video_width * video_height / 1600)`.
    pub plane_clear_time: u64,
    /// `max(epoch_decoding_duration, plane_clear_time)`.
    pub initialization_duration: u64,
}

/// Computes the epoch buffer model for one DS's objects, in declaration order.
pub fn compute_buffer_model(object_areas: &[u64], video_area: u64, stream_type: crate::epoch::HdmvStreamType) -> EpochBufferModel {
    let durations: Vec<u64> = object_areas.iter().map(|&area| decode_duration(area, stream_type)).collect();
    let mut epoch_decoding_duration: u64 = durations.iter().sum();
    if let Some((_, rest)) = durations.split_last() {
        epoch_decoding_duration += rest.iter().map(|&d| transfer_duration(d)).sum::<u64>();
    }
    let plane_clear = plane_clear_time(video_area);
    EpochBufferModel {
        epoch_decoding_duration,
        plane_clear_time: plane_clear,
        initialization_duration: epoch_decoding_duration.max(plane_clear),
    }
}

/// Checks the Decoded Object Buffer occupancy for one DS against `DB_size`
/// for its stream type. Returns `None` when within bounds, else a fatal
/// diagnostic (§4.4.5: overflow is fatal; the Coded Object Buffer size is
/// informational only and is not checked here).
pub fn check_decoded_object_buffer(ds: &DisplaySet, stream_type: crate::epoch::HdmvStreamType) -> Option<Diagnostic> {
    let total: u64 = ds.ods.iter().map(|ods| ods.area()).sum();
    let limit = match stream_type {
        crate::epoch::HdmvStreamType::Igs => DB_SIZE_IGS,
        crate::epoch::HdmvStreamType::Pgs => DB_SIZE_PGS,
    };
    if total > limit {
        Some(Diagnostic::new(
            Severity::ParserError,
            "hdmv.dob.overflow",
            format!("decoded object buffer occupancy {total} exceeds {limit} bytes"),
        ))
    } else {
        None
    }
}

/// Force-retiming assignment of DTS/PTS to every segment in a DS, per
/// §4.4.6: ICS gets `{0, INITIALIZATION_DURATION}`, PDS gets `{0, 0}`, each
/// ODS_i is chained by its predecessor's decode+transfer duration, and END
/// mirrors the ICS's PTS.
///
/// `segments` is the DS's segments in stream order, paired with the pixel
/// area of each ODS (ignored for non-ODS entries).
pub fn force_retime_display_set(
    segments: &[(SegmentType, u64)],
    video_area: u64,
    stream_type: crate::epoch::HdmvStreamType,
) -> Vec<SegmentTiming> {
    let object_areas: Vec<u64> = segments.iter().filter(|(t, _)| *t == SegmentType::Ods).map(|(_, area)| *area).collect();
    let model = compute_buffer_model(&object_areas, video_area, stream_type);

    let mut ods_seen = 0usize;
    let mut ods_dts = 0u64;
    let mut timings = Vec::with_capacity(segments.len());

    for (segment_type, area) in segments {
        let timing = match segment_type {
            SegmentType::Ics => SegmentTiming { dts: 0, pts: model.initialization_duration },
            SegmentType::Pds => SegmentTiming { dts: 0, pts: 0 },
            SegmentType::Ods => {
                let dts = if ods_seen == 0 { 0 } else { ods_dts };
                let dd = decode_duration(*area, stream_type);
                let td = transfer_duration(dd);
                let pts = dts + dd;
                ods_dts = dts + dd + td;
                ods_seen += 1;
                SegmentTiming { dts, pts }
            }
            SegmentType::Pcs | SegmentType::Wds => SegmentTiming { dts: 0, pts: 0 },
            SegmentType::End => SegmentTiming { dts: model.initialization_duration, pts: model.initialization_duration },
        };
        timings.push(timing);
    }

    timings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epoch::HdmvStreamType;

    // S4 from §8: one epoch, ICS + two ODS (1280x720, 640x360), video 1920x1080.
    #[test]
    fn igs_timing_scenario_s4() {
        let areas = [1280u64 * 720, 640 * 360];
        let model = compute_buffer_model(&areas, 1920 * 1080, HdmvStreamType::Igs);
        assert_eq!(decode_duration(areas[0], HdmvStreamType::Igs), 10368);
        assert_eq!(decode_duration(areas[1], HdmvStreamType::Igs), 2592);
        assert_eq!(transfer_duration(10368), 93312);
        assert_eq!(model.epoch_decoding_duration, 10368 + 93312 + 2592);
        assert_eq!(model.plane_clear_time, 11664);
        assert_eq!(model.initialization_duration, 106272);
    }

    #[test]
    fn empty_object_has_zero_decode_duration() {
        assert_eq!(decode_duration(0, HdmvStreamType::Pgs), 0);
    }

    #[test]
    fn force_retiming_chains_ods_and_mirrors_ics_pts_on_end() {
        let segments = [
            (SegmentType::Ics, 0),
            (SegmentType::Pds, 0),
            (SegmentType::Ods, 1280 * 720),
            (SegmentType::Ods, 640 * 360),
            (SegmentType::End, 0),
        ];
        let timings = force_retime_display_set(&segments, 1920 * 1080, HdmvStreamType::Igs);
        let ics = timings[0];
        let end = timings[4];
        assert_eq!(ics.pts, 106272);
        assert_eq!(end.dts, ics.pts);
        assert_eq!(end.pts, ics.pts);
        // ODS_1's DTS starts at 0; ODS_2's DTS follows ODS_1's decode+transfer.
        assert_eq!(timings[2].dts, 0);
        assert_eq!(timings[3].dts, 10368 + 93312);
    }

    #[test]
    fn decoded_object_buffer_overflow_is_fatal() {
        let ds = DisplaySet {
            ods: vec![crate::object::ObjectDefinition {
                object_id: 0,
                object_version_number: 0,
                object_width: 5000,
                object_height: 5000,
                data: bytes::Bytes::new(),
            }],
            ..Default::default()
        };
        let diag = check_decoded_object_buffer(&ds, HdmvStreamType::Pgs);
        assert!(diag.is_some());
    }
}
