use crate::PicStruct;

/// The system clock frequency DTS/PTS are expressed against (the Blu-ray
/// 27 MHz mux clock).
pub const MAIN_CLOCK_27MHZ: u64 = 27_000_000;

/// One access unit's reconstructed decode/presentation timestamps, both in
/// 27 MHz ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessUnitTiming {
    /// `DTS`.
    pub dts: i64,
    /// `PTS`.
    pub pts: i64,
}

/// Reconstructs DTS/PTS across an access-unit stream, one AU at a time.
///
/// `frameDuration = MAIN_CLOCK_27MHz / frame_rate`; each AU's `DTS` advances
/// by an increment chosen from the *previous* AU's `pic_struct` (field-paired
/// and frame-doubled/tripled pictures occupy more than one frame duration in
/// decode order), and `PTS` is recovered from the picture order count with a
/// fixed reordering depth.
#[derive(Debug, Clone, Copy)]
pub struct TimingReconstructor {
    frame_duration: u64,
    nb_pics: u32,
    last_dts: Option<i64>,
}

impl TimingReconstructor {
    /// Creates a reconstructor for a stream running at `frame_rate` frames
    /// per second, reordering up to `nb_pics` pictures (typically the active
    /// SPS's `max_num_reorder_frames`, or 1 if unknown).
    pub fn new(frame_rate: f64, nb_pics: u32) -> Self {
        let frame_duration = (MAIN_CLOCK_27MHZ as f64 / frame_rate).round() as u64;
        Self { frame_duration, nb_pics: nb_pics.max(1), last_dts: None }
    }

    /// `frameDuration`, in 27 MHz ticks.
    pub fn frame_duration(&self) -> u64 {
        self.frame_duration
    }

    fn dts_increment(&self, prev_pic_struct: Option<PicStruct>) -> u64 {
        match prev_pic_struct {
            Some(PicStruct::TopBottomTop) | Some(PicStruct::BottomTopBottom) => self.frame_duration * 3 / 2,
            Some(PicStruct::FrameDoubling) => self.frame_duration * 2,
            Some(PicStruct::FrameTripling) => self.frame_duration * 3,
            _ => self.frame_duration,
        }
    }

    /// Advances the clock by one access unit and returns its `{DTS, PTS}`.
    ///
    /// `pic_order_cnt` is the AU's `PicOrderCnt`; `field_pic` selects the
    /// `/1` or `/2` divisor; `prev_pic_struct` is the *previous* AU's
    /// `pic_struct`, or `None` for the first AU or when no picture-timing SEI
    /// was present.
    pub fn next(&mut self, pic_order_cnt: i64, field_pic: bool, prev_pic_struct: Option<PicStruct>) -> AccessUnitTiming {
        let dts = self.last_dts.unwrap_or(0) + self.dts_increment(prev_pic_struct) as i64;
        self.last_dts = Some(dts);

        let divisor = if field_pic { 2 } else { 1 };
        let pts = dts + (pic_order_cnt / divisor - self.nb_pics as i64 + 1) * self.frame_duration as i64;

        AccessUnitTiming { dts, pts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_au_advances_by_one_frame_duration() {
        let mut reconstructor = TimingReconstructor::new(25.0, 1);
        let timing = reconstructor.next(0, false, None);
        assert_eq!(timing.dts, reconstructor.frame_duration() as i64);
        assert_eq!(timing.pts, timing.dts);
    }

    #[test]
    fn frame_doubling_advances_dts_by_two_frame_durations() {
        let mut reconstructor = TimingReconstructor::new(25.0, 1);
        let _ = reconstructor.next(0, false, None);
        let timing = reconstructor.next(2, false, Some(PicStruct::FrameDoubling));
        assert_eq!(timing.dts, 3 * reconstructor.frame_duration() as i64);
    }

    #[test]
    fn field_pictures_halve_the_poc_contribution_to_pts() {
        let mut reconstructor = TimingReconstructor::new(25.0, 1);
        let timing = reconstructor.next(2, true, None);
        assert_eq!(timing.pts, timing.dts + (1 - 1 + 1) * reconstructor.frame_duration() as i64);
    }
}
