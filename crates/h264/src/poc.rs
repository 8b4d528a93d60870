//! Picture order count computation (ISO/IEC-14496-10-2022 clause 8.2.1), restricted
//! to the two `pic_order_cnt_type` variants that can legally occur in a
//! Blu-ray-conformant stream (0 and 1 are both exercised by real authoring
//! tools; type 2 is handled by the caller as a derived-from-frame-num fallback
//! with no state carried across pictures).

use crate::sps::PicOrderCountType1;

/// Failure computing a picture order count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PocError {
    /// `pic_order_cnt_type == 1`'s full clause 8.2.1.2 derivation
    /// (`offset_for_top_to_bottom_field`/`offset_for_non_ref_pic` placement,
    /// `nal_ref_idc`-dependent `absFrameNum` adjustment) is not implemented.
    /// Rather than return a guessed value, this is reported so the caller can
    /// restart or reject the stream instead.
    #[error("pic_order_cnt_type == 1 POC computation is not supported")]
    UnsupportedPocType1,
}

/// The picture-order-count state carried across pictures of one coded video
/// sequence, reset at every IDR.
#[derive(Debug, Clone, Copy, Default)]
pub struct PicOrderCountState {
    prev_pic_order_cnt_msb: i64,
    prev_pic_order_cnt_lsb: i64,
    prev_frame_num: u32,
    prev_frame_num_offset: i64,
}

/// The two field order counts and the frame-level `PicOrderCnt` derived from
/// them (the minimum of the two for frame pictures, per 8.2.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PicOrderCnt {
    /// `TopFieldOrderCnt`.
    pub top_field_order_cnt: i64,
    /// `BottomFieldOrderCnt`.
    pub bottom_field_order_cnt: i64,
    /// `PicOrderCnt = min(TopFieldOrderCnt, BottomFieldOrderCnt)` for frame pictures,
    /// or the single field's order count for field pictures.
    pub pic_order_cnt: i64,
}

/// Inputs to [`PicOrderCountState::compute_type0`], drawn from the active
/// slice header.
#[derive(Debug, Clone, Copy)]
pub struct Type0Inputs {
    /// `pic_order_cnt_lsb`.
    pub pic_order_cnt_lsb: u32,
    /// `delta_pic_order_cnt_bottom`, 0 if absent (field pictures or
    /// `bottom_field_pic_order_in_frame_present_flag == 0`).
    pub delta_pic_order_cnt_bottom: i64,
    /// Whether this is an IDR picture (resets `prevPicOrderCntMsb/Lsb` to 0).
    pub idr_pic_flag: bool,
    /// Whether a `memory_management_control_operation == 5` was present on the
    /// *previous* reference picture (wraps `prevPicOrderCntMsb` back to 0).
    pub prev_has_mmco5: bool,
    /// Whether this is a field picture, and if so which field.
    pub field: Option<Field>,
}

/// Which field a field picture carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// `field_pic_flag == 1 && bottom_field_flag == 0`.
    Top,
    /// `field_pic_flag == 1 && bottom_field_flag == 1`.
    Bottom,
}

impl PicOrderCountState {
    /// `pic_order_cnt_type == 0` (8.2.1.1). `max_pic_order_cnt_lsb` is the
    /// active SPS's `2^(log2_max_pic_order_cnt_lsb_minus4 + 4)`.
    pub fn compute_type0(&mut self, max_pic_order_cnt_lsb: i64, inputs: Type0Inputs) -> PicOrderCnt {
        let (prev_msb, prev_lsb) = if inputs.idr_pic_flag {
            (0, 0)
        } else if inputs.prev_has_mmco5 {
            // 8.2.1.1: prevPicOrderCntMsb is 0, prevPicOrderCntLsb is the
            // previous top field order count (approximated here as the
            // latched lsb, since this state only tracks frame-level pictures).
            (0, self.prev_pic_order_cnt_lsb)
        } else {
            (self.prev_pic_order_cnt_msb, self.prev_pic_order_cnt_lsb)
        };

        let lsb = inputs.pic_order_cnt_lsb as i64;
        let pic_order_cnt_msb = if lsb < prev_lsb && (prev_lsb - lsb) >= max_pic_order_cnt_lsb / 2 {
            prev_msb + max_pic_order_cnt_lsb
        } else if lsb > prev_lsb && (lsb - prev_lsb) > max_pic_order_cnt_lsb / 2 {
            prev_msb - max_pic_order_cnt_lsb
        } else {
            prev_msb
        };

        self.prev_pic_order_cnt_msb = pic_order_cnt_msb;
        self.prev_pic_order_cnt_lsb = lsb;

        let top_field_order_cnt = pic_order_cnt_msb + lsb;
        match inputs.field {
            Some(Field::Top) => PicOrderCnt {
                top_field_order_cnt,
                bottom_field_order_cnt: top_field_order_cnt,
                pic_order_cnt: top_field_order_cnt,
            },
            Some(Field::Bottom) => {
                let bottom = top_field_order_cnt + inputs.delta_pic_order_cnt_bottom;
                PicOrderCnt { top_field_order_cnt, bottom_field_order_cnt: bottom, pic_order_cnt: bottom }
            }
            None => {
                let bottom_field_order_cnt = top_field_order_cnt + inputs.delta_pic_order_cnt_bottom;
                PicOrderCnt {
                    top_field_order_cnt,
                    bottom_field_order_cnt,
                    pic_order_cnt: top_field_order_cnt.min(bottom_field_order_cnt),
                }
            }
        }
    }

    /// `pic_order_cnt_type == 1` (8.2.1.2) is not implemented; see
    /// [`PocError::UnsupportedPocType1`]. The parameters are accepted (rather
    /// than deleted) so the call site at every future attempt to implement
    /// this reads exactly like [`Self::compute_type0`]'s.
    #[allow(unused_variables, clippy::too_many_arguments)]
    pub fn compute_type1(
        &mut self,
        poc1: &PicOrderCountType1,
        max_frame_num: u32,
        frame_num: u32,
        idr_pic_flag: bool,
        prev_has_mmco5: bool,
        delta_pic_order_cnt: [i64; 2],
        field: Option<Field>,
    ) -> Result<PicOrderCnt, PocError> {
        Err(PocError::UnsupportedPocType1)
    }
}
