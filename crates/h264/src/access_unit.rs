use crate::{NALUnitType, SliceHeader};

/// One NAL unit belonging to an access unit, as positioned in the source
/// elementary stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NalDescriptor {
    /// The NAL unit's type.
    pub nal_unit_type: NALUnitType,
    /// Byte offset of the NAL unit's start code (or first byte, if no start
    /// code precedes it) in the source file.
    pub file_start_offset: u64,
    /// Length in bytes of the NAL unit, start code excluded.
    pub byte_length: u64,
}

/// The ordered set of NAL units making up one coded picture, plus whichever
/// non-VCL NALs (AUD, SPS, PPS, SEI, ...) preceded its first VCL NAL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccessUnit {
    /// Every NAL unit belonging to this access unit, in stream order.
    pub nal_units: Vec<NalDescriptor>,
    /// Index into `nal_units` of the first VCL NAL (the primary coded picture).
    /// `None` for an access unit that, so far, holds only non-VCL NALs.
    pub first_vcl_nal_index: Option<usize>,
}

impl AccessUnit {
    fn push(&mut self, descriptor: NalDescriptor) {
        self.nal_units.push(descriptor);
    }

    fn push_vcl(&mut self, descriptor: NalDescriptor) {
        if self.first_vcl_nal_index.is_none() {
            self.first_vcl_nal_index = Some(self.nal_units.len());
        }
        self.nal_units.push(descriptor);
    }

    fn is_empty(&self) -> bool {
        self.nal_units.is_empty()
    }
}

/// Non-VCL NAL unit types that unconditionally start a new access unit when
/// one is already open (`4.2`'s "Non-VCL NALs of types AUD, SPS, PPS, SEI,
/// prefix, or 14..18 additionally start a new AU").
fn always_starts_new_au(nal_unit_type: NALUnitType) -> bool {
    matches!(
        nal_unit_type,
        NALUnitType::AccessUnitDelimiter
            | NALUnitType::SPS
            | NALUnitType::PPS
            | NALUnitType::SEI
            | NALUnitType::PrefixNalUnit
            | NALUnitType::SubsetSPS
            | NALUnitType::DepthParameterSet
            | NALUnitType::Reserved1
            | NALUnitType::Reserved2
    )
}

/// Whether `current`'s slice header begins a new primary coded picture
/// relative to `prev`, per the field-by-field comparison in clause 7.4.1.2.4.
pub fn slice_starts_new_access_unit(prev: &SliceHeader, current: &SliceHeader, pic_order_cnt_type: u8) -> bool {
    if prev.frame_num != current.frame_num {
        return true;
    }
    if prev.pic_parameter_set_id != current.pic_parameter_set_id {
        return true;
    }
    if prev.field_pic_flag != current.field_pic_flag {
        return true;
    }
    if current.field_pic_flag && prev.bottom_field_flag != current.bottom_field_flag {
        return true;
    }
    if (prev.nal_ref_idc == 0) != (current.nal_ref_idc == 0) {
        return true;
    }
    if prev.idr_pic_flag() != current.idr_pic_flag() {
        return true;
    }
    if current.idr_pic_flag() && prev.idr_pic_id != current.idr_pic_id {
        return true;
    }
    match pic_order_cnt_type {
        0 => {
            if prev.pic_order_cnt_lsb != current.pic_order_cnt_lsb {
                return true;
            }
            if prev.delta_pic_order_cnt_bottom != current.delta_pic_order_cnt_bottom {
                return true;
            }
        }
        1 => {
            if prev.delta_pic_order_cnt != current.delta_pic_order_cnt {
                return true;
            }
        }
        _ => {}
    }
    false
}

/// Accumulates NAL unit descriptors into [`AccessUnit`]s, driven one NAL at a
/// time by the caller as it walks the bitstream.
///
/// Grounded on the teacher's incremental accumulator style: the builder never
/// looks ahead, it only ever compares the incoming NAL against state latched
/// from the previous one.
#[derive(Debug, Default)]
pub struct AccessUnitBuilder {
    current: AccessUnit,
    last_vcl_header: Option<SliceHeader>,
    pic_order_cnt_type: u8,
}

impl AccessUnitBuilder {
    /// Creates a builder for a coded video sequence with the given
    /// `pic_order_cnt_type` (from the active SPS).
    pub fn new(pic_order_cnt_type: u8) -> Self {
        Self { current: AccessUnit::default(), last_vcl_header: None, pic_order_cnt_type }
    }

    /// Feeds one non-VCL NAL unit. Returns the just-completed access unit if
    /// this NAL starts a new one.
    pub fn push_non_vcl(&mut self, descriptor: NalDescriptor) -> Option<AccessUnit> {
        let completed = if always_starts_new_au(descriptor.nal_unit_type) && self.current.first_vcl_nal_index.is_some() {
            self.take_current()
        } else {
            None
        };
        self.current.push(descriptor);
        completed
    }

    /// Feeds one VCL (coded slice) NAL unit along with its parsed slice
    /// header. Returns the just-completed access unit if this slice starts a
    /// new one.
    pub fn push_vcl(&mut self, descriptor: NalDescriptor, header: &SliceHeader) -> Option<AccessUnit> {
        let starts_new = match &self.last_vcl_header {
            Some(prev) => slice_starts_new_access_unit(prev, header, self.pic_order_cnt_type),
            None => false,
        };
        let completed = if starts_new { self.take_current() } else { None };
        self.current.push_vcl(descriptor);
        self.last_vcl_header = Some(header.clone());
        completed
    }

    /// Flushes any in-progress access unit at end of stream.
    pub fn finish(&mut self) -> Option<AccessUnit> {
        self.take_current()
    }

    fn take_current(&mut self) -> Option<AccessUnit> {
        if self.current.is_empty() {
            None
        } else {
            self.last_vcl_header = None;
            Some(std::mem::take(&mut self.current))
        }
    }
}
