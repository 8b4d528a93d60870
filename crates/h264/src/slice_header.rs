use std::io;

use bitstream::{BitReader, BitWriter};
use expgolomb::{BitReaderExpGolombExt, BitWriterExpGolombExt};

use crate::{DecRefPicMarking, NALUnitType, Pps, PredWeightTable, RefPicListModification, SliceType, Sps};

/// `slice_header()`.
/// ISO/IEC-14496-10-2022 - 7.3.3
///
/// Parsed against the active SPS/PPS rather than carrying its own copies of
/// their fields, matching how a real decoder's Parameters Handler looks them
/// up by id before entering the slice header.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceHeader {
    /// `nal_ref_idc` from the enclosing NAL header.
    pub nal_ref_idc: u8,
    /// `nal_unit_type` from the enclosing NAL header (1 or 5).
    pub nal_unit_type: NALUnitType,
    /// `first_mb_in_slice`.
    pub first_mb_in_slice: u64,
    /// `slice_type`, one of the 10 enumerated values (0..9).
    pub slice_type: SliceType,
    /// `pic_parameter_set_id`.
    pub pic_parameter_set_id: u64,
    /// `colour_plane_id`, present iff `separate_color_plane_flag`.
    pub colour_plane_id: Option<u8>,
    /// `frame_num`, width `log2_max_frame_num_minus4 + 4` bits.
    pub frame_num: u32,
    /// `field_pic_flag`, present iff `!frame_mbs_only_flag`.
    pub field_pic_flag: bool,
    /// `bottom_field_flag`, present iff `field_pic_flag`.
    pub bottom_field_flag: bool,
    /// `idr_pic_id`, present iff `IdrPicFlag`.
    pub idr_pic_id: Option<u64>,
    /// `pic_order_cnt_lsb`, present iff `pic_order_cnt_type == 0`.
    pub pic_order_cnt_lsb: Option<u32>,
    /// `delta_pic_order_cnt_bottom`, present iff `pic_order_cnt_type == 0` and
    /// `bottom_field_pic_order_in_frame_present_flag` and `!field_pic_flag`.
    pub delta_pic_order_cnt_bottom: Option<i64>,
    /// `delta_pic_order_cnt[0..2]`, present iff `pic_order_cnt_type == 1` and
    /// `!delta_pic_order_always_zero_flag`.
    pub delta_pic_order_cnt: Option<[i64; 2]>,
    /// `redundant_pic_cnt`, present iff PPS `redundant_pic_cnt_present_flag`.
    pub redundant_pic_cnt: Option<u64>,
    /// `direct_spatial_mv_pred_flag`, present iff this is a B slice.
    pub direct_spatial_mv_pred_flag: Option<bool>,
    /// `num_ref_idx_l0_active_minus1`, overridden from the PPS default iff
    /// `num_ref_idx_active_override_flag`.
    pub num_ref_idx_l0_active_minus1: u64,
    /// `num_ref_idx_l1_active_minus1`, only meaningful for B slices.
    pub num_ref_idx_l1_active_minus1: u64,
    /// `ref_pic_list_modification()` for list 0, empty list means not present.
    pub ref_pic_list_modification_l0: Vec<RefPicListModification>,
    /// `ref_pic_list_modification()` for list 1 (B slices only).
    pub ref_pic_list_modification_l1: Vec<RefPicListModification>,
    /// `pred_weight_table()`, present iff the PPS/slice-type combination requires it.
    pub pred_weight_table: Option<PredWeightTable>,
    /// `dec_ref_pic_marking()`, present iff `nal_ref_idc != 0`.
    pub dec_ref_pic_marking: Option<DecRefPicMarking>,
    /// `cabac_init_idc`, present iff CABAC and not an I/SI slice. `< 3`.
    pub cabac_init_idc: Option<u8>,
    /// `slice_qp_delta`.
    pub slice_qp_delta: i64,
    /// `(sp_for_switch_flag, slice_qs_delta)`, present iff this is an SP slice.
    pub sp_switch: Option<(bool, i64)>,
    /// `disable_deblocking_filter_idc`, present iff PPS `deblocking_filter_control_present_flag`. `< 3`.
    pub disable_deblocking_filter_idc: Option<u8>,
    /// `(slice_alpha_c0_offset_div2, slice_beta_offset_div2)`, present iff the
    /// filter isn't fully disabled by `disable_deblocking_filter_idc == 1`.
    pub deblocking_filter_offsets: Option<(i64, i64)>,
    /// `slice_group_change_cycle`, present iff the PPS uses a dynamic FMO map
    /// type (3..5) with more than one slice group.
    pub slice_group_change_cycle: Option<u64>,
}

impl SliceHeader {
    /// `IdrPicFlag = nal_unit_type == 5`.
    pub fn idr_pic_flag(&self) -> bool {
        self.nal_unit_type == NALUnitType::IDRSliceLayerWithoutPartitioning
    }

    /// `MbaffFrameFlag = mb_adaptive_frame_field_flag && !field_pic_flag`.
    pub fn mbaff_frame_flag(&self, sps: &Sps) -> bool {
        sps.mb_adaptive_frame_field_flag.unwrap_or(false) && !self.field_pic_flag
    }

    /// `PicHeightInMbs = FrameHeightInMbs / (1 + field_pic_flag)`.
    pub fn pic_height_in_mbs(&self, sps: &Sps) -> u64 {
        sps.frame_height_in_mbs() / (1 + self.field_pic_flag as u64)
    }

    /// `PicSizeInMbs = PicWidthInMbs * PicHeightInMbs`.
    pub fn pic_size_in_mbs(&self, sps: &Sps) -> u64 {
        sps.pic_width_in_mbs() * self.pic_height_in_mbs(sps)
    }

    /// Parses a `slice_header()`, including the enclosing 1-byte NAL header.
    /// `sps`/`pps` must be the ones the header's own `pic_parameter_set_id`/
    /// `seq_parameter_set_id` resolve to, looked up by the caller before
    /// parsing proceeds past `pic_parameter_set_id`.
    pub fn parse<T: io::Read>(mut bit_reader: BitReader<T>, sps: &Sps, pps: &Pps) -> io::Result<Self> {
        let bit_reader = &mut bit_reader;
        let forbidden_zero_bit = bit_reader.read_bit()?;
        if forbidden_zero_bit {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "forbidden_zero_bit must be 0"));
        }
        let nal_ref_idc = bit_reader.read_bits(2)? as u8;
        let nal_unit_type = NALUnitType::try_from(bit_reader.read_bits(5)? as u8)?;
        if !matches!(
            nal_unit_type,
            NALUnitType::NonIDRSliceLayerWithoutPartitioning | NALUnitType::IDRSliceLayerWithoutPartitioning
        ) {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "expected a coded slice NAL unit"));
        }

        let first_mb_in_slice = bit_reader.read_exp_golomb()?;
        let raw_slice_type = bit_reader.read_exp_golomb()?;
        let slice_type =
            SliceType::try_from(raw_slice_type).map_err(|v| io::Error::new(io::ErrorKind::InvalidData, format!("invalid slice_type {v}")))?;
        let pic_parameter_set_id = bit_reader.read_exp_golomb()?;

        let colour_plane_id = if sps.ext.as_ref().is_some_and(|ext| ext.separate_color_plane_flag) {
            Some(bit_reader.read_bits(2)? as u8)
        } else {
            None
        };

        let frame_num_bits = sps.log2_max_frame_num_minus4 as u8 + 4;
        let frame_num = bit_reader.read_bits(frame_num_bits)? as u32;

        let field_pic_flag = if !sps.frame_mbs_only_flag() { bit_reader.read_bit()? } else { false };
        let bottom_field_flag = if field_pic_flag { bit_reader.read_bit()? } else { false };

        let idr_pic_flag = nal_unit_type == NALUnitType::IDRSliceLayerWithoutPartitioning;
        let idr_pic_id = if idr_pic_flag { Some(bit_reader.read_exp_golomb()?) } else { None };

        let mut pic_order_cnt_lsb = None;
        let mut delta_pic_order_cnt_bottom = None;
        let mut delta_pic_order_cnt = None;
        match sps.pic_order_cnt_type {
            0 => {
                let lsb_bits = sps.log2_max_pic_order_cnt_lsb_minus4.unwrap_or(0) as u8 + 4;
                pic_order_cnt_lsb = Some(bit_reader.read_bits(lsb_bits)? as u32);
                if pps.bottom_field_pic_order_in_frame_present_flag && !field_pic_flag {
                    delta_pic_order_cnt_bottom = Some(bit_reader.read_signed_exp_golomb()?);
                }
            }
            1 => {
                let always_zero = sps.pic_order_cnt_type1.as_ref().is_some_and(|p| p.delta_pic_order_always_zero_flag);
                if !always_zero {
                    let mut delta = [0i64; 2];
                    delta[0] = bit_reader.read_signed_exp_golomb()?;
                    if pps.bottom_field_pic_order_in_frame_present_flag && !field_pic_flag {
                        delta[1] = bit_reader.read_signed_exp_golomb()?;
                    }
                    delta_pic_order_cnt = Some(delta);
                }
            }
            _ => {}
        }

        let redundant_pic_cnt = if pps.redundant_pic_cnt_present_flag { Some(bit_reader.read_exp_golomb()?) } else { None };

        let base_type = slice_type.base();
        let is_b = base_type == SliceType::B;
        let direct_spatial_mv_pred_flag = if is_b { Some(bit_reader.read_bit()?) } else { None };

        let is_p_sp = matches!(base_type, SliceType::P | SliceType::Sp);
        let mut num_ref_idx_l0_active_minus1 = pps.num_ref_idx_l0_default_active_minus1;
        let mut num_ref_idx_l1_active_minus1 = pps.num_ref_idx_l1_default_active_minus1;
        if is_p_sp || is_b {
            if bit_reader.read_bit()? {
                num_ref_idx_l0_active_minus1 = bit_reader.read_exp_golomb()?;
                if is_b {
                    num_ref_idx_l1_active_minus1 = bit_reader.read_exp_golomb()?;
                }
            }
        }

        let is_i_si = matches!(base_type, SliceType::I | SliceType::Si);
        let ref_pic_list_modification_l0 = if !is_i_si && bit_reader.read_bit()? { RefPicListModification::parse_list(bit_reader)? } else { Vec::new() };
        let ref_pic_list_modification_l1 = if is_b && bit_reader.read_bit()? { RefPicListModification::parse_list(bit_reader)? } else { Vec::new() };

        let needs_pred_weight_table = (pps.weighted_pred_flag && is_p_sp) || (pps.weighted_bipred_idc == 1 && is_b);
        let pred_weight_table = if needs_pred_weight_table {
            Some(PredWeightTable::parse(
                bit_reader,
                num_ref_idx_l0_active_minus1 + 1,
                num_ref_idx_l1_active_minus1 + 1,
                is_b,
                sps.chroma_array_type(),
            )?)
        } else {
            None
        };

        let dec_ref_pic_marking = if nal_ref_idc != 0 { Some(DecRefPicMarking::parse(bit_reader, idr_pic_flag)?) } else { None };

        let cabac_init_idc = if pps.entropy_coding_mode_flag && !is_i_si {
            let idc = bit_reader.read_exp_golomb()? as u8;
            if idc >= 3 {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "cabac_init_idc must be < 3"));
            }
            Some(idc)
        } else {
            None
        };

        let slice_qp_delta = bit_reader.read_signed_exp_golomb()?;

        let sp_switch = if matches!(base_type, SliceType::Sp | SliceType::Si) {
            let sp_for_switch_flag = if base_type == SliceType::Sp { bit_reader.read_bit()? } else { false };
            let qs_delta = bit_reader.read_signed_exp_golomb()?;
            Some((sp_for_switch_flag, qs_delta))
        } else {
            None
        };

        let disable_deblocking_filter_idc = if pps.deblocking_filter_control_present_flag {
            let idc = bit_reader.read_exp_golomb()? as u8;
            if idc >= 3 {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "disable_deblocking_filter_idc must be < 3"));
            }
            Some(idc)
        } else {
            None
        };
        let deblocking_filter_offsets = if disable_deblocking_filter_idc != Some(1) {
            Some((bit_reader.read_signed_exp_golomb()?, bit_reader.read_signed_exp_golomb()?))
        } else {
            None
        };

        let slice_group_change_cycle = if pps.num_slice_groups_minus1 > 0 {
            let map_type = pps.slice_group_info.as_ref().map(|g| g.slice_group_map_type as u64);
            if matches!(map_type, Some(3) | Some(4) | Some(5)) {
                let pic_size_in_map_units = sps.pic_width_in_mbs() * sps.pic_height_in_map_units();
                let change_rate = pps
                    .slice_group_info
                    .as_ref()
                    .and_then(|g| g.slice_group_change_rate_minus1)
                    .unwrap_or(0)
                    + 1;
                let max_value = pic_size_in_map_units.div_ceil(change_rate) + 1;
                let bits = 64 - (max_value.max(1) - 1).leading_zeros().min(64);
                Some(bit_reader.read_bits(bits.clamp(1, 64) as u8)?)
            } else {
                None
            }
        } else {
            None
        };

        Ok(Self {
            nal_ref_idc,
            nal_unit_type,
            first_mb_in_slice,
            slice_type,
            pic_parameter_set_id,
            colour_plane_id,
            frame_num,
            field_pic_flag,
            bottom_field_flag,
            idr_pic_id,
            pic_order_cnt_lsb,
            delta_pic_order_cnt_bottom,
            delta_pic_order_cnt,
            redundant_pic_cnt,
            direct_spatial_mv_pred_flag,
            num_ref_idx_l0_active_minus1,
            num_ref_idx_l1_active_minus1,
            ref_pic_list_modification_l0,
            ref_pic_list_modification_l1,
            pred_weight_table,
            dec_ref_pic_marking,
            cabac_init_idc,
            slice_qp_delta,
            sp_switch,
            disable_deblocking_filter_idc,
            deblocking_filter_offsets,
            slice_group_change_cycle,
        })
    }

    /// Builds a `slice_header()`, including the enclosing 1-byte NAL header.
    pub fn build<W: io::Write>(&self, mut bit_writer: BitWriter<W>, sps: &Sps, pps: &Pps) -> io::Result<()> {
        let bit_writer = &mut bit_writer;
        bit_writer.write_bit(false)?;
        bit_writer.write_bits(self.nal_ref_idc as u64, 2)?;
        bit_writer.write_bits(self.nal_unit_type as u64, 5)?;

        bit_writer.write_exp_golomb(self.first_mb_in_slice)?;
        bit_writer.write_exp_golomb(self.slice_type as u64)?;
        bit_writer.write_exp_golomb(self.pic_parameter_set_id)?;

        if let Some(colour_plane_id) = self.colour_plane_id {
            bit_writer.write_bits(colour_plane_id as u64, 2)?;
        }

        let frame_num_bits = sps.log2_max_frame_num_minus4 as u8 + 4;
        bit_writer.write_bits(self.frame_num as u64, frame_num_bits)?;

        if !sps.frame_mbs_only_flag() {
            bit_writer.write_bit(self.field_pic_flag)?;
        }
        if self.field_pic_flag {
            bit_writer.write_bit(self.bottom_field_flag)?;
        }

        if let Some(idr_pic_id) = self.idr_pic_id {
            bit_writer.write_exp_golomb(idr_pic_id)?;
        }

        match sps.pic_order_cnt_type {
            0 => {
                let lsb_bits = sps.log2_max_pic_order_cnt_lsb_minus4.unwrap_or(0) as u8 + 4;
                bit_writer.write_bits(self.pic_order_cnt_lsb.unwrap_or(0) as u64, lsb_bits)?;
                if pps.bottom_field_pic_order_in_frame_present_flag && !self.field_pic_flag {
                    bit_writer.write_signed_exp_golomb(self.delta_pic_order_cnt_bottom.unwrap_or(0))?;
                }
            }
            1 => {
                let always_zero = sps.pic_order_cnt_type1.as_ref().is_some_and(|p| p.delta_pic_order_always_zero_flag);
                if !always_zero {
                    let delta = self.delta_pic_order_cnt.unwrap_or([0, 0]);
                    bit_writer.write_signed_exp_golomb(delta[0])?;
                    if pps.bottom_field_pic_order_in_frame_present_flag && !self.field_pic_flag {
                        bit_writer.write_signed_exp_golomb(delta[1])?;
                    }
                }
            }
            _ => {}
        }

        if pps.redundant_pic_cnt_present_flag {
            bit_writer.write_exp_golomb(self.redundant_pic_cnt.unwrap_or(0))?;
        }

        let base_type = self.slice_type.base();
        let is_b = base_type == SliceType::B;
        if is_b {
            bit_writer.write_bit(self.direct_spatial_mv_pred_flag.unwrap_or(false))?;
        }

        let is_p_sp = matches!(base_type, SliceType::P | SliceType::Sp);
        if is_p_sp || is_b {
            let overridden = self.num_ref_idx_l0_active_minus1 != pps.num_ref_idx_l0_default_active_minus1
                || (is_b && self.num_ref_idx_l1_active_minus1 != pps.num_ref_idx_l1_default_active_minus1);
            bit_writer.write_bit(overridden)?;
            if overridden {
                bit_writer.write_exp_golomb(self.num_ref_idx_l0_active_minus1)?;
                if is_b {
                    bit_writer.write_exp_golomb(self.num_ref_idx_l1_active_minus1)?;
                }
            }
        }

        let is_i_si = matches!(base_type, SliceType::I | SliceType::Si);
        if !is_i_si {
            bit_writer.write_bit(!self.ref_pic_list_modification_l0.is_empty())?;
            if !self.ref_pic_list_modification_l0.is_empty() {
                RefPicListModification::build_list(&self.ref_pic_list_modification_l0, bit_writer)?;
            }
        }
        if is_b {
            bit_writer.write_bit(!self.ref_pic_list_modification_l1.is_empty())?;
            if !self.ref_pic_list_modification_l1.is_empty() {
                RefPicListModification::build_list(&self.ref_pic_list_modification_l1, bit_writer)?;
            }
        }

        if let Some(pred_weight_table) = &self.pred_weight_table {
            pred_weight_table.build(bit_writer)?;
        }

        if let Some(dec_ref_pic_marking) = &self.dec_ref_pic_marking {
            dec_ref_pic_marking.build(bit_writer)?;
        }

        if let Some(cabac_init_idc) = self.cabac_init_idc {
            bit_writer.write_exp_golomb(cabac_init_idc as u64)?;
        }

        bit_writer.write_signed_exp_golomb(self.slice_qp_delta)?;

        if let Some((sp_for_switch_flag, qs_delta)) = self.sp_switch {
            if base_type == SliceType::Sp {
                bit_writer.write_bit(sp_for_switch_flag)?;
            }
            bit_writer.write_signed_exp_golomb(qs_delta)?;
        }

        if let Some(idc) = self.disable_deblocking_filter_idc {
            bit_writer.write_exp_golomb(idc as u64)?;
        }
        if let Some((alpha, beta)) = self.deblocking_filter_offsets {
            bit_writer.write_signed_exp_golomb(alpha)?;
            bit_writer.write_signed_exp_golomb(beta)?;
        }

        if let Some(slice_group_change_cycle) = self.slice_group_change_cycle {
            let pic_size_in_map_units = sps.pic_width_in_mbs() * sps.pic_height_in_map_units();
            let change_rate =
                pps.slice_group_info.as_ref().and_then(|g| g.slice_group_change_rate_minus1).unwrap_or(0) + 1;
            let max_value = pic_size_in_map_units.div_ceil(change_rate) + 1;
            let bits = 64 - (max_value.max(1) - 1).leading_zeros().min(64);
            bit_writer.write_bits(slice_group_change_cycle, bits.clamp(1, 64) as u8)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn minimal_sps() -> Sps {
        Sps {
            nal_ref_idc: 3,
            nal_unit_type: NALUnitType::SPS,
            profile_idc: 100,
            constraint_set0_flag: false,
            constraint_set1_flag: false,
            constraint_set2_flag: false,
            constraint_set3_flag: false,
            constraint_set4_flag: false,
            constraint_set5_flag: false,
            level_idc: 41,
            seq_parameter_set_id: 0,
            ext: None,
            log2_max_frame_num_minus4: 4,
            pic_order_cnt_type: 0,
            log2_max_pic_order_cnt_lsb_minus4: Some(2),
            pic_order_cnt_type1: None,
            max_num_ref_frames: 2,
            gaps_in_frame_num_value_allowed_flag: false,
            pic_width_in_mbs_minus1: 19,
            pic_height_in_map_units_minus1: 10,
            mb_adaptive_frame_field_flag: None,
            direct_8x8_inference_flag: true,
            frame_crop_info: None,
            sample_aspect_ratio: None,
            overscan_appropriate_flag: None,
            color_config: None,
            chroma_sample_loc: None,
            timing_info: None,
            nal_hrd_parameters: None,
            vcl_hrd_parameters: None,
            low_delay_hrd_flag: None,
            pic_struct_present_flag: false,
            bitstream_restriction: None,
        }
    }

    fn minimal_pps() -> Pps {
        Pps {
            nal_ref_idc: 3,
            nal_unit_type: crate::NALUnitType::PPS,
            pic_parameter_set_id: 0,
            seq_parameter_set_id: 0,
            entropy_coding_mode_flag: true,
            bottom_field_pic_order_in_frame_present_flag: false,
            num_slice_groups_minus1: 0,
            slice_group_info: None,
            num_ref_idx_l0_default_active_minus1: 0,
            num_ref_idx_l1_default_active_minus1: 0,
            weighted_pred_flag: false,
            weighted_bipred_idc: 0,
            pic_init_qp_minus26: 0,
            pic_init_qs_minus26: 0,
            chroma_qp_index_offset: 0,
            deblocking_filter_control_present_flag: true,
            constrained_intra_pred_flag: false,
            redundant_pic_cnt_present_flag: false,
            extension: None,
        }
    }

    fn minimal_header(nal_unit_type: NALUnitType, slice_type: SliceType) -> SliceHeader {
        SliceHeader {
            nal_ref_idc: 2,
            nal_unit_type,
            first_mb_in_slice: 0,
            slice_type,
            pic_parameter_set_id: 0,
            colour_plane_id: None,
            frame_num: 0,
            field_pic_flag: false,
            bottom_field_flag: false,
            idr_pic_id: if nal_unit_type == NALUnitType::IDRSliceLayerWithoutPartitioning { Some(0) } else { None },
            pic_order_cnt_lsb: Some(0),
            delta_pic_order_cnt_bottom: None,
            delta_pic_order_cnt: None,
            redundant_pic_cnt: None,
            direct_spatial_mv_pred_flag: if slice_type.base() == SliceType::B { Some(false) } else { None },
            num_ref_idx_l0_active_minus1: 0,
            num_ref_idx_l1_active_minus1: 0,
            ref_pic_list_modification_l0: Vec::new(),
            ref_pic_list_modification_l1: Vec::new(),
            pred_weight_table: None,
            dec_ref_pic_marking: if nal_unit_type == NALUnitType::IDRSliceLayerWithoutPartitioning {
                Some(DecRefPicMarking::Idr { no_output_of_prior_pics_flag: false, long_term_reference_flag: false })
            } else {
                None
            },
            cabac_init_idc: None,
            slice_qp_delta: 0,
            sp_switch: None,
            disable_deblocking_filter_idc: Some(0),
            deblocking_filter_offsets: Some((0, 0)),
            slice_group_change_cycle: None,
        }
    }

    #[test]
    fn roundtrips_idr_i_slice() {
        let sps = minimal_sps();
        let pps = minimal_pps();
        let header = minimal_header(NALUnitType::IDRSliceLayerWithoutPartitioning, SliceType::I);

        let mut buf = Vec::new();
        header.build(BitWriter::new(&mut buf), &sps, &pps).unwrap();

        let bit_reader = BitReader::new(Cursor::new(buf));
        let parsed = SliceHeader::parse(bit_reader, &sps, &pps).unwrap();
        assert_eq!(parsed, header);
        assert!(parsed.idr_pic_flag());
    }

    #[test]
    fn roundtrips_non_idr_p_slice_with_ref_list_mod() {
        let sps = minimal_sps();
        let pps = minimal_pps();
        let mut header = minimal_header(NALUnitType::NonIDRSliceLayerWithoutPartitioning, SliceType::P);
        header.frame_num = 5;
        header.ref_pic_list_modification_l0 = vec![RefPicListModification::SubtractAbsDiff { abs_diff_pic_num_minus1: 0 }];

        let mut buf = Vec::new();
        header.build(BitWriter::new(&mut buf), &sps, &pps).unwrap();

        let bit_reader = BitReader::new(Cursor::new(buf));
        let parsed = SliceHeader::parse(bit_reader, &sps, &pps).unwrap();
        assert_eq!(parsed, header);
        assert!(!parsed.idr_pic_flag());
        assert_eq!(parsed.pic_height_in_mbs(&sps), 11);
        assert_eq!(parsed.pic_size_in_mbs(&sps), 20 * 11);
    }

    #[test]
    fn roundtrips_b_slice_with_weighted_pred() {
        let sps = minimal_sps();
        let mut pps = minimal_pps();
        pps.weighted_bipred_idc = 1;
        let mut header = minimal_header(NALUnitType::NonIDRSliceLayerWithoutPartitioning, SliceType::B);
        header.pred_weight_table = Some(PredWeightTable {
            luma_log2_weight_denom: 5,
            chroma_log2_weight_denom: None,
            list0: vec![crate::WeightOffset { luma_weight: None, luma_offset: 0, chroma_weight: None, chroma_offset: [0, 0] }],
            list1: vec![crate::WeightOffset { luma_weight: None, luma_offset: 0, chroma_weight: None, chroma_offset: [0, 0] }],
        });

        let mut buf = Vec::new();
        header.build(BitWriter::new(&mut buf), &sps, &pps).unwrap();

        let bit_reader = BitReader::new(Cursor::new(buf));
        let parsed = SliceHeader::parse(bit_reader, &sps, &pps).unwrap();
        assert_eq!(parsed, header);
    }
}
