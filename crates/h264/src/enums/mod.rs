mod aspect_ratio_idc;
mod nal_unit_type;
mod pic_struct;
mod profile_idc;
mod slice_type;
mod video_format;

pub use aspect_ratio_idc::AspectRatioIdc;
pub use nal_unit_type::NALUnitType;
pub use pic_struct::PicStruct;
pub use profile_idc::ProfileIdc;
pub use slice_type::SliceType;
pub use video_format::VideoFormat;
