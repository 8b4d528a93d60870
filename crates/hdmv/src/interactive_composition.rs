//! ICS payload: the full `InteractiveComposition` tree (pages, button overlap
//! groups, buttons, navigation commands, and in/out effect sequences).

use std::io;

use bitstream::{BitReader, BitWriter};

use crate::composition::{CompositionDescriptor, CompositionObject};
use crate::video_descriptor::VideoDescriptor;
use crate::window::WindowInfo;

/// `stream_model`, whether this menu's graphics are carried out-of-mux.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamModel {
    /// Graphics are decoded ahead of presentation and cached (out-of-mux).
    OutOfMux,
    /// Graphics are multiplexed with the video and decoded just-in-time.
    Multiplexed,
}

/// `user_interface_model`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserInterfaceModel {
    /// The menu pops up over the underlying video.
    PopUp,
    /// The menu is always displayed.
    AlwaysOn,
}

/// The out-of-mux timeout pair, present only when `stream_model == OutOfMux`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfMuxTimeouts {
    /// 33-bit PTS after which the composition must be fully decoded.
    pub composition_time_out_pts: u64,
    /// 33-bit PTS after which user selection stops being honored.
    pub selection_time_out_pts: u64,
}

/// One `window_info()` entry inside an effect sequence, plus the
/// `effect_info()` records that place objects into those windows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EffectSequence {
    /// Local window declarations used only by this effect sequence.
    pub windows: Vec<WindowInfo>,
    /// The effect frames, in playback order.
    pub effects: Vec<EffectInfo>,
}

/// One `effect_info()`: a duration, a palette, and the objects it composites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectInfo {
    /// Duration of this effect frame, in 90 kHz ticks (24-bit field).
    pub effect_duration: u32,
    /// The palette this effect frame uses.
    pub palette_id_ref: u8,
    /// The objects placed by this effect frame.
    pub composition_objects: Vec<CompositionObject>,
}

impl EffectSequence {
    fn parse<T: io::Read>(reader: &mut BitReader<T>) -> io::Result<Self> {
        let number_of_windows = reader.read_bits(8)?;
        let mut windows = Vec::with_capacity(number_of_windows as usize);
        for _ in 0..number_of_windows {
            windows.push(read_window(reader)?);
        }
        let number_of_effects = reader.read_bits(8)?;
        let mut effects = Vec::with_capacity(number_of_effects as usize);
        for _ in 0..number_of_effects {
            let effect_duration = reader.read_bits(24)? as u32;
            let palette_id_ref = reader.read_bits(8)? as u8;
            let number_of_composition_objects = reader.read_bits(8)?;
            let mut composition_objects = Vec::with_capacity(number_of_composition_objects as usize);
            for _ in 0..number_of_composition_objects {
                composition_objects.push(CompositionObject::parse(reader)?);
            }
            effects.push(EffectInfo { effect_duration, palette_id_ref, composition_objects });
        }
        Ok(Self { windows, effects })
    }

    fn build<W: io::Write>(&self, writer: &mut BitWriter<W>) -> io::Result<()> {
        writer.write_bits(self.windows.len() as u64, 8)?;
        for window in &self.windows {
            write_window(writer, window)?;
        }
        writer.write_bits(self.effects.len() as u64, 8)?;
        for effect in &self.effects {
            writer.write_bits(effect.effect_duration as u64, 24)?;
            writer.write_bits(effect.palette_id_ref as u64, 8)?;
            writer.write_bits(effect.composition_objects.len() as u64, 8)?;
            for object in &effect.composition_objects {
                object.build(writer)?;
            }
        }
        Ok(())
    }

    /// Looks up a window declared locally by this effect sequence.
    pub fn window(&self, id: u8) -> Option<&WindowInfo> {
        self.windows.iter().find(|w| w.id == id)
    }
}

fn read_window<T: io::Read>(reader: &mut BitReader<T>) -> io::Result<WindowInfo> {
    let id = reader.read_bits(8)? as u8;
    let x = reader.read_bits(16)? as u16;
    let y = reader.read_bits(16)? as u16;
    let width = reader.read_bits(16)? as u16;
    let height = reader.read_bits(16)? as u16;
    Ok(WindowInfo { id, x, y, width, height })
}

fn write_window<W: io::Write>(writer: &mut BitWriter<W>, window: &WindowInfo) -> io::Result<()> {
    writer.write_bits(window.id as u64, 8)?;
    writer.write_bits(window.x as u64, 16)?;
    writer.write_bits(window.y as u64, 16)?;
    writer.write_bits(window.width as u64, 16)?;
    writer.write_bits(window.height as u64, 16)?;
    Ok(())
}

/// The four neighboring-button references used for remote-control navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeighborInfo {
    /// Button selected on "up".
    pub upper_button_id_ref: u16,
    /// Button selected on "down".
    pub lower_button_id_ref: u16,
    /// Button selected on "left".
    pub left_button_id_ref: u16,
    /// Button selected on "right".
    pub right_button_id_ref: u16,
}

/// One `navigation_command()`: an opaque `{opcode, destination, source}` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationCommand {
    /// Command opcode.
    pub opcode: u32,
    /// Destination operand.
    pub destination: u32,
    /// Source operand.
    pub source: u32,
}

/// One button's object range for a given state (normal/selected/activated).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonState {
    /// First object in the state's animation range.
    pub start_object_id_ref: u16,
    /// Last object in the state's animation range.
    pub end_object_id_ref: u16,
    /// Whether the animation repeats.
    pub repeat_flag: bool,
    /// Whether the animation plays to completion before looping/handing off.
    pub complete_flag: bool,
    /// The sound played on entering this state, if any.
    pub sound_id_ref: Option<u8>,
}

impl ButtonState {
    fn parse<T: io::Read>(reader: &mut BitReader<T>, has_sound: bool) -> io::Result<Self> {
        let start_object_id_ref = reader.read_bits(16)? as u16;
        let end_object_id_ref = reader.read_bits(16)? as u16;
        let repeat_flag = reader.read_bit()?;
        let complete_flag = reader.read_bit()?;
        let _reserved = reader.read_bits(6)?;
        let sound_id_ref = if has_sound { Some(reader.read_bits(8)? as u8) } else { None };
        Ok(Self { start_object_id_ref, end_object_id_ref, repeat_flag, complete_flag, sound_id_ref })
    }

    fn build<W: io::Write>(&self, writer: &mut BitWriter<W>) -> io::Result<()> {
        writer.write_bits(self.start_object_id_ref as u64, 16)?;
        writer.write_bits(self.end_object_id_ref as u64, 16)?;
        writer.write_bit(self.repeat_flag)?;
        writer.write_bit(self.complete_flag)?;
        writer.write_bits(0, 6)?;
        if let Some(sound) = self.sound_id_ref {
            writer.write_bits(sound as u64, 8)?;
        }
        Ok(())
    }

    /// Whether this state's object range is non-empty and well-formed
    /// (`start <= end`), per invariant 5 in §3.3.
    pub fn is_contiguous(&self) -> bool {
        self.start_object_id_ref <= self.end_object_id_ref
    }
}

/// One button within a Button Overlap Group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    /// `button_id`, must be `<= 0x1FDF` and unique within its page.
    pub button_id: u16,
    /// `button_numeric_select_value`: either `0xFFFF` (no direct-select key)
    /// or a value `<= 9999` unique within the page.
    pub button_numeric_select_value: u16,
    /// Whether selecting this button auto-fires its activated navigation commands.
    pub auto_action_flag: bool,
    /// Horizontal placement within the page.
    pub x: u16,
    /// Vertical placement within the page.
    pub y: u16,
    /// Remote-control neighbor references.
    pub neighbor_info: NeighborInfo,
    /// Object range and playback flags while unselected.
    pub normal_state: ButtonState,
    /// Object range and playback flags while selected but not activated.
    pub selected_state: ButtonState,
    /// Object range and playback flags while activated.
    pub activated_state: ButtonState,
    /// Commands run when this button is activated.
    pub navigation_commands: Vec<NavigationCommand>,
}

impl Button {
    fn parse<T: io::Read>(reader: &mut BitReader<T>) -> io::Result<Self> {
        let button_id = reader.read_bits(16)? as u16;
        let button_numeric_select_value = reader.read_bits(16)? as u16;
        let auto_action_flag = reader.read_bit()?;
        let _reserved = reader.read_bits(7)?;
        let x = reader.read_bits(16)? as u16;
        let y = reader.read_bits(16)? as u16;
        let neighbor_info = NeighborInfo {
            upper_button_id_ref: reader.read_bits(16)? as u16,
            lower_button_id_ref: reader.read_bits(16)? as u16,
            left_button_id_ref: reader.read_bits(16)? as u16,
            right_button_id_ref: reader.read_bits(16)? as u16,
        };
        let normal_state = ButtonState::parse(reader, false)?;
        let selected_state = ButtonState::parse(reader, true)?;
        let activated_state = ButtonState::parse(reader, true)?;
        let number_of_navigation_commands = reader.read_bits(16)?;
        let mut navigation_commands = Vec::with_capacity(number_of_navigation_commands as usize);
        for _ in 0..number_of_navigation_commands {
            navigation_commands.push(NavigationCommand {
                opcode: reader.read_bits(32)? as u32,
                destination: reader.read_bits(32)? as u32,
                source: reader.read_bits(32)? as u32,
            });
        }
        Ok(Self {
            button_id,
            button_numeric_select_value,
            auto_action_flag,
            x,
            y,
            neighbor_info,
            normal_state,
            selected_state,
            activated_state,
            navigation_commands,
        })
    }

    fn build<W: io::Write>(&self, writer: &mut BitWriter<W>) -> io::Result<()> {
        writer.write_bits(self.button_id as u64, 16)?;
        writer.write_bits(self.button_numeric_select_value as u64, 16)?;
        writer.write_bit(self.auto_action_flag)?;
        writer.write_bits(0, 7)?;
        writer.write_bits(self.x as u64, 16)?;
        writer.write_bits(self.y as u64, 16)?;
        writer.write_bits(self.neighbor_info.upper_button_id_ref as u64, 16)?;
        writer.write_bits(self.neighbor_info.lower_button_id_ref as u64, 16)?;
        writer.write_bits(self.neighbor_info.left_button_id_ref as u64, 16)?;
        writer.write_bits(self.neighbor_info.right_button_id_ref as u64, 16)?;
        self.normal_state.build(writer)?;
        self.selected_state.build(writer)?;
        self.activated_state.build(writer)?;
        writer.write_bits(self.navigation_commands.len() as u64, 16)?;
        for command in &self.navigation_commands {
            writer.write_bits(command.opcode as u64, 32)?;
            writer.write_bits(command.destination as u64, 32)?;
            writer.write_bits(command.source as u64, 32)?;
        }
        Ok(())
    }
}

/// One Button Overlap Group: mutually exclusive buttons sharing a default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonOverlapGroup {
    /// The button within this group selected by default.
    pub default_valid_button_id_ref: u16,
    /// The group's buttons.
    pub buttons: Vec<Button>,
}

impl ButtonOverlapGroup {
    fn parse<T: io::Read>(reader: &mut BitReader<T>) -> io::Result<Self> {
        let default_valid_button_id_ref = reader.read_bits(16)? as u16;
        let number_of_buttons = reader.read_bits(8)?;
        let mut buttons = Vec::with_capacity(number_of_buttons as usize);
        for _ in 0..number_of_buttons {
            buttons.push(Button::parse(reader)?);
        }
        Ok(Self { default_valid_button_id_ref, buttons })
    }

    fn build<W: io::Write>(&self, writer: &mut BitWriter<W>) -> io::Result<()> {
        writer.write_bits(self.default_valid_button_id_ref as u64, 16)?;
        writer.write_bits(self.buttons.len() as u64, 8)?;
        for button in &self.buttons {
            button.build(writer)?;
        }
        Ok(())
    }
}

/// One ICS page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// `page_id`, unique within the composition and never `0xFF`.
    pub page_id: u8,
    /// `page_version`, incremented on content changes.
    pub page_version: u8,
    /// 64-bit user-operation mask: which remote-control keys are disabled on this page.
    pub uo_mask_table: u64,
    /// Effect sequence played when this page is entered.
    pub in_effects: EffectSequence,
    /// Effect sequence played when this page is exited.
    pub out_effects: EffectSequence,
    /// Frame rate code for `in_effects`/`out_effects` playback.
    pub animation_frame_rate_code: u8,
    /// The button selected by default, or `0xFFFF` for none.
    pub default_selected_button_id_ref: u16,
    /// The button activated by default (e.g. on timeout), or `0xFFFF` for none.
    pub default_activated_button_id_ref: u16,
    /// The palette this page's buttons composite against.
    pub palette_id_ref: u8,
    /// The page's button overlap groups.
    pub bogs: Vec<ButtonOverlapGroup>,
}

const NO_DEFAULT_BUTTON: u16 = 0xFFFF;

impl Page {
    fn parse<T: io::Read>(reader: &mut BitReader<T>) -> io::Result<Self> {
        let page_id = reader.read_bits(8)? as u8;
        let page_version = reader.read_bits(8)? as u8;
        let uo_mask_table = reader.read_bits(64)?;
        let in_effects = EffectSequence::parse(reader)?;
        let out_effects = EffectSequence::parse(reader)?;
        let animation_frame_rate_code = reader.read_bits(8)? as u8;
        let default_selected_button_id_ref = reader.read_bits(16)? as u16;
        let default_activated_button_id_ref = reader.read_bits(16)? as u16;
        let palette_id_ref = reader.read_bits(8)? as u8;
        let number_of_bogs = reader.read_bits(8)?;
        let mut bogs = Vec::with_capacity(number_of_bogs as usize);
        for _ in 0..number_of_bogs {
            bogs.push(ButtonOverlapGroup::parse(reader)?);
        }
        Ok(Self {
            page_id,
            page_version,
            uo_mask_table,
            in_effects,
            out_effects,
            animation_frame_rate_code,
            default_selected_button_id_ref,
            default_activated_button_id_ref,
            palette_id_ref,
            bogs,
        })
    }

    fn build<W: io::Write>(&self, writer: &mut BitWriter<W>) -> io::Result<()> {
        writer.write_bits(self.page_id as u64, 8)?;
        writer.write_bits(self.page_version as u64, 8)?;
        writer.write_bits(self.uo_mask_table, 64)?;
        self.in_effects.build(writer)?;
        self.out_effects.build(writer)?;
        writer.write_bits(self.animation_frame_rate_code as u64, 8)?;
        writer.write_bits(self.default_selected_button_id_ref as u64, 16)?;
        writer.write_bits(self.default_activated_button_id_ref as u64, 16)?;
        writer.write_bits(self.palette_id_ref as u64, 8)?;
        writer.write_bits(self.bogs.len() as u64, 8)?;
        for bog in &self.bogs {
            bog.build(writer)?;
        }
        Ok(())
    }

    /// All buttons across every BOG on this page, in stream order.
    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.bogs.iter().flat_map(|bog| bog.buttons.iter())
    }

    /// True if `button_id_ref` is `0xFFFF` (no default) or resolves to a
    /// known button on this page.
    pub fn resolves_default_button(&self, button_id_ref: u16) -> bool {
        button_id_ref == NO_DEFAULT_BUTTON || self.buttons().any(|b| b.button_id == button_id_ref)
    }
}

/// The reassembled ICS payload: the full `InteractiveComposition` tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractiveComposition {
    /// The ICS's video plane dimensions. Unlike PGS, IGS carries its own
    /// `video_descriptor()`/`composition_descriptor()` rather than sharing a
    /// separate PCS.
    pub video_descriptor: VideoDescriptor,
    /// `composition_number`/`composition_state`; `EpochStart` here resets the
    /// epoch's carried-over palettes/objects the same way it does for PGS.
    pub composition_descriptor: CompositionDescriptor,
    /// Declared byte length of the composition, as parsed from the stream.
    pub interactive_composition_length: u32,
    /// Whether graphics are cached ahead of time or multiplexed just-in-time.
    pub stream_model: StreamModel,
    /// Whether the menu pops up or stays always-on.
    pub user_interface_model: UserInterfaceModel,
    /// Out-of-mux timeout pair, present only when `stream_model` is `OutOfMux`.
    pub out_of_mux_timeouts: Option<OutOfMuxTimeouts>,
    /// How long, in 90 kHz ticks, the menu stays interactive with no input.
    pub user_time_out_duration: u32,
    /// The composition's pages.
    pub pages: Vec<Page>,
}

impl InteractiveComposition {
    /// Parses a full `interactive_composition()` from its reassembled bytes.
    pub fn parse<T: io::Read>(reader: &mut BitReader<T>) -> io::Result<Self> {
        let video_descriptor = VideoDescriptor::parse(reader)?;
        let composition_descriptor = CompositionDescriptor::parse(reader)?;
        let interactive_composition_length = reader.read_bits(24)? as u32;
        let stream_model = if reader.read_bit()? { StreamModel::OutOfMux } else { StreamModel::Multiplexed };
        let user_interface_model = if reader.read_bit()? { UserInterfaceModel::AlwaysOn } else { UserInterfaceModel::PopUp };
        let _reserved = reader.read_bits(6)?;
        let out_of_mux_timeouts = match stream_model {
            StreamModel::OutOfMux => Some(OutOfMuxTimeouts {
                composition_time_out_pts: reader.read_bits(33)?,
                selection_time_out_pts: reader.read_bits(33)?,
            }),
            StreamModel::Multiplexed => None,
        };
        let user_time_out_duration = reader.read_bits(24)? as u32;
        let number_of_pages = reader.read_bits(8)?;
        let mut pages = Vec::with_capacity(number_of_pages as usize);
        for _ in 0..number_of_pages {
            pages.push(Page::parse(reader)?);
        }
        Ok(Self {
            video_descriptor,
            composition_descriptor,
            interactive_composition_length,
            stream_model,
            user_interface_model,
            out_of_mux_timeouts,
            user_time_out_duration,
            pages,
        })
    }

    /// Rebuilds `interactive_composition()`.
    pub fn build<W: io::Write>(&self, writer: &mut BitWriter<W>) -> io::Result<()> {
        self.video_descriptor.build(writer)?;
        self.composition_descriptor.build(writer)?;
        writer.write_bits(self.interactive_composition_length as u64, 24)?;
        writer.write_bit(matches!(self.stream_model, StreamModel::OutOfMux))?;
        writer.write_bit(matches!(self.user_interface_model, UserInterfaceModel::AlwaysOn))?;
        writer.write_bits(0, 6)?;
        if let Some(timeouts) = self.out_of_mux_timeouts {
            writer.write_bits(timeouts.composition_time_out_pts, 33)?;
            writer.write_bits(timeouts.selection_time_out_pts, 33)?;
        }
        writer.write_bits(self.user_time_out_duration as u64, 24)?;
        writer.write_bits(self.pages.len() as u64, 8)?;
        for page in &self.pages {
            page.build(writer)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn sample_state() -> ButtonState {
        ButtonState { start_object_id_ref: 0, end_object_id_ref: 0, repeat_flag: false, complete_flag: true, sound_id_ref: None }
    }

    fn sample_ic() -> InteractiveComposition {
        let button = Button {
            button_id: 1,
            button_numeric_select_value: 0xFFFF,
            auto_action_flag: false,
            x: 0,
            y: 0,
            neighbor_info: NeighborInfo { upper_button_id_ref: 1, lower_button_id_ref: 1, left_button_id_ref: 1, right_button_id_ref: 1 },
            normal_state: sample_state(),
            selected_state: ButtonState { sound_id_ref: Some(2), ..sample_state() },
            activated_state: ButtonState { sound_id_ref: Some(3), ..sample_state() },
            navigation_commands: vec![NavigationCommand { opcode: 1, destination: 2, source: 3 }],
        };
        let bog = ButtonOverlapGroup { default_valid_button_id_ref: 1, buttons: vec![button] };
        let page = Page {
            page_id: 0,
            page_version: 0,
            uo_mask_table: 0,
            in_effects: EffectSequence::default(),
            out_effects: EffectSequence::default(),
            animation_frame_rate_code: 0,
            default_selected_button_id_ref: 1,
            default_activated_button_id_ref: 0xFFFF,
            palette_id_ref: 0,
            bogs: vec![bog],
        };
        InteractiveComposition {
            video_descriptor: VideoDescriptor { video_width: 1920, video_height: 1080, frame_rate_id: 0 },
            composition_descriptor: CompositionDescriptor { composition_number: 0, composition_state: crate::composition::CompositionState::EpochStart },
            interactive_composition_length: 0,
            stream_model: StreamModel::Multiplexed,
            user_interface_model: UserInterfaceModel::PopUp,
            out_of_mux_timeouts: None,
            user_time_out_duration: 0,
            pages: vec![page],
        }
    }

    #[test]
    fn round_trips() {
        let ic = sample_ic();
        let mut writer = BitWriter::new(Vec::new());
        ic.build(&mut writer).unwrap();
        let bytes = writer.finish().unwrap();

        let mut reader = BitReader::new(Cursor::new(bytes));
        let parsed = InteractiveComposition::parse(&mut reader).unwrap();
        assert_eq!(parsed, ic);
    }

    #[test]
    fn default_valid_button_must_exist_in_its_bog() {
        let ic = sample_ic();
        let page = &ic.pages[0];
        assert!(page.resolves_default_button(page.default_selected_button_id_ref));
        let bog = &page.bogs[0];
        assert!(bog.buttons.iter().any(|b| b.button_id == bog.default_valid_button_id_ref));
    }
}
