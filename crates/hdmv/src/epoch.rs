//! Per-epoch state, Display Set accumulation, and `check_and_build_display_set`
//! (§4.4.4): the reference-closure and layout checks run at every END segment.

use std::collections::BTreeMap;

use diagnostics::{Diagnostic, DiagnosticSink, Severity};

use crate::composition::PresentationComposition;
use crate::interactive_composition::{Button, InteractiveComposition, Page};
use crate::object::ObjectDefinition;
use crate::palette::PaletteDefinition;
use crate::video_descriptor::VideoDescriptor;
use crate::window::WindowDefinition;

const PAGE_ID_RESERVED: u8 = 0xFF;
const MAX_BUTTON_ID: u16 = 0x1FDF;
const MAX_NUMERIC_SELECT_VALUE: u16 = 9999;
const NO_NUMERIC_SELECT_VALUE: u16 = 0xFFFF;

/// Which of the two HDMV graphics stream types an epoch carries: Interactive
/// Graphics (menus) or Presentation Graphics (subtitles). Drives both the
/// §4.4.4 validation path (IGS vs PGS) and the §4.4.6 decode-duration divisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HdmvStreamType {
    /// Interactive Graphics Stream (menus).
    Igs,
    /// Presentation Graphics Stream (subtitles).
    Pgs,
}

/// Chooses how `check_and_build_display_set` orders the PDS/ODS link queue
/// it produces as a side effect of validation: either in reference order, or
/// strictly by ascending id. §4.4.4 leaves this a caller-configured choice
/// per stream type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceOrdering {
    /// Link definitions in the order the DS referenced them.
    AsReferenced,
    /// Link definitions by ascending id, regardless of reference order.
    ByAscendingId,
}

/// Palettes and objects carried over within one epoch, reset at every
/// `EpochStart` composition (invariant 4 in §3.3: never carried across epochs).
#[derive(Debug, Clone, Default)]
pub struct EpochDefinitions {
    /// Palettes defined so far in this epoch, keyed by `palette_id`.
    pub palettes: BTreeMap<u8, PaletteDefinition>,
    /// Objects defined so far in this epoch, keyed by `object_id`.
    pub objects: BTreeMap<u16, ObjectDefinition>,
    /// The most recently declared WDS window list (PGS path).
    pub windows: WindowDefinition,
}

impl EpochDefinitions {
    /// Discards every carried-over definition, as happens at `EpochStart`.
    pub fn reset(&mut self) {
        self.palettes.clear();
        self.objects.clear();
        self.windows = WindowDefinition::default();
    }
}

/// One Display Set's accumulated segments, gathered between two END segments.
#[derive(Debug, Clone, Default)]
pub struct DisplaySet {
    /// Palettes introduced in this DS.
    pub pds: Vec<PaletteDefinition>,
    /// Objects introduced in this DS.
    pub ods: Vec<ObjectDefinition>,
    /// The DS's presentation composition, if any (PGS always has one; IGS may not).
    pub pcs: Option<PresentationComposition>,
    /// The DS's window definition, if any.
    pub wds: Option<WindowDefinition>,
    /// The DS's interactive composition, if present (marks this as an IGS DS).
    pub ics: Option<InteractiveComposition>,
    /// Number of END segments seen for this DS.
    pub end_count: u32,
}

/// The outcome of `check_and_build_display_set`: whether the DS is fatal-free,
/// and the per-DS link queue of referenced definitions.
#[derive(Debug, Clone, Default)]
pub struct DisplaySetOutcome {
    /// `false` if any `ComplianceError`/`ParserError` diagnostic was raised.
    pub ok: bool,
    /// Palette ids linked into this DS's output, in link order.
    pub linked_palettes: Vec<u8>,
    /// Object ids linked into this DS's output, in link order.
    pub linked_objects: Vec<u16>,
}

fn report(sink: &mut dyn DiagnosticSink, code: &'static str, message: impl Into<String>) {
    sink.report(Diagnostic::new(Severity::ComplianceError, code, message));
}

/// Runs every §4.4.4 check against one Display Set, merges its new
/// definitions into `epoch`, and returns the validation outcome plus the
/// PDS/ODS link queue.
///
/// `epoch` is updated even when validation fails, mirroring the reference
/// decoder's behaviour of keeping the most recent definitions available for
/// subsequent DSs to reference; callers that want strict all-or-nothing
/// semantics should snapshot `epoch` beforehand.
pub fn check_and_build_display_set(
    epoch: &mut EpochDefinitions,
    ds: &DisplaySet,
    ordering: ReferenceOrdering,
    sink: &mut dyn DiagnosticSink,
) -> DisplaySetOutcome {
    let mut ok = true;

    if ds.end_count != 1 {
        report(sink, "hdmv.ds.end-count", format!("display set must end with exactly one END segment, found {}", ds.end_count));
        ok = false;
    }

    let epoch_start = ds
        .pcs
        .as_ref()
        .map(|p| p.composition_descriptor.composition_state.is_epoch_start())
        .or_else(|| ds.ics.as_ref().map(|ics| ics.composition_descriptor.composition_state.is_epoch_start()))
        .unwrap_or(false);
    if epoch_start {
        epoch.reset();
    }

    for pds in &ds.pds {
        epoch.palettes.insert(pds.palette_id, pds.clone());
    }
    for ods in &ds.ods {
        epoch.objects.insert(ods.object_id, ods.clone());
    }
    if let Some(wds) = &ds.wds {
        if !wds.has_unique_ids() {
            report(sink, "hdmv.wds.duplicate-id", "window_id is not unique within the WDS");
            ok = false;
        }
        epoch.windows = wds.clone();
    }

    let video = ds
        .pcs
        .as_ref()
        .map(|p| p.video_descriptor)
        .unwrap_or_else(|| VideoDescriptor { video_width: 0, video_height: 0, frame_rate_id: 0 });

    for window in &epoch.windows.windows {
        if !window.fits_in_plane(video.video_width, video.video_height) {
            report(sink, "hdmv.window.out-of-plane", format!("window {} does not fit inside the video plane", window.id));
            ok = false;
        }
    }

    let mut linked_palettes = Vec::new();
    let mut linked_objects = Vec::new();
    let mut link_palette = |id: u8, linked: &mut Vec<u8>| {
        if !linked.contains(&id) {
            linked.push(id);
        }
    };
    let mut link_object = |id: u16, linked: &mut Vec<u16>| {
        if !linked.contains(&id) {
            linked.push(id);
        }
    };

    if let Some(ics) = &ds.ics {
        if !validate_igs(epoch, ics, video, &mut linked_palettes, &mut linked_objects, &mut link_palette, &mut link_object, sink) {
            ok = false;
        }
    } else if let Some(pcs) = &ds.pcs {
        if !validate_pgs(epoch, pcs, &mut linked_palettes, &mut linked_objects, &mut link_palette, &mut link_object, sink) {
            ok = false;
        }
    }

    if ordering == ReferenceOrdering::ByAscendingId {
        linked_palettes.sort_unstable();
        linked_objects.sort_unstable();
    }

    DisplaySetOutcome { ok, linked_palettes, linked_objects }
}

#[allow(clippy::too_many_arguments)]
fn validate_pgs(
    epoch: &EpochDefinitions,
    pcs: &PresentationComposition,
    linked_palettes: &mut Vec<u8>,
    linked_objects: &mut Vec<u16>,
    link_palette: &mut impl FnMut(u8, &mut Vec<u8>),
    link_object: &mut impl FnMut(u16, &mut Vec<u16>),
    sink: &mut dyn DiagnosticSink,
) -> bool {
    let mut ok = true;

    if !epoch.palettes.contains_key(&pcs.palette_id_ref) {
        report(sink, "hdmv.pcs.unknown-palette", format!("PCS references unknown palette {}", pcs.palette_id_ref));
        ok = false;
    } else {
        link_palette(pcs.palette_id_ref, linked_palettes);
    }

    for object in &pcs.composition_objects {
        let Some(definition) = epoch.objects.get(&object.object_id_ref) else {
            report(sink, "hdmv.pcs.unknown-object", format!("PCS references unknown object {}", object.object_id_ref));
            ok = false;
            continue;
        };
        link_object(object.object_id_ref, linked_objects);

        let Some(window) = epoch.windows.get(object.window_id_ref) else {
            report(sink, "hdmv.pcs.unknown-window", format!("PCS composition object references unknown window {}", object.window_id_ref));
            ok = false;
            continue;
        };
        if !object.fits_in_window(window, definition.object_width, definition.object_height) {
            report(sink, "hdmv.pcs.object-out-of-window", format!("composition object {} does not fit inside window {}", object.object_id_ref, window.id));
            ok = false;
        }
        if let Some(crop) = object.cropping {
            if !crop.fits_in_object(definition.object_width, definition.object_height) {
                report(sink, "hdmv.pcs.crop-out-of-object", format!("composition object {} crop exceeds object bounds", object.object_id_ref));
                ok = false;
            }
        }
    }

    ok
}

#[allow(clippy::too_many_arguments)]
fn validate_igs(
    epoch: &EpochDefinitions,
    ics: &InteractiveComposition,
    video: VideoDescriptor,
    linked_palettes: &mut Vec<u8>,
    linked_objects: &mut Vec<u16>,
    link_palette: &mut impl FnMut(u8, &mut Vec<u8>),
    link_object: &mut impl FnMut(u16, &mut Vec<u16>),
    sink: &mut dyn DiagnosticSink,
) -> bool {
    let mut ok = true;
    let mut seen_page_ids = std::collections::HashSet::new();

    for page in &ics.pages {
        if page.page_id == PAGE_ID_RESERVED {
            report(sink, "hdmv.ics.reserved-page-id", "page_id 0xFF is reserved");
            ok = false;
        }
        if !seen_page_ids.insert(page.page_id) {
            report(sink, "hdmv.ics.duplicate-page-id", format!("page_id {} is not unique", page.page_id));
            ok = false;
        }

        if !epoch.palettes.contains_key(&page.palette_id_ref) {
            report(sink, "hdmv.ics.unknown-palette", format!("page {} references unknown palette {}", page.page_id, page.palette_id_ref));
            ok = false;
        } else {
            link_palette(page.palette_id_ref, linked_palettes);
        }

        if !validate_page_buttons(page, epoch, linked_objects, link_object, sink) {
            ok = false;
        }

        if !page.resolves_default_button(page.default_selected_button_id_ref) {
            report(sink, "hdmv.ics.bad-default-selected", format!("page {} default_selected_button_id_ref does not resolve", page.page_id));
            ok = false;
        }
        if !page.resolves_default_button(page.default_activated_button_id_ref) {
            report(sink, "hdmv.ics.bad-default-activated", format!("page {} default_activated_button_id_ref does not resolve", page.page_id));
            ok = false;
        }

        for effects in [&page.in_effects, &page.out_effects] {
            for window in &effects.windows {
                if !window.fits_in_plane(video.video_width, video.video_height) {
                    report(sink, "hdmv.ics.effect-window-out-of-plane", format!("page {} effect window {} does not fit inside the video plane", page.page_id, window.id));
                    ok = false;
                }
            }
            for effect in &effects.effects {
                if !epoch.palettes.contains_key(&effect.palette_id_ref) {
                    report(sink, "hdmv.ics.effect-unknown-palette", format!("page {} effect references unknown palette {}", page.page_id, effect.palette_id_ref));
                    ok = false;
                } else {
                    link_palette(effect.palette_id_ref, linked_palettes);
                }
                for object in &effect.composition_objects {
                    let Some(definition) = epoch.objects.get(&object.object_id_ref) else {
                        report(sink, "hdmv.ics.effect-unknown-object", format!("page {} effect references unknown object {}", page.page_id, object.object_id_ref));
                        ok = false;
                        continue;
                    };
                    link_object(object.object_id_ref, linked_objects);
                    let Some(window) = effects.window(object.window_id_ref) else {
                        report(sink, "hdmv.ics.effect-unknown-window", format!("page {} effect composition object references unknown window {}", page.page_id, object.window_id_ref));
                        ok = false;
                        continue;
                    };
                    if !object.fits_in_window(window, definition.object_width, definition.object_height) {
                        report(sink, "hdmv.ics.effect-object-out-of-window", format!("page {} effect composition object {} does not fit inside window {}", page.page_id, object.object_id_ref, window.id));
                        ok = false;
                    }
                }
            }
        }
    }

    ok
}

fn validate_page_buttons(
    page: &Page,
    epoch: &EpochDefinitions,
    linked_objects: &mut Vec<u16>,
    link_object: &mut impl FnMut(u16, &mut Vec<u16>),
    sink: &mut dyn DiagnosticSink,
) -> bool {
    let mut ok = true;
    let mut seen_button_ids = std::collections::HashSet::new();
    let mut seen_numeric_values = std::collections::HashSet::new();

    for bog in &page.bogs {
        if !bog.buttons.iter().any(|b| b.button_id == bog.default_valid_button_id_ref) {
            report(
                sink,
                "hdmv.ics.bad-default-valid-button",
                format!("page {} BOG default_valid_button_id_ref {} is not one of its own buttons", page.page_id, bog.default_valid_button_id_ref),
            );
            ok = false;
        }

        for button in &bog.buttons {
            if button.button_id > MAX_BUTTON_ID {
                report(sink, "hdmv.ics.button-id-out-of-range", format!("button_id {} exceeds 0x1FDF", button.button_id));
                ok = false;
            }
            if !seen_button_ids.insert(button.button_id) {
                report(sink, "hdmv.ics.duplicate-button-id", format!("button_id {} is not unique within page {}", button.button_id, page.page_id));
                ok = false;
            }
            if button.button_numeric_select_value != NO_NUMERIC_SELECT_VALUE {
                if button.button_numeric_select_value > MAX_NUMERIC_SELECT_VALUE {
                    report(sink, "hdmv.ics.numeric-select-out-of-range", format!("button {} numeric select value exceeds 9999", button.button_id));
                    ok = false;
                } else if !seen_numeric_values.insert(button.button_numeric_select_value) {
                    report(sink, "hdmv.ics.duplicate-numeric-select", format!("numeric select value {} is not unique within page {}", button.button_numeric_select_value, page.page_id));
                    ok = false;
                }
            }
            if !validate_button_object_ranges(page, button, epoch, linked_objects, link_object, sink) {
                ok = false;
            }
            if !validate_neighbor_references(page, button, bog.buttons.as_slice(), sink) {
                ok = false;
            }
        }
    }

    ok
}

fn validate_button_object_ranges(
    page: &Page,
    button: &Button,
    epoch: &EpochDefinitions,
    linked_objects: &mut Vec<u16>,
    link_object: &mut impl FnMut(u16, &mut Vec<u16>),
    sink: &mut dyn DiagnosticSink,
) -> bool {
    let mut ok = true;
    let mut common_dims: Option<(u16, u16)> = None;

    for (label, state) in [("normal", button.normal_state), ("selected", button.selected_state), ("activated", button.activated_state)] {
        if !state.is_contiguous() {
            report(sink, "hdmv.ics.button-range-inverted", format!("button {} {} state range is not contiguous", button.button_id, label));
            ok = false;
            continue;
        }
        let mut dims: Option<(u16, u16)> = None;
        for object_id in state.start_object_id_ref..=state.end_object_id_ref {
            let Some(definition) = epoch.objects.get(&object_id) else {
                report(sink, "hdmv.ics.button-unknown-object", format!("button {} {} state references unknown object {}", button.button_id, label, object_id));
                ok = false;
                continue;
            };
            link_object(object_id, linked_objects);
            let this_dims = (definition.object_width, definition.object_height);
            match dims {
                None => dims = Some(this_dims),
                Some(existing) if existing == this_dims => {}
                Some(_) => {
                    report(sink, "hdmv.ics.button-dims-mismatch", format!("button {} {} state objects have inconsistent dimensions", button.button_id, label));
                    ok = false;
                }
            }
        }
        if let Some(dims) = dims {
            match common_dims {
                None => common_dims = Some(dims),
                Some(existing) if existing == dims => {}
                Some(_) => {
                    report(sink, "hdmv.ics.button-state-dims-mismatch", format!("button {} states do not share one (w,h)", button.button_id));
                    ok = false;
                }
            }
        }
    }

    let _ = page;
    ok
}

fn validate_neighbor_references(page: &Page, button: &Button, bog_buttons: &[Button], sink: &mut dyn DiagnosticSink) -> bool {
    let mut ok = true;
    let refs = [
        button.neighbor_info.upper_button_id_ref,
        button.neighbor_info.lower_button_id_ref,
        button.neighbor_info.left_button_id_ref,
        button.neighbor_info.right_button_id_ref,
    ];
    for neighbor_id in refs {
        if neighbor_id == button.button_id {
            continue;
        }
        if bog_buttons.iter().any(|b| b.button_id == neighbor_id) {
            report(
                sink,
                "hdmv.ics.intra-bog-neighbor",
                format!("button {} neighbor reference {} belongs to its own BOG (forbidden)", button.button_id, neighbor_id),
            );
            ok = false;
        } else if !page.buttons().any(|b| b.button_id == neighbor_id) {
            report(sink, "hdmv.ics.unknown-neighbor", format!("button {} neighbor reference {} does not resolve", button.button_id, neighbor_id));
            ok = false;
        }
    }
    ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::{CompositionDescriptor, CompositionObject, CompositionState};
    use crate::window::WindowInfo;

    fn object(id: u16, w: u16, h: u16) -> ObjectDefinition {
        ObjectDefinition { object_id: id, object_version_number: 0, object_width: w, object_height: h, data: bytes::Bytes::new() }
    }

    #[test]
    fn pgs_display_set_validates_references() {
        let mut epoch = EpochDefinitions::default();
        let ds = DisplaySet {
            pds: vec![PaletteDefinition { palette_id: 0, palette_version_number: 0, entries: vec![] }],
            ods: vec![object(1, 200, 150)],
            pcs: Some(PresentationComposition {
                video_descriptor: VideoDescriptor { video_width: 1920, video_height: 1080, frame_rate_id: 0 },
                composition_descriptor: CompositionDescriptor { composition_number: 0, composition_state: CompositionState::EpochStart },
                palette_update_flag: false,
                palette_id_ref: 0,
                composition_objects: vec![CompositionObject { object_id_ref: 1, window_id_ref: 0, object_horizontal_position: 150, object_vertical_position: 120, cropping: None }],
            }),
            wds: Some(WindowDefinition { windows: vec![WindowInfo { id: 0, x: 100, y: 100, width: 400, height: 200 }] }),
            ics: None,
            end_count: 1,
        };
        let mut sink = diagnostics::CollectingSink::new();
        let outcome = check_and_build_display_set(&mut epoch, &ds, ReferenceOrdering::AsReferenced, &mut sink);
        assert!(outcome.ok, "{:?}", sink.diagnostics());
        assert_eq!(outcome.linked_palettes, vec![0]);
        assert_eq!(outcome.linked_objects, vec![1]);
    }

    #[test]
    fn pgs_object_outside_window_is_rejected() {
        let mut epoch = EpochDefinitions::default();
        let ds = DisplaySet {
            pds: vec![PaletteDefinition { palette_id: 0, palette_version_number: 0, entries: vec![] }],
            ods: vec![object(1, 200, 150)],
            pcs: Some(PresentationComposition {
                video_descriptor: VideoDescriptor { video_width: 1920, video_height: 1080, frame_rate_id: 0 },
                composition_descriptor: CompositionDescriptor { composition_number: 0, composition_state: CompositionState::EpochStart },
                palette_update_flag: false,
                palette_id_ref: 0,
                composition_objects: vec![CompositionObject { object_id_ref: 1, window_id_ref: 0, object_horizontal_position: 350, object_vertical_position: 120, cropping: None }],
            }),
            wds: Some(WindowDefinition { windows: vec![WindowInfo { id: 0, x: 100, y: 100, width: 400, height: 200 }] }),
            ics: None,
            end_count: 1,
        };
        let mut sink = diagnostics::CollectingSink::new();
        let outcome = check_and_build_display_set(&mut epoch, &ds, ReferenceOrdering::AsReferenced, &mut sink);
        assert!(!outcome.ok);
    }
}
