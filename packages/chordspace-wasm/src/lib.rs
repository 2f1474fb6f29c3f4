use chordspace::chord::{ChordQuality, PitchClass};
use chordspace::corners::{self, SideSelection};
use chordspace::playback;
use chordspace::radial::{self, CellLayout, CellVisual};
use chordspace::{NoteSequence, SpaceError};
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[derive(Serialize)]
struct BindingError {
    kind: &'static str,
    message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CornerInfo {
    symbol: String,
    root: u8,
    pitches: Vec<u8>,
}

fn error_to_binding_error(e: SpaceError) -> BindingError {
    let kind = match &e {
        SpaceError::UnknownChord(_) => "unknownChord",
        SpaceError::CellOutOfRange { .. } => "cellOutOfRange",
        SpaceError::Config(_) => "config",
        _ => "other",
    };
    BindingError {
        kind,
        message: e.to_string(),
    }
}

fn to_js_error(e: SpaceError) -> JsValue {
    let error = error_to_binding_error(e);
    let json = serde_json::to_string(&error).unwrap_or_else(|_| error.message.clone());
    JsValue::from_str(&json)
}

fn json_error(e: serde_json::Error) -> JsValue {
    to_js_error(SpaceError::Config(e.to_string()))
}

fn parse_sequence(json: &str) -> Result<NoteSequence, JsValue> {
    serde_json::from_str(json).map_err(json_error)
}

fn parse_side(tonic: u8, chord: &str) -> Result<SideSelection, JsValue> {
    let tonic = PitchClass::new(tonic)
        .ok_or_else(|| to_js_error(SpaceError::UnknownChord(format!("tonic {}", tonic))))?;
    let quality: ChordQuality = chord.parse().map_err(to_js_error)?;
    Ok(SideSelection::new(tonic, quality))
}

/// Four corner chords as a JSON array in grid order (top-left, top-right, bottom-left, bottom-right)
#[wasm_bindgen]
pub fn resolve_corners(tonic_left: u8, chord_left: &str, tonic_right: u8, chord_right: &str) -> Result<String, JsValue> {
    let left = parse_side(tonic_left, chord_left)?;
    let right = parse_side(tonic_right, chord_right)?;
    let corners: Vec<CornerInfo> = corners::resolve_corners(&left, &right)
        .chords()
        .iter()
        .map(|chord| CornerInfo {
            symbol: chord.symbol(),
            root: chord.root,
            pitches: chord.pitches(),
        })
        .collect();
    serde_json::to_string(&corners).map_err(json_error)
}

#[wasm_bindgen]
pub fn octave_shift(note: u8) -> u8 {
    corners::octave_shift(note)
}

/// Seed melody for a chord symbol as NoteSequence JSON
#[wasm_bindgen]
pub fn build_seed(chord_symbol: &str, tempo: f64) -> Result<String, JsValue> {
    serde_json::to_string(&chordspace::build_seed(chord_symbol, tempo)).map_err(json_error)
}

/// Radial geometry of one cell
#[wasm_bindgen]
pub fn map_cell(sequence_json: &str, index: usize, grid_size: usize, canvas_size: f64) -> Result<JsValue, JsValue> {
    let sequence = parse_sequence(sequence_json)?;
    let visual = CellVisual::new(sequence, CellLayout::new(index, grid_size, canvas_size));
    serde_wasm_bindgen::to_value(&visual).map_err(JsValue::from)
}

/// Render a whole grid (JSON array of NoteSequence) as SVG, with `on_cells` marked as playing
#[wasm_bindgen]
pub fn render_grid_svg(cells_json: &str, grid_size: usize, canvas_size: f64, on_cells: Vec<u32>) -> Result<String, JsValue> {
    let cells: Vec<NoteSequence> = serde_json::from_str(cells_json).map_err(json_error)?;
    let mut visuals = radial::build_visuals(&cells, grid_size, canvas_size);
    for index in on_cells.into_iter().map(|i| i as usize) {
        let count = visuals.len();
        let visual = visuals
            .get_mut(index)
            .ok_or_else(|| to_js_error(SpaceError::CellOutOfRange { index, cells: count }))?;
        visual.is_on = true;
    }
    Ok(radial::render_svg(&visuals, canvas_size))
}

/// Loop events of a cell at the 120 bpm reference time base
#[wasm_bindgen]
pub fn playback_events(sequence_json: &str) -> Result<JsValue, JsValue> {
    let sequence = parse_sequence(sequence_json)?;
    serde_wasm_bindgen::to_value(&playback::to_playback_events(&sequence)).map_err(JsValue::from)
}
