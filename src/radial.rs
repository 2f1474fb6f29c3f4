//! # Radial Visualization
//!
//! Maps each grid cell's note sequence onto a radial plot: time runs once
//! around the circle and pitch maps inversely to radius, so higher notes sit
//! closer to the center.
//!
//! ## Geometry
//! - The canvas is split into `N × N` square cells with a margin of `cell/30`
//! - `radius = (MAX_NOTE - (pitch - MIN_NOTE)) / MAX_NOTE * max_radius`
//! - `start_angle = start_step / SEQ_LENGTH * 2π`,
//!   `end_angle = (end_step or SEQ_LENGTH) / SEQ_LENGTH * 2π`
//! - Each note becomes a pie slice `M cx cy L sx sy A r r 0 0 1 ex ey Z` and a
//!   halo ring of radius `max_radius + 2` drawn on a separate layer
//! - Notes more than 4 semitones outside the instrument range are dropped here
//!
//! ## Interaction State
//! Every cell has a pointer rectangle covering it exactly, and two flags:
//! `is_on` (the cell's voice is playing) and `is_hovered`. The flags are
//! reflected as the `on` and `hover` classes in the SVG output.
//!
//! ## Output
//! [`render_svg()`] emits the whole grid as one SVG document, in the same
//! string-building style as the rest of the crate's text output.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use serde::Serialize;

use crate::corners::is_valid_note;
use crate::sequence::NoteSequence;
use crate::{MAX_NOTE, MIN_NOTE, SEQ_LENGTH};

/// Semitones outside the instrument range that are still drawn.
pub const PITCH_FORGIVENESS: i16 = 4;

/// Where a cell sits on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellLayout {
    pub index: usize,
    pub row: usize,
    pub col: usize,
    pub cell_size: f64,
    pub center_x: f64,
    pub center_y: f64,
    pub max_radius: f64,
}

impl CellLayout {
    /// Layout of cell `index` (row-major) in a `grid_size × grid_size` grid.
    ///
    /// # Example
    /// ```
    /// use chordspace::radial::CellLayout;
    ///
    /// let cell = CellLayout::new(12, 10, 1000.0);
    /// assert_eq!((cell.row, cell.col), (1, 2));
    /// assert_eq!(cell.cell_size, 100.0);
    /// ```
    pub fn new(index: usize, grid_size: usize, canvas_size: f64) -> Self {
        let row = index / grid_size;
        let col = index % grid_size;
        let cell_size = canvas_size / grid_size as f64;
        let margin = cell_size / 30.0;
        Self {
            index,
            row,
            col,
            cell_size,
            center_x: (col as f64 + 0.5) * cell_size + margin,
            center_y: (row as f64 + 0.5) * cell_size + margin,
            max_radius: cell_size / 2.0 - 2.0 * margin,
        }
    }

    /// The pointer rectangle covering this cell.
    pub fn pointer_area(&self) -> Rect {
        Rect {
            x: self.col as f64 * self.cell_size,
            y: self.row as f64 * self.cell_size,
            width: self.cell_size,
            height: self.cell_size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteSlice {
    pub pitch: u8,
    pub radius: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    /// SVG path data.
    pub path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Halo {
    pub cx: f64,
    pub cy: f64,
    pub r: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteShape {
    pub slice: NoteSlice,
    pub halo: Halo,
}

/// Pie-slice path from the center out to `radius` between two angles.
pub fn build_slice(cx: f64, cy: f64, start_angle: f64, end_angle: f64, radius: f64) -> String {
    let start_x = cx + start_angle.cos() * radius;
    let start_y = cy + start_angle.sin() * radius;
    let end_x = cx + end_angle.cos() * radius;
    let end_y = cy + end_angle.sin() * radius;
    format!(
        "M {} {} L {} {} A {} {} 0 0 1 {} {} Z",
        cx, cy, start_x, start_y, radius, radius, end_x, end_y
    )
}

/// Radius for `pitch` inside a cell of `max_radius`.
pub fn pitch_radius(pitch: u8, max_radius: f64) -> f64 {
    let relative = (MAX_NOTE as f64 - (pitch as f64 - MIN_NOTE as f64)) / MAX_NOTE as f64;
    relative * max_radius
}

/// Angle of a quantized step; one sequence is always one full turn.
pub fn step_angle(step: u32) -> f64 {
    step as f64 / SEQ_LENGTH as f64 * PI * 2.0
}

/// Geometry for every drawable note of `sequence`, keyed by start step.
///
/// When two notes share a start step the later one wins.
pub fn map_notes(sequence: &NoteSequence, layout: &CellLayout) -> BTreeMap<u32, NoteShape> {
    let mut shapes = BTreeMap::new();
    for note in &sequence.notes {
        if note.pitch == 0 || !is_valid_note(note.pitch as i16, PITCH_FORGIVENESS) {
            continue;
        }
        let start_step = note.quantized_start_step.unwrap_or(0);
        let radius = pitch_radius(note.pitch, layout.max_radius);
        let start_angle = step_angle(start_step);
        let end_angle = step_angle(note.quantized_end_step.unwrap_or(SEQ_LENGTH));

        let slice = NoteSlice {
            pitch: note.pitch,
            radius,
            start_angle,
            end_angle,
            path: build_slice(layout.center_x, layout.center_y, start_angle, end_angle, radius),
        };
        let halo = Halo {
            cx: layout.center_x,
            cy: layout.center_y,
            r: layout.max_radius + 2.0,
        };
        shapes.insert(start_step, NoteShape { slice, halo });
    }
    shapes
}

/// A rendered grid cell and its interaction state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellVisual {
    pub layout: CellLayout,
    pub notes: BTreeMap<u32, NoteShape>,
    pub pointer_area: Rect,
    pub is_on: bool,
    pub is_hovered: bool,
    #[serde(skip)]
    pub sequence: NoteSequence,
}

impl CellVisual {
    pub fn new(sequence: NoteSequence, layout: CellLayout) -> Self {
        Self {
            notes: map_notes(&sequence, &layout),
            pointer_area: layout.pointer_area(),
            layout,
            is_on: false,
            is_hovered: false,
            sequence,
        }
    }

    pub fn index(&self) -> usize {
        self.layout.index
    }

    /// Flip the on/off flag and return the new state.
    pub fn toggle(&mut self) -> bool {
        self.is_on = !self.is_on;
        self.is_on
    }

    pub fn set_hover(&mut self, hovered: bool) {
        self.is_hovered = hovered;
    }

    /// CSS class list of the cell's group element.
    pub fn class(&self) -> &'static str {
        match (self.is_on, self.is_hovered) {
            (true, true) => "on hover",
            (true, false) => "on",
            (false, true) => "hover",
            (false, false) => "",
        }
    }
}

/// Build visuals for a whole grid of row-major `cells`.
pub fn build_visuals(cells: &[NoteSequence], grid_size: usize, canvas_size: f64) -> Vec<CellVisual> {
    cells
        .iter()
        .enumerate()
        .map(|(index, sequence)| {
            CellVisual::new(sequence.clone(), CellLayout::new(index, grid_size, canvas_size))
        })
        .collect()
}

/// Index of the cell under canvas point `(x, y)`, if any.
pub fn hit_test(visuals: &[CellVisual], x: f64, y: f64) -> Option<usize> {
    visuals
        .iter()
        .find(|v| v.pointer_area.contains(x, y))
        .map(CellVisual::index)
}

/// Render every cell as an SVG document with a halo layer under the note layer.
pub fn render_svg(visuals: &[CellVisual], canvas_size: f64) -> String {
    let mut svg = String::new();

    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}">"#,
        canvas_size, canvas_size
    ));
    svg.push('\n');

    svg.push_str("  <defs>\n");
    svg.push_str("    <radialGradient id=\"halo\">\n");
    svg.push_str("      <stop offset=\"0%\" stop-color=\"rgba(255, 255, 255, 0.5)\"/>\n");
    svg.push_str("      <stop offset=\"95%\" stop-color=\"rgba(255, 255, 255, 0.5)\"/>\n");
    svg.push_str("      <stop offset=\"100%\" stop-color=\"rgba(255, 255, 255, 0)\"/>\n");
    svg.push_str("    </radialGradient>\n");
    svg.push_str("  </defs>\n");

    svg.push_str("  <g id=\"vis-halos\">\n");
    for visual in visuals {
        for shape in visual.notes.values() {
            let class = if visual.is_on { "halo on" } else { "halo" };
            svg.push_str(&format!(
                "    <circle class=\"{}\" cx=\"{}\" cy=\"{}\" r=\"{}\"/>\n",
                class, shape.halo.cx, shape.halo.cy, shape.halo.r
            ));
        }
    }
    svg.push_str("  </g>\n");

    svg.push_str("  <g id=\"vis-elements\">\n");
    for visual in visuals {
        svg.push_str(&cell_to_svg(visual));
    }
    svg.push_str("  </g>\n");

    svg.push_str("</svg>\n");
    svg
}

fn cell_to_svg(visual: &CellVisual) -> String {
    let mut svg = String::new();
    svg.push_str(&format!(
        "    <g class=\"{}\" data-cell=\"{}\">\n",
        visual.class(),
        visual.index()
    ));
    for shape in visual.notes.values() {
        svg.push_str(&format!("      <path class=\"note\" d=\"{}\"/>\n", shape.slice.path));
    }
    let area = &visual.pointer_area;
    svg.push_str(&format!(
        "      <rect class=\"pointer-area\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"/>\n",
        area.x, area.y, area.width, area.height
    ));
    svg.push_str("    </g>\n");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::NoteEvent;

    fn sequence(notes: Vec<NoteEvent>) -> NoteSequence {
        NoteSequence {
            notes,
            ..NoteSequence::empty(4.0, 120.0)
        }
    }

    #[test]
    fn test_cell_layout() {
        let first = CellLayout::new(0, 10, 1000.0);
        let margin = 100.0 / 30.0;
        assert_eq!(first.center_x, 50.0 + margin);
        assert_eq!(first.center_y, 50.0 + margin);
        assert_eq!(first.max_radius, 50.0 - 2.0 * margin);

        let last = CellLayout::new(99, 10, 1000.0);
        assert_eq!((last.row, last.col), (9, 9));
        assert_eq!(last.pointer_area(), Rect { x: 900.0, y: 900.0, width: 100.0, height: 100.0 });
    }

    #[test]
    fn test_higher_pitch_smaller_radius() {
        let low = pitch_radius(48, 40.0);
        let high = pitch_radius(83, 40.0);
        assert_eq!(low, 40.0);
        assert!(high < low);
        assert!((high - 40.0 * 48.0 / 83.0).abs() < 1e-12);
    }

    #[test]
    fn test_angles_cover_one_turn() {
        assert_eq!(step_angle(0), 0.0);
        assert!((step_angle(SEQ_LENGTH / 2) - PI).abs() < 1e-12);
        assert!((step_angle(SEQ_LENGTH) - 2.0 * PI).abs() < 1e-12);
    }

    #[test]
    fn test_missing_steps_default_to_full_circle() {
        let layout = CellLayout::new(0, 10, 1000.0);
        let note = NoteEvent { pitch: 60, ..Default::default() };
        let shapes = map_notes(&sequence(vec![note]), &layout);
        let slice = &shapes[&0].slice;
        assert_eq!(slice.start_angle, 0.0);
        assert!((slice.end_angle - 2.0 * PI).abs() < 1e-12);
    }

    #[test]
    fn test_out_of_range_notes_are_dropped() {
        let layout = CellLayout::new(0, 10, 1000.0);
        let notes = vec![
            NoteEvent::stepped(43, 0, 2),  // 5 below range
            NoteEvent::stepped(44, 2, 4),  // 4 below, forgiven
            NoteEvent::stepped(87, 4, 6),  // 4 above, forgiven
            NoteEvent::stepped(88, 6, 8),  // 5 above
            NoteEvent::stepped(0, 8, 10),  // no pitch
        ];
        let shapes = map_notes(&sequence(notes), &layout);
        assert_eq!(shapes.keys().copied().collect::<Vec<_>>(), vec![2, 4]);
    }

    #[test]
    fn test_same_start_step_keeps_last_note() {
        let layout = CellLayout::new(0, 10, 1000.0);
        let notes = vec![NoteEvent::stepped(60, 4, 6), NoteEvent::stepped(72, 4, 8)];
        let shapes = map_notes(&sequence(notes), &layout);
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[&4].slice.pitch, 72);
    }

    #[test]
    fn test_slice_path_shape() {
        let path = build_slice(10.0, 20.0, 0.0, PI / 2.0, 5.0);
        assert!(path.starts_with("M 10 20 L 15 20 A 5 5 0 0 1 "));
        assert!(path.ends_with(" Z"));
    }

    #[test]
    fn test_mapping_is_idempotent() {
        let layout = CellLayout::new(37, 10, 1000.0);
        let seq = sequence(vec![
            NoteEvent::stepped(60, 0, 4),
            NoteEvent::stepped(67, 4, 6),
            NoteEvent::stepped(79, 8, 16),
        ]);
        assert_eq!(map_notes(&seq, &layout), map_notes(&seq, &layout));
        assert_eq!(CellVisual::new(seq.clone(), layout), CellVisual::new(seq, layout));
    }

    #[test]
    fn test_halo_is_fixed_ring() {
        let layout = CellLayout::new(5, 10, 1000.0);
        let seq = sequence(vec![NoteEvent::stepped(50, 0, 2), NoteEvent::stepped(80, 2, 4)]);
        for shape in map_notes(&seq, &layout).values() {
            assert_eq!(shape.halo.r, layout.max_radius + 2.0);
            assert_eq!((shape.halo.cx, shape.halo.cy), (layout.center_x, layout.center_y));
        }
    }

    #[test]
    fn test_toggle_and_hover_classes() {
        let mut cell = CellVisual::new(sequence(vec![]), CellLayout::new(0, 10, 1000.0));
        assert_eq!(cell.class(), "");
        assert!(cell.toggle());
        assert_eq!(cell.class(), "on");
        cell.set_hover(true);
        assert_eq!(cell.class(), "on hover");
        assert!(!cell.toggle());
        assert_eq!(cell.class(), "hover");
    }

    #[test]
    fn test_hit_test() {
        let cells = vec![sequence(vec![]); 4];
        let visuals = build_visuals(&cells, 2, 100.0);
        assert_eq!(hit_test(&visuals, 10.0, 10.0), Some(0));
        assert_eq!(hit_test(&visuals, 60.0, 10.0), Some(1));
        assert_eq!(hit_test(&visuals, 10.0, 60.0), Some(2));
        assert_eq!(hit_test(&visuals, 99.0, 99.0), Some(3));
        assert_eq!(hit_test(&visuals, 100.0, 10.0), None);
    }

    #[test]
    fn test_render_svg() {
        let cells = vec![
            sequence(vec![NoteEvent::stepped(60, 0, 8), NoteEvent::stepped(64, 8, 16)]),
            sequence(vec![]),
        ];
        let mut visuals = build_visuals(&cells, 2, 200.0);
        visuals[0].toggle();
        let svg = render_svg(&visuals, 200.0);

        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 200 200\">"));
        assert_eq!(svg.matches("<path class=\"note\"").count(), 2);
        assert_eq!(svg.matches("<circle class=\"halo on\"").count(), 2);
        assert_eq!(svg.matches("<rect class=\"pointer-area\"").count(), 2);
        assert!(svg.contains("<g class=\"on\" data-cell=\"0\">"));
        assert!(svg.contains("<g class=\"\" data-cell=\"1\">"));
        // Halo layer comes before the note layer
        assert!(svg.find("vis-halos").unwrap() < svg.find("vis-elements").unwrap());
    }
}
