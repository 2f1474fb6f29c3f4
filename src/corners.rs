//! # Corner Resolution
//!
//! Picks the four chords that anchor the interpolation grid.
//!
//! Each side of the control surface contributes two corners: its chord rooted
//! at `MIN_NOTE + tonic`, and the same chord moved as many octaves as will fit
//! in the direction with more headroom. The register contrast between the two
//! becomes one axis of the grid.
//!
//! ## Corner Order
//! `[shifted left, left, shifted right, right]`. The interpolation model reads
//! the four corners as top-left, top-right, bottom-left, bottom-right:
//!
//! ```text
//! (0,0) shifted left  ─────────  (0,N-1) left
//!       │                              │
//! (N-1,0) shifted right ───────  (N-1,N-1) right
//! ```
//!
//! Register therefore varies along each row and the left/right chord down
//! each column.

use serde::{Deserialize, Serialize};

use crate::chord::{Chord, ChordQuality, PitchClass};
use crate::{MAX_NOTE, MIN_NOTE};

/// Whether `note` lies within `forgive` semitones of the instrument range.
pub fn is_valid_note(note: i16, forgive: i16) -> bool {
    note <= MAX_NOTE as i16 + forgive && note >= MIN_NOTE as i16 - forgive
}

/// Move `note` by whole octaves toward the side of the range with more room,
/// as far as it stays in range.
///
/// Returns `note` unchanged when no in-range octave shift exists.
///
/// # Example
/// ```
/// use chordspace::corners::octave_shift;
///
/// assert_eq!(octave_shift(48), 72); // C3 → C5
/// assert_eq!(octave_shift(83), 59); // B5 → B3
/// assert_eq!(octave_shift(66), 54); // F#4 sits just above the middle
/// ```
pub fn octave_shift(note: u8) -> u8 {
    let note = note as i16;
    let shift: i16 = if MAX_NOTE as i16 - note > note - MIN_NOTE as i16 { 12 } else { -12 };
    let mut delta = 0;
    while is_valid_note(note + delta + shift, 0) {
        delta += shift;
    }
    (note + delta) as u8
}

/// One side of the control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SideSelection {
    pub tonic: PitchClass,
    pub quality: ChordQuality,
}

impl SideSelection {
    pub fn new(tonic: PitchClass, quality: ChordQuality) -> Self {
        Self { tonic, quality }
    }

    /// The side's chord rooted in the lowest octave of the range.
    pub fn base_chord(&self) -> Chord {
        Chord::new(MIN_NOTE + self.tonic.value(), self.quality)
    }

    /// The side's chord after octave balancing.
    pub fn shifted_chord(&self) -> Chord {
        Chord::new(octave_shift(MIN_NOTE + self.tonic.value()), self.quality)
    }
}

/// The four corner chords in grid order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CornerChords(pub [Chord; 4]);

impl CornerChords {
    pub fn chords(&self) -> &[Chord; 4] {
        &self.0
    }

    pub fn symbols(&self) -> [String; 4] {
        self.0.map(|c| c.symbol())
    }
}

/// Resolve the corner chords for a pair of control-panel selections.
///
/// # Example
/// ```
/// use chordspace::chord::{ChordQuality, PitchClass};
/// use chordspace::corners::{resolve_corners, SideSelection};
///
/// let left = SideSelection::new(PitchClass::new(0).unwrap(), ChordQuality::Major);
/// let right = SideSelection::new(PitchClass::new(7).unwrap(), ChordQuality::Minor7th);
/// let corners = resolve_corners(&left, &right);
///
/// assert_eq!(corners.symbols(), ["CM", "CM", "Gm7", "Gm7"].map(String::from));
/// assert_eq!(corners.chords()[0].root, 72);
/// assert_eq!(corners.chords()[1].root, 48);
/// ```
pub fn resolve_corners(left: &SideSelection, right: &SideSelection) -> CornerChords {
    CornerChords([
        left.shifted_chord(),
        left.base_chord(),
        right.shifted_chord(),
        right.base_chord(),
    ])
}
