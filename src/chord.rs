//! # Chord Theory
//!
//! Pitch classes, chord qualities and chord symbols for the two control panels.
//!
//! ## Chord Symbols
//! A chord symbol is a root note name without octave followed by a quality
//! suffix: `CM`, `Gm7`, `F#M7`, `Bb7`, `DMsus4`. The root is always written
//! with sharps when produced here; flats are accepted when parsing.
//!
//! | Quality       | Suffix  | Intervals        |
//! |---------------|---------|------------------|
//! | `major`       | `M`     | 0, 4, 7          |
//! | `minor`       | `m`     | 0, 3, 7          |
//! | `major7th`    | `M7`    | 0, 4, 7, 11      |
//! | `minor7th`    | `m7`    | 0, 3, 7, 10      |
//! | `dominant7th` | `7`     | 0, 4, 7, 10      |
//! | `sus2`        | `Msus2` | 0, 2, 7          |
//! | `sus4`        | `Msus4` | 0, 5, 7          |
//!
//! ## MIDI Note Reference
//! - C4 = 60, so `note_name(60) == "C4"` and `note_name(61) == "C#4"`
//! - The instrument range is [`MIN_NOTE`](crate::MIN_NOTE) = 48 (C3) to
//!   [`MAX_NOTE`](crate::MAX_NOTE) = 83 (B5)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SpaceError;

const SHARP_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Display labels for the twelve tonic buttons of a control panel.
pub const TONIC_LABELS: [&str; 12] = [
    "C",
    "C♯ / D♭",
    "D",
    "D♯ / E♭",
    "E",
    "F",
    "F♯ / G♭",
    "G",
    "G♯ / A♭",
    "A",
    "A♯ / B♭",
    "B",
];

/// Root name → MIDI pitch in the octave above middle C.
const ROOT_PITCHES: [(&str, u8); 17] = [
    ("C", 60),
    ("C#", 61),
    ("Db", 61),
    ("D", 62),
    ("D#", 63),
    ("Eb", 63),
    ("E", 64),
    ("F", 65),
    ("F#", 66),
    ("Gb", 66),
    ("G", 67),
    ("G#", 68),
    ("Ab", 68),
    ("A", 69),
    ("A#", 70),
    ("Bb", 70),
    ("B", 71),
];

/// A tonic as an offset 0–11 above C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PitchClass(u8);

impl PitchClass {
    pub fn new(value: u8) -> Option<Self> {
        (value < 12).then_some(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Sharp spelling, e.g. `C#`.
    pub fn name(self) -> &'static str {
        SHARP_NAMES[self.0 as usize]
    }

    /// Button label, e.g. `C♯ / D♭`.
    pub fn label(self) -> &'static str {
        TONIC_LABELS[self.0 as usize]
    }

    pub fn all() -> impl Iterator<Item = PitchClass> {
        (0..12).map(PitchClass)
    }
}

impl TryFrom<u8> for PitchClass {
    type Error = SpaceError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        PitchClass::new(value).ok_or_else(|| SpaceError::UnknownChord(format!("tonic {}", value)))
    }
}

impl From<PitchClass> for u8 {
    fn from(pc: PitchClass) -> u8 {
        pc.0
    }
}

impl FromStr for PitchClass {
    type Err = SpaceError;

    /// Accepts a note name (`G`, `F#`, `Bb`) or a numeric offset (`7`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(n) = s.parse::<u8>() {
            return PitchClass::try_from(n);
        }
        root_pitch(s)
            .map(|pitch| PitchClass(pitch % 12))
            .ok_or_else(|| SpaceError::UnknownChord(s.to_string()))
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The seven chord qualities offered by a control panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChordQuality {
    #[default]
    Major,
    Minor,
    Major7th,
    Minor7th,
    Dominant7th,
    Sus2,
    Sus4,
}

impl ChordQuality {
    pub const ALL: [ChordQuality; 7] = [
        ChordQuality::Major,
        ChordQuality::Minor,
        ChordQuality::Major7th,
        ChordQuality::Minor7th,
        ChordQuality::Dominant7th,
        ChordQuality::Sus2,
        ChordQuality::Sus4,
    ];

    /// Suffix appended to the root name in a chord symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            ChordQuality::Major => "M",
            ChordQuality::Minor => "m",
            ChordQuality::Major7th => "M7",
            ChordQuality::Minor7th => "m7",
            ChordQuality::Dominant7th => "7",
            ChordQuality::Sus2 => "Msus2",
            ChordQuality::Sus4 => "Msus4",
        }
    }

    /// Button label, matching the serialized name.
    pub fn name(self) -> &'static str {
        match self {
            ChordQuality::Major => "major",
            ChordQuality::Minor => "minor",
            ChordQuality::Major7th => "major7th",
            ChordQuality::Minor7th => "minor7th",
            ChordQuality::Dominant7th => "dominant7th",
            ChordQuality::Sus2 => "sus2",
            ChordQuality::Sus4 => "sus4",
        }
    }

    /// Semitone offsets of the chord tones above the root.
    pub fn intervals(self) -> &'static [u8] {
        match self {
            ChordQuality::Major => &[0, 4, 7],
            ChordQuality::Minor => &[0, 3, 7],
            ChordQuality::Major7th => &[0, 4, 7, 11],
            ChordQuality::Minor7th => &[0, 3, 7, 10],
            ChordQuality::Dominant7th => &[0, 4, 7, 10],
            ChordQuality::Sus2 => &[0, 2, 7],
            ChordQuality::Sus4 => &[0, 5, 7],
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "" | "M" | "maj" => Some(ChordQuality::Major),
            "m" | "min" | "-" => Some(ChordQuality::Minor),
            "M7" | "maj7" => Some(ChordQuality::Major7th),
            "m7" | "min7" | "-7" => Some(ChordQuality::Minor7th),
            "7" => Some(ChordQuality::Dominant7th),
            "Msus2" | "sus2" => Some(ChordQuality::Sus2),
            "Msus4" | "sus4" => Some(ChordQuality::Sus4),
            _ => None,
        }
    }
}

impl FromStr for ChordQuality {
    type Err = SpaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChordQuality::ALL
            .into_iter()
            .find(|q| q.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SpaceError::UnknownChord(s.to_string()))
    }
}

impl fmt::Display for ChordQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A chord anchored at a concrete MIDI root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chord {
    pub root: u8,
    pub quality: ChordQuality,
}

impl Chord {
    pub fn new(root: u8, quality: ChordQuality) -> Self {
        Self { root, quality }
    }

    /// Chord symbol with the octave dropped, e.g. `CM` for both C3 and C5 roots.
    pub fn symbol(&self) -> String {
        format!("{}{}", SHARP_NAMES[(self.root % 12) as usize], self.quality.symbol())
    }

    /// MIDI pitches of the chord tones stacked on the root.
    pub fn pitches(&self) -> Vec<u8> {
        self.quality
            .intervals()
            .iter()
            .map(|i| self.root.saturating_add(*i))
            .collect()
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol())
    }
}

/// Scientific pitch name for a MIDI note, e.g. `note_name(61) == "C#4"`.
pub fn note_name(midi: u8) -> String {
    let octave = (midi / 12) as i16 - 1;
    format!("{}{}", SHARP_NAMES[(midi % 12) as usize], octave)
}

/// Look up a bare root name (`C`, `F#`, `Bb`) in the root table.
pub fn root_pitch(name: &str) -> Option<u8> {
    ROOT_PITCHES
        .iter()
        .find(|(root, _)| *root == name)
        .map(|(_, pitch)| *pitch)
}

/// Split the leading root (`[A-G][#b]?`) off a chord symbol.
///
/// Returns `(root, suffix)`, or `None` if the symbol does not start with a note letter.
pub fn split_root(symbol: &str) -> Option<(&str, &str)> {
    let bytes = symbol.as_bytes();
    match bytes.first() {
        Some(b'A'..=b'G') => {}
        _ => return None,
    }
    let len = if matches!(bytes.get(1), Some(b'#') | Some(b'b')) { 2 } else { 1 };
    Some(symbol.split_at(len))
}

/// Parse a chord symbol into its root pitch (octave above middle C) and quality.
///
/// # Examples
/// ```
/// use chordspace::chord::{parse_chord_symbol, ChordQuality};
///
/// assert_eq!(parse_chord_symbol("CM"), Some((60, ChordQuality::Major)));
/// assert_eq!(parse_chord_symbol("Gm7"), Some((67, ChordQuality::Minor7th)));
/// assert_eq!(parse_chord_symbol("BbMsus4"), Some((70, ChordQuality::Sus4)));
/// assert_eq!(parse_chord_symbol("Hm"), None);
/// ```
pub fn parse_chord_symbol(symbol: &str) -> Option<(u8, ChordQuality)> {
    let (root, suffix) = split_root(symbol)?;
    let pitch = root_pitch(root)?;
    let quality = ChordQuality::from_suffix(suffix)?;
    Some((pitch, quality))
}
