//! Seed melodies for the continuation model.
//!
//! A seed is the chord root repeated as eighth notes over the length of one
//! grid sequence, quantized at four steps per quarter. It is a pure function of
//! the chord symbol and the tempo.

use tracing::debug;

use crate::chord::{root_pitch, split_root};
use crate::sequence::{NoteEvent, NoteSequence, TimeSignatureMarker};
use crate::{MAX_NOTE, MIN_NOTE, SEQ_LENGTH, STEPS_PER_QUARTER};

/// Root pitch used when a symbol has no recognizable root.
pub const DEFAULT_ROOT: u8 = 60;

/// Velocity of every seed note.
pub const SEED_VELOCITY: u8 = 100;

/// Resolve the seed pitch for a chord symbol, folded into the instrument range.
pub fn seed_pitch(chord_symbol: &str) -> u8 {
    let mut pitch = split_root(chord_symbol)
        .and_then(|(root, _)| root_pitch(root))
        .unwrap_or(DEFAULT_ROOT) as i16;

    while pitch < MIN_NOTE as i16 {
        pitch += 12;
    }
    while pitch > MAX_NOTE as i16 {
        pitch -= 12;
    }
    pitch as u8
}

/// Build the quantized seed for `chord_symbol` at `tempo` quarter notes per minute.
///
/// # Example
/// ```
/// use chordspace::seed::build_seed;
///
/// let seed = build_seed("Gm7", 120.0);
///
/// // 8 quarter notes at 120 bpm
/// assert_eq!(seed.total_time, 4.0);
/// assert_eq!(seed.notes.len(), 16);
/// assert!(seed.notes.iter().all(|n| n.pitch == 67));
/// assert_eq!(seed.notes[1].quantized_start_step, Some(2));
/// ```
pub fn build_seed(chord_symbol: &str, tempo: f64) -> NoteSequence {
    let pitch = seed_pitch(chord_symbol);

    let quarter = 60.0 / tempo;
    let eighth = quarter / 2.0;
    let seed_duration = (SEQ_LENGTH as f64 / 4.0) * quarter;
    let num_notes = ((seed_duration / eighth).floor() as usize).max(1);

    let notes = (0..num_notes)
        .map(|i| NoteEvent {
            pitch,
            start_time: i as f64 * eighth,
            end_time: (i + 1) as f64 * eighth,
            velocity: Some(SEED_VELOCITY),
            ..Default::default()
        })
        .collect();

    let mut seed = NoteSequence::empty(seed_duration, tempo);
    seed.notes = notes;
    seed.time_signatures = vec![TimeSignatureMarker { time: 0.0, numerator: 4, denominator: 4 }];

    debug!(chord = chord_symbol, pitch, num_notes, "built seed");
    seed.quantize(STEPS_PER_QUARTER)
}
