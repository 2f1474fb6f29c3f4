//! Playback event conversion

use serde::{Deserialize, Serialize};

use crate::chord::note_name;
use crate::sequence::NoteSequence;
use crate::{REFERENCE_TEMPO, SEQ_LENGTH, STEPS_PER_QUARTER};

/// Seconds per quantized step at the reference tempo.
pub const STEP_SECONDS: f64 = 60.0 / REFERENCE_TEMPO / STEPS_PER_QUARTER as f64;

/// Length of one voice loop at the reference tempo.
pub const LOOP_SECONDS: f64 = SEQ_LENGTH as f64 * STEP_SECONDS;

/// Longest sounding duration of a single trigger, in seconds.
pub const MAX_NOTE_DURATION: f64 = 0.5;

/// Normalized velocity for notes without one.
pub const DEFAULT_VELOCITY: f64 = 0.7;

/// A note ready to be triggered by a voice.
///
/// `time` is the offset into the loop in reference seconds; `duration` is
/// in seconds and already capped at [`MAX_NOTE_DURATION`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackEvent {
    pub time: f64,
    pub pitch: u8,
    /// Scientific note name, e.g. `C#4`.
    pub note: String,
    pub duration: f64,
    /// Velocity in `[0, 1]`.
    pub velocity: f64,
}

/// Convert a cell sequence into loop events, ordered by time.
///
/// Missing start steps count as step 0, missing end steps as the end of the
/// loop. Notes that start at or after the loop end are dropped since the voice
/// wraps before reaching them.
pub fn to_playback_events(sequence: &NoteSequence) -> Vec<PlaybackEvent> {
    let mut events: Vec<PlaybackEvent> = sequence
        .notes
        .iter()
        .filter_map(|note| {
            let start = note.quantized_start_step.unwrap_or(0);
            if start >= SEQ_LENGTH {
                return None;
            }
            let end = note.quantized_end_step.unwrap_or(SEQ_LENGTH);
            let span = end.saturating_sub(start) as f64 * STEP_SECONDS;

            let velocity = match note.velocity {
                Some(v) if v > 0 => v as f64 / 127.0,
                _ => DEFAULT_VELOCITY,
            };

            Some(PlaybackEvent {
                time: start as f64 * STEP_SECONDS,
                pitch: note.pitch,
                note: note_name(note.pitch),
                duration: span.min(MAX_NOTE_DURATION),
                velocity,
            })
        })
        .collect();

    events.sort_by(|a, b| a.time.total_cmp(&b.time));
    events
}
