//! Deterministic stand-ins for the external collaborators.
//!
//! - [`ChordToneWalker`]: continuation that walks the conditioning chord's tones
//!   around the seed pitch, one note per eighth
//! - [`BlendInterpolator`]: fills the grid by picking, for every eighth, one
//!   corner's notes with probability equal to its bilinear weight at the cell
//! - [`LogEngine`]: writes every trigger to the log
//! - [`RecordingEngine`]: keeps every trigger for inspection
//!
//! These drive the CLI without model weights or an audio device, and back the
//! test suite.

use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use tracing::{debug, info};

use crate::audio::{AudioEngine, InstrumentKey, SampleBank};
use crate::chord::{parse_chord_symbol, Chord};
use crate::error::SpaceError;
use crate::model::{BoxFuture, ContinuationModel, InterpolationModel};
use crate::sequence::{seconds_per_step, NoteEvent, NoteSequence, QuantizationInfo};
use crate::{MAX_NOTE, MIN_NOTE, SEQ_LENGTH, STEPS_PER_QUARTER};

/// Steps per eighth note.
const EIGHTH: u32 = STEPS_PER_QUARTER / 2;

/// Tone-index offsets from the starting tone, repeated every bar.
const CONTOUR: [i32; 8] = [0, 1, 2, 1, 3, 2, 1, -1];

/// Chord-tone continuation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChordToneWalker;

impl ChordToneWalker {
    pub fn new() -> Self {
        Self
    }

    /// Walk `chord_symbol`'s tones for `steps` steps, starting near `anchor`.
    pub fn walk(&self, chord_symbol: &str, anchor: u8, steps: u32, qpm: f64) -> Result<NoteSequence, SpaceError> {
        let (root, quality) = parse_chord_symbol(chord_symbol)
            .ok_or_else(|| SpaceError::UnknownChord(chord_symbol.to_string()))?;
        let classes: Vec<u8> = Chord::new(root, quality).pitches().iter().map(|p| p % 12).collect();
        let tones: Vec<u8> = (MIN_NOTE..=MAX_NOTE).filter(|p| classes.contains(&(p % 12))).collect();
        if tones.is_empty() {
            return Err(SpaceError::UnknownChord(chord_symbol.to_string()));
        }

        let home = tones
            .iter()
            .enumerate()
            .min_by_key(|(_, p)| (**p as i32 - anchor as i32).abs())
            .map_or(0, |(i, _)| i as i32);

        let step_seconds = seconds_per_step(qpm);
        let notes = (0..steps / EIGHTH)
            .map(|k| {
                let offset = CONTOUR[k as usize % CONTOUR.len()];
                let idx = (home + offset).clamp(0, tones.len() as i32 - 1) as usize;
                let start = k * EIGHTH;
                let end = start + EIGHTH;
                NoteEvent {
                    pitch: tones[idx],
                    start_time: start as f64 * step_seconds,
                    end_time: end as f64 * step_seconds,
                    quantized_start_step: Some(start),
                    quantized_end_step: Some(end),
                    velocity: Some(if k % 2 == 0 { 100 } else { 80 }),
                }
            })
            .collect();

        let mut out = NoteSequence::empty(steps as f64 * step_seconds, qpm);
        out.notes = notes;
        out.quantization_info = Some(QuantizationInfo { steps_per_quarter: STEPS_PER_QUARTER });
        out.total_quantized_steps = Some(steps);
        Ok(out)
    }
}

impl ContinuationModel for ChordToneWalker {
    fn initialize(&self) -> BoxFuture<'_, Result<(), SpaceError>> {
        Box::pin(async {
            info!("chord-tone walker ready");
            Ok(())
        })
    }

    fn continue_sequence<'a>(
        &'a self,
        seed: &'a NoteSequence,
        steps: u32,
        _steps_per_second: f64,
        chord_conditioning: &'a [String],
    ) -> BoxFuture<'a, Result<Option<NoteSequence>, SpaceError>> {
        Box::pin(async move {
            let Some(chord) = chord_conditioning.first() else {
                return Ok(None);
            };
            let anchor = seed.notes.first().map_or(60, |n| n.pitch);
            let qpm = seed.qpm().unwrap_or(crate::REFERENCE_TEMPO);
            self.walk(chord, anchor, steps, qpm)
                .map(Some)
                .map_err(|e| SpaceError::Continuation {
                    chord: chord.clone(),
                    message: e.to_string(),
                })
        })
    }
}

/// Bilinear corner blend.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlendInterpolator {
    seed: u64,
}

impl BlendInterpolator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Corner weights `[top-left, top-right, bottom-left, bottom-right]` for a cell.
    ///
    /// # Example
    /// ```
    /// use chordspace::offline::BlendInterpolator;
    ///
    /// assert_eq!(BlendInterpolator::weights(0, 0, 10), [1.0, 0.0, 0.0, 0.0]);
    /// assert_eq!(BlendInterpolator::weights(0, 9, 10), [0.0, 1.0, 0.0, 0.0]);
    /// assert_eq!(BlendInterpolator::weights(9, 9, 10), [0.0, 0.0, 0.0, 1.0]);
    /// ```
    pub fn weights(row: usize, col: usize, n: usize) -> [f64; 4] {
        let span = n.saturating_sub(1).max(1) as f64;
        let u = col as f64 / span;
        let v = row as f64 / span;
        [(1.0 - u) * (1.0 - v), u * (1.0 - v), (1.0 - u) * v, u * v]
    }

    /// Blend one cell.
    pub fn blend(&self, corners: &[NoteSequence; 4], row: usize, col: usize, n: usize) -> NoteSequence {
        let weights = Self::weights(row, col, n);
        let mut rng = fastrand::Rng::with_seed(self.seed ^ (row * n + col) as u64);

        let mut notes = Vec::new();
        for slot in 0..SEQ_LENGTH / EIGHTH {
            let from = slot * EIGHTH;
            let to = from + EIGHTH;
            let corner = pick(&weights, rng.f64());
            notes.extend(
                corners[corner]
                    .notes
                    .iter()
                    .filter(|note| {
                        let start = note.quantized_start_step.unwrap_or(0);
                        start >= from && start < to
                    })
                    .cloned(),
            );
        }

        let qpm = corners[0].qpm().unwrap_or(crate::REFERENCE_TEMPO);
        let mut out = NoteSequence::empty(SEQ_LENGTH as f64 * seconds_per_step(qpm), qpm);
        out.notes = notes;
        out.quantization_info = Some(QuantizationInfo { steps_per_quarter: STEPS_PER_QUARTER });
        out.total_quantized_steps = Some(SEQ_LENGTH);
        out
    }
}

fn pick(weights: &[f64; 4], draw: f64) -> usize {
    let mut acc = 0.0;
    for (i, w) in weights.iter().enumerate() {
        acc += w;
        if draw < acc {
            return i;
        }
    }
    // Rounding can leave the sum just under 1
    weights.iter().rposition(|w| *w > 0.0).unwrap_or(0)
}

impl InterpolationModel for BlendInterpolator {
    fn initialize(&self) -> BoxFuture<'_, Result<(), SpaceError>> {
        Box::pin(async {
            info!("blend interpolator ready");
            Ok(())
        })
    }

    fn interpolate<'a>(
        &'a self,
        corners: &'a [NoteSequence; 4],
        n: usize,
    ) -> BoxFuture<'a, Result<Vec<NoteSequence>, SpaceError>> {
        Box::pin(async move {
            let cells = (0..n * n)
                .map(|i| self.blend(corners, i / n, i % n, n))
                .collect();
            Ok(cells)
        })
    }
}

/// Engine that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEngine;

impl AudioEngine for LogEngine {
    fn load<'a>(&'a self, bank: &'a SampleBank) -> BoxFuture<'a, Result<(), SpaceError>> {
        Box::pin(async move {
            info!(samplers = bank.samplers.len(), "sample bank loaded");
            Ok(())
        })
    }

    fn trigger_attack_release(&self, instrument: InstrumentKey, note: &str, duration: f64, time: f64, velocity: f64) {
        info!(
            instrument = instrument.sample_prefix().trim_end_matches('-'),
            note,
            duration,
            time,
            velocity,
            "trigger"
        );
    }
}

/// One captured engine call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedTrigger {
    pub instrument: InstrumentKey,
    pub note: String,
    pub duration: f64,
    pub time: f64,
    pub velocity: f64,
}

/// Engine that records every trigger.
#[derive(Debug, Default)]
pub struct RecordingEngine {
    triggers: Mutex<Vec<RecordedTrigger>>,
    loaded: Mutex<Option<SampleBank>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn triggers(&self) -> Vec<RecordedTrigger> {
        self.triggers.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn trigger_count(&self) -> usize {
        self.triggers.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn clear(&self) {
        self.triggers.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// The bank passed to the last `load`.
    pub fn loaded_bank(&self) -> Option<SampleBank> {
        self.loaded.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl AudioEngine for RecordingEngine {
    fn load<'a>(&'a self, bank: &'a SampleBank) -> BoxFuture<'a, Result<(), SpaceError>> {
        Box::pin(async move {
            *self.loaded.lock().unwrap_or_else(PoisonError::into_inner) = Some(bank.clone());
            Ok(())
        })
    }

    fn trigger_attack_release(&self, instrument: InstrumentKey, note: &str, duration: f64, time: f64, velocity: f64) {
        debug!(note, time, "recorded trigger");
        self.triggers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedTrigger {
                instrument,
                note: note.to_string(),
                duration,
                time,
                velocity,
            });
    }
}
