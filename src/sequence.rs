//! Note sequence types shared by the models, the radial mapper and the scheduler.
//!
//! Timing lives in two forms: absolute `start_time`/`end_time` in seconds, and
//! quantized steps on a grid of [`STEPS_PER_QUARTER`](crate::STEPS_PER_QUARTER)
//! steps per quarter note. Seeds are built in seconds and then quantized; model
//! output and everything downstream of it is read by step.

use serde::{Deserialize, Serialize};

use crate::STEPS_PER_QUARTER;

/// A single note.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteEvent {
    pub pitch: u8,
    #[serde(default)]
    pub start_time: f64,
    #[serde(default)]
    pub end_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantized_start_step: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantized_end_step: Option<u32>,
    /// MIDI velocity 0–127, absent when the model did not supply one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<u8>,
}

impl NoteEvent {
    /// A quantized note spanning `start..end` steps.
    pub fn stepped(pitch: u8, start: u32, end: u32) -> Self {
        Self {
            pitch,
            quantized_start_step: Some(start),
            quantized_end_step: Some(end),
            ..Default::default()
        }
    }

    pub fn with_velocity(mut self, velocity: u8) -> Self {
        self.velocity = Some(velocity);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TempoMarker {
    pub time: f64,
    pub qpm: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSignatureMarker {
    pub time: f64,
    pub numerator: u8,
    pub denominator: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantizationInfo {
    pub steps_per_quarter: u32,
}

/// An ordered list of notes (by start step) plus tempo and length.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteSequence {
    #[serde(default)]
    pub notes: Vec<NoteEvent>,
    #[serde(default)]
    pub total_time: f64,
    #[serde(default)]
    pub tempos: Vec<TempoMarker>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub time_signatures: Vec<TimeSignatureMarker>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantization_info: Option<QuantizationInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_quantized_steps: Option<u32>,
}

impl NoteSequence {
    /// A silent sequence of the given length, stamped with `qpm`.
    pub fn empty(total_time: f64, qpm: f64) -> Self {
        Self {
            total_time,
            tempos: vec![TempoMarker { time: 0.0, qpm }],
            ..Default::default()
        }
    }

    /// Replace the tempo markers with a single marker at time zero.
    pub fn set_tempo(&mut self, qpm: f64) {
        self.tempos = vec![TempoMarker { time: 0.0, qpm }];
    }

    /// First tempo marker, if any.
    pub fn qpm(&self) -> Option<f64> {
        self.tempos.first().map(|t| t.qpm)
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn is_quantized(&self) -> bool {
        self.quantization_info.is_some()
    }

    /// Quantize note times onto `steps_per_quarter` steps per quarter note.
    ///
    /// Uses the sequence's first tempo marker (120 qpm if absent). A note that
    /// would collapse to zero length is extended to one step.
    ///
    /// # Example
    /// ```
    /// use chordspace::sequence::{NoteEvent, NoteSequence};
    ///
    /// let mut seq = NoteSequence::empty(1.0, 120.0);
    /// seq.notes.push(NoteEvent { pitch: 60, start_time: 0.25, end_time: 0.5, ..Default::default() });
    /// let q = seq.quantize(4);
    ///
    /// // At 120 qpm a sixteenth step is 0.125 s
    /// assert_eq!(q.notes[0].quantized_start_step, Some(2));
    /// assert_eq!(q.notes[0].quantized_end_step, Some(4));
    /// assert_eq!(q.total_quantized_steps, Some(8));
    /// ```
    pub fn quantize(&self, steps_per_quarter: u32) -> NoteSequence {
        let qpm = self.qpm().unwrap_or(120.0);
        let steps_per_second = qpm / 60.0 * steps_per_quarter as f64;
        let to_step = |seconds: f64| (seconds * steps_per_second).round().max(0.0) as u32;

        let mut out = self.clone();
        for note in &mut out.notes {
            let start = to_step(note.start_time);
            let mut end = to_step(note.end_time);
            if end <= start {
                end = start + 1;
            }
            note.quantized_start_step = Some(start);
            note.quantized_end_step = Some(end);
        }
        out.notes.sort_by_key(|n| n.quantized_start_step);

        let last_end = out
            .notes
            .iter()
            .filter_map(|n| n.quantized_end_step)
            .max()
            .unwrap_or(0);
        out.total_quantized_steps = Some(to_step(self.total_time).max(last_end));
        out.quantization_info = Some(QuantizationInfo { steps_per_quarter });
        out
    }
}

/// Seconds per quantized step at `qpm`.
pub fn seconds_per_step(qpm: f64) -> f64 {
    60.0 / qpm / STEPS_PER_QUARTER as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sequence_carries_tempo() {
        let seq = NoteSequence::empty(8.0, 90.0);
        assert!(seq.is_empty());
        assert_eq!(seq.total_time, 8.0);
        assert_eq!(seq.qpm(), Some(90.0));
        assert!(!seq.is_quantized());
    }

    #[test]
    fn test_quantize_extends_zero_length_notes() {
        let mut seq = NoteSequence::empty(1.0, 120.0);
        seq.notes.push(NoteEvent { pitch: 64, start_time: 0.5, end_time: 0.51, ..Default::default() });
        let q = seq.quantize(4);
        assert_eq!(q.notes[0].quantized_start_step, Some(4));
        assert_eq!(q.notes[0].quantized_end_step, Some(5));
    }

    #[test]
    fn test_quantize_sorts_by_start_step() {
        let mut seq = NoteSequence::empty(2.0, 60.0);
        seq.notes.push(NoteEvent { pitch: 67, start_time: 1.0, end_time: 1.5, ..Default::default() });
        seq.notes.push(NoteEvent { pitch: 60, start_time: 0.0, end_time: 0.5, ..Default::default() });
        let q = seq.quantize(4);
        assert_eq!(q.notes[0].pitch, 60);
        assert_eq!(q.notes[1].quantized_start_step, Some(4));
        assert_eq!(q.total_quantized_steps, Some(8));
    }

    #[test]
    fn test_json_uses_camel_case() {
        let seq = NoteSequence {
            notes: vec![NoteEvent::stepped(60, 0, 2).with_velocity(100)],
            ..NoteSequence::empty(4.0, 120.0)
        };
        let json = serde_json::to_string(&seq).unwrap();
        assert!(json.contains("\"quantizedStartStep\":0"));
        assert!(json.contains("\"totalTime\":4.0"));
        assert!(json.contains("\"qpm\":120.0"));

        let back: NoteSequence = serde_json::from_str(&json).unwrap();
        assert_eq!(back, seq);
    }

    #[test]
    fn test_seconds_per_step() {
        assert_eq!(seconds_per_step(120.0), 0.125);
        assert_eq!(seconds_per_step(60.0), 0.25);
    }
}
