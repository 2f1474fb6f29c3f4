//! Humanization and timbre selection.
//!
//! Both draw from their own seeded `fastrand::Rng`, so a fixed seed replays the
//! same jitter and the same instrument choices.

use crate::audio::{Family, InstrumentKey, Register};

use super::events::PlaybackEvent;

/// Random onset delay and duration stretch.
#[derive(Debug, Clone)]
pub struct Humanizer {
    rng: fastrand::Rng,
    max_delay: f64,
}

impl Humanizer {
    pub fn new(rng: fastrand::Rng, max_delay: f64) -> Self {
        Self { rng, max_delay }
    }

    /// Delay in `[0, max_delay]` seconds.
    pub fn delay(&mut self) -> f64 {
        self.rng.f64() * self.max_delay
    }

    /// `duration` scaled by a factor in `[0.95, 1.05]`.
    pub fn duration(&mut self, duration: f64) -> f64 {
        duration * (0.95 + self.rng.f64() * 0.1)
    }
}

/// Picks marimba or xylophone with equal probability per trigger.
#[derive(Debug, Clone)]
pub struct TimbreSelector {
    rng: fastrand::Rng,
}

impl TimbreSelector {
    pub fn new(rng: fastrand::Rng) -> Self {
        Self { rng }
    }

    pub fn family(&mut self) -> Family {
        if self.rng.bool() {
            Family::Marimba
        } else {
            Family::Xylophone
        }
    }

    pub fn instrument(&mut self, pitch: u8) -> InstrumentKey {
        InstrumentKey::new(self.family(), Register::for_pitch(pitch))
    }
}

/// Everything needed for one engine call, minus the absolute transport time.
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub instrument: InstrumentKey,
    pub note: String,
    pub duration: f64,
    /// Humanized delay added to the transport time.
    pub delay: f64,
    pub velocity: f64,
}

impl Trigger {
    pub fn humanize(event: &PlaybackEvent, humanizer: &mut Humanizer, timbre: &mut TimbreSelector) -> Self {
        Self {
            instrument: timbre.instrument(event.pitch),
            note: event.note.clone(),
            duration: humanizer.duration(event.duration),
            delay: humanizer.delay(),
            velocity: event.velocity,
        }
    }
}
