//! Looping voices for active grid cells.
//!
//! Each active cell owns one [`Voice`]: a tokio task that walks the cell's
//! events in loop time, sleeping until each trigger. Every trigger is pinned
//! to a beat on the shared [`Transport`], so all voices stay in phase with the
//! clock and with each other. Loop time advances at `tempo / 120` of wall
//! time; a tempo change re-times the pending trigger mid-loop.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::audio::AudioEngine;
use crate::sequence::NoteSequence;
use crate::{REFERENCE_TEMPO, TEMPO_MAX, TEMPO_MIN};

use super::events::{to_playback_events, PlaybackEvent, LOOP_SECONDS};
use super::humanize::{Humanizer, TimbreSelector, Trigger};
use super::transport::Transport;

/// A running loop for one cell. Dropping it stops the loop.
#[derive(Debug)]
pub struct Voice {
    index: usize,
    tempo: watch::Receiver<f64>,
    handle: JoinHandle<()>,
}

impl Voice {
    fn spawn(
        index: usize,
        events: Vec<PlaybackEvent>,
        transport: Arc<Transport>,
        engine: Arc<dyn AudioEngine>,
        humanizer: Humanizer,
        timbre: TimbreSelector,
    ) -> Self {
        let tempo = transport.subscribe();
        let joined_at = transport.position_beats();
        let handle = tokio::spawn(run_voice(
            events,
            joined_at,
            transport.clone(),
            engine,
            transport.subscribe(),
            humanizer,
            timbre,
        ));
        Self { index, tempo, handle }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Current loop speed relative to the reference tempo.
    pub fn playback_rate(&self) -> f64 {
        *self.tempo.borrow() / REFERENCE_TEMPO
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Voice {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Loop position in reference seconds to transport beats.
fn to_beats(reference_seconds: f64) -> f64 {
    reference_seconds * REFERENCE_TEMPO / 60.0
}

async fn run_voice(
    events: Vec<PlaybackEvent>,
    joined_at: f64,
    transport: Arc<Transport>,
    engine: Arc<dyn AudioEngine>,
    mut tempo: watch::Receiver<f64>,
    mut humanizer: Humanizer,
    mut timbre: TimbreSelector,
) {
    if events.is_empty() {
        // Nothing to trigger; stay alive until the voice is dropped
        while tempo.changed().await.is_ok() {}
        return;
    }

    let loop_beats = to_beats(LOOP_SECONDS);

    // Join the loop where the shared clock was when the voice was started
    let mut loop_start = (joined_at / loop_beats).floor() * loop_beats;
    let mut next = match events.iter().position(|e| loop_start + to_beats(e.time) >= joined_at) {
        Some(next) => next,
        None => {
            loop_start += loop_beats;
            0
        }
    };

    loop {
        // Deadlines are absolute beats on the transport, so a late wake-up
        // never shifts the triggers after it
        tempo.borrow_and_update();
        let target = loop_start + to_beats(events[next].time);
        let Some(deadline) = transport.instant_at_beats(target) else {
            if tempo.changed().await.is_err() {
                return;
            }
            continue;
        };

        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => {}
            changed = tempo.changed() => {
                if changed.is_err() {
                    return;
                }
                continue;
            }
        }

        let trigger = Trigger::humanize(&events[next], &mut humanizer, &mut timbre);
        engine.trigger_attack_release(
            trigger.instrument,
            &trigger.note,
            trigger.duration,
            transport.seconds_at(deadline) + trigger.delay,
            trigger.velocity,
        );

        next += 1;
        if next == events.len() {
            next = 0;
            loop_start += loop_beats;
        }
    }
}

/// Owns the active voice set and the shared transport.
///
/// Must be used from within a tokio runtime: starting a voice spawns a task.
pub struct PlaybackScheduler {
    transport: Arc<Transport>,
    engine: Arc<dyn AudioEngine>,
    voices: Mutex<BTreeMap<usize, Voice>>,
    rng: Mutex<fastrand::Rng>,
    humanize_timing: f64,
}

impl PlaybackScheduler {
    /// `seed` fixes every voice's humanization and timbre draws.
    pub fn new(
        engine: Arc<dyn AudioEngine>,
        transport: Arc<Transport>,
        humanize_timing: f64,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        Self {
            transport,
            engine,
            voices: Mutex::new(BTreeMap::new()),
            rng: Mutex::new(rng),
            humanize_timing,
        }
    }

    pub fn transport(&self) -> &Arc<Transport> {
        &self.transport
    }

    fn voices(&self) -> MutexGuard<'_, BTreeMap<usize, Voice>> {
        self.voices.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start looping `sequence` for cell `index`, replacing any voice it had.
    pub fn start(&self, index: usize, sequence: &NoteSequence) {
        let events = to_playback_events(sequence);
        let (humanizer, timbre) = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            (
                Humanizer::new(fastrand::Rng::with_seed(rng.u64(..)), self.humanize_timing),
                TimbreSelector::new(fastrand::Rng::with_seed(rng.u64(..))),
            )
        };

        self.transport.start();
        debug!(index, events = events.len(), "voice started");
        let voice = Voice::spawn(
            index,
            events,
            self.transport.clone(),
            self.engine.clone(),
            humanizer,
            timbre,
        );
        self.voices().insert(index, voice);
    }

    /// Stop the voice for `index`. Halts the transport when it was the last.
    ///
    /// Returns whether a voice was playing.
    pub fn stop(&self, index: usize) -> bool {
        let mut voices = self.voices();
        let removed = voices.remove(&index).is_some();
        if removed {
            debug!(index, "voice stopped");
        }
        if voices.is_empty() {
            self.transport.stop();
        }
        removed
    }

    pub fn stop_all(&self) {
        let mut voices = self.voices();
        if !voices.is_empty() {
            info!(count = voices.len(), "stopping all voices");
        }
        voices.clear();
        self.transport.stop();
    }

    /// Set the shared tempo, clamped to the slider range. Returns the applied tempo.
    pub fn set_tempo(&self, tempo: f64) -> f64 {
        let tempo = tempo.clamp(TEMPO_MIN, TEMPO_MAX);
        self.transport.set_tempo(tempo);
        info!(tempo, voices = self.voices().len(), "tempo changed");
        tempo
    }

    pub fn tempo(&self) -> f64 {
        self.transport.tempo()
    }

    pub fn is_active(&self, index: usize) -> bool {
        self.voices().contains_key(&index)
    }

    pub fn active_indices(&self) -> Vec<usize> {
        self.voices().keys().copied().collect()
    }

    pub fn voice_count(&self) -> usize {
        self.voices().len()
    }

    pub fn voice_rate(&self, index: usize) -> Option<f64> {
        self.voices().get(&index).map(Voice::playback_rate)
    }
}

impl Drop for PlaybackScheduler {
    fn drop(&mut self) {
        self.stop_all();
    }
}
