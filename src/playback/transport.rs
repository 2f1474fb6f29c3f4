//! Shared tempo clock.
//!
//! One transport per process. It owns the tempo and a beat position that
//! advances while it is started. Voices subscribe to tempo changes through a
//! `watch` channel and read their start phase from [`Transport::position_beats`].

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info};

/// Floor applied when converting beats to wall time.
const MIN_TEMPO: f64 = 0.12;

/// Snapshot of the transport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportState {
    pub is_playing: bool,
    pub tempo: f64,
    pub position_beats: f64,
}

#[derive(Debug)]
struct Clock {
    is_playing: bool,
    tempo: f64,
    anchor: Instant,
    beats_at_anchor: f64,
    started_at: Option<Instant>,
}

impl Clock {
    fn beats_at(&self, at: Instant) -> f64 {
        if self.is_playing {
            self.beats_at_anchor + beats_between(self.anchor, at, self.tempo)
        } else {
            self.beats_at_anchor
        }
    }
}

#[derive(Debug)]
pub struct Transport {
    tempo: watch::Sender<f64>,
    clock: Mutex<Clock>,
}

impl Transport {
    pub fn new(tempo: f64) -> Self {
        let (tx, _) = watch::channel(tempo);
        Self {
            tempo: tx,
            clock: Mutex::new(Clock {
                is_playing: false,
                tempo,
                anchor: Instant::now(),
                beats_at_anchor: 0.0,
                started_at: None,
            }),
        }
    }

    fn clock(&self) -> MutexGuard<'_, Clock> {
        self.clock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn tempo(&self) -> f64 {
        self.clock().tempo
    }

    /// Change the tempo. The beat position is carried over so the clock
    /// stays continuous across the change.
    pub fn set_tempo(&self, tempo: f64) {
        let mut clock = self.clock();
        let old = clock.tempo;
        let now = Instant::now();
        clock.beats_at_anchor = clock.beats_at(now);
        clock.anchor = now;
        clock.tempo = tempo;
        // Subscribers wake only after the clock is re-anchored
        self.tempo.send_replace(tempo);
        debug!(from = old, to = tempo, "transport tempo");
    }

    /// Receiver that observes every tempo change.
    pub fn subscribe(&self) -> watch::Receiver<f64> {
        self.tempo.subscribe()
    }

    /// Start the clock from beat zero. No-op if already started.
    pub fn start(&self) {
        let mut clock = self.clock();
        if clock.is_playing {
            return;
        }
        let now = Instant::now();
        clock.is_playing = true;
        clock.anchor = now;
        clock.beats_at_anchor = 0.0;
        clock.started_at = Some(now);
        info!(tempo = clock.tempo, "transport started");
    }

    /// Halt the clock and rewind it.
    pub fn stop(&self) {
        let mut clock = self.clock();
        if !clock.is_playing {
            return;
        }
        clock.is_playing = false;
        clock.anchor = Instant::now();
        clock.beats_at_anchor = 0.0;
        clock.started_at = None;
        info!("transport stopped");
    }

    pub fn is_playing(&self) -> bool {
        self.clock().is_playing
    }

    /// Quarter-note beats elapsed since the clock started.
    pub fn position_beats(&self) -> f64 {
        self.clock().beats_at(Instant::now())
    }

    /// When the running clock will reach `beats` at the current tempo.
    ///
    /// `None` while the clock is halted. Positions already passed give an
    /// instant in the past.
    pub fn instant_at_beats(&self, beats: f64) -> Option<Instant> {
        let clock = self.clock();
        if !clock.is_playing {
            return None;
        }
        let secs = (beats - clock.beats_at_anchor) * 60.0 / clock.tempo.max(MIN_TEMPO);
        let offset = Duration::try_from_secs_f64(secs.abs()).ok()?;
        if secs >= 0.0 {
            clock.anchor.checked_add(offset)
        } else {
            clock.anchor.checked_sub(offset)
        }
    }

    /// Wall-clock seconds since the clock started; the time base for engine triggers.
    pub fn seconds(&self) -> f64 {
        self.seconds_at(Instant::now())
    }

    /// Seconds from the clock start to `at`, or 0 while halted.
    pub fn seconds_at(&self, at: Instant) -> f64 {
        self.clock()
            .started_at
            .map(|start| at.saturating_duration_since(start).as_secs_f64())
            .unwrap_or(0.0)
    }

    pub fn state(&self) -> TransportState {
        let clock = self.clock();
        TransportState {
            is_playing: clock.is_playing,
            tempo: clock.tempo,
            position_beats: clock.beats_at(Instant::now()),
        }
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new(crate::DEFAULT_TEMPO)
    }
}

fn beats_between(from: Instant, to: Instant, tempo: f64) -> f64 {
    to.saturating_duration_since(from).as_secs_f64() * tempo / 60.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_position_advances_only_while_playing() {
        let transport = Transport::new(120.0);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(transport.position_beats(), 0.0);

        transport.start();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!((transport.position_beats() - 2.0).abs() < 1e-9);
        assert!((transport.seconds() - 1.0).abs() < 1e-9);

        transport.stop();
        assert!(!transport.is_playing());
        assert_eq!(transport.position_beats(), 0.0);
        assert_eq!(transport.seconds(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tempo_change_keeps_position_continuous() {
        let transport = Transport::new(60.0);
        transport.start();
        tokio::time::sleep(Duration::from_secs(2)).await;
        transport.set_tempo(120.0);
        assert!((transport.position_beats() - 2.0).abs() < 1e-9);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!((transport.position_beats() - 4.0).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_instant_at_beats_follows_tempo() {
        let transport = Transport::new(120.0);
        assert_eq!(transport.instant_at_beats(4.0), None);

        transport.start();
        let origin = Instant::now();
        assert_eq!(transport.instant_at_beats(4.0), Some(origin + Duration::from_secs(2)));

        tokio::time::sleep(Duration::from_secs(1)).await;
        transport.set_tempo(60.0);
        // Two beats played, two left at one beat per second
        assert_eq!(transport.instant_at_beats(4.0), Some(origin + Duration::from_secs(3)));
        assert!(transport.instant_at_beats(1.0).unwrap() < Instant::now());
        assert!((transport.seconds_at(origin + Duration::from_secs(3)) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_poisoned_clock_still_starts_and_stops() {
        let transport = std::sync::Arc::new(Transport::new(90.0));
        let poisoner = transport.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.clock.lock().unwrap();
            panic!("poison the clock");
        })
        .join();
        assert!(transport.clock.is_poisoned());

        transport.start();
        assert!(transport.is_playing());
        transport.set_tempo(140.0);
        assert_eq!(transport.tempo(), 140.0);
        transport.stop();
        assert!(!transport.is_playing());
    }

    #[tokio::test]
    async fn test_subscribers_see_tempo_changes() {
        let transport = Transport::new(90.0);
        let mut rx = transport.subscribe();
        transport.set_tempo(150.0);
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), 150.0);
        assert_eq!(transport.state().tempo, 150.0);
    }
}
