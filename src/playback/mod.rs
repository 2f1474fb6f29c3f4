//! # Playback Module
//!
//! Turns grid cells into looping, humanized voices on a shared tempo clock.
//!
//! ## Sub-modules
//! - `events` - NoteSequence → PlaybackEvent conversion (reference time base)
//! - `humanize` - Per-trigger timing jitter and timbre selection
//! - `transport` - Process-wide tempo clock
//! - `scheduler` - One looping voice per active cell
//!
//! ## Time Base
//! Events are laid out at the 120 bpm reference: one step is `0.5 / 4` s and
//! one loop of [`SEQ_LENGTH`](crate::SEQ_LENGTH) steps is 4 s. Tempo never
//! rewrites event times. Instead every voice plays at rate `tempo / 120`,
//! read live from the [`Transport`] so a tempo change reaches voices that are
//! already running.
//!
//! ## Trigger Path
//! ```text
//! PlaybackEvent ─► Humanizer (delay, duration) ─► TimbreSelector (family)
//!               ─► Register::for_pitch ─► AudioEngine::trigger_attack_release
//! ```
//!
//! ## Example
//! ```rust
//! use chordspace::playback::to_playback_events;
//! use chordspace::sequence::{NoteEvent, NoteSequence};
//!
//! let mut seq = NoteSequence::empty(4.0, 90.0);
//! seq.notes.push(NoteEvent::stepped(60, 4, 8).with_velocity(127));
//!
//! let events = to_playback_events(&seq);
//! assert_eq!(events[0].time, 0.5);
//! assert_eq!(events[0].note, "C4");
//! assert_eq!(events[0].duration, 0.5);
//! assert_eq!(events[0].velocity, 1.0);
//! ```

mod events;
mod humanize;
#[cfg(feature = "runtime")]
mod scheduler;
#[cfg(feature = "runtime")]
mod transport;


pub use events::{
    to_playback_events, PlaybackEvent, DEFAULT_VELOCITY, LOOP_SECONDS, MAX_NOTE_DURATION,
    STEP_SECONDS,
};
pub use humanize::{Humanizer, TimbreSelector, Trigger};
#[cfg(feature = "runtime")]
pub use scheduler::{PlaybackScheduler, Voice};
#[cfg(feature = "runtime")]
pub use transport::{Transport, TransportState};
