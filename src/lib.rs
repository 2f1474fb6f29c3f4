//! # chordspace
//!
//! Explore the latent space between chords. Two chord selections define four
//! corner melodies; a latent interpolation model fills an N×N grid between
//! them; each cell is drawn as a radial plot and can be toggled into a looping,
//! humanized voice that follows a shared tempo clock.
//!
//! ## Pipeline
//! ```text
//! SideSelection ×2 ─► corners ─► seed ─► ContinuationModel ×4
//!                                                │
//!                         InterpolationModel ◄───┘
//!                                │
//!                     InterpolationGrid (N×N)
//!                       │                 │
//!                   radial            playback
//!                (CellVisual)    (Voice per active cell)
//! ```
//!
//! The generative models and the sample engine live behind the traits in
//! [`model`] and [`audio`]; [`offline`] has deterministic stand-ins for both.

pub mod audio;
pub mod chord;
pub mod config;
pub mod corners;
pub mod error;
pub mod model;
pub mod offline;
pub mod playback;
pub mod radial;
pub mod seed;
pub mod sequence;

#[cfg(feature = "runtime")]
pub mod explorer;
#[cfg(feature = "runtime")]
pub mod generation;
#[cfg(feature = "runtime")]
pub mod interaction;

pub use config::Config;
pub use corners::{resolve_corners, CornerChords, SideSelection};
pub use error::SpaceError;
pub use seed::build_seed;
pub use sequence::{NoteEvent, NoteSequence};

#[cfg(feature = "runtime")]
pub use explorer::Explorer;
#[cfg(feature = "runtime")]
pub use interaction::InteractionController;

/// Lowest playable MIDI pitch (C3).
pub const MIN_NOTE: u8 = 48;
/// Highest playable MIDI pitch (B5).
pub const MAX_NOTE: u8 = 83;

/// Length of every grid sequence in quantized steps (two bars of sixteenths).
pub const SEQ_LENGTH: u32 = 32;
pub const STEPS_PER_QUARTER: u32 = 4;

/// Upper bound of the random onset delay added to each trigger, in seconds.
pub const HUMANIZE_TIMING: f64 = 0.0085;

/// Default grid edge length.
pub const N_INTERPOLATIONS: usize = 10;

pub const DEFAULT_TEMPO: f64 = 90.0;
pub const TEMPO_MIN: f64 = 10.0;
pub const TEMPO_MAX: f64 = 200.0;

/// Tempo at which voices play at rate 1.0.
pub const REFERENCE_TEMPO: f64 = 120.0;
