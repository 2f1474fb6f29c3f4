//! # Error Types
//!
//! This module defines all error types for the chordspace pipeline.
//!
//! Most failures in the pipeline are recovered where they happen: a failed
//! corner continuation becomes a silent corner, an empty sequence renders as an
//! empty cell. The variants below are the ones that reach a caller.
//!
//! ## Error Types
//! - `NotReady` - Generation or playback requested before initialization finished
//! - `ModelInit` / `AudioInit` - A collaborator failed to initialize
//! - `Continuation` / `Interpolation` - A model call failed
//! - `ShapeMismatch` - The interpolation model returned the wrong number of cells
//! - `CellOutOfRange` - A cell index outside the current grid
//! - `UnknownChord` - A tonic, quality or chord symbol that could not be resolved
//! - `Config` / `Io` - Configuration loading
//!
//! ## Usage
//! ```rust
//! use chordspace::SpaceError;
//!
//! fn describe(err: &SpaceError) -> &'static str {
//!     match err {
//!         SpaceError::NotReady => "still loading",
//!         SpaceError::Interpolation(_) | SpaceError::ShapeMismatch { .. } => "grid unchanged",
//!         _ => "error",
//!     }
//! }
//!
//! assert_eq!(describe(&SpaceError::NotReady), "still loading");
//! ```

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpaceError {
    /// Models or audio have not finished initializing (or failed to).
    ///
    /// # Example
    /// ```
    /// # use chordspace::SpaceError;
    /// assert_eq!(SpaceError::NotReady.to_string(), "Models and audio are not ready");
    /// ```
    #[error("Models and audio are not ready")]
    NotReady,

    /// A generative model failed its one-time initialization.
    ///
    /// # Example
    /// ```
    /// # use chordspace::SpaceError;
    /// let err = SpaceError::ModelInit("checkpoint unreachable".to_string());
    /// assert_eq!(err.to_string(), "Model initialization failed: checkpoint unreachable");
    /// ```
    #[error("Model initialization failed: {0}")]
    ModelInit(String),

    /// The audio engine failed to load samples or build its effect graph.
    #[error("Audio initialization failed: {0}")]
    AudioInit(String),

    /// A continuation call failed for one corner chord.
    ///
    /// Never escapes corner generation; it is logged and replaced by a silent corner.
    #[error("Continuation over {chord} failed: {message}")]
    Continuation { chord: String, message: String },

    /// The interpolation call failed. The previously installed grid is kept.
    #[error("Interpolation failed: {0}")]
    Interpolation(String),

    /// The interpolation model returned a grid of the wrong size.
    ///
    /// # Example
    /// ```
    /// # use chordspace::SpaceError;
    /// let err = SpaceError::ShapeMismatch { expected: 100, actual: 99 };
    /// assert_eq!(err.to_string(), "Interpolation returned 99 sequences, expected 100");
    /// ```
    #[error("Interpolation returned {actual} sequences, expected {expected}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// A cell index outside the current grid.
    #[error("Cell {index} is outside the grid ({cells} cells)")]
    CellOutOfRange { index: usize, cells: usize },

    /// An unresolvable tonic, chord quality or chord symbol.
    ///
    /// # Example
    /// ```
    /// # use chordspace::SpaceError;
    /// let err = SpaceError::UnknownChord("H7".to_string());
    /// assert_eq!(err.to_string(), "Unknown chord: H7");
    /// ```
    #[error("Unknown chord: {0}")]
    UnknownChord(String),

    /// Invalid configuration values or YAML.
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
