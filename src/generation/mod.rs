//! # Generation
//!
//! Corner melodies and the interpolation grid.
//!
//! ## Sub-modules
//! - `corner` - One continuation call per corner chord, with a silent fallback
//! - `grid` - Readiness gate, regeneration ordering and grid installation
//!
//! ## Failure Policy
//! A failing corner never fails the grid: it becomes a silent sequence and a
//! warning. A failing or malformed interpolation is surfaced to the caller
//! and the previously installed grid stays in place.

mod corner;
mod grid;

pub use corner::{generate_corner, generate_corners, silent_corner, CornerSet};
pub use grid::{GridInterpolationController, GridOutcome, GridRequest, InterpolationGrid, Readiness};
