//! Boundary to the generative sequence models.
//!
//! Two models are involved: a chord-conditioned continuation model that turns a
//! seed into a full corner melody, and a latent interpolation model that spans
//! a grid between four corners. Both are initialized once, asynchronously,
//! before any generation call.
//!
//! The traits return boxed futures so that they stay object safe and can be
//! shared as `Arc<dyn ...>` between the grid controller and the explorer.

use std::future::Future;
use std::pin::Pin;

use crate::error::SpaceError;
use crate::sequence::NoteSequence;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Chord-conditioned melody continuation.
pub trait ContinuationModel: Send + Sync {
    /// One-time setup (weights download, warm-up).
    fn initialize(&self) -> BoxFuture<'_, Result<(), SpaceError>>;

    /// Continue `seed` for `steps` quantized steps over `chord_conditioning`.
    ///
    /// `Ok(None)` means the model produced nothing; callers treat it like a failure.
    fn continue_sequence<'a>(
        &'a self,
        seed: &'a NoteSequence,
        steps: u32,
        steps_per_second: f64,
        chord_conditioning: &'a [String],
    ) -> BoxFuture<'a, Result<Option<NoteSequence>, SpaceError>>;
}

/// Latent-space interpolation between four corner sequences.
pub trait InterpolationModel: Send + Sync {
    fn initialize(&self) -> BoxFuture<'_, Result<(), SpaceError>>;

    /// Return `n * n` sequences in row-major order.
    ///
    /// `corners[0]` is the top-left cell, `corners[1]` top-right,
    /// `corners[2]` bottom-left and `corners[3]` bottom-right.
    fn interpolate<'a>(
        &'a self,
        corners: &'a [NoteSequence; 4],
        n: usize,
    ) -> BoxFuture<'a, Result<Vec<NoteSequence>, SpaceError>>;
}
