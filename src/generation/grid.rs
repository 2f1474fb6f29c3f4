//! Grid interpolation controller.
//!
//! Owns the two models and the installed grid. Every call to
//! [`GridInterpolationController::generate_grid`] takes a generation number;
//! when it finishes, it installs its grid only if no later call has started
//! in the meantime.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{error, info};

use crate::corners::{resolve_corners, SideSelection};
use crate::error::SpaceError;
use crate::model::{ContinuationModel, InterpolationModel};
use crate::playback::PlaybackScheduler;
use crate::sequence::NoteSequence;

use super::corner::{generate_corners, CornerSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Loading,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridRequest {
    pub left: SideSelection,
    pub right: SideSelection,
    pub tempo: f64,
}

/// An installed N×N grid, cells in row-major order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpolationGrid {
    pub size: usize,
    pub generation: u64,
    pub corners: CornerSet,
    pub cells: Vec<NoteSequence>,
}

impl InterpolationGrid {
    pub fn cell(&self, row: usize, col: usize) -> Option<&NoteSequence> {
        if row >= self.size || col >= self.size {
            return None;
        }
        self.cells.get(row * self.size + col)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GridOutcome {
    Installed(Arc<InterpolationGrid>),
    /// A later request started before this one finished; nothing was installed.
    Superseded { generation: u64 },
}

/// Decrements the in-flight counter when the request ends, however it ends.
struct Busy<'a>(&'a AtomicUsize);

impl<'a> Busy<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Busy(counter)
    }
}

impl Drop for Busy<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct GridInterpolationController {
    continuation: Arc<dyn ContinuationModel>,
    interpolation: Arc<dyn InterpolationModel>,
    scheduler: Arc<PlaybackScheduler>,
    grid_size: usize,
    readiness: Mutex<Readiness>,
    latest: AtomicU64,
    in_flight: AtomicUsize,
    grid: Mutex<Option<Arc<InterpolationGrid>>>,
}

impl GridInterpolationController {
    pub fn new(
        continuation: Arc<dyn ContinuationModel>,
        interpolation: Arc<dyn InterpolationModel>,
        scheduler: Arc<PlaybackScheduler>,
        grid_size: usize,
    ) -> Self {
        Self {
            continuation,
            interpolation,
            scheduler,
            grid_size,
            readiness: Mutex::new(Readiness::Loading),
            latest: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            grid: Mutex::new(None),
        }
    }

    fn readiness_mut(&self) -> MutexGuard<'_, Readiness> {
        self.readiness.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Initialize both models. On failure the controller stays unusable.
    pub async fn initialize(&self) -> Result<(), SpaceError> {
        *self.readiness_mut() = Readiness::Loading;
        let result = tokio::try_join!(self.continuation.initialize(), self.interpolation.initialize());

        match result {
            Ok(_) => {
                *self.readiness_mut() = Readiness::Ready;
                info!("models ready");
                Ok(())
            }
            Err(e) => {
                let reason = e.to_string();
                error!(error = %reason, "model initialization failed");
                *self.readiness_mut() = Readiness::Failed(reason.clone());
                Err(match e {
                    SpaceError::ModelInit(_) => e,
                    _ => SpaceError::ModelInit(reason),
                })
            }
        }
    }

    pub fn readiness(&self) -> Readiness {
        self.readiness_mut().clone()
    }

    pub fn is_ready(&self) -> bool {
        *self.readiness_mut() == Readiness::Ready
    }

    /// Whether a request is in flight.
    pub fn is_generating(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    /// The installed grid, if any.
    pub fn grid(&self) -> Option<Arc<InterpolationGrid>> {
        self.grid.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Stop playback, generate four corners and interpolate a new grid.
    pub async fn generate_grid(&self, request: &GridRequest) -> Result<GridOutcome, SpaceError> {
        if !self.is_ready() {
            return Err(SpaceError::NotReady);
        }

        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let _busy = Busy::enter(&self.in_flight);

        self.scheduler.stop_all();

        let chords = resolve_corners(&request.left, &request.right);
        info!(generation, corners = ?chords.symbols(), tempo = request.tempo, "generating grid");
        let corners = generate_corners(self.continuation.as_ref(), &chords, request.tempo).await;

        let n = self.grid_size;
        let cells = self
            .interpolation
            .interpolate(&corners.sequences, n)
            .await
            .map_err(|e| {
                error!(generation, error = %e, "interpolation failed");
                match e {
                    SpaceError::Interpolation(_) => e,
                    other => SpaceError::Interpolation(other.to_string()),
                }
            })?;

        if cells.len() != n * n {
            error!(generation, expected = n * n, actual = cells.len(), "wrong grid shape");
            return Err(SpaceError::ShapeMismatch {
                expected: n * n,
                actual: cells.len(),
            });
        }

        Ok(self.install(InterpolationGrid {
            size: n,
            generation,
            corners,
            cells,
        }))
    }

    /// Install `grid` unless a later request has started. The generation is
    /// re-read under the grid lock so a stale grid never overwrites a newer one.
    fn install(&self, grid: InterpolationGrid) -> GridOutcome {
        let generation = grid.generation;
        let mut installed = self.grid.lock().unwrap_or_else(PoisonError::into_inner);
        if self.latest.load(Ordering::SeqCst) != generation {
            info!(generation, "grid superseded, discarding");
            return GridOutcome::Superseded { generation };
        }
        let grid = Arc::new(grid);
        *installed = Some(grid.clone());
        info!(generation, cells = grid.len(), "grid installed");
        GridOutcome::Installed(grid)
    }
}
