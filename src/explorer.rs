//! # Explorer
//!
//! The session object. It wires the control panels, the grid controller, the
//! radial visuals and the playback scheduler together, and holds the state a
//! front end renders: selections, tempo, readiness and the cell visuals.
//!
//! ## Lifecycle
//! 1. [`Explorer::new`] with the two models and the audio engine
//! 2. [`Explorer::initialize`] loads models and samples; nothing else works
//!    until it succeeds
//! 3. [`Explorer::regenerate`] builds a grid from the current selections;
//!    changing a tonic or chord regenerates
//! 4. Cells are toggled and hovered by index; the tempo can change at any time
//! 5. [`Explorer::shutdown`] (or drop) stops every voice

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::audio::{AudioEngine, SampleBank};
use crate::chord::{ChordQuality, PitchClass};
use crate::config::Config;
use crate::corners::SideSelection;
use crate::error::SpaceError;
use crate::generation::{GridInterpolationController, GridOutcome, GridRequest, InterpolationGrid, Readiness};
use crate::model::{ContinuationModel, InterpolationModel};
use crate::playback::{PlaybackScheduler, Transport};
use crate::radial::{build_visuals, render_svg, CellVisual};

/// One of the two mirrored control panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

pub struct Explorer {
    config: Config,
    left: SideSelection,
    right: SideSelection,
    tempo: f64,
    readiness: Readiness,
    engine: Arc<dyn AudioEngine>,
    scheduler: Arc<PlaybackScheduler>,
    controller: GridInterpolationController,
    grid: Option<Arc<InterpolationGrid>>,
    visuals: Vec<CellVisual>,
}

impl Explorer {
    pub fn new(
        config: Config,
        continuation: Arc<dyn ContinuationModel>,
        interpolation: Arc<dyn InterpolationModel>,
        engine: Arc<dyn AudioEngine>,
    ) -> Self {
        let transport = Arc::new(Transport::new(config.tempo));
        let scheduler = Arc::new(PlaybackScheduler::new(
            engine.clone(),
            transport,
            config.humanize_timing,
            config.seed,
        ));
        let controller =
            GridInterpolationController::new(continuation, interpolation, scheduler.clone(), config.grid_size);

        Self {
            left: config.left,
            right: config.right,
            tempo: config.tempo,
            readiness: Readiness::Loading,
            engine,
            scheduler,
            controller,
            grid: None,
            visuals: Vec::new(),
            config,
        }
    }

    /// Initialize the models and load the sample bank concurrently.
    pub async fn initialize(&mut self) -> Result<(), SpaceError> {
        self.readiness = Readiness::Loading;
        let bank = SampleBank::from_config(&self.config.audio);

        let load_audio = async {
            self.engine.load(&bank).await.map_err(|e| match e {
                SpaceError::AudioInit(_) => e,
                other => SpaceError::AudioInit(other.to_string()),
            })
        };
        let result = tokio::try_join!(self.controller.initialize(), load_audio);

        match result {
            Ok(_) => {
                self.readiness = Readiness::Ready;
                info!(grid_size = self.config.grid_size, "explorer ready");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "explorer initialization failed");
                self.readiness = Readiness::Failed(e.to_string());
                Err(e)
            }
        }
    }

    pub fn readiness(&self) -> &Readiness {
        &self.readiness
    }

    pub fn is_ready(&self) -> bool {
        self.readiness == Readiness::Ready
    }

    pub fn is_generating(&self) -> bool {
        self.controller.is_generating()
    }

    /// Generate a new grid from the current selections and tempo.
    ///
    /// On success every cell starts off and un-hovered. On error the previous
    /// grid and visuals are kept (with playback already stopped).
    pub async fn regenerate(&mut self) -> Result<GridOutcome, SpaceError> {
        if !self.is_ready() {
            warn!("regenerate requested before initialization");
            return Err(SpaceError::NotReady);
        }

        let request = GridRequest {
            left: self.left,
            right: self.right,
            tempo: self.tempo,
        };
        let outcome = self.controller.generate_grid(&request).await;

        // Playback was stopped whatever the outcome
        for visual in &mut self.visuals {
            visual.is_on = false;
        }

        if let Ok(GridOutcome::Installed(grid)) = &outcome {
            self.visuals = build_visuals(&grid.cells, grid.size, self.config.canvas_size);
            self.grid = Some(grid.clone());
        }
        outcome
    }

    fn visual_mut(&mut self, index: usize) -> Result<&mut CellVisual, SpaceError> {
        let cells = self.visuals.len();
        self.visuals
            .get_mut(index)
            .ok_or(SpaceError::CellOutOfRange { index, cells })
    }

    /// Flip a cell on or off. Returns the new state.
    pub fn toggle_cell(&mut self, index: usize) -> Result<bool, SpaceError> {
        let scheduler = self.scheduler.clone();
        let visual = self.visual_mut(index)?;
        let on = visual.toggle();
        if on {
            scheduler.start(index, &visual.sequence);
        } else {
            scheduler.stop(index);
        }
        info!(index, on, "cell toggled");
        Ok(on)
    }

    /// Pointer entered a cell. With the pointer engaged the cell also toggles.
    pub fn hover_cell(&mut self, index: usize, pointer_engaged: bool) -> Result<(), SpaceError> {
        self.visual_mut(index)?.set_hover(true);
        if pointer_engaged {
            self.toggle_cell(index)?;
        }
        Ok(())
    }

    pub fn unhover_cell(&mut self, index: usize) -> Result<(), SpaceError> {
        self.visual_mut(index)?.set_hover(false);
        Ok(())
    }

    /// Apply a tempo (clamped to the slider range) to every voice. Returns the applied tempo.
    pub fn set_tempo(&mut self, tempo: f64) -> f64 {
        self.tempo = self.scheduler.set_tempo(tempo);
        self.tempo
    }

    pub async fn select_tonic(&mut self, side: Side, tonic: PitchClass) -> Result<GridOutcome, SpaceError> {
        self.selection_mut(side).tonic = tonic;
        self.regenerate().await
    }

    pub async fn select_chord(&mut self, side: Side, quality: ChordQuality) -> Result<GridOutcome, SpaceError> {
        self.selection_mut(side).quality = quality;
        self.regenerate().await
    }

    fn selection_mut(&mut self, side: Side) -> &mut SideSelection {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    pub fn selection(&self, side: Side) -> SideSelection {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    pub fn grid(&self) -> Option<&Arc<InterpolationGrid>> {
        self.grid.as_ref()
    }

    pub fn visuals(&self) -> &[CellVisual] {
        &self.visuals
    }

    pub fn scheduler(&self) -> &Arc<PlaybackScheduler> {
        &self.scheduler
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn render_svg(&self) -> String {
        render_svg(&self.visuals, self.config.canvas_size)
    }

    /// Stop every voice and leave all cells off.
    pub fn shutdown(&mut self) {
        self.scheduler.stop_all();
        for visual in &mut self.visuals {
            visual.is_on = false;
        }
    }
}

impl Drop for Explorer {
    fn drop(&mut self) {
        self.scheduler.stop_all();
    }
}
