//! Pointer and slider input.
//!
//! Translates raw input events into [`Explorer`] calls. Holding the pointer
//! down and sweeping across cells toggles each one entered, so the controller
//! tracks whether the pointer is engaged anywhere on the page.

use tracing::debug;

use crate::error::SpaceError;
use crate::explorer::Explorer;
use crate::radial::hit_test;

#[derive(Debug, Default)]
pub struct InteractionController {
    pointer_engaged: bool,
    hovered: Option<usize>,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pointer_engaged(&self) -> bool {
        self.pointer_engaged
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    /// Pointer pressed anywhere.
    pub fn pointer_down_global(&mut self) {
        self.pointer_engaged = true;
    }

    /// Pointer released anywhere.
    pub fn pointer_up_global(&mut self) {
        self.pointer_engaged = false;
    }

    /// Pointer pressed on a cell: engages the pointer and toggles the cell.
    pub fn cell_pointer_down(&mut self, explorer: &mut Explorer, index: usize) -> Result<bool, SpaceError> {
        self.pointer_engaged = true;
        explorer.toggle_cell(index)
    }

    pub fn cell_pointer_enter(&mut self, explorer: &mut Explorer, index: usize) -> Result<(), SpaceError> {
        explorer.hover_cell(index, self.pointer_engaged)?;
        self.hovered = Some(index);
        Ok(())
    }

    pub fn cell_pointer_leave(&mut self, explorer: &mut Explorer, index: usize) -> Result<(), SpaceError> {
        explorer.unhover_cell(index)?;
        if self.hovered == Some(index) {
            self.hovered = None;
        }
        Ok(())
    }

    /// Pointer moved to canvas coordinates; emits the leave/enter pair when it crosses a cell edge.
    pub fn pointer_move(&mut self, explorer: &mut Explorer, x: f64, y: f64) -> Result<(), SpaceError> {
        let target = hit_test(explorer.visuals(), x, y);
        if target == self.hovered {
            return Ok(());
        }
        if let Some(previous) = self.hovered {
            self.cell_pointer_leave(explorer, previous)?;
        }
        if let Some(index) = target {
            self.cell_pointer_enter(explorer, index)?;
        }
        debug!(?target, "pointer moved");
        Ok(())
    }

    /// Tempo slider moved. Returns the tempo actually applied.
    pub fn tempo_input(&self, explorer: &mut Explorer, value: f64) -> f64 {
        explorer.set_tempo(value)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::offline::{BlendInterpolator, ChordToneWalker, RecordingEngine};
    use crate::Config;

    async fn ready_explorer() -> Explorer {
        let mut explorer = Explorer::new(
            Config::default(),
            Arc::new(ChordToneWalker::new()),
            Arc::new(BlendInterpolator::default()),
            Arc::new(RecordingEngine::new()),
        );
        explorer.initialize().await.unwrap();
        explorer.regenerate().await.unwrap();
        explorer
    }

    #[tokio::test]
    async fn test_drag_toggles_entered_cells() {
        let mut explorer = ready_explorer().await;
        let mut input = InteractionController::new();

        assert!(input.cell_pointer_down(&mut explorer, 0).unwrap());
        input.cell_pointer_enter(&mut explorer, 1).unwrap();
        input.cell_pointer_enter(&mut explorer, 2).unwrap();
        input.pointer_up_global();
        input.cell_pointer_enter(&mut explorer, 3).unwrap();

        assert_eq!(explorer.scheduler().active_indices(), vec![0, 1, 2]);
        assert!(explorer.visuals()[3].is_hovered);
        assert!(!explorer.visuals()[3].is_on);
    }

    #[tokio::test]
    async fn test_pointer_move_tracks_hover() {
        let mut explorer = ready_explorer().await;
        let mut input = InteractionController::new();

        input.pointer_move(&mut explorer, 150.0, 50.0).unwrap();
        assert_eq!(input.hovered(), Some(1));
        input.pointer_move(&mut explorer, 250.0, 50.0).unwrap();
        assert_eq!(input.hovered(), Some(2));
        assert!(!explorer.visuals()[1].is_hovered);
        assert!(explorer.visuals()[2].is_hovered);

        input.pointer_move(&mut explorer, 2000.0, 50.0).unwrap();
        assert_eq!(input.hovered(), None);
        assert!(!explorer.visuals()[2].is_hovered);
    }

    #[tokio::test]
    async fn test_tempo_input_is_clamped() {
        let mut explorer = ready_explorer().await;
        let input = InteractionController::new();
        assert_eq!(input.tempo_input(&mut explorer, 500.0), 200.0);
        assert_eq!(input.tempo_input(&mut explorer, 0.0), 10.0);
        assert_eq!(input.tempo_input(&mut explorer, 137.0), 137.0);
        assert_eq!(explorer.tempo(), 137.0);
    }
}
