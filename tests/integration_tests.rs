//! Integration tests for chordspace
//!
//! Drives the explorer end to end: selections → corners → grid → visuals → playback.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chordspace::chord::{ChordQuality, PitchClass};
use chordspace::explorer::Side;
use chordspace::generation::{GridInterpolationController, GridOutcome, GridRequest};
use chordspace::model::{BoxFuture, ContinuationModel, InterpolationModel};
use chordspace::offline::{BlendInterpolator, ChordToneWalker, RecordingEngine};
use chordspace::playback::{PlaybackScheduler, Transport};
use chordspace::{Config, Explorer, InteractionController, NoteSequence, SideSelection, SpaceError};

/// Continuation that delegates to the walker but fails or stays silent on chosen calls.
struct Flaky {
    inner: ChordToneWalker,
    calls: AtomicUsize,
    fail_on: Vec<usize>,
    silent: bool,
}

impl Flaky {
    fn failing(fail_on: Vec<usize>) -> Self {
        Self { inner: ChordToneWalker::new(), calls: AtomicUsize::new(0), fail_on, silent: false }
    }

    fn silent() -> Self {
        Self { inner: ChordToneWalker::new(), calls: AtomicUsize::new(0), fail_on: Vec::new(), silent: true }
    }
}

impl ContinuationModel for Flaky {
    fn initialize(&self) -> BoxFuture<'_, Result<(), SpaceError>> {
        Box::pin(async { Ok(()) })
    }

    fn continue_sequence<'a>(
        &'a self,
        seed: &'a NoteSequence,
        steps: u32,
        steps_per_second: f64,
        chord_conditioning: &'a [String],
    ) -> BoxFuture<'a, Result<Option<NoteSequence>, SpaceError>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.silent {
            return Box::pin(async { Ok(None) });
        }
        if self.fail_on.contains(&call) {
            return Box::pin(async move {
                Err(SpaceError::Continuation {
                    chord: chord_conditioning[0].clone(),
                    message: "timed out".to_string(),
                })
            });
        }
        self.inner.continue_sequence(seed, steps, steps_per_second, chord_conditioning)
    }
}

fn c_major_g_minor7() -> Config {
    Config::from_yaml(
        r#"
tempo: 90
seed: 11
left:
  tonic: C
  chord: major
right:
  tonic: G
  chord: minor7th
"#,
    )
    .unwrap()
}

async fn explorer_with(config: Config, continuation: Arc<dyn ContinuationModel>) -> (Explorer, Arc<RecordingEngine>) {
    let engine = Arc::new(RecordingEngine::new());
    let mut explorer = Explorer::new(config, continuation, Arc::new(BlendInterpolator::new(11)), engine.clone());
    explorer.initialize().await.unwrap();
    (explorer, engine)
}

#[tokio::test(start_paused = true)]
async fn test_c_major_g_minor7_at_90() {
    let (mut explorer, engine) = explorer_with(c_major_g_minor7(), Arc::new(ChordToneWalker::new())).await;

    let GridOutcome::Installed(grid) = explorer.regenerate().await.unwrap() else {
        panic!("grid should install");
    };
    assert_eq!(grid.corners.symbols, ["CM", "CM", "Gm7", "Gm7"].map(String::from));
    assert_eq!(grid.len(), 100);
    for corner in &grid.corners.sequences {
        assert_eq!(corner.qpm(), Some(90.0));
        assert!(!corner.is_empty());
    }
    assert_eq!(explorer.visuals().len(), 100);

    // Top-left cell is the octave-shifted C major corner
    assert_eq!(grid.cells[0].notes, grid.corners.sequences[0].notes);
    assert!(grid.cells[0].notes.iter().all(|n| [0, 4, 7].contains(&(n.pitch % 12))));

    assert!(explorer.toggle_cell(0).unwrap());
    assert_eq!(explorer.scheduler().voice_rate(0), Some(0.75));

    // At 90 bpm the 4 s reference loop takes 5.33 s
    tokio::time::sleep(Duration::from_secs(6)).await;
    let first_loop = grid.cells[0].notes.len();
    let triggers = engine.triggers();
    assert!(triggers.len() > first_loop, "{} triggers", triggers.len());
    assert!(triggers.iter().all(|t| (0.0..=1.0).contains(&t.velocity)));

    explorer.shutdown();
}

#[tokio::test]
async fn test_single_corner_failure_is_silent() {
    let (mut explorer, _engine) = explorer_with(c_major_g_minor7(), Arc::new(Flaky::failing(vec![2]))).await;

    let GridOutcome::Installed(grid) = explorer.regenerate().await.unwrap() else {
        panic!("grid should install");
    };
    assert_eq!(grid.len(), 100);

    let silent = &grid.corners.sequences[2];
    assert!(silent.is_empty());
    assert!((silent.total_time - 8.0 * 60.0 / 90.0).abs() < 1e-9);
    assert_eq!(silent.qpm(), Some(90.0));
    for i in [0, 1, 3] {
        assert!(!grid.corners.sequences[i].is_empty(), "corner {}", i);
    }
    // The bottom-left cell copies the silent corner
    assert!(grid.cells[90].is_empty());
}

#[tokio::test]
async fn test_all_silent_corners_still_fill_grid() {
    let (mut explorer, _engine) = explorer_with(c_major_g_minor7(), Arc::new(Flaky::silent())).await;

    let GridOutcome::Installed(grid) = explorer.regenerate().await.unwrap() else {
        panic!("grid should install");
    };
    assert_eq!(grid.len(), 100);
    assert!(grid.cells.iter().all(NoteSequence::is_empty));
    assert!(explorer.visuals().iter().all(|v| v.notes.is_empty()));
}

#[tokio::test(start_paused = true)]
async fn test_toggle_twice_halts_clock() {
    let (mut explorer, engine) = explorer_with(c_major_g_minor7(), Arc::new(ChordToneWalker::new())).await;
    explorer.regenerate().await.unwrap();
    let mut input = InteractionController::new();

    assert!(input.cell_pointer_down(&mut explorer, 42).unwrap());
    input.pointer_up_global();
    assert!(explorer.scheduler().transport().is_playing());
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert!(!input.cell_pointer_down(&mut explorer, 42).unwrap());
    input.pointer_up_global();
    assert_eq!(explorer.scheduler().voice_count(), 0);
    assert!(!explorer.scheduler().transport().is_playing());
    assert!(!explorer.visuals()[42].is_on);

    let before = engine.trigger_count();
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(engine.trigger_count(), before);
}

#[tokio::test(start_paused = true)]
async fn test_tempo_change_with_active_voices() {
    let (mut explorer, _engine) = explorer_with(c_major_g_minor7(), Arc::new(ChordToneWalker::new())).await;
    explorer.regenerate().await.unwrap();
    for index in [0, 45, 99] {
        explorer.toggle_cell(index).unwrap();
    }

    let input = InteractionController::new();
    assert_eq!(input.tempo_input(&mut explorer, 150.0), 150.0);

    assert_eq!(explorer.scheduler().transport().tempo(), 150.0);
    assert_eq!(explorer.scheduler().active_indices(), vec![0, 45, 99]);
    for index in [0, 45, 99] {
        assert_eq!(explorer.scheduler().voice_rate(index), Some(1.25));
    }
}

#[tokio::test]
async fn test_changing_selection_regenerates() {
    let (mut explorer, _engine) = explorer_with(c_major_g_minor7(), Arc::new(ChordToneWalker::new())).await;
    explorer.regenerate().await.unwrap();

    let outcome = explorer
        .select_tonic(Side::Left, PitchClass::new(2).unwrap())
        .await
        .unwrap();
    let GridOutcome::Installed(grid) = outcome else {
        panic!("grid should install");
    };
    assert_eq!(grid.generation, 2);
    assert_eq!(grid.corners.symbols[0], "DM");
}

#[tokio::test]
async fn test_render_svg_reflects_state() {
    let (mut explorer, _engine) = explorer_with(c_major_g_minor7(), Arc::new(ChordToneWalker::new())).await;
    explorer.regenerate().await.unwrap();
    explorer.toggle_cell(7).unwrap();
    explorer.hover_cell(8, false).unwrap();

    let svg = explorer.render_svg();
    assert_eq!(svg.matches("<rect class=\"pointer-area\"").count(), 100);
    assert!(svg.contains("<g class=\"on\" data-cell=\"7\">"));
    assert!(svg.contains("<g class=\"hover\" data-cell=\"8\">"));
    explorer.shutdown();
}

#[test]
fn test_grid_serializes_as_camel_case_json() {
    let mut seq = NoteSequence::empty(4.0, 90.0);
    seq.notes.push(chordspace::NoteEvent::stepped(60, 0, 2).with_velocity(90));
    let json = serde_json::to_value(&seq).unwrap();
    assert_eq!(json["totalTime"], 4.0);
    assert_eq!(json["notes"][0]["quantizedStartStep"], 0);
    assert_eq!(json["tempos"][0]["qpm"], 90.0);
}

/// Interpolator whose calls finish in a scripted order.
struct Delayed {
    delays: Mutex<VecDeque<Duration>>,
}

impl InterpolationModel for Delayed {
    fn initialize(&self) -> BoxFuture<'_, Result<(), SpaceError>> {
        Box::pin(async { Ok(()) })
    }

    fn interpolate<'a>(
        &'a self,
        corners: &'a [NoteSequence; 4],
        n: usize,
    ) -> BoxFuture<'a, Result<Vec<NoteSequence>, SpaceError>> {
        let delay = self.delays.lock().unwrap().pop_front().unwrap_or_default();
        Box::pin(async move {
            tokio::time::sleep(delay).await;
            Ok(vec![corners[3].clone(); n * n])
        })
    }
}

#[tokio::test(start_paused = true)]
async fn test_stale_regeneration_is_discarded() {
    let scheduler = Arc::new(PlaybackScheduler::new(
        Arc::new(RecordingEngine::new()),
        Arc::new(Transport::new(90.0)),
        chordspace::HUMANIZE_TIMING,
        None,
    ));
    let controller = Arc::new(GridInterpolationController::new(
        Arc::new(ChordToneWalker::new()),
        Arc::new(Delayed {
            delays: Mutex::new(VecDeque::from([Duration::from_secs(3), Duration::from_secs(1)])),
        }),
        scheduler,
        4,
    ));
    controller.initialize().await.unwrap();

    let side = |tonic| SideSelection::new(PitchClass::new(tonic).unwrap(), ChordQuality::Major);
    let older = GridRequest { left: side(0), right: side(5), tempo: 90.0 };
    let newer = GridRequest { left: side(0), right: side(7), tempo: 90.0 };

    let first = tokio::spawn({
        let controller = controller.clone();
        async move { controller.generate_grid(&older).await }
    });
    tokio::time::sleep(Duration::from_millis(1)).await;
    let second = controller.generate_grid(&newer).await.unwrap();

    assert!(matches!(second, GridOutcome::Installed(_)));
    assert!(matches!(first.await.unwrap().unwrap(), GridOutcome::Superseded { .. }));

    let grid = controller.grid().unwrap();
    assert_eq!(grid.corners.symbols[3], "GM");
    assert_eq!(grid.len(), 16);
}
