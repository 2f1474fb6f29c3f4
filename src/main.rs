//! chordspace CLI - explore a chord grid with the offline models

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::info;

use chordspace::offline::{BlendInterpolator, ChordToneWalker, LogEngine};
use chordspace::{resolve_corners, Config, Explorer};

#[derive(Parser)]
#[command(name = "chordspace")]
#[command(about = "Explore the latent space between two chords", long_about = None)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Tempo in quarter notes per minute (overrides the config)
    #[arg(short, long, global = true)]
    tempo: Option<f64>,

    /// Seed for humanization, timbre and blending
    #[arg(short, long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the four corner chords for the configured selections
    Corners,

    /// Generate a grid and write it as SVG and JSON
    Render {
        /// SVG output path (stdout if omitted)
        #[arg(long)]
        svg: Option<PathBuf>,

        /// JSON output path for the grid sequences
        #[arg(long)]
        json: Option<PathBuf>,

        /// Cells to mark as playing, e.g. `0,11,22`
        #[arg(long, value_delimiter = ',')]
        on: Vec<usize>,
    },

    /// Generate a grid and loop the given cells, logging every trigger
    Play {
        /// Cells to play, e.g. `0,11,22`
        #[arg(value_delimiter = ',', required = true)]
        cells: Vec<usize>,

        /// How long to play, in seconds
        #[arg(short, long, default_value = "8.0", value_parser = parse_seconds)]
        duration: Duration,
    },
}

/// Parse a finite, non-negative number of seconds.
fn parse_seconds(value: &str) -> Result<Duration, String> {
    let secs: f64 = value.parse().map_err(|e| format!("{}", e))?;
    Duration::try_from_secs_f64(secs).map_err(|_| format!("expected a finite number of seconds >= 0, got {}", value))
}

fn load_config(cli: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(tempo) = cli.tempo {
        config.tempo = tempo.clamp(chordspace::TEMPO_MIN, chordspace::TEMPO_MAX);
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    Ok(config)
}

async fn ready_explorer(config: Config) -> Result<Explorer, Box<dyn std::error::Error>> {
    let blend_seed = config.seed.unwrap_or_default();
    let mut explorer = Explorer::new(
        config,
        Arc::new(ChordToneWalker::new()),
        Arc::new(BlendInterpolator::new(blend_seed)),
        Arc::new(LogEngine),
    );
    explorer.initialize().await?;
    explorer.regenerate().await?;
    Ok(explorer)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Corners => {
            let corners = resolve_corners(&config.left, &config.right);
            for (position, chord) in ["top-left", "top-right", "bottom-left", "bottom-right"]
                .iter()
                .zip(corners.chords())
            {
                println!("{:<13} {:<8} root {}", position, chord.symbol(), chordspace::chord::note_name(chord.root));
            }
        }

        Commands::Render { svg, json, on } => {
            let mut explorer = ready_explorer(config).await?;
            for index in on {
                explorer.toggle_cell(index)?;
            }
            let document = explorer.render_svg();
            explorer.shutdown();

            match svg {
                Some(path) => {
                    fs::write(&path, &document)?;
                    eprintln!("Wrote SVG to {}", path.display());
                }
                None => println!("{}", document),
            }

            if let (Some(path), Some(grid)) = (json, explorer.grid()) {
                fs::write(&path, serde_json::to_string_pretty(grid.as_ref())?)?;
                eprintln!("Wrote grid to {}", path.display());
            }
        }

        Commands::Play { cells, duration } => {
            let mut explorer = ready_explorer(config).await?;
            for index in &cells {
                explorer.toggle_cell(*index)?;
            }
            info!(cells = ?cells, tempo = explorer.tempo(), duration = duration.as_secs_f64(), "playing");
            tokio::time::sleep(duration).await;
            explorer.shutdown();
        }
    }

    Ok(())
}
