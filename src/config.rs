//! # Configuration
//!
//! Session settings loaded from YAML. Every key is optional; missing keys take
//! the defaults below.
//!
//! ```yaml
//! tempo: 90              # quarter notes per minute, 10–200
//! grid-size: 10          # cells per side
//! canvas-size: 1000      # SVG viewBox edge
//! humanize-timing: 0.0085
//! seed: 7                # fixes humanization and timbre draws
//! left:
//!   tonic: C             # name or offset 0–11
//!   chord: major
//! right:
//!   tonic: G
//!   chord: minor7th
//! audio:
//!   sample-base-url: https://s3-us-west-2.amazonaws.com/s.cdpn.io/969699/
//!   reverb-decay: 2.5
//!   reverb-pre-delay: 0.1
//!   reverb-wet: 0.2
//!   delay-time: 8n
//!   delay-feedback: 0.2
//!   delay-wet: 0.1
//!   pans: [-0.4, 0.4]
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::chord::{ChordQuality, PitchClass};
use crate::corners::SideSelection;
use crate::error::SpaceError;
use crate::{DEFAULT_TEMPO, HUMANIZE_TIMING, N_INTERPOLATIONS, TEMPO_MAX, TEMPO_MIN};

pub const DEFAULT_SAMPLE_BASE_URL: &str = "https://s3-us-west-2.amazonaws.com/s.cdpn.io/969699/";
pub const DEFAULT_CANVAS_SIZE: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct AudioConfig {
    pub sample_base_url: String,
    pub reverb_decay: f64,
    pub reverb_pre_delay: f64,
    pub reverb_wet: f64,
    pub delay_time: String,
    pub delay_feedback: f64,
    pub delay_wet: f64,
    pub pans: Vec<f64>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_base_url: DEFAULT_SAMPLE_BASE_URL.to_string(),
            reverb_decay: 2.5,
            reverb_pre_delay: 0.1,
            reverb_wet: 0.2,
            delay_time: "8n".to_string(),
            delay_feedback: 0.2,
            delay_wet: 0.1,
            pans: vec![-0.4, 0.4],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub tempo: f64,
    pub grid_size: usize,
    pub canvas_size: f64,
    pub humanize_timing: f64,
    /// Seed for the playback random sources; `None` seeds from entropy.
    pub seed: Option<u64>,
    pub left: SideSelection,
    pub right: SideSelection,
    pub audio: AudioConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tempo: DEFAULT_TEMPO,
            grid_size: N_INTERPOLATIONS,
            canvas_size: DEFAULT_CANVAS_SIZE,
            humanize_timing: HUMANIZE_TIMING,
            seed: None,
            left: SideSelection::default(),
            right: SideSelection::default(),
            audio: AudioConfig::default(),
        }
    }
}

/// Raw YAML shape before validation.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawConfig {
    tempo: Option<f64>,
    grid_size: Option<usize>,
    canvas_size: Option<f64>,
    humanize_timing: Option<f64>,
    seed: Option<u64>,
    left: Option<RawSide>,
    right: Option<RawSide>,
    audio: Option<RawAudio>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawSide {
    tonic: Option<RawTonic>,
    chord: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum RawTonic {
    Offset(u8),
    Name(String),
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawAudio {
    sample_base_url: Option<String>,
    reverb_decay: Option<f64>,
    reverb_pre_delay: Option<f64>,
    reverb_wet: Option<f64>,
    delay_time: Option<String>,
    delay_feedback: Option<f64>,
    delay_wet: Option<f64>,
    pans: Option<Vec<f64>>,
}

impl Config {
    /// Parse and validate a YAML document.
    ///
    /// # Example
    /// ```
    /// use chordspace::Config;
    ///
    /// let config = Config::from_yaml("tempo: 90\nright:\n  tonic: G\n  chord: minor7th\n")?;
    /// assert_eq!(config.tempo, 90.0);
    /// assert_eq!(config.right.tonic.value(), 7);
    /// assert_eq!(config.grid_size, 10);
    /// # Ok::<(), chordspace::SpaceError>(())
    /// ```
    pub fn from_yaml(content: &str) -> Result<Self, SpaceError> {
        if content.trim().is_empty() {
            return Ok(Config::default());
        }
        let raw: RawConfig =
            serde_yaml::from_str(content).map_err(|e| SpaceError::Config(e.to_string()))?;
        Self::from_raw(raw)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SpaceError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, SpaceError> {
        let defaults = Config::default();

        let tempo = raw.tempo.unwrap_or(defaults.tempo);
        if !(TEMPO_MIN..=TEMPO_MAX).contains(&tempo) {
            return Err(SpaceError::Config(format!(
                "tempo must be between {} and {}, got {}",
                TEMPO_MIN, TEMPO_MAX, tempo
            )));
        }

        let grid_size = raw.grid_size.unwrap_or(defaults.grid_size);
        if !(2..=64).contains(&grid_size) {
            return Err(SpaceError::Config(format!(
                "grid-size must be between 2 and 64, got {}",
                grid_size
            )));
        }

        let canvas_size = raw.canvas_size.unwrap_or(defaults.canvas_size);
        if canvas_size <= 0.0 {
            return Err(SpaceError::Config(format!("canvas-size must be positive, got {}", canvas_size)));
        }

        let humanize_timing = raw.humanize_timing.unwrap_or(defaults.humanize_timing);
        if !(0.0..1.0).contains(&humanize_timing) {
            return Err(SpaceError::Config(format!(
                "humanize-timing must be in [0, 1) seconds, got {}",
                humanize_timing
            )));
        }

        Ok(Config {
            tempo,
            grid_size,
            canvas_size,
            humanize_timing,
            seed: raw.seed,
            left: parse_side(raw.left, "left")?,
            right: parse_side(raw.right, "right")?,
            audio: parse_audio(raw.audio.unwrap_or_default()),
        })
    }
}

fn parse_side(raw: Option<RawSide>, which: &str) -> Result<SideSelection, SpaceError> {
    let raw = raw.unwrap_or_default();
    let tonic = match raw.tonic {
        None => Ok(PitchClass::default()),
        Some(RawTonic::Offset(n)) => PitchClass::try_from(n),
        Some(RawTonic::Name(name)) => name.parse(),
    }
    .map_err(|e| SpaceError::Config(format!("{}.tonic: {}", which, e)))?;
    let quality = match raw.chord {
        None => ChordQuality::default(),
        Some(chord) => chord
            .parse()
            .map_err(|e| SpaceError::Config(format!("{}.chord: {}", which, e)))?,
    };
    Ok(SideSelection::new(tonic, quality))
}

fn parse_audio(raw: RawAudio) -> AudioConfig {
    let defaults = AudioConfig::default();
    AudioConfig {
        sample_base_url: raw.sample_base_url.unwrap_or(defaults.sample_base_url),
        reverb_decay: raw.reverb_decay.unwrap_or(defaults.reverb_decay),
        reverb_pre_delay: raw.reverb_pre_delay.unwrap_or(defaults.reverb_pre_delay),
        reverb_wet: raw.reverb_wet.unwrap_or(defaults.reverb_wet),
        delay_time: raw.delay_time.unwrap_or(defaults.delay_time),
        delay_feedback: raw.delay_feedback.unwrap_or(defaults.delay_feedback),
        delay_wet: raw.delay_wet.unwrap_or(defaults.delay_wet),
        pans: raw.pans.unwrap_or(defaults.pans),
    }
}
