//! # Audio Engine Boundary
//!
//! The sample playback engine is an external collaborator. This module defines
//! what the scheduler needs from it and describes the instrument bank it must
//! load.
//!
//! ## Instrument Bank
//! Two timbre families (marimba, xylophone), each sampled in three registers
//! (high, mid, low). Every sampler covers the twelve-note sample scale
//! `C3 D#3 F#3 A3 C4 … A5`; the engine repitches between samples.
//!
//! ```text
//!                high (>= 72)   mid (>= 60)   low
//! marimba        sampler        sampler       sampler
//! xylophone      sampler        sampler       sampler
//! ```
//!
//! All samplers feed a panner, a feedback delay and a shared reverb.

use serde::{Deserialize, Serialize};

use crate::config::AudioConfig;
use crate::error::SpaceError;
use crate::model::BoxFuture;

/// Notes that have a recorded sample in every sampler.
pub const SAMPLE_SCALE: [&str; 12] = [
    "C3", "D#3", "F#3", "A3", "C4", "D#4", "F#4", "A4", "C5", "D#5", "F#5", "A5",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Marimba,
    Xylophone,
}

impl Family {
    pub const ALL: [Family; 2] = [Family::Marimba, Family::Xylophone];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Register {
    High,
    Mid,
    Low,
}

impl Register {
    pub const ALL: [Register; 3] = [Register::High, Register::Mid, Register::Low];

    /// Register bucket for an absolute MIDI pitch.
    pub fn for_pitch(midi: u8) -> Self {
        if midi >= 72 {
            Register::High
        } else if midi >= 60 {
            Register::Mid
        } else {
            Register::Low
        }
    }
}

/// Which sampler plays a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstrumentKey {
    pub family: Family,
    pub register: Register,
}

impl InstrumentKey {
    pub fn new(family: Family, register: Register) -> Self {
        Self { family, register }
    }

    /// File-name prefix of this sampler's samples.
    pub fn sample_prefix(&self) -> &'static str {
        match (self.family, self.register) {
            (Family::Marimba, Register::High) => "marimba-classic-",
            (Family::Marimba, Register::Mid) => "marimba-classic-mid-",
            (Family::Marimba, Register::Low) => "marimba-classic-low-",
            (Family::Xylophone, Register::High) => "xylophone-dark-",
            (Family::Xylophone, Register::Mid) => "xylophone-dark-mid-",
            (Family::Xylophone, Register::Low) => "xylophone-dark-low-",
        }
    }
}

/// One sampler: the URL of every sample-scale note for an instrument key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplerSpec {
    pub key: InstrumentKey,
    pub samples: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReverbSpec {
    pub decay: f64,
    pub pre_delay: f64,
    pub wet: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelaySpec {
    /// Delay time in transport notation, e.g. `8n`.
    pub time: String,
    pub feedback: f64,
    pub wet: f64,
}

/// Everything the engine must load before playback is enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleBank {
    pub samplers: Vec<SamplerSpec>,
    pub reverb: ReverbSpec,
    pub delay: DelaySpec,
    pub pans: Vec<f64>,
}

impl SampleBank {
    pub fn from_config(config: &AudioConfig) -> Self {
        let samplers = Family::ALL
            .iter()
            .flat_map(|family| Register::ALL.iter().map(move |register| InstrumentKey::new(*family, *register)))
            .map(|key| SamplerSpec {
                key,
                samples: SAMPLE_SCALE
                    .iter()
                    .map(|note| (note.to_string(), sample_url(&config.sample_base_url, key, note)))
                    .collect(),
            })
            .collect();

        Self {
            samplers,
            reverb: ReverbSpec {
                decay: config.reverb_decay,
                pre_delay: config.reverb_pre_delay,
                wet: config.reverb_wet,
            },
            delay: DelaySpec {
                time: config.delay_time.clone(),
                feedback: config.delay_feedback,
                wet: config.delay_wet,
            },
            pans: config.pans.clone(),
        }
    }

    pub fn sampler(&self, key: InstrumentKey) -> Option<&SamplerSpec> {
        self.samplers.iter().find(|s| s.key == key)
    }
}

/// `<base><prefix><note>.mp3`, with the note lowercased and `#` spelled `s`.
pub fn sample_url(base: &str, key: InstrumentKey, note: &str) -> String {
    format!(
        "{}{}{}.mp3",
        base,
        key.sample_prefix(),
        note.to_lowercase().replace('#', "s")
    )
}

/// Sample playback engine.
pub trait AudioEngine: Send + Sync {
    /// Load every sampler and build the effect graph.
    fn load<'a>(&'a self, bank: &'a SampleBank) -> BoxFuture<'a, Result<(), SpaceError>>;

    /// Play `note` on `instrument` at transport `time` (seconds) for `duration` seconds.
    ///
    /// `velocity` is normalized to `[0, 1]`.
    fn trigger_attack_release(
        &self,
        instrument: InstrumentKey,
        note: &str,
        duration: f64,
        time: f64,
        velocity: f64,
    );
}
