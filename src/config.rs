// Scheduler configuration
// Loaded from RON; every field has a default so partial files are fine

use crate::sequencer::groove::GrooveSettings;
use crate::sequencer::timeline::{TempoSig, TimeBase, TimingError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("RON serialization error: {0}")]
    RonSerialize(#[from] ron::Error),

    #[error("Invalid timing: {0}")]
    Timing(#[from] TimingError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub sample_rate: f64,
    pub tempo: TempoSig,
    /// Frames per audio block
    pub block_size: u32,
    /// Initial capacity of the per-block event buffer
    pub event_capacity: usize,
    pub groove: GrooveSettings,
    /// Fixed humanize seed for reproducible renders
    pub humanize_seed: Option<u64>,
}

impl SchedulerConfig {
    /// Parse and validate a RON document
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let config = Self::from_ron_str(&source)?;
        tracing::debug!(path = %path.display(), "loaded scheduler config");
        Ok(config)
    }

    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.time_base()?;
        if self.block_size == 0 {
            return Err(ConfigError::Invalid("block_size must be > 0".into()));
        }
        if self.tempo.numerator == 0 || !self.tempo.denominator.is_power_of_two() {
            return Err(ConfigError::Invalid(format!(
                "unsupported time signature {}/{}",
                self.tempo.numerator, self.tempo.denominator
            )));
        }
        Ok(())
    }

    pub fn time_base(&self) -> Result<TimeBase, TimingError> {
        TimeBase::new(self.sample_rate, self.tempo)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            tempo: TempoSig::default(),
            block_size: 512,
            event_capacity: 1024,
            groove: GrooveSettings::default(),
            humanize_seed: None,
        }
    }
}
