// Engine configuration
// Loaded from RON, validated before any engine is built

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::chord::{StrumPace, TAP_HOLD_SECONDS, TriggerMode};
use crate::grid::GridLayout;
use crate::sequencer::note::DEFAULT_NOTE_BEATS;
use crate::sequencer::timeline::TempoConfig;
use crate::sequencer::EngineError;

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] EngineError),

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: f64 },
}

/// Default chord trigger settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrumDefaults {
    pub mode: TriggerMode,
    pub pace: StrumPace,
}

impl Default for StrumDefaults {
    fn default() -> Self {
        Self {
            mode: TriggerMode::Strum,
            pace: StrumPace::default(),
        }
    }
}

/// Everything needed to build a playback engine
///
/// Any field may be omitted from the RON file; missing fields take their
/// default values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tempo: TempoConfig,
    pub grid: GridLayout,
    /// Control loop frequency (ticks per second)
    pub control_rate_hz: f64,
    /// Automatic release time of tapped and strummed notes
    pub tap_hold_ms: f64,
    /// Length of recorded notes in beats
    pub note_beats: f64,
    pub strum: StrumDefaults,
}

impl EngineConfig {
    /// Parse and validate a RON document
    pub fn from_ron_str(ron_data: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = ron::from_str(ron_data)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_ron_str(&data)
    }

    /// Serialize to pretty RON
    pub fn to_ron_string(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tempo.validate()?;

        if !(self.control_rate_hz.is_finite() && self.control_rate_hz > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "control_rate_hz",
                value: self.control_rate_hz,
            });
        }
        if !(self.tap_hold_ms.is_finite() && self.tap_hold_ms >= 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "tap_hold_ms",
                value: self.tap_hold_ms,
            });
        }
        if !(self.note_beats.is_finite() && self.note_beats >= 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "note_beats",
                value: self.note_beats,
            });
        }
        Ok(())
    }

    /// Seconds between two control loop ticks
    pub fn tick_interval_seconds(&self) -> f64 {
        1.0 / self.control_rate_hz
    }

    pub fn tap_hold_seconds(&self) -> f64 {
        self.tap_hold_ms / 1000.0
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tempo: TempoConfig::default(),
            grid: GridLayout::default(),
            control_rate_hz: 60.0,
            tap_hold_ms: TAP_HOLD_SECONDS * 1000.0,
            note_beats: DEFAULT_NOTE_BEATS,
            strum: StrumDefaults::default(),
        }
    }
}
