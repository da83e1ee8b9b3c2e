//! Configuration loading and typed config structures for the spawn tracker.
//!
//! The canonical configuration lives in `nebula-config.yaml` at the project
//! root. Every section has serde defaults, so an empty or partial file is
//! valid and the built-in rotation data applies.
//!
//! The reference epoch, rotation table, and color sequence are plain data
//! here so they can be recalibrated against fresh in-game observations
//! without touching the predictor.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use nebula_types::{ColorSet, Location, RotationEntry, SpawnKind, SpawnSite};
use serde::Deserialize;

/// Environment variable overriding [`PredictorConfig::phase_offset`].
pub const PHASE_OFFSET_ENV: &str = "NEBULA_PHASE_OFFSET";

/// Smallest accepted driver tick interval.
pub const MIN_TICK_INTERVAL_MS: u64 = 100;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override could not be parsed.
    #[error("invalid value {value:?} for {name}")]
    InvalidOverride {
        /// Name of the environment variable.
        name: String,
        /// The raw value that failed to parse.
        value: String,
    },

    /// A parsed value is outside its accepted range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level tracker configuration.
///
/// Mirrors the structure of `nebula-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TrackerConfig {
    /// Reference epoch, phase offset, rotation table, and color sequence.
    #[serde(default)]
    pub predictor: PredictorConfig,

    /// Presentation driver cadence.
    #[serde(default)]
    pub driver: DriverConfig,

    /// Rendering settings (time zone, output format, image overrides).
    #[serde(default)]
    pub display: DisplayConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TrackerConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `NEBULA_PHASE_OFFSET` overrides `predictor.phase_offset` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, and
    /// [`ConfigError::InvalidOverride`] or [`ConfigError::Invalid`] if a
    /// value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, applying environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, and
    /// [`ConfigError::InvalidOverride`] or [`ConfigError::Invalid`] if a
    /// value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Self::parse_with(yaml, |name| std::env::var(name).ok())
    }

    /// Parse configuration from a YAML string, resolving overrides through
    /// `lookup` instead of the process environment.
    ///
    /// # Errors
    ///
    /// Same as [`parse`](Self::parse).
    pub fn parse_with<F>(yaml: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides on top of the parsed values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOverride`] if an override is set but
    /// does not parse.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(PHASE_OFFSET_ENV) {
            let offset = raw
                .trim()
                .parse::<i64>()
                .map_err(|_err| ConfigError::InvalidOverride {
                    name: PHASE_OFFSET_ENV.to_owned(),
                    value: raw.clone(),
                })?;
            self.predictor.phase_offset = offset;
        }
        Ok(())
    }

    /// Check ranges that serde cannot express.
    ///
    /// Predictor invariants (non-empty rotation, three colors) are checked
    /// when the predictor is built.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.driver.tick_interval_ms < MIN_TICK_INTERVAL_MS {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "driver.tick_interval_ms must be at least {MIN_TICK_INTERVAL_MS}, got {}",
                    self.driver.tick_interval_ms
                ),
            });
        }
        Ok(())
    }
}

/// Calibration data for the spawn predictor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PredictorConfig {
    /// Instant defining cycle phase zero.
    #[serde(default = "default_reference_epoch")]
    pub reference_epoch: DateTime<FixedOffset>,

    /// Added to the elapsed hour count before indexing the rotation table.
    /// Tuned against observed game states, not derived.
    #[serde(default = "default_phase_offset")]
    pub phase_offset: i64,

    /// One entry per hour, indexed cyclically.
    #[serde(default = "default_rotation")]
    pub rotation: Vec<RotationEntry>,

    /// Color set for each 20-minute window of the hour.
    #[serde(default = "default_color_sequence")]
    pub color_sequence: Vec<ColorSet>,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            reference_epoch: default_reference_epoch(),
            phase_offset: default_phase_offset(),
            rotation: default_rotation(),
            color_sequence: default_color_sequence(),
        }
    }
}

/// Presentation driver configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DriverConfig {
    /// Real-time milliseconds between re-evaluations.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

/// How rendered output is encoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable terminal output.
    #[default]
    Text,
    /// One JSON document per update, for a browser or other consumer.
    Json,
}

/// Rendering configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DisplayConfig {
    /// IANA time zone for displayed wall-clock times. Daylight saving
    /// follows the zone's rules.
    #[serde(default = "default_timezone")]
    pub timezone: Tz,

    /// Output encoding.
    #[serde(default)]
    pub format: OutputFormat,

    /// Per-location image overrides (e.g. hosted asset URLs).
    #[serde(default)]
    pub images: BTreeMap<Location, String>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            format: OutputFormat::default(),
            images: BTreeMap::new(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit logs as JSON lines.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

/// 9:00 PM EST on 2025-01-16, the first observed rotation.
fn default_reference_epoch() -> DateTime<FixedOffset> {
    // UTC-5, in seconds.
    FixedOffset::west_opt(18_000)
        .and_then(|tz| {
            chrono::NaiveDate::from_ymd_opt(2025, 1, 16)
                .and_then(|d| d.and_hms_opt(21, 0, 0))
                .and_then(|naive| naive.and_local_timezone(tz).single())
        })
        .unwrap_or_default()
}

const fn default_phase_offset() -> i64 {
    1
}

fn default_rotation() -> Vec<RotationEntry> {
    let entry = |a: Location, ak: SpawnKind, b: Location, bk: SpawnKind| {
        RotationEntry::new(SpawnSite::new(a, ak), SpawnSite::new(b, bk))
    };
    vec![
        entry(Location::SanctuarySeal, SpawnKind::Ore, Location::OrcVillage, SpawnKind::Chest),
        entry(
            Location::SanctuarySeal,
            SpawnKind::Chest,
            Location::ShrineOfDevotion,
            SpawnKind::Ore,
        ),
        entry(Location::OrcVillage, SpawnKind::Ore, Location::ArkeumPost, SpawnKind::Chest),
        entry(Location::OrcVillage, SpawnKind::Chest, Location::SanctuarySeal, SpawnKind::Ore),
    ]
}

fn default_color_sequence() -> Vec<ColorSet> {
    vec![ColorSet::Blue, ColorSet::Green, ColorSet::Orange]
}

const fn default_tick_interval_ms() -> u64 {
    1000
}

const fn default_timezone() -> Tz {
    Tz::America__New_York
}

fn default_log_level() -> String {
    "info".to_owned()
}
