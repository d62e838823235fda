//! Configuration loading and typed config structures for the Frostfall simulation.
//!
//! The canonical configuration lives in `frostfall-config.yaml` in the
//! working directory. Every section and every field has a default, so an
//! empty file (or a missing section) yields the stock 100-day apocalypse.
//!
//! Presets (`short`, `normal`, `long`, `brutal`) rewrite the apocalypse
//! length and multipliers at runtime through the admin command tree.

use std::path::Path;

use frostfall_survival::SurvivalConfig;
use frostfall_world::{SamplingSettings, TransponderSettings};
use serde::{Deserialize, Serialize};

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

    /// The YAML parsed but describes an unusable simulation.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// What is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `frostfall-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// World-level settings (name, seed, pacing, build range).
    #[serde(default)]
    pub world: WorldConfig,

    /// Apocalypse timeline and multipliers.
    #[serde(default)]
    pub apocalypse: ApocalypseConfig,

    /// Block sampling radius and baselines.
    #[serde(default)]
    pub sampling: SamplingConfig,

    /// Transponder tuning.
    #[serde(default)]
    pub transponder: TransponderSettings,

    /// Client sync intervals.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Survival tracker thresholds.
    #[serde(default)]
    pub survival: SurvivalConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.world.ticks_per_day == 0 {
            return Err(invalid("world.ticks_per_day must be at least 1"));
        }
        if self.world.min_y >= self.world.max_y {
            return Err(invalid("world.min_y must be below world.max_y"));
        }
        if self.apocalypse.weather_lock_phase > 6 {
            return Err(invalid("apocalypse.weather_lock_phase must be 0-6"));
        }
        if self.apocalypse.geo_strength_multiplier < 0.0 || self.apocalypse.heat_multiplier < 0.0 {
            return Err(invalid("apocalypse multipliers must not be negative"));
        }
        if self.sync.environment_interval == 0 || self.sync.temperature_interval == 0 {
            return Err(invalid("sync intervals must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.to_owned(),
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Human-readable world name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Random seed for block sampling and weather.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Real-time milliseconds per tick.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Host ticks in one day.
    #[serde(default = "default_ticks_per_day")]
    pub ticks_per_day: u32,

    /// Lowest buildable y.
    #[serde(default = "default_min_y")]
    pub min_y: i32,

    /// Highest buildable y.
    #[serde(default = "default_max_y")]
    pub max_y: i32,

    /// Where the world save is written on shutdown.
    #[serde(default = "default_save_path")]
    pub save_path: String,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
            tick_interval_ms: default_tick_interval_ms(),
            ticks_per_day: default_ticks_per_day(),
            min_y: default_min_y(),
            max_y: default_max_y(),
            save_path: default_save_path(),
        }
    }
}

/// Apocalypse timeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApocalypseConfig {
    /// Days from the first snow to the end of the main timeline.
    #[serde(default = "default_total_days")]
    pub total_days: u32,

    /// Whether the counter starts frozen.
    #[serde(default)]
    pub paused: bool,

    /// Whether the first tick begins the apocalypse on its own.
    #[serde(default = "default_true")]
    pub auto_start: bool,

    /// Whether the atmospheric collapse follows the main timeline.
    #[serde(default = "default_true")]
    pub phase6_enabled: bool,

    /// Length of the collapse in days.
    #[serde(default = "default_phase6_days")]
    pub phase6_days: u32,

    /// Scale on the depth modifier.
    #[serde(default = "default_multiplier")]
    pub geo_strength_multiplier: f64,

    /// Scale on heat source warmth.
    #[serde(default = "default_multiplier")]
    pub heat_multiplier: f64,

    /// First phase with weather locked to snow.
    #[serde(default = "default_weather_lock_phase")]
    pub weather_lock_phase: u8,
}

impl Default for ApocalypseConfig {
    fn default() -> Self {
        Self {
            total_days: default_total_days(),
            paused: false,
            auto_start: true,
            phase6_enabled: true,
            phase6_days: default_phase6_days(),
            geo_strength_multiplier: default_multiplier(),
            heat_multiplier: default_multiplier(),
            weather_lock_phase: default_weather_lock_phase(),
        }
    }
}

/// Block sampling configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Half-width of the sampled square around each player.
    #[serde(default = "default_horizontal_radius")]
    pub horizontal_radius: i32,

    /// Surface samples per player at the baseline schedule.
    #[serde(default = "default_surface_samples")]
    pub surface_samples: u32,

    /// Volume samples per player at the baseline schedule.
    #[serde(default = "default_volume_samples")]
    pub volume_samples: u32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            horizontal_radius: default_horizontal_radius(),
            surface_samples: default_surface_samples(),
            volume_samples: default_volume_samples(),
        }
    }
}

impl SamplingConfig {
    /// Settings handed to the block engines.
    pub const fn settings(&self) -> SamplingSettings {
        SamplingSettings {
            horizontal_radius: self.horizontal_radius,
            surface_samples: self.surface_samples,
            volume_samples: self.volume_samples,
        }
    }
}

/// Client sync configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Ticks between environment broadcasts.
    #[serde(default = "default_environment_interval")]
    pub environment_interval: u32,

    /// Ticks between per-player temperature updates.
    #[serde(default = "default_temperature_interval")]
    pub temperature_interval: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            environment_interval: default_environment_interval(),
            temperature_interval: default_temperature_interval(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
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
// Presets
// ---------------------------------------------------------------------------

/// Named apocalypse tunings selectable at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// A 30-day sprint.
    Short,
    /// The stock 100-day timeline.
    Normal,
    /// A 200-day slow burn.
    Long,
    /// 60 days with halved geothermal and heat source warmth.
    Brutal,
}

impl Preset {
    /// Every preset, in display order.
    pub const ALL: [Self; 4] = [Self::Short, Self::Normal, Self::Long, Self::Brutal];

    /// Look a preset up by name, ignoring case.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Name used on the command line.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Normal => "normal",
            Self::Long => "long",
            Self::Brutal => "brutal",
        }
    }

    /// Rewrite the timeline length and multipliers.
    pub const fn apply(self, config: &mut ApocalypseConfig) {
        let (total_days, multiplier) = match self {
            Self::Short => (30, 1.0),
            Self::Normal => (100, 1.0),
            Self::Long => (200, 1.0),
            Self::Brutal => (60, 0.5),
        };
        config.total_days = total_days;
        config.geo_strength_multiplier = multiplier;
        config.heat_multiplier = multiplier;
    }
}

// ---------------------------------------------------------------------------
// Default value functions (required by serde)
// ---------------------------------------------------------------------------

fn default_world_name() -> String {
    "Frostfall".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_tick_interval_ms() -> u64 {
    50
}

const fn default_ticks_per_day() -> u32 {
    24_000
}

const fn default_min_y() -> i32 {
    -64
}

const fn default_max_y() -> i32 {
    320
}

fn default_save_path() -> String {
    "frostfall-save.json".to_owned()
}

const fn default_total_days() -> u32 {
    100
}

const fn default_true() -> bool {
    true
}

const fn default_phase6_days() -> u32 {
    20
}

const fn default_multiplier() -> f64 {
    1.0
}

const fn default_weather_lock_phase() -> u8 {
    2
}

const fn default_horizontal_radius() -> i32 {
    64
}

const fn default_surface_samples() -> u32 {
    24
}

const fn default_volume_samples() -> u32 {
    12
}

const fn default_environment_interval() -> u32 {
    100
}

const fn default_temperature_interval() -> u32 {
    40
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.world.ticks_per_day, 24_000);
        assert_eq!(config.apocalypse.total_days, 100);
        assert_eq!(config.apocalypse.phase6_days, 20);
        assert_eq!(config.sampling.horizontal_radius, 64);
        assert_eq!(config.transponder.total_broadcast_ticks, 12_000);
        assert_eq!(config.sync.temperature_interval, 40);
    }

    #[test]
    fn shipped_config_file_matches_defaults() {
        let yaml = include_str!("../../../frostfall-config.yaml");
        let parsed = SimulationConfig::parse(yaml);
        assert_eq!(parsed.ok(), Some(SimulationConfig::default()));
    }

    #[test]
    fn parse_partial_yaml() {
        let yaml = r"
world:
  name: Glacier Test
  seed: 7
apocalypse:
  total_days: 40
  phase6_enabled: false
transponder:
  power_radius: 6
survival:
  frostbite:
    exposure_temperature: -10.0
";
        let config = SimulationConfig::parse(yaml).ok().unwrap_or_default();
        assert_eq!(config.world.name, "Glacier Test");
        assert_eq!(config.world.seed, 7);
        assert_eq!(config.world.tick_interval_ms, 50);
        assert_eq!(config.apocalypse.total_days, 40);
        assert!(!config.apocalypse.phase6_enabled);
        assert_eq!(config.apocalypse.phase6_days, 20);
        assert_eq!(config.transponder.power_radius, 6);
        assert_eq!(config.transponder.total_broadcast_ticks, 12_000);
        assert!((config.survival.frostbite.exposure_temperature + 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn parse_empty_yaml_gives_defaults() {
        let config = SimulationConfig::parse("{}").ok();
        assert_eq!(config, Some(SimulationConfig::default()));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let zero_day = SimulationConfig::parse("world:\n  ticks_per_day: 0\n");
        assert!(matches!(zero_day, Err(ConfigError::Invalid { .. })));
        let inverted = SimulationConfig::parse("world:\n  min_y: 10\n  max_y: 0\n");
        assert!(matches!(inverted, Err(ConfigError::Invalid { .. })));
        let garbage = SimulationConfig::parse("world: [1, 2");
        assert!(matches!(garbage, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn presets_rewrite_timeline() {
        let mut apocalypse = ApocalypseConfig::default();
        Preset::Brutal.apply(&mut apocalypse);
        assert_eq!(apocalypse.total_days, 60);
        assert!((apocalypse.heat_multiplier - 0.5).abs() < f64::EPSILON);
        Preset::Long.apply(&mut apocalypse);
        assert_eq!(apocalypse.total_days, 200);
        assert!((apocalypse.geo_strength_multiplier - 1.0).abs() < f64::EPSILON);
        assert_eq!(Preset::parse(" SHORT "), Some(Preset::Short));
        assert_eq!(Preset::parse("endless"), None);
    }
}
