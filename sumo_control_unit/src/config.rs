//! Configuration loading for the control unit.
//!
//! Reads one TOML file into [`SumoConfig`], validates it, and derives the
//! runtime [`ControlParams`] (durations as [`Duration`], thresholds and gains
//! copied out). Loaded once at startup; there is no reload.

use std::path::Path;
use std::time::Duration;

use sumo_common::config::{ConfigError, ConfigLoader, SumoConfig};
use sumo_common::control_unit::config::{PidConfig, SpeedConfig, ThresholdConfig, TimingConfig};
use tracing::info;

/// Everything the state machine and cycle runner need at runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlParams {
    /// Behavior speeds.
    pub speeds: SpeedConfig,
    /// Detection, push and edge thresholds.
    pub thresholds: ThresholdConfig,
    /// Steering PID.
    pub pid: PidConfig,
    /// Raw timing section (maneuver durations are derived from it).
    pub timing: TimingConfig,
    /// Sleep between ticks.
    pub tick_interval: Duration,
    /// A push longer than this is a stall.
    pub push_timeout: Duration,
}

impl ControlParams {
    /// Derive runtime parameters from a validated configuration.
    pub fn from_config(config: &SumoConfig) -> Self {
        Self {
            speeds: config.speeds.clone(),
            thresholds: config.thresholds.clone(),
            pid: config.pid.clone(),
            timing: config.timing.clone(),
            tick_interval: TimingConfig::duration(config.timing.tick_interval),
            push_timeout: TimingConfig::duration(config.timing.push_timeout),
        }
    }
}

impl Default for ControlParams {
    fn default() -> Self {
        Self::from_config(&SumoConfig::default())
    }
}

/// Validated configuration bundle, ready for runtime use.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The file contents (with defaults filled in).
    pub config: SumoConfig,
    /// Derived runtime parameters.
    pub params: ControlParams,
}

impl LoadedConfig {
    /// Validate `config` and derive runtime parameters.
    pub fn new(config: SumoConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let params = ControlParams::from_config(&config);
        Ok(Self { config, params })
    }

    /// Re-validate after changing `config` (command-line overrides).
    pub fn revalidate(self) -> Result<Self, ConfigError> {
        Self::new(self.config)
    }
}

/// Load and validate the configuration.
///
/// `None` runs with built-in defaults.
pub fn load_config(path: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    let config = match path {
        Some(path) => {
            let config = SumoConfig::load(path).map_err(|e| match e {
                ConfigError::FileNotFound => {
                    ConfigError::ParseError(format!("{} not found", path.display()))
                }
                other => other,
            })?;
            info!("Loaded configuration from {}", path.display());
            config
        }
        None => {
            info!("No configuration file given, using defaults");
            SumoConfig::default()
        }
    };
    LoadedConfig::new(config)
}

/// Parse and validate configuration from a TOML string.
pub fn load_config_from_str(content: &str) -> Result<LoadedConfig, ConfigError> {
    LoadedConfig::new(SumoConfig::from_toml(content)?)
}

/// Render the effective configuration as TOML.
pub fn render_config(config: &SumoConfig) -> Result<String, ConfigError> {
    toml::to_string_pretty(config).map_err(|e| ConfigError::ParseError(e.to_string()))
}
