//! Configuration structures for the control unit.
//!
//! All config types use `serde::Deserialize` for TOML loading and
//! `#[serde(default)]` so a partial file (or none at all) yields the
//! reference tuning. Durations are given in seconds as `f64`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ConfigError;
use crate::consts::{
    DEFAULT_TICK_LOG_PATH, DISTANCE_MAX_RANGE_CM, MOTOR_SPEED_MAX, PID_DEFAULT_DT_S, PID_MIN_DT_S,
    REFLECTANCE_MAX, REFLECTANCE_MIN, TICK_INTERVAL_S, TIMING_MAX_S,
};

fn invalid(msg: String) -> ConfigError {
    ConfigError::ValidationError(msg)
}

fn check_speed(name: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value.abs() > MOTOR_SPEED_MAX {
        return Err(invalid(format!(
            "speeds.{name} {value} out of range [-{MOTOR_SPEED_MAX}, {MOTOR_SPEED_MAX}]"
        )));
    }
    Ok(())
}

fn check_positive(section: &str, name: &str, value: f64) -> Result<(), ConfigError> {
    if !(value.is_finite() && value > 0.0) {
        return Err(invalid(format!(
            "{section}.{name} must be finite and > 0, got {value}"
        )));
    }
    Ok(())
}

fn check_duration(name: &str, value: f64) -> Result<(), ConfigError> {
    check_positive("timing", name, value)?;
    if value > TIMING_MAX_S {
        return Err(invalid(format!(
            "timing.{name} {value} s exceeds {TIMING_MAX_S} s"
        )));
    }
    Ok(())
}

// ─── Speeds ─────────────────────────────────────────────────────────

/// Motor speeds [% of max] used by each behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedConfig {
    /// In-place spin while searching.
    pub search: f64,
    /// Base speed under PID steering.
    pub approach: f64,
    /// Both sides while pushing.
    pub push: f64,
    /// Slow in-place turn while locking on.
    pub lockon: f64,
    /// Forward nudge when lock-on loses a side.
    pub nudge: f64,
    /// In-place rotation of the escape maneuvers.
    pub rotate: f64,
    /// Reverse speed of the edge escape (negative).
    pub edge_reverse: f64,
    /// Reverse speed of the stall backoff (negative).
    pub stall_reverse: f64,
}

impl Default for SpeedConfig {
    fn default() -> Self {
        Self {
            search: 20.0,
            approach: 30.0,
            push: 85.0,
            lockon: 15.0,
            nudge: 15.0,
            rotate: 30.0,
            edge_reverse: -30.0,
            stall_reverse: -40.0,
        }
    }
}

impl SpeedConfig {
    /// All speeds within ±100; reverse speeds must actually reverse.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_speed("search", self.search)?;
        check_speed("approach", self.approach)?;
        check_speed("push", self.push)?;
        check_speed("lockon", self.lockon)?;
        check_speed("nudge", self.nudge)?;
        check_speed("rotate", self.rotate)?;
        check_speed("edge_reverse", self.edge_reverse)?;
        check_speed("stall_reverse", self.stall_reverse)?;
        if self.edge_reverse >= 0.0 || self.stall_reverse >= 0.0 {
            return Err(invalid(format!(
                "speeds.edge_reverse ({}) and speeds.stall_reverse ({}) must be negative",
                self.edge_reverse, self.stall_reverse
            )));
        }
        Ok(())
    }
}

// ─── Thresholds ─────────────────────────────────────────────────────

/// Distance and reflectance thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Opponent counts as detected below this distance [cm].
    pub detect_cm: f64,
    /// Switch to pushing at or below this center distance [cm].
    pub push_cm: f64,
    /// Lock-on is aligned when |left − right| is below this [cm].
    pub align_tolerance_cm: f64,
    /// Readings at or above this are "no echo" [cm].
    pub max_range_cm: f64,
    /// Reflectance at or above this is the white ring border.
    pub edge_reflectance: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            detect_cm: 25.0,
            push_cm: 7.0,
            align_tolerance_cm: 2.0,
            max_range_cm: DISTANCE_MAX_RANGE_CM,
            edge_reflectance: 40.0,
        }
    }
}

impl ThresholdConfig {
    /// `push_cm < detect_cm < max_range_cm`, reflectance threshold inside the sensor range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_positive("thresholds", "detect_cm", self.detect_cm)?;
        check_positive("thresholds", "push_cm", self.push_cm)?;
        check_positive("thresholds", "align_tolerance_cm", self.align_tolerance_cm)?;
        check_positive("thresholds", "max_range_cm", self.max_range_cm)?;
        if self.push_cm >= self.detect_cm {
            return Err(invalid(format!(
                "thresholds.push_cm {} must be below detect_cm {}",
                self.push_cm, self.detect_cm
            )));
        }
        if self.detect_cm >= self.max_range_cm {
            return Err(invalid(format!(
                "thresholds.detect_cm {} must be below max_range_cm {}",
                self.detect_cm, self.max_range_cm
            )));
        }
        if !(self.edge_reflectance > REFLECTANCE_MIN && self.edge_reflectance <= REFLECTANCE_MAX) {
            return Err(invalid(format!(
                "thresholds.edge_reflectance {} out of range ({REFLECTANCE_MIN}, {REFLECTANCE_MAX}]",
                self.edge_reflectance
            )));
        }
        Ok(())
    }
}

// ─── PID ────────────────────────────────────────────────────────────

/// Steering PID gains and timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PidConfig {
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain.
    pub ki: f64,
    /// Derivative gain.
    pub kd: f64,
    /// Symmetric output limit; `None` leaves the output unclamped.
    pub limit: Option<f64>,
    /// Time step used on the first compute after a reset [s].
    pub default_dt: f64,
    /// Floor for the measured time step [s].
    pub min_dt: f64,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            kp: 1.2,
            ki: 0.01,
            kd: 0.08,
            limit: Some(40.0),
            default_dt: PID_DEFAULT_DT_S,
            min_dt: PID_MIN_DT_S,
        }
    }
}

impl PidConfig {
    /// Finite gains, positive limit and time steps.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, gain) in [("kp", self.kp), ("ki", self.ki), ("kd", self.kd)] {
            if !gain.is_finite() {
                return Err(invalid(format!("pid.{name} must be finite, got {gain}")));
            }
        }
        if let Some(limit) = self.limit {
            check_positive("pid", "limit", limit)?;
        }
        check_positive("pid", "default_dt", self.default_dt)?;
        check_positive("pid", "min_dt", self.min_dt)?;
        Ok(())
    }
}

// ─── Timing ─────────────────────────────────────────────────────────

/// Loop pacing and maneuver durations [s].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Sleep between ticks.
    pub tick_interval: f64,
    /// A push longer than this is a stall.
    pub push_timeout: f64,
    /// Reverse phase of the edge escape.
    pub edge_backup: f64,
    /// Rotate phase of both escape maneuvers.
    pub edge_rotate: f64,
    /// Reverse phase of the stall backoff.
    pub stall_backup: f64,
    /// Forward nudge in lock-on.
    pub nudge: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_interval: TICK_INTERVAL_S,
            push_timeout: 2.0,
            edge_backup: 0.5,
            edge_rotate: 0.6,
            stall_backup: 0.4,
            nudge: 0.25,
        }
    }
}

impl TimingConfig {
    /// Every duration finite, > 0 and at most [`TIMING_MAX_S`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_duration("tick_interval", self.tick_interval)?;
        check_duration("push_timeout", self.push_timeout)?;
        check_duration("edge_backup", self.edge_backup)?;
        check_duration("edge_rotate", self.edge_rotate)?;
        check_duration("stall_backup", self.stall_backup)?;
        check_duration("nudge", self.nudge)?;
        Ok(())
    }

    /// Convert a validated seconds value.
    ///
    /// Out-of-range input saturates: negative and NaN give zero, values too
    /// large for [`Duration`] give `Duration::MAX`.
    #[inline]
    pub fn duration(secs: f64) -> Duration {
        if secs.is_nan() || secs <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }
}

// ─── Tick Log ───────────────────────────────────────────────────────

/// On-disk format of the tick log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TickLogFormat {
    /// One CSV row per tick.
    #[default]
    Csv,
    /// One JSON object per line.
    Jsonl,
    /// Discard tick events.
    None,
}

/// Tick log sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickLogConfig {
    /// Output file (appended to).
    pub path: String,
    /// Output format.
    pub format: TickLogFormat,
}

impl Default for TickLogConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_TICK_LOG_PATH.to_string(),
            format: TickLogFormat::default(),
        }
    }
}

impl TickLogConfig {
    /// A path is required unless logging is off.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.format != TickLogFormat::None && self.path.is_empty() {
            return Err(invalid("tick_log.path cannot be empty".to_string()));
        }
        Ok(())
    }
}
