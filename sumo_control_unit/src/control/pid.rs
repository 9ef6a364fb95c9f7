//! Time-aware PID controller for approach steering.
//!
//! The time step is measured between calls from the control clock, floored at
//! a minimum so a zero or backwards delta cannot blow up the derivative. The
//! first call after a reset has no previous timestamp and uses a fixed default
//! step instead.

use std::time::Duration;

use sumo_common::consts::{PID_DEFAULT_DT_S, PID_MIN_DT_S};
use sumo_common::control_unit::config::PidConfig;

fn positive_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value > 0.0 { value } else { fallback }
}

/// PID gains and output limit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidGains {
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain (0 = disabled).
    pub ki: f64,
    /// Derivative gain (0 = disabled).
    pub kd: f64,
    /// Symmetric output clamp; `None` leaves the output unclamped.
    pub limit: Option<f64>,
}

impl From<&PidConfig> for PidGains {
    fn from(config: &PidConfig) -> Self {
        Self {
            kp: config.kp,
            ki: config.ki,
            kd: config.kd,
            limit: config.limit,
        }
    }
}

/// Internal state carried between calls.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PidState {
    /// Sum of `error × dt`.
    pub integral: f64,
    /// Error of the previous call.
    pub prev_error: f64,
    /// Clock time of the previous call.
    pub last_time: Option<Duration>,
}

/// PID controller owned by the state machine.
#[derive(Debug, Clone)]
pub struct PidController {
    gains: PidGains,
    default_dt: f64,
    min_dt: f64,
    state: PidState,
}

impl PidController {
    /// Create a controller with zeroed history.
    ///
    /// `default_dt` and `min_dt` are seconds; a value that is not finite and
    /// positive falls back to the built-in default. A negative limit is
    /// taken by magnitude and a NaN limit disables clamping.
    pub fn new(gains: PidGains, default_dt: f64, min_dt: f64) -> Self {
        let gains = PidGains {
            limit: gains.limit.filter(|l| !l.is_nan()).map(f64::abs),
            ..gains
        };
        Self {
            gains,
            default_dt: positive_or(default_dt, PID_DEFAULT_DT_S),
            min_dt: positive_or(min_dt, PID_MIN_DT_S),
            state: PidState::default(),
        }
    }

    /// Create a controller from the `[pid]` section.
    pub fn from_config(config: &PidConfig) -> Self {
        Self::new(PidGains::from(config), config.default_dt, config.min_dt)
    }

    /// Gains in use.
    #[inline]
    pub fn gains(&self) -> &PidGains {
        &self.gains
    }

    /// Current accumulated state.
    #[inline]
    pub fn state(&self) -> &PidState {
        &self.state
    }

    /// Forget integral, previous error and timestamp.
    #[inline]
    pub fn reset(&mut self) {
        self.state = PidState::default();
    }

    /// Time step for a call at `now`, in seconds. Always > 0.
    fn dt(&self, now: Duration) -> f64 {
        match self.state.last_time {
            None => self.default_dt,
            Some(last) => now.saturating_sub(last).as_secs_f64().max(self.min_dt),
        }
    }

    /// One PID step for `error` observed at clock time `now`.
    ///
    /// A non-finite error is treated as zero so the accumulated state stays
    /// finite.
    pub fn compute(&mut self, error: f64, now: Duration) -> f64 {
        let error = if error.is_finite() { error } else { 0.0 };
        let dt = self.dt(now);

        self.state.integral += error * dt;
        let derivative = (error - self.state.prev_error) / dt;

        self.state.prev_error = error;
        self.state.last_time = Some(now);

        let output =
            self.gains.kp * error + self.gains.ki * self.state.integral + self.gains.kd * derivative;
        match self.gains.limit {
            Some(limit) => output.clamp(-limit, limit),
            None => output,
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
