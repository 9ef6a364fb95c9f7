//! Prelude module for common re-exports.
//!
//! ```rust
//! use sumo_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig, SumoConfig};
pub use crate::control_unit::config::{
    PidConfig, SpeedConfig, ThresholdConfig, TickLogConfig, TickLogFormat, TimingConfig,
};
pub use crate::hal::config::{HalConfig, SimulationConfig};

// ─── Data Model ─────────────────────────────────────────────────────
pub use crate::control_unit::state::{
    ManeuverKind, MotorCommand, PerceptionSnapshot, RobotState, TickEvent, clamp_speed,
};
pub use crate::hal::types::Side;

// ─── Drivers & Time ─────────────────────────────────────────────────
pub use crate::clock::{Clock, ManualClock, MonotonicClock};
pub use crate::hal::driver::{
    ActuatorDriver, DriverError, DriverFactory, DriverSet, SensorDriver,
};
