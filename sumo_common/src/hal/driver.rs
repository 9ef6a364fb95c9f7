//! Driver traits and error types.
//!
//! This module defines:
//! - `SensorDriver` trait - distance, reflectance and contact inputs
//! - `ActuatorDriver` trait - the two drive motors
//! - `DriverError` enum - error types for driver operations
//! - `DriverSet` / `DriverFactory` - what a backend hands to the control loop

use crate::clock::Clock;
use crate::hal::config::HalConfig;
use crate::hal::types::Side;
use std::time::Duration;
use thiserror::Error;

/// Error types for driver operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DriverError {
    /// Driver initialization failed
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// No device found on the configured port
    #[error("No device on port {0}")]
    DeviceNotFound(String),

    /// Hardware communication error
    #[error("Hardware communication error: {0}")]
    Communication(String),

    /// Device answered with something that is not a reading
    #[error("Invalid reading: {0}")]
    InvalidReading(String),

    /// Driver not found in the registry
    #[error("Driver not found: {0}")]
    DriverNotFound(String),
}

/// Sensor inputs consumed by the perception adapter.
///
/// Each call is one read of one device. Implementations must not retry
/// internally and must not cache across calls.
pub trait SensorDriver {
    /// Backend identifier (e.g. "simulation", "ev3dev").
    fn name(&self) -> &'static str;

    /// Distance to the nearest object [cm]. `Ok(None)` means no valid echo.
    fn read_distance(&mut self, side: Side) -> Result<Option<f64>, DriverError>;

    /// Surface reflectance, nominally in [0, 100].
    fn read_reflectance(&mut self, side: Side) -> Result<f64, DriverError>;

    /// Contact (bumper) state. `Ok(None)` when no contact sensor is fitted.
    fn is_contact_pressed(&mut self) -> Result<Option<bool>, DriverError> {
        Ok(None)
    }
}

/// The two drive motors.
///
/// Speeds are percentages in [-100, 100]; positive drives forward.
pub trait ActuatorDriver {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run both motors continuously until the next command.
    fn set_speeds(&mut self, left: f64, right: f64) -> Result<(), DriverError>;

    /// Run both motors for `duration`, blocking until they have stopped.
    fn run_for(&mut self, left: f64, right: f64, duration: Duration) -> Result<(), DriverError>;

    /// Stop both motors.
    fn stop(&mut self) -> Result<(), DriverError>;
}

impl<T: SensorDriver + ?Sized> SensorDriver for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn read_distance(&mut self, side: Side) -> Result<Option<f64>, DriverError> {
        (**self).read_distance(side)
    }

    fn read_reflectance(&mut self, side: Side) -> Result<f64, DriverError> {
        (**self).read_reflectance(side)
    }

    fn is_contact_pressed(&mut self) -> Result<Option<bool>, DriverError> {
        (**self).is_contact_pressed()
    }
}

impl<T: ActuatorDriver + ?Sized> ActuatorDriver for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn set_speeds(&mut self, left: f64, right: f64) -> Result<(), DriverError> {
        (**self).set_speeds(left, right)
    }

    fn run_for(&mut self, left: f64, right: f64, duration: Duration) -> Result<(), DriverError> {
        (**self).run_for(left, right, duration)
    }

    fn stop(&mut self) -> Result<(), DriverError> {
        (**self).stop()
    }
}

/// Everything a backend provides to the control loop.
///
/// The clock belongs to the backend: real hardware runs on the wall clock,
/// the simulator on a virtual one that its actuators advance.
pub struct DriverSet {
    /// Sensor inputs.
    pub sensors: Box<dyn SensorDriver>,
    /// Drive motors.
    pub actuators: Box<dyn ActuatorDriver>,
    /// Time source matching the backend.
    pub clock: Box<dyn Clock>,
}

/// Factory function type for creating a backend from its configuration.
pub type DriverFactory = fn(&HalConfig) -> Result<DriverSet, DriverError>;
