//! Simulation backend.
//!
//! Runs the control loop against a simulated ring without hardware, on a
//! virtual clock so a whole bout runs in milliseconds. The scripted doubles
//! in this module replace the arena when a test needs exact per-tick input.

mod driver;
mod physics;
mod scripted;

pub use driver::{SimActuators, SimSensors, Simulation};
pub use physics::{ArenaSimulator, Pose};
pub use scripted::{ActuatorCall, ActuatorLog, RecordingActuators, ScriptedSensors, SensorFrame};

use sumo_common::hal::config::HalConfig;
use sumo_common::hal::driver::{DriverError, DriverSet};

/// Factory function to create the simulation backend.
pub fn create_driver(config: &HalConfig) -> Result<DriverSet, DriverError> {
    config
        .simulation
        .validate()
        .map_err(|e| DriverError::ConfigError(e.to_string()))?;

    let mut simulation = Simulation::new(config.simulation.clone());
    if config.contact.is_some() {
        simulation = simulation.with_contact_sensor();
    }
    Ok(simulation.into_driver_set())
}
