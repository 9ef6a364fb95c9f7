//! Driver backend implementations.
//!
//! - [`simulation`] - Ring simulator plus scripted test doubles
//! - [`ev3dev`] - LEGO EV3 running ev3dev, through sysfs
//!
//! # Adding New Backends
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement `SensorDriver` and `ActuatorDriver` from `sumo_common::hal::driver`
//! 3. Expose a `create_driver(&HalConfig)` factory and register it below

pub mod ev3dev;
pub mod simulation;

use crate::driver_registry::DriverRegistry;

/// Register all built-in backends.
pub fn register_all_drivers(registry: &mut DriverRegistry) {
    registry.register("simulation", simulation::create_driver);
    registry.register("ev3dev", ev3dev::create_driver);
}
