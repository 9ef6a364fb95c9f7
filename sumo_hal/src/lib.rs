//! # Sumo HAL Library
//!
//! Driver backends behind the `SensorDriver` / `ActuatorDriver` traits defined
//! in `sumo_common::hal::driver`.
//!
//! # Module Structure
//!
//! - [`driver_registry`] - Backend factory registration
//! - [`drivers`] - Backend implementations (`simulation`, `ev3dev`)
//!
//! # Usage
//!
//! ```rust
//! use sumo_common::hal::config::HalConfig;
//! use sumo_hal::DriverRegistry;
//!
//! let registry = DriverRegistry::with_builtin_drivers();
//! let drivers = registry.create("simulation", &HalConfig::default()).unwrap();
//! assert_eq!(drivers.sensors.name(), "simulation");
//! ```

#![deny(missing_docs)]

pub mod driver_registry;
pub mod drivers;

pub use crate::driver_registry::DriverRegistry;
