//! Driver registry.
//!
//! Maps backend names to [`DriverFactory`] functions. Built once at startup
//! and consulted with the name from `hal.driver` or the command line. No
//! global state.

use std::collections::BTreeMap;

use sumo_common::hal::config::HalConfig;
use sumo_common::hal::driver::{DriverError, DriverFactory, DriverSet};
use tracing::info;

use crate::drivers::register_all_drivers;

/// Registry of available driver backends.
pub struct DriverRegistry {
    factories: BTreeMap<&'static str, DriverFactory>,
}

impl DriverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Create a registry holding every built-in backend.
    pub fn with_builtin_drivers() -> Self {
        let mut registry = Self::new();
        register_all_drivers(&mut registry);
        registry
    }

    /// Register a backend factory.
    ///
    /// # Panics
    /// Panics if a backend with the same name is already registered.
    pub fn register(&mut self, name: &'static str, factory: DriverFactory) {
        if self.factories.contains_key(name) {
            panic!("Driver '{name}' is already registered");
        }
        self.factories.insert(name, factory);
    }

    /// Get a backend factory by name.
    pub fn get_factory(&self, name: &str) -> Option<DriverFactory> {
        self.factories.get(name).copied()
    }

    /// Instantiate a backend by name.
    ///
    /// # Errors
    /// Returns `DriverError::DriverNotFound` if no backend with the given name
    /// is registered, or whatever the factory reports.
    pub fn create(&self, name: &str, config: &HalConfig) -> Result<DriverSet, DriverError> {
        let factory = self
            .get_factory(name)
            .ok_or_else(|| DriverError::DriverNotFound(name.to_string()))?;
        let drivers = factory(config)?;
        info!(
            "Driver '{}' ready (sensors: {}, actuators: {})",
            name,
            drivers.sensors.name(),
            drivers.actuators.name()
        );
        Ok(drivers)
    }

    /// All registered backend names, sorted.
    pub fn list_drivers(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}
