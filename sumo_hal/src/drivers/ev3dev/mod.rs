//! ev3dev backend.
//!
//! Drives a LEGO EV3 brick running ev3dev through its sysfs class devices.
//! Devices are matched by port, so the wiring lives in `[hal]` and nothing
//! depends on plug order. Maneuvers block the calling thread for their
//! duration, and time comes from the monotonic clock.

mod sensors;
mod sysfs;
mod tank;

pub use sensors::{Ev3Sensors, LegoSensor, MODE_COL_REFLECT, MODE_TOUCH, MODE_US_DIST_CM};
pub use sysfs::{Device, SysfsError, SysfsResult};
pub use tank::{Ev3Tank, TachoMotor};

use std::path::Path;

use sumo_common::clock::MonotonicClock;
use sumo_common::hal::config::HalConfig;
use sumo_common::hal::driver::{DriverError, DriverSet};
use tracing::info;

/// Factory function to create the ev3dev backend.
pub fn create_driver(config: &HalConfig) -> Result<DriverSet, DriverError> {
    config
        .validate()
        .map_err(|e| DriverError::ConfigError(e.to_string()))?;

    let root = Path::new(&config.sysfs_root);
    let sensors = Ev3Sensors::open(
        root,
        (config.left_distance.as_str(), config.right_distance.as_str()),
        (
            config.left_reflectance.as_str(),
            config.right_reflectance.as_str(),
        ),
        config.contact.as_deref(),
    )?;
    let tank = Ev3Tank::open(root, &config.left_motor, &config.right_motor)?;
    info!(
        "ev3dev: motors {}/{}, ultrasonic {}/{}, color {}/{}, touch {}",
        config.left_motor,
        config.right_motor,
        config.left_distance,
        config.right_distance,
        config.left_reflectance,
        config.right_reflectance,
        config.contact.as_deref().unwrap_or("none")
    );

    Ok(DriverSet {
        sensors: Box::new(sensors),
        actuators: Box::new(tank),
        clock: Box::new(MonotonicClock::new()),
    })
}

#[cfg(test)]
mod tests {
    use super::sysfs::fake::FakeSysfs;
    use super::*;
    use sumo_common::hal::types::Side;

    fn config_for(fake: &FakeSysfs) -> HalConfig {
        HalConfig {
            driver: "ev3dev".to_string(),
            sysfs_root: fake.root().to_string_lossy().into_owned(),
            ..Default::default()
        }
    }

    #[test]
    fn factory_wires_reference_robot() {
        let fake = FakeSysfs::reference_robot();
        let mut drivers = create_driver(&config_for(&fake)).unwrap();
        assert_eq!(drivers.sensors.name(), "ev3dev");
        assert_eq!(drivers.actuators.name(), "ev3dev");
        assert_eq!(drivers.sensors.read_reflectance(Side::Right).unwrap(), 7.0);
        drivers.actuators.stop().unwrap();
    }

    #[test]
    fn factory_reports_missing_motor() {
        let fake = FakeSysfs::new();
        fake.add_sensor("sensor0", "in1", 0, 5);
        fake.add_sensor("sensor1", "in2", 0, 5);
        fake.add_sensor("sensor2", "in3", 0, 30);
        fake.add_sensor("sensor3", "in4", 0, 30);
        fake.add_motor("motor0", "outB", 1050);

        let result = create_driver(&config_for(&fake));
        match result {
            Err(DriverError::DeviceNotFound(msg)) => assert!(msg.contains("outC")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected missing motor"),
        }
    }

    #[test]
    fn factory_rejects_bad_wiring() {
        let fake = FakeSysfs::reference_robot();
        let config = HalConfig {
            right_motor: "outB".to_string(),
            ..config_for(&fake)
        };
        assert!(matches!(
            create_driver(&config),
            Err(DriverError::ConfigError(_))
        ));
    }
}
