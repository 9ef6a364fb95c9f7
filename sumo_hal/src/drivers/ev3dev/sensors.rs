//! LEGO sensors (`lego-sensor` class).

use std::path::Path;

use sumo_common::hal::driver::{DriverError, SensorDriver};
use sumo_common::hal::types::Side;
use tracing::debug;

use super::sysfs::{Device, SysfsResult};

/// Ultrasonic distance in centimeters.
pub const MODE_US_DIST_CM: &str = "US-DIST-CM";
/// Color sensor reflected light intensity (0-100).
pub const MODE_COL_REFLECT: &str = "COL-REFLECT";
/// Touch sensor state (0/1).
pub const MODE_TOUCH: &str = "TOUCH";

/// One sensor switched into a fixed mode.
#[derive(Debug, Clone)]
pub struct LegoSensor {
    device: Device,
    port: String,
    scale: f64,
}

impl LegoSensor {
    /// Locate the sensor on `port` and switch it to `mode`.
    pub fn open(root: &Path, port: &str, mode: &str) -> SysfsResult<Self> {
        let device = Device::find(root, "lego-sensor", port)?;
        device.write("mode", mode)?;
        // `decimals` depends on the mode, so read it after switching.
        let decimals = device.read_i64("decimals")?;
        let scale = 10f64.powi(decimals.clamp(0, 9) as i32);
        debug!("Sensor {port}: mode {mode}, decimals {decimals}");
        Ok(Self {
            device,
            port: port.to_string(),
            scale,
        })
    }

    /// Port the sensor is plugged into.
    pub fn port(&self) -> &str {
        &self.port
    }

    /// `value0` scaled by `decimals`.
    pub fn value(&self) -> SysfsResult<f64> {
        Ok(self.device.read_i64("value0")? as f64 / self.scale)
    }
}

/// Two ultrasonic sensors, two color sensors and an optional touch sensor.
#[derive(Debug)]
pub struct Ev3Sensors {
    left_distance: LegoSensor,
    right_distance: LegoSensor,
    left_reflectance: LegoSensor,
    right_reflectance: LegoSensor,
    contact: Option<LegoSensor>,
}

impl Ev3Sensors {
    /// Open every sensor of the wiring.
    pub fn open(
        root: &Path,
        distance_ports: (&str, &str),
        reflectance_ports: (&str, &str),
        contact_port: Option<&str>,
    ) -> SysfsResult<Self> {
        Ok(Self {
            left_distance: LegoSensor::open(root, distance_ports.0, MODE_US_DIST_CM)?,
            right_distance: LegoSensor::open(root, distance_ports.1, MODE_US_DIST_CM)?,
            left_reflectance: LegoSensor::open(root, reflectance_ports.0, MODE_COL_REFLECT)?,
            right_reflectance: LegoSensor::open(root, reflectance_ports.1, MODE_COL_REFLECT)?,
            contact: contact_port
                .map(|port| LegoSensor::open(root, port, MODE_TOUCH))
                .transpose()?,
        })
    }
}

impl SensorDriver for Ev3Sensors {
    fn name(&self) -> &'static str {
        "ev3dev"
    }

    fn read_distance(&mut self, side: Side) -> Result<Option<f64>, DriverError> {
        let sensor = match side {
            Side::Left => &self.left_distance,
            Side::Right => &self.right_distance,
        };
        // No echo reads as 255.0; range filtering happens in perception.
        Ok(Some(sensor.value()?))
    }

    fn read_reflectance(&mut self, side: Side) -> Result<f64, DriverError> {
        let sensor = match side {
            Side::Left => &self.left_reflectance,
            Side::Right => &self.right_reflectance,
        };
        Ok(sensor.value()?)
    }

    fn is_contact_pressed(&mut self) -> Result<Option<bool>, DriverError> {
        match &self.contact {
            Some(sensor) => Ok(Some(sensor.value()? != 0.0)),
            None => Ok(None),
        }
    }
}
