//! Driver backend and port configuration.
//!
//! # TOML Example
//!
//! ```toml
//! [hal]
//! driver = "ev3dev"
//! left_motor = "outB"
//! right_motor = "outC"
//! left_distance = "in3"
//! right_distance = "in4"
//! left_reflectance = "in1"
//! right_reflectance = "in2"
//! # contact = "in4"
//! ```

use crate::config::ConfigError;
use crate::consts::DEFAULT_SYSFS_ROOT;
use serde::{Deserialize, Serialize};

/// Backend selection, port wiring and simulator parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HalConfig {
    /// Registered driver name ("simulation", "ev3dev").
    pub driver: String,
    /// Left drive motor port.
    pub left_motor: String,
    /// Right drive motor port.
    pub right_motor: String,
    /// Left ultrasonic sensor port.
    pub left_distance: String,
    /// Right ultrasonic sensor port.
    pub right_distance: String,
    /// Left color sensor port.
    pub left_reflectance: String,
    /// Right color sensor port.
    pub right_reflectance: String,
    /// Touch sensor port; `None` when no bumper is fitted.
    pub contact: Option<String>,
    /// Mount point of sysfs (overridable for tests).
    pub sysfs_root: String,
    /// Simulator parameters (only read by the `simulation` driver).
    pub simulation: SimulationConfig,
}

impl Default for HalConfig {
    fn default() -> Self {
        Self {
            driver: "simulation".to_string(),
            left_motor: "outB".to_string(),
            right_motor: "outC".to_string(),
            left_distance: "in3".to_string(),
            right_distance: "in4".to_string(),
            left_reflectance: "in1".to_string(),
            right_reflectance: "in2".to_string(),
            contact: None,
            sysfs_root: DEFAULT_SYSFS_ROOT.to_string(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl HalConfig {
    /// Validate port wiring.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if:
    /// - `driver` is empty
    /// - any port is empty
    /// - two devices share a port
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.driver.is_empty() {
            return Err(ConfigError::ValidationError(
                "hal.driver cannot be empty".to_string(),
            ));
        }

        let mut ports: Vec<(&str, &str)> = vec![
            ("left_motor", self.left_motor.as_str()),
            ("right_motor", self.right_motor.as_str()),
            ("left_distance", self.left_distance.as_str()),
            ("right_distance", self.right_distance.as_str()),
            ("left_reflectance", self.left_reflectance.as_str()),
            ("right_reflectance", self.right_reflectance.as_str()),
        ];
        if let Some(contact) = &self.contact {
            ports.push(("contact", contact.as_str()));
        }

        for (i, (name, port)) in ports.iter().enumerate() {
            if port.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "hal.{name} cannot be empty"
                )));
            }
            if let Some((other, _)) = ports[..i].iter().find(|(_, p)| p == port) {
                return Err(ConfigError::ValidationError(format!(
                    "hal.{name} and hal.{other} both use port {port}"
                )));
            }
        }

        self.simulation.validate()
    }
}

/// Geometry and dynamics of the simulated ring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Ring radius to the outer edge of the white border [cm].
    pub ring_radius_cm: f64,
    /// Width of the white border [cm].
    pub border_width_cm: f64,
    /// Robot body radius [cm].
    pub robot_radius_cm: f64,
    /// Distance between the wheels [cm].
    pub wheel_base_cm: f64,
    /// Wheel surface speed at 100 % [cm/s].
    pub max_wheel_speed_cm_s: f64,
    /// Robot start position [cm], ring center is the origin.
    pub robot_start: [f64; 2],
    /// Robot start heading [deg], 0 = +x, counter-clockwise positive.
    pub robot_heading_deg: f64,
    /// Opponent body radius [cm].
    pub opponent_radius_cm: f64,
    /// Opponent start position [cm].
    pub opponent_start: [f64; 2],
    /// Half-angle of the ultrasonic cone [deg].
    pub sonar_half_angle_deg: f64,
    /// Reflectance of the black ring surface.
    pub black_reflectance: f64,
    /// Reflectance of the white border.
    pub white_reflectance: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            ring_radius_cm: 38.5,
            border_width_cm: 2.5,
            robot_radius_cm: 7.0,
            wheel_base_cm: 12.0,
            max_wheel_speed_cm_s: 30.0,
            robot_start: [-15.0, 0.0],
            robot_heading_deg: 90.0,
            opponent_radius_cm: 7.5,
            opponent_start: [15.0, 0.0],
            sonar_half_angle_deg: 15.0,
            black_reflectance: 6.0,
            white_reflectance: 60.0,
        }
    }
}

impl SimulationConfig {
    /// Validate simulator geometry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("ring_radius_cm", self.ring_radius_cm),
            ("border_width_cm", self.border_width_cm),
            ("robot_radius_cm", self.robot_radius_cm),
            ("wheel_base_cm", self.wheel_base_cm),
            ("max_wheel_speed_cm_s", self.max_wheel_speed_cm_s),
            ("opponent_radius_cm", self.opponent_radius_cm),
            ("sonar_half_angle_deg", self.sonar_half_angle_deg),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::ValidationError(format!(
                    "hal.simulation.{name} must be finite and > 0, got {value}"
                )));
            }
        }
        if self.border_width_cm >= self.ring_radius_cm {
            return Err(ConfigError::ValidationError(format!(
                "hal.simulation.border_width_cm {} must be smaller than ring_radius_cm {}",
                self.border_width_cm, self.ring_radius_cm
            )));
        }
        Ok(())
    }
}
