//! System-wide constants for the sumo workspace.
//!
//! Single source of truth for numeric limits and default values. The defaults
//! match the reference EV3 build: two ultrasonic sensors on the front corners,
//! two color sensors in reflect mode, two large motors in a tank layout.

/// Lower bound of a motor speed command [% of max].
pub const MOTOR_SPEED_MIN: f64 = -100.0;

/// Upper bound of a motor speed command [% of max].
pub const MOTOR_SPEED_MAX: f64 = 100.0;

/// Lower bound of a reflectance reading.
pub const REFLECTANCE_MIN: f64 = 0.0;

/// Upper bound of a reflectance reading. Also the fail-safe value substituted
/// for a failed read (full white trips the edge monitor).
pub const REFLECTANCE_MAX: f64 = 100.0;

/// Default control tick interval [s] (50 Hz).
pub const TICK_INTERVAL_S: f64 = 0.02;

/// Longest accepted timing value [s].
pub const TIMING_MAX_S: f64 = 3600.0;

/// PID time step used on the first `compute` after a reset [s].
pub const PID_DEFAULT_DT_S: f64 = 0.01;

/// Floor applied to the measured PID time step [s].
pub const PID_MIN_DT_S: f64 = 0.001;

/// Ultrasonic reading reported when there is no echo [cm].
pub const DISTANCE_MAX_RANGE_CM: f64 = 255.0;

/// Default service name.
pub const DEFAULT_SERVICE_NAME: &str = "sumo";

/// Default tick log location on the brick.
pub const DEFAULT_TICK_LOG_PATH: &str = "/home/robot/logs/sumo_test_log.csv";

/// Default sysfs mount point.
pub const DEFAULT_SYSFS_ROOT: &str = "/sys";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_consistent() {
        assert!(MOTOR_SPEED_MIN < 0.0 && MOTOR_SPEED_MAX > 0.0);
        assert_eq!(MOTOR_SPEED_MIN, -MOTOR_SPEED_MAX);
        assert!(REFLECTANCE_MIN < REFLECTANCE_MAX);
        assert!(PID_MIN_DT_S > 0.0);
        assert!(PID_DEFAULT_DT_S >= PID_MIN_DT_S);
        assert!(TICK_INTERVAL_S > 0.0);
        assert!(TIMING_MAX_S > TICK_INTERVAL_S);
    }
}
