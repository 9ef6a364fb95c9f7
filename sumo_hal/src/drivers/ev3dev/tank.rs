//! Tank drive on two `tacho-motor` devices.

use std::path::Path;
use std::thread;
use std::time::Duration;

use sumo_common::consts::MOTOR_SPEED_MAX;
use sumo_common::hal::driver::{ActuatorDriver, DriverError};
use tracing::debug;

use super::sysfs::{Device, SysfsResult};

/// One large motor.
#[derive(Debug, Clone)]
pub struct TachoMotor {
    device: Device,
    port: String,
    /// Counts per second at 100 %.
    max_speed: i64,
}

impl TachoMotor {
    /// Locate the motor on `port`, set brake-on-stop.
    pub fn open(root: &Path, port: &str) -> SysfsResult<Self> {
        let device = Device::find(root, "tacho-motor", port)?;
        let max_speed = device.read_i64("max_speed")?;
        device.write("stop_action", "brake")?;
        debug!("Motor {port}: max_speed {max_speed}");
        Ok(Self {
            device,
            port: port.to_string(),
            max_speed,
        })
    }

    /// Port the motor is plugged into.
    pub fn port(&self) -> &str {
        &self.port
    }

    /// `speed_sp` for a percent command.
    pub fn speed_sp(&self, percent: f64) -> i64 {
        let percent = if percent.is_finite() {
            percent.clamp(-MOTOR_SPEED_MAX, MOTOR_SPEED_MAX)
        } else {
            0.0
        };
        (percent / MOTOR_SPEED_MAX * self.max_speed as f64).round() as i64
    }

    /// Run at `percent` until told otherwise.
    pub fn run_forever(&self, percent: f64) -> SysfsResult<()> {
        self.device.write("speed_sp", self.speed_sp(percent))?;
        self.device.write("command", "run-forever")
    }

    /// Run at `percent` for `duration`; the motor stops itself.
    pub fn run_timed(&self, percent: f64, duration: Duration) -> SysfsResult<()> {
        self.device.write("speed_sp", self.speed_sp(percent))?;
        self.device.write("time_sp", duration.as_millis())?;
        self.device.write("command", "run-timed")
    }

    /// Stop using the configured stop action.
    pub fn stop(&self) -> SysfsResult<()> {
        self.device.write("command", "stop")
    }
}

/// Left and right drive motors.
#[derive(Debug)]
pub struct Ev3Tank {
    left: TachoMotor,
    right: TachoMotor,
}

impl Ev3Tank {
    /// Open both motors.
    pub fn open(root: &Path, left_port: &str, right_port: &str) -> SysfsResult<Self> {
        Ok(Self {
            left: TachoMotor::open(root, left_port)?,
            right: TachoMotor::open(root, right_port)?,
        })
    }
}

impl ActuatorDriver for Ev3Tank {
    fn name(&self) -> &'static str {
        "ev3dev"
    }

    fn set_speeds(&mut self, left: f64, right: f64) -> Result<(), DriverError> {
        self.left.run_forever(left)?;
        self.right.run_forever(right)?;
        Ok(())
    }

    fn run_for(&mut self, left: f64, right: f64, duration: Duration) -> Result<(), DriverError> {
        self.left.run_timed(left, duration)?;
        self.right.run_timed(right, duration)?;
        thread::sleep(duration);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), DriverError> {
        // Try both even if the first fails.
        let left = self.left.stop();
        let right = self.right.stop();
        left?;
        right?;
        Ok(())
    }
}
