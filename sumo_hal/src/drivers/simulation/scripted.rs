//! Scripted sensors and recording actuators.
//!
//! Deterministic doubles for exercising the control loop tick by tick:
//! [`ScriptedSensors`] replays a list of [`SensorFrame`]s and
//! [`RecordingActuators`] keeps every command it receives.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use sumo_common::clock::ManualClock;
use sumo_common::hal::driver::{ActuatorDriver, DriverError, SensorDriver};
use sumo_common::hal::types::Side;

/// Floor value of a frame that does not set one (black ring surface).
const DEFAULT_FLOOR: f64 = 5.0;

/// Raw readings for one sample.
///
/// Every channel is a `Result` so a frame can inject driver failures.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorFrame {
    /// Left ultrasonic.
    pub left_distance: Result<Option<f64>, DriverError>,
    /// Right ultrasonic.
    pub right_distance: Result<Option<f64>, DriverError>,
    /// Left color sensor.
    pub left_reflectance: Result<f64, DriverError>,
    /// Right color sensor.
    pub right_reflectance: Result<f64, DriverError>,
    /// Bumper.
    pub contact: Result<Option<bool>, DriverError>,
}

impl Default for SensorFrame {
    fn default() -> Self {
        Self {
            left_distance: Ok(None),
            right_distance: Ok(None),
            left_reflectance: Ok(DEFAULT_FLOOR),
            right_reflectance: Ok(DEFAULT_FLOOR),
            contact: Ok(None),
        }
    }
}

impl SensorFrame {
    /// Frame with the given distances and reflectances.
    pub fn new(
        left_distance: Option<f64>,
        right_distance: Option<f64>,
        left_reflectance: f64,
        right_reflectance: f64,
    ) -> Self {
        Self {
            left_distance: Ok(left_distance),
            right_distance: Ok(right_distance),
            left_reflectance: Ok(left_reflectance),
            right_reflectance: Ok(right_reflectance),
            contact: Ok(None),
        }
    }

    /// Opponent seen at the given distances, black floor.
    pub fn seen(left: f64, right: f64) -> Self {
        Self::new(Some(left), Some(right), DEFAULT_FLOOR, DEFAULT_FLOOR)
    }

    /// Nothing in range, black floor.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Replace the floor readings.
    pub fn with_floor(mut self, left: f64, right: f64) -> Self {
        self.left_reflectance = Ok(left);
        self.right_reflectance = Ok(right);
        self
    }

    /// Report a bumper state.
    pub fn with_contact(mut self, pressed: bool) -> Self {
        self.contact = Ok(Some(pressed));
        self
    }

    /// Make the ultrasonic on `side` fail.
    pub fn with_distance_error(mut self, side: Side) -> Self {
        let err = Err(DriverError::Communication(format!("{side} ultrasonic offline")));
        match side {
            Side::Left => self.left_distance = err,
            Side::Right => self.right_distance = err,
        }
        self
    }

    /// Make the color sensor on `side` fail.
    pub fn with_reflectance_error(mut self, side: Side) -> Self {
        let err = Err(DriverError::Communication(format!("{side} color sensor offline")));
        match side {
            Side::Left => self.left_reflectance = err,
            Side::Right => self.right_reflectance = err,
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    LeftDistance = 0,
    RightDistance = 1,
    LeftReflectance = 2,
    RightReflectance = 3,
    Contact = 4,
}

/// Sensor double replaying [`SensorFrame`]s.
///
/// A frame stays current until one of its channels is read a second time;
/// that read moves to the next frame. The last frame repeats forever, and
/// an empty script reads as [`SensorFrame::empty`].
#[derive(Debug, Clone)]
pub struct ScriptedSensors {
    pending: VecDeque<SensorFrame>,
    current: SensorFrame,
    read_mask: u8,
    frames_started: usize,
}

impl ScriptedSensors {
    /// Replay `frames` in order.
    pub fn new(frames: Vec<SensorFrame>) -> Self {
        let mut pending: VecDeque<SensorFrame> = frames.into();
        let current = pending.pop_front().unwrap_or_default();
        Self {
            pending,
            current,
            read_mask: 0,
            frames_started: 0,
        }
    }

    /// Repeat one frame forever.
    pub fn constant(frame: SensorFrame) -> Self {
        Self::new(vec![frame])
    }

    /// Frames sampled so far, including the current one.
    pub fn frames_started(&self) -> usize {
        self.frames_started
    }

    fn frame_for(&mut self, channel: Channel) -> &SensorFrame {
        let bit = 1u8 << channel as u8;
        if self.read_mask == 0 {
            self.frames_started += 1;
        } else if self.read_mask & bit != 0 {
            if let Some(next) = self.pending.pop_front() {
                self.current = next;
            }
            self.read_mask = 0;
            self.frames_started += 1;
        }
        self.read_mask |= bit;
        &self.current
    }
}

impl SensorDriver for ScriptedSensors {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn read_distance(&mut self, side: Side) -> Result<Option<f64>, DriverError> {
        match side {
            Side::Left => self.frame_for(Channel::LeftDistance).left_distance.clone(),
            Side::Right => self.frame_for(Channel::RightDistance).right_distance.clone(),
        }
    }

    fn read_reflectance(&mut self, side: Side) -> Result<f64, DriverError> {
        match side {
            Side::Left => self.frame_for(Channel::LeftReflectance).left_reflectance.clone(),
            Side::Right => self
                .frame_for(Channel::RightReflectance)
                .right_reflectance
                .clone(),
        }
    }

    fn is_contact_pressed(&mut self) -> Result<Option<bool>, DriverError> {
        self.frame_for(Channel::Contact).contact.clone()
    }
}

/// One command received by [`RecordingActuators`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActuatorCall {
    /// `set_speeds(left, right)`.
    SetSpeeds {
        /// Left motor [%].
        left: f64,
        /// Right motor [%].
        right: f64,
    },
    /// `run_for(left, right, duration)`.
    RunFor {
        /// Left motor [%].
        left: f64,
        /// Right motor [%].
        right: f64,
        /// Requested run time.
        duration: Duration,
    },
    /// `stop()`.
    Stop,
}

/// Shared view of the commands a [`RecordingActuators`] has received.
#[derive(Debug, Clone, Default)]
pub struct ActuatorLog {
    calls: Rc<RefCell<Vec<ActuatorCall>>>,
}

impl ActuatorLog {
    /// Snapshot of all calls so far.
    pub fn calls(&self) -> Vec<ActuatorCall> {
        self.calls.borrow().clone()
    }

    /// Most recent call.
    pub fn last(&self) -> Option<ActuatorCall> {
        self.calls.borrow().last().copied()
    }

    /// Number of calls so far.
    pub fn len(&self) -> usize {
        self.calls.borrow().len()
    }

    /// No calls yet.
    pub fn is_empty(&self) -> bool {
        self.calls.borrow().is_empty()
    }

    /// Forget recorded calls.
    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    fn push(&self, call: ActuatorCall) {
        self.calls.borrow_mut().push(call);
    }
}

/// Actuator double that records commands.
///
/// `run_for` advances the shared [`ManualClock`] by its duration, as a real
/// blocking maneuver would.
#[derive(Debug, Clone)]
pub struct RecordingActuators {
    clock: ManualClock,
    log: ActuatorLog,
    /// Drive commands accepted before failures start.
    fail_after: Option<usize>,
    drive_commands: usize,
    fail_stop: bool,
}

impl RecordingActuators {
    /// Record against `clock`.
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            log: ActuatorLog::default(),
            fail_after: None,
            drive_commands: 0,
            fail_stop: false,
        }
    }

    /// Fail every `set_speeds`/`run_for` after the first `n`.
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    /// Make `stop` fail (the call is still recorded).
    pub fn with_failing_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }

    /// Handle on the recorded calls.
    pub fn log(&self) -> ActuatorLog {
        self.log.clone()
    }

    fn check_drive(&mut self) -> Result<(), DriverError> {
        if self.fail_after.is_some_and(|limit| self.drive_commands >= limit) {
            return Err(DriverError::Communication("motor port disconnected".to_string()));
        }
        self.drive_commands += 1;
        Ok(())
    }
}

impl ActuatorDriver for RecordingActuators {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn set_speeds(&mut self, left: f64, right: f64) -> Result<(), DriverError> {
        self.check_drive()?;
        self.log.push(ActuatorCall::SetSpeeds { left, right });
        Ok(())
    }

    fn run_for(&mut self, left: f64, right: f64, duration: Duration) -> Result<(), DriverError> {
        self.check_drive()?;
        self.log.push(ActuatorCall::RunFor {
            left,
            right,
            duration,
        });
        self.clock.advance(duration);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), DriverError> {
        self.log.push(ActuatorCall::Stop);
        if self.fail_stop {
            return Err(DriverError::Communication("stop not acknowledged".to_string()));
        }
        Ok(())
    }
}
