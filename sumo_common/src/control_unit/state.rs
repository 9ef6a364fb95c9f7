//! Control-loop data model: robot state, perception snapshot, motor command
//! and the per-tick event handed to the tick logger.

use crate::consts::{MOTOR_SPEED_MAX, MOTOR_SPEED_MIN};
use crate::hal::types::Side;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::time::Duration;

// ─── Robot State ────────────────────────────────────────────────────

/// Behavior state of the robot. Exactly one is active at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RobotState {
    /// Spinning in place looking for the opponent.
    #[default]
    Search,
    /// Turning to face a detected opponent.
    Lockon,
    /// Closing distance under PID steering.
    Approach,
    /// Full-force push.
    Push,
    /// Executing a scripted escape. Only held for the duration of the
    /// maneuver inside a single tick.
    Recover,
}

impl RobotState {
    /// Upper-case name used in logs and CSV output.
    pub const fn as_str(self) -> &'static str {
        match self {
            RobotState::Search => "SEARCH",
            RobotState::Lockon => "LOCKON",
            RobotState::Approach => "APPROACH",
            RobotState::Push => "PUSH",
            RobotState::Recover => "RECOVER",
        }
    }
}

impl fmt::Display for RobotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which scripted maneuver ran during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManeuverKind {
    /// Reverse and rotate away from the ring edge.
    EdgeEscape,
    /// Back off and rotate after a push timed out.
    StallBackoff,
    /// Short forward move to get a better sensor angle.
    ReacquireNudge,
}

impl fmt::Display for ManeuverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManeuverKind::EdgeEscape => f.write_str("edge_escape"),
            ManeuverKind::StallBackoff => f.write_str("stall_backoff"),
            ManeuverKind::ReacquireNudge => f.write_str("reacquire_nudge"),
        }
    }
}

// ─── Perception Snapshot ────────────────────────────────────────────

/// All sensor readings of one tick, captured once and read by every
/// decision made in that tick.
///
/// A distance of `Some(0.0)` is a valid close-range reading; only `None`
/// means "no object".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerceptionSnapshot {
    /// Left ultrasonic distance [cm].
    pub left_distance: Option<f64>,
    /// Right ultrasonic distance [cm].
    pub right_distance: Option<f64>,
    /// Mean of left and right; present only when both are.
    pub center_distance: Option<f64>,
    /// Left surface reflectance [0, 100].
    pub left_reflectance: f64,
    /// Right surface reflectance [0, 100].
    pub right_reflectance: f64,
    /// Bumper state; `None` when no contact sensor is fitted.
    pub contact: Option<bool>,
}

impl PerceptionSnapshot {
    /// Build a snapshot, deriving the center distance.
    pub fn new(
        left_distance: Option<f64>,
        right_distance: Option<f64>,
        left_reflectance: f64,
        right_reflectance: f64,
        contact: Option<bool>,
    ) -> Self {
        let center_distance = match (left_distance, right_distance) {
            (Some(l), Some(r)) => Some((l + r) / 2.0),
            _ => None,
        };
        Self {
            left_distance,
            right_distance,
            center_distance,
            left_reflectance,
            right_reflectance,
            contact,
        }
    }

    /// Both distances, if both are present.
    #[inline]
    pub fn both_distances(&self) -> Option<(f64, f64)> {
        self.left_distance.zip(self.right_distance)
    }

    /// Distance on one side.
    #[inline]
    pub fn distance(&self, side: Side) -> Option<f64> {
        match side {
            Side::Left => self.left_distance,
            Side::Right => self.right_distance,
        }
    }

    /// Reflectance on one side.
    #[inline]
    pub fn reflectance(&self, side: Side) -> f64 {
        match side {
            Side::Left => self.left_reflectance,
            Side::Right => self.right_reflectance,
        }
    }

    /// Whether the contact sensor is fitted and pressed.
    #[inline]
    pub fn contact_pressed(&self) -> bool {
        self.contact == Some(true)
    }
}

// ─── Motor Command ──────────────────────────────────────────────────

/// Clamp a speed into [-100, 100]. NaN maps to 0.
#[inline]
pub fn clamp_speed(speed: f64) -> f64 {
    if speed.is_nan() {
        0.0
    } else {
        speed.clamp(MOTOR_SPEED_MIN, MOTOR_SPEED_MAX)
    }
}

/// Left/right motor speeds [% of max]. Always within [-100, 100].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MotorCommand {
    /// Left motor speed.
    pub left: f64,
    /// Right motor speed.
    pub right: f64,
}

impl MotorCommand {
    /// Both motors stopped.
    pub const STOP: Self = Self {
        left: 0.0,
        right: 0.0,
    };

    /// Build a command, clamping each side independently.
    #[inline]
    pub fn new(left: f64, right: f64) -> Self {
        Self {
            left: clamp_speed(left),
            right: clamp_speed(right),
        }
    }

    /// Same speed on both sides.
    #[inline]
    pub fn straight(speed: f64) -> Self {
        Self::new(speed, speed)
    }

    /// Turn in place: left forward, right backward for positive `speed`
    /// (clockwise seen from above).
    #[inline]
    pub fn spin(speed: f64) -> Self {
        Self::new(speed, -speed)
    }
}

// ─── Tick Event ─────────────────────────────────────────────────────

/// Everything that happened in one tick, handed to the tick logger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TickEvent {
    /// Tick sequence number, starting at 0.
    pub tick: u64,
    /// Tick start on the control clock [s since the run epoch].
    #[serde(serialize_with = "serialize_secs")]
    pub timestamp: Duration,
    /// State at the end of the tick.
    pub state: RobotState,
    /// Readings the tick decided on.
    pub snapshot: PerceptionSnapshot,
    /// Steering error fed to the PID (0 when not approaching).
    pub error: f64,
    /// PID output (0 when not approaching).
    pub pid_output: f64,
    /// Motor command in effect at the end of the tick.
    pub command: MotorCommand,
    /// Scripted maneuver executed during the tick, if any.
    pub maneuver: Option<ManeuverKind>,
}

fn serialize_secs<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_requires_both_sides() {
        let snap = PerceptionSnapshot::new(Some(10.0), None, 5.0, 5.0, None);
        assert_eq!(snap.center_distance, None);
        assert_eq!(snap.both_distances(), None);

        let snap = PerceptionSnapshot::new(Some(10.0), Some(20.0), 5.0, 5.0, None);
        assert_eq!(snap.center_distance, Some(15.0));
        assert_eq!(snap.both_distances(), Some((10.0, 20.0)));
    }

    #[test]
    fn zero_distance_is_present() {
        let snap = PerceptionSnapshot::new(Some(0.0), Some(0.0), 5.0, 5.0, None);
        assert_eq!(snap.center_distance, Some(0.0));
        assert_eq!(snap.distance(Side::Left), Some(0.0));
    }

    #[test]
    fn contact_pressed_only_when_fitted_and_true() {
        let mut snap = PerceptionSnapshot::default();
        assert!(!snap.contact_pressed());
        snap.contact = Some(false);
        assert!(!snap.contact_pressed());
        snap.contact = Some(true);
        assert!(snap.contact_pressed());
    }

    #[test]
    fn motor_command_clamps_each_side() {
        let cmd = MotorCommand::new(150.0, -300.0);
        assert_eq!(cmd, MotorCommand::new(100.0, -100.0));
        let cmd = MotorCommand::new(f64::NAN, 42.0);
        assert_eq!(cmd.left, 0.0);
        assert_eq!(cmd.right, 42.0);
    }

    #[test]
    fn spin_is_clockwise_for_positive_speed() {
        let cmd = MotorCommand::spin(20.0);
        assert_eq!(cmd.left, 20.0);
        assert_eq!(cmd.right, -20.0);
    }

    #[test]
    fn robot_state_names() {
        assert_eq!(RobotState::Lockon.to_string(), "LOCKON");
        assert_eq!(RobotState::default(), RobotState::Search);
    }

    #[test]
    fn tick_event_serializes_timestamp_as_seconds() {
        let event = TickEvent {
            tick: 3,
            timestamp: Duration::from_millis(1500),
            state: RobotState::Push,
            snapshot: PerceptionSnapshot::new(Some(4.0), None, 5.0, 6.0, None),
            error: 0.0,
            pid_output: 0.0,
            command: MotorCommand::straight(85.0),
            maneuver: Some(ManeuverKind::StallBackoff),
        };
        let json = serde_json::to_value(event).unwrap();
        assert_eq!(json["timestamp"], 1.5);
        assert_eq!(json["state"], "PUSH");
        assert_eq!(json["maneuver"], "stall_backoff");
        assert!(json["snapshot"]["right_distance"].is_null());
    }
}
