//! Scripted blocking maneuvers.
//!
//! A maneuver is a short fixed list of timed motor segments, executed to
//! completion inside one tick:
//!
//! ```text
//! stop → run_for(seg 0) → stop → run_for(seg 1) → stop …
//! ```
//!
//! There is no cancellation; the next sensor sample happens only after the
//! last segment has stopped.

use std::time::Duration;

use sumo_common::control_unit::config::{SpeedConfig, TimingConfig};
use sumo_common::control_unit::state::{ManeuverKind, MotorCommand};
use sumo_common::hal::driver::{ActuatorDriver, DriverError};
use sumo_common::hal::types::Side;
use tracing::debug;

/// Upper bound on segments per maneuver.
pub const MAX_SEGMENTS: usize = 4;

/// One timed motor command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Left motor [%].
    pub left: f64,
    /// Right motor [%].
    pub right: f64,
    /// Run time.
    pub duration: Duration,
}

impl Segment {
    /// Both motors at `speed`.
    pub fn straight(speed: f64, duration: Duration) -> Self {
        Self::from_command(MotorCommand::straight(speed), duration)
    }

    /// Turn in place toward `side`.
    pub fn turn(side: Side, speed: f64, duration: Duration) -> Self {
        let command = match side {
            Side::Right => MotorCommand::spin(speed),
            Side::Left => MotorCommand::spin(-speed),
        };
        Self::from_command(command, duration)
    }

    fn from_command(command: MotorCommand, duration: Duration) -> Self {
        Self {
            left: command.left,
            right: command.right,
            duration,
        }
    }
}

/// A scripted sequence of segments.
#[derive(Debug, Clone, PartialEq)]
pub struct Maneuver {
    kind: ManeuverKind,
    segments: heapless::Vec<Segment, MAX_SEGMENTS>,
}

impl Maneuver {
    /// Build a maneuver; segments past [`MAX_SEGMENTS`] are dropped.
    pub fn new(kind: ManeuverKind, segments: &[Segment]) -> Self {
        let mut list = heapless::Vec::new();
        for segment in segments.iter().take(MAX_SEGMENTS) {
            let _ = list.push(*segment);
        }
        Self {
            kind,
            segments: list,
        }
    }

    /// Which maneuver this is.
    #[inline]
    pub fn kind(&self) -> ManeuverKind {
        self.kind
    }

    /// Segments in execution order.
    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Sum of all segment durations.
    pub fn total_duration(&self) -> Duration {
        self.segments.iter().map(|s| s.duration).sum()
    }

    /// Run every segment to completion.
    ///
    /// Stops first, then `run_for` + `stop` per segment. The first actuator
    /// error aborts the rest of the sequence.
    pub fn execute<A: ActuatorDriver + ?Sized>(&self, actuators: &mut A) -> Result<(), DriverError> {
        actuators.stop()?;
        for (i, segment) in self.segments.iter().enumerate() {
            debug!(
                "{} segment {}: ({:.0}, {:.0}) for {} ms",
                self.kind,
                i,
                segment.left,
                segment.right,
                segment.duration.as_millis()
            );
            actuators.run_for(segment.left, segment.right, segment.duration)?;
            actuators.stop()?;
        }
        Ok(())
    }
}

/// Speeds and durations of every scripted maneuver.
#[derive(Debug, Clone, PartialEq)]
pub struct ManeuverPlan {
    rotate_speed: f64,
    edge_reverse: f64,
    stall_reverse: f64,
    nudge_speed: f64,
    edge_backup: Duration,
    rotate: Duration,
    stall_backup: Duration,
    nudge: Duration,
}

impl ManeuverPlan {
    /// Build from the `[speeds]` and `[timing]` sections.
    pub fn new(speeds: &SpeedConfig, timing: &TimingConfig) -> Self {
        Self {
            rotate_speed: speeds.rotate,
            edge_reverse: speeds.edge_reverse,
            stall_reverse: speeds.stall_reverse,
            nudge_speed: speeds.nudge,
            edge_backup: TimingConfig::duration(timing.edge_backup),
            rotate: TimingConfig::duration(timing.edge_rotate),
            stall_backup: TimingConfig::duration(timing.stall_backup),
            nudge: TimingConfig::duration(timing.nudge),
        }
    }

    /// Reverse, then rotate toward `turn` (away from the edge).
    pub fn edge_escape(&self, turn: Side) -> Maneuver {
        Maneuver::new(
            ManeuverKind::EdgeEscape,
            &[
                Segment::straight(self.edge_reverse, self.edge_backup),
                Segment::turn(turn, self.rotate_speed, self.rotate),
            ],
        )
    }

    /// Back off, then the default clockwise rotate.
    pub fn stall_backoff(&self) -> Maneuver {
        Maneuver::new(
            ManeuverKind::StallBackoff,
            &[
                Segment::straight(self.stall_reverse, self.stall_backup),
                Segment::turn(Side::Right, self.rotate_speed, self.rotate),
            ],
        )
    }

    /// Short forward move to change the sensor angle.
    pub fn reacquire_nudge(&self) -> Maneuver {
        Maneuver::new(
            ManeuverKind::ReacquireNudge,
            &[Segment::straight(self.nudge_speed, self.nudge)],
        )
    }
}

impl Default for ManeuverPlan {
    fn default() -> Self {
        Self::new(&SpeedConfig::default(), &TimingConfig::default())
    }
}
