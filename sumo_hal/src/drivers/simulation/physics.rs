//! Ring physics simulator.
//!
//! The `ArenaSimulator` models a circular ring (black surface, white border),
//! a differential-drive robot and one passive opponent:
//! - Robot: unicycle kinematics from left/right wheel speeds
//! - Opponent: a disc that is shoved out of any overlap with the robot
//! - Ultrasonic sensors: forward cones on the front corners
//! - Color sensors: floor reflectance under two front points
//!
//! Coordinates are centimeters with the ring center at the origin; headings
//! are radians, counter-clockwise positive.

use std::f64::consts::PI;
use std::time::Duration;

use sumo_common::consts::{DISTANCE_MAX_RANGE_CM, MOTOR_SPEED_MAX};
use sumo_common::hal::config::SimulationConfig;
use sumo_common::hal::types::Side;
use tracing::{debug, trace};

/// Integration step upper bound.
const MAX_STEP: Duration = Duration::from_millis(5);

/// Lateral offset of each sensor from the robot centerline [cm].
const SENSOR_LATERAL_CM: f64 = 4.0;

/// Forward offset of the ultrasonic sensors, as a fraction of the body radius.
const SONAR_FORWARD_RATIO: f64 = 0.8;

/// Planar pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// X position [cm].
    pub x: f64,
    /// Y position [cm].
    pub y: f64,
    /// Heading [rad].
    pub heading: f64,
}

impl Pose {
    /// Point at `forward` ahead and `lateral` to the left of this pose.
    fn offset(&self, forward: f64, lateral: f64) -> (f64, f64) {
        let (sin, cos) = self.heading.sin_cos();
        (
            self.x + forward * cos - lateral * sin,
            self.y + forward * sin + lateral * cos,
        )
    }
}

fn side_sign(side: Side) -> f64 {
    match side {
        Side::Left => 1.0,
        Side::Right => -1.0,
    }
}

fn wrap_angle(a: f64) -> f64 {
    let mut a = a % (2.0 * PI);
    if a > PI {
        a -= 2.0 * PI;
    } else if a < -PI {
        a += 2.0 * PI;
    }
    a
}

/// Simulated ring with one robot and one opponent.
#[derive(Debug, Clone)]
pub struct ArenaSimulator {
    config: SimulationConfig,
    robot: Pose,
    opponent: (f64, f64),
    /// Current wheel commands [%].
    speeds: (f64, f64),
    /// Simulated time already integrated.
    elapsed: Duration,
}

impl ArenaSimulator {
    /// Create an arena in the configured start positions.
    pub fn new(config: SimulationConfig) -> Self {
        let robot = Pose {
            x: config.robot_start[0],
            y: config.robot_start[1],
            heading: config.robot_heading_deg.to_radians(),
        };
        let opponent = (config.opponent_start[0], config.opponent_start[1]);
        debug!(
            "Arena: ring r={} cm, robot at ({:.1}, {:.1}) heading {:.0} deg, opponent at ({:.1}, {:.1})",
            config.ring_radius_cm,
            robot.x,
            robot.y,
            config.robot_heading_deg,
            opponent.0,
            opponent.1
        );
        Self {
            config,
            robot,
            opponent,
            speeds: (0.0, 0.0),
            elapsed: Duration::ZERO,
        }
    }

    /// Robot pose.
    pub fn robot(&self) -> Pose {
        self.robot
    }

    /// Opponent center.
    pub fn opponent(&self) -> (f64, f64) {
        self.opponent
    }

    /// Wheel commands currently applied.
    pub fn speeds(&self) -> (f64, f64) {
        self.speeds
    }

    /// Simulated time integrated so far.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Whether the opponent's center has left the ring.
    pub fn opponent_out(&self) -> bool {
        self.opponent.0.hypot(self.opponent.1) > self.config.ring_radius_cm
    }

    /// Whether the robot's center has left the ring.
    pub fn robot_out(&self) -> bool {
        self.robot.x.hypot(self.robot.y) > self.config.ring_radius_cm
    }

    /// Center distance at which robot and opponent touch [cm].
    pub fn contact_distance(&self) -> f64 {
        self.config.robot_radius_cm + self.config.opponent_radius_cm
    }

    /// Change the wheel commands from now on.
    pub fn set_speeds(&mut self, left: f64, right: f64) {
        self.speeds = (
            left.clamp(-MOTOR_SPEED_MAX, MOTOR_SPEED_MAX),
            right.clamp(-MOTOR_SPEED_MAX, MOTOR_SPEED_MAX),
        );
    }

    /// Integrate motion up to absolute simulated time `t`.
    pub fn advance_to(&mut self, t: Duration) {
        while self.elapsed < t {
            let step = (t - self.elapsed).min(MAX_STEP);
            self.step(step.as_secs_f64());
            self.elapsed += step;
        }
    }

    fn step(&mut self, dt: f64) {
        let scale = self.config.max_wheel_speed_cm_s / MOTOR_SPEED_MAX;
        let v_left = self.speeds.0 * scale;
        let v_right = self.speeds.1 * scale;
        let v = (v_left + v_right) / 2.0;
        let omega = (v_right - v_left) / self.config.wheel_base_cm;

        // Midpoint heading for the translation.
        let mid = self.robot.heading + omega * dt / 2.0;
        self.robot.x += v * mid.cos() * dt;
        self.robot.y += v * mid.sin() * dt;
        self.robot.heading = wrap_angle(self.robot.heading + omega * dt);

        self.resolve_contact();
    }

    /// Push the opponent out of any overlap along the center line.
    fn resolve_contact(&mut self) {
        let dx = self.opponent.0 - self.robot.x;
        let dy = self.opponent.1 - self.robot.y;
        let dist = dx.hypot(dy);
        let min_dist = self.contact_distance();
        if dist < min_dist && dist > f64::EPSILON {
            let push = min_dist - dist;
            self.opponent.0 += dx / dist * push;
            self.opponent.1 += dy / dist * push;
            trace!(
                "Contact: opponent pushed {:.3} cm to ({:.2}, {:.2})",
                push, self.opponent.0, self.opponent.1
            );
        }
    }

    /// Ultrasonic reading on one side [cm]; the no-echo value when the
    /// opponent is outside the cone or out of range.
    pub fn sonar(&self, side: Side) -> f64 {
        let forward = self.config.robot_radius_cm * SONAR_FORWARD_RATIO;
        let (sx, sy) = self.robot.offset(forward, side_sign(side) * SENSOR_LATERAL_CM);
        let dx = self.opponent.0 - sx;
        let dy = self.opponent.1 - sy;
        let center_dist = dx.hypot(dy);
        let radius = self.config.opponent_radius_cm;
        if center_dist <= radius {
            return 0.0;
        }

        let off_axis = wrap_angle(dy.atan2(dx) - self.robot.heading).abs();
        let half_width = (radius / center_dist).asin();
        if off_axis - half_width > self.config.sonar_half_angle_deg.to_radians() {
            return DISTANCE_MAX_RANGE_CM;
        }
        (center_dist - radius).min(DISTANCE_MAX_RANGE_CM)
    }

    /// Floor reflectance under the color sensor on one side.
    pub fn reflectance(&self, side: Side) -> f64 {
        let (px, py) = self
            .robot
            .offset(self.config.robot_radius_cm, side_sign(side) * SENSOR_LATERAL_CM);
        let inner = self.config.ring_radius_cm - self.config.border_width_cm;
        if px.hypot(py) >= inner {
            self.config.white_reflectance
        } else {
            self.config.black_reflectance
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facing_opponent() -> SimulationConfig {
        SimulationConfig {
            robot_start: [-15.0, 0.0],
            robot_heading_deg: 0.0,
            opponent_start: [15.0, 0.0],
            ..Default::default()
        }
    }

    #[test]
    fn spin_in_place_keeps_position() {
        let mut arena = ArenaSimulator::new(facing_opponent());
        arena.set_speeds(30.0, -30.0);
        arena.advance_to(Duration::from_millis(500));
        let pose = arena.robot();
        assert!((pose.x + 15.0).abs() < 1e-9);
        assert!(pose.y.abs() < 1e-9);
        // Left forward, right back turns clockwise.
        assert!(pose.heading < 0.0);
    }

    #[test]
    fn straight_drive_covers_expected_distance() {
        let mut arena = ArenaSimulator::new(facing_opponent());
        arena.set_speeds(50.0, 50.0);
        arena.advance_to(Duration::from_secs(1));
        // 50 % of 30 cm/s for 1 s.
        assert!((arena.robot().x - (-15.0 + 15.0)).abs() < 1e-9);
    }

    #[test]
    fn sonar_sees_opponent_ahead_symmetrically() {
        let arena = ArenaSimulator::new(facing_opponent());
        let left = arena.sonar(Side::Left);
        let right = arena.sonar(Side::Right);
        assert_eq!(left, right);
        assert!(left < 25.0 && left > 10.0);
    }

    #[test]
    fn sonar_reports_no_echo_when_facing_away() {
        let config = SimulationConfig {
            robot_heading_deg: 180.0,
            ..facing_opponent()
        };
        let arena = ArenaSimulator::new(config);
        assert_eq!(arena.sonar(Side::Left), DISTANCE_MAX_RANGE_CM);
        assert_eq!(arena.sonar(Side::Right), DISTANCE_MAX_RANGE_CM);
    }

    #[test]
    fn reflectance_is_white_on_border_only() {
        let arena = ArenaSimulator::new(facing_opponent());
        assert_eq!(arena.reflectance(Side::Left), 6.0);

        let config = SimulationConfig {
            robot_start: [29.0, 0.0],
            opponent_start: [-20.0, 0.0],
            ..facing_opponent()
        };
        let arena = ArenaSimulator::new(config);
        assert_eq!(arena.reflectance(Side::Left), 60.0);
        assert_eq!(arena.reflectance(Side::Right), 60.0);
    }

    #[test]
    fn driving_into_opponent_pushes_it() {
        let mut arena = ArenaSimulator::new(facing_opponent());
        arena.set_speeds(100.0, 100.0);
        arena.advance_to(Duration::from_secs(2));
        let (ox, oy) = arena.opponent();
        assert!(ox > 15.0);
        assert!(oy.abs() < 1e-9);
        let gap = ox - arena.robot().x;
        assert!(gap >= 14.5 - 1e-9);
    }

    #[test]
    fn opponent_out_after_long_push() {
        let mut arena = ArenaSimulator::new(facing_opponent());
        arena.set_speeds(100.0, 100.0);
        arena.advance_to(Duration::from_secs(3));
        assert!(arena.opponent_out());
    }
}
