//! Integration test: the ring edge overrides every behavior.
//!
//! 1. Edge seen in any state → escape maneuver → SEARCH in the same tick
//! 2. Escape turns away from the brighter sensor
//! 3. A failed color sensor reads as border

use std::time::Duration;

use sumo_common::clock::Clock;

use sumo_common::control_unit::state::{ManeuverKind, MotorCommand, RobotState};
use sumo_common::hal::types::Side;
use sumo_hal::drivers::simulation::{ActuatorCall, SensorFrame};

use super::{into_approach, rig};

// ── Helpers ─────────────────────────────────────────────────────────

/// The rotate segment of the last escape.
fn escape_rotation(calls: &[ActuatorCall]) -> (f64, f64) {
    calls
        .iter()
        .rev()
        .find_map(|c| match c {
            ActuatorCall::RunFor { left, right, .. } if left != right => Some((*left, *right)),
            _ => None,
        })
        .unwrap()
}

/// Frames reaching `state` followed by one edge frame.
fn frames_then_edge(state: RobotState, left: f64, right: f64) -> Vec<SensorFrame> {
    let mut frames = match state {
        RobotState::Search => vec![],
        RobotState::Lockon => vec![SensorFrame::seen(20.0, 20.0)],
        RobotState::Approach => into_approach(),
        RobotState::Push => {
            let mut f = into_approach();
            f.push(SensorFrame::seen(6.0, 6.0));
            f
        }
        RobotState::Recover => unreachable!(),
    };
    frames.push(SensorFrame::seen(5.0, 5.0).with_floor(left, right));
    frames
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn edge_overrides_every_state() {
    for state in [
        RobotState::Search,
        RobotState::Lockon,
        RobotState::Approach,
        RobotState::Push,
    ] {
        let frames = frames_then_edge(state, 50.0, 10.0);
        let setup = frames.len() - 1;
        let mut rig = rig(frames);
        for _ in 0..setup {
            rig.runner.tick().unwrap();
        }
        assert_eq!(rig.runner.state(), state);

        let event = rig.runner.tick().unwrap();
        assert_eq!(event.maneuver, Some(ManeuverKind::EdgeEscape), "from {state}");
        assert_eq!(event.state, RobotState::Search, "from {state}");
        assert_eq!(event.command, MotorCommand::STOP);
        assert_eq!(rig.runner.machine().push_started(), None);
        assert_eq!(rig.runner.machine().pid().state().last_time, None);
    }
}

#[test]
fn left_edge_escapes_turning_right() {
    let mut rig = rig(frames_then_edge(RobotState::Search, 50.0, 10.0));
    rig.runner.tick().unwrap();
    let calls = rig.actuators.calls();
    assert_eq!(
        calls[1],
        ActuatorCall::RunFor {
            left: -30.0,
            right: -30.0,
            duration: Duration::from_millis(500),
        }
    );
    assert_eq!(escape_rotation(&calls), (30.0, -30.0));
}

#[test]
fn right_edge_escapes_turning_left() {
    let mut rig = rig(frames_then_edge(RobotState::Approach, 8.0, 70.0));
    for _ in 0..3 {
        rig.runner.tick().unwrap();
    }
    assert_eq!(escape_rotation(&rig.actuators.calls()), (-30.0, 30.0));
}

#[test]
fn edge_beats_push_trigger() {
    // Close enough to push, but one sensor is on the border.
    let mut rig = rig(frames_then_edge(RobotState::Approach, 10.0, 40.0));
    rig.runner.tick().unwrap();
    rig.runner.tick().unwrap();
    let event = rig.runner.tick().unwrap();
    assert_eq!(event.maneuver, Some(ManeuverKind::EdgeEscape));
    assert_eq!(event.state, RobotState::Search);
    assert_ne!(rig.runner.state(), RobotState::Push);
}

#[test]
fn just_below_threshold_is_not_an_edge() {
    let mut rig = rig(vec![SensorFrame::empty().with_floor(39.9, 39.9)]);
    let event = rig.runner.tick().unwrap();
    assert_eq!(event.maneuver, None);
    assert_eq!(event.state, RobotState::Search);
}

#[test]
fn failed_color_sensor_reads_as_border() {
    let mut rig = rig(vec![
        SensorFrame::empty().with_reflectance_error(Side::Left),
        SensorFrame::empty(),
    ]);
    let event = rig.runner.tick().unwrap();
    assert_eq!(event.maneuver, Some(ManeuverKind::EdgeEscape));
    assert_eq!(event.snapshot.left_reflectance, 100.0);
    // Turn away from the failed (bright) side.
    assert_eq!(escape_rotation(&rig.actuators.calls()), (30.0, -30.0));
    assert_eq!(rig.runner.stats().edge_recoveries, 1);
}

#[test]
fn escape_ends_with_motors_stopped() {
    let mut rig = rig(frames_then_edge(RobotState::Push, 60.0, 60.0));
    for _ in 0..4 {
        rig.runner.tick().unwrap();
    }
    assert_eq!(rig.actuators.last(), Some(ActuatorCall::Stop));
    assert_eq!(rig.runner.last_command(), MotorCommand::STOP);
    assert!(rig.clock.now() >= Duration::from_millis(1099));
}
