//! Integration test: behavior scenarios through the full tick pipeline.
//!
//! Scripted sensor frames in, recorded motor commands and tick events out.

use std::sync::atomic::AtomicBool;
use std::time::Duration;

use sumo_common::clock::Clock;

use sumo_common::control_unit::state::{ManeuverKind, MotorCommand, RobotState};
use sumo_common::hal::types::Side;
use sumo_control_unit::config::ControlParams;
use sumo_hal::drivers::simulation::{ActuatorCall, SensorFrame};

use super::{into_approach, rig, rig_with};

// ── Helpers ─────────────────────────────────────────────────────────

fn run_ticks(rig: &mut super::Rig, n: usize) {
    let running = AtomicBool::new(true);
    rig.runner.run(&running, Some(n as u64)).unwrap();
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn aligned_lockon_enters_approach_without_new_command() {
    let mut rig = rig(into_approach());
    let first = rig.runner.tick().unwrap();
    assert_eq!(first.state, RobotState::Lockon);
    assert_eq!(rig.actuators.last(), Some(ActuatorCall::Stop));

    let calls = rig.actuators.len();
    let second = rig.runner.tick().unwrap();
    assert_eq!(second.state, RobotState::Approach);
    assert_eq!(rig.actuators.len(), calls);
}

#[test]
fn misaligned_lockon_rotates_toward_closer_side() {
    let mut rig = rig(vec![
        SensorFrame::seen(12.0, 20.0),
        SensorFrame::seen(12.0, 20.0),
    ]);
    rig.runner.tick().unwrap();
    let event = rig.runner.tick().unwrap();
    assert_eq!(event.state, RobotState::Lockon);
    assert_eq!(event.command, MotorCommand::new(-15.0, 15.0));
}

#[test]
fn lockon_losing_one_side_nudges_forward_then_searches() {
    let mut rig = rig(vec![
        SensorFrame::seen(20.0, 20.0),
        SensorFrame::new(Some(20.0), None, 5.0, 5.0),
        SensorFrame::empty(),
    ]);
    rig.runner.tick().unwrap();
    let event = rig.runner.tick().unwrap();
    assert_eq!(event.maneuver, Some(ManeuverKind::ReacquireNudge));
    assert_eq!(event.state, RobotState::Search);
    assert_eq!(rig.clock.now(), Duration::from_millis(250));
    assert!(rig.actuators.calls().contains(&ActuatorCall::RunFor {
        left: 15.0,
        right: 15.0,
        duration: Duration::from_millis(250),
    }));
    assert_eq!(rig.runner.stats().nudges, 1);

    let event = rig.runner.tick().unwrap();
    assert_eq!(event.state, RobotState::Search);
    assert_eq!(event.command, MotorCommand::spin(20.0));
}

#[test]
fn approach_steers_toward_nearer_side() {
    let mut frames = into_approach();
    frames.push(SensorFrame::seen(18.0, 14.0));
    let mut rig = rig(frames);
    rig.runner.tick().unwrap();
    rig.runner.tick().unwrap();
    let event = rig.runner.tick().unwrap();

    assert_eq!(event.state, RobotState::Approach);
    assert!(event.error < 0.0);
    assert!(event.pid_output < 0.0);
    // Opponent nearer on the right: left wheel faster, turning right.
    assert!(event.command.left > event.command.right);
}

#[test]
fn approach_losing_left_returns_to_search_and_stops() {
    let mut frames = into_approach();
    frames.push(SensorFrame::seen(15.0, 16.0));
    frames.push(SensorFrame::new(None, Some(16.0), 5.0, 5.0));
    let mut rig = rig(frames);
    for _ in 0..3 {
        rig.runner.tick().unwrap();
    }
    assert!(rig.runner.machine().pid().state().last_time.is_some());

    let event = rig.runner.tick().unwrap();
    assert_eq!(event.state, RobotState::Search);
    assert_eq!(event.command, MotorCommand::STOP);
    assert_eq!(rig.actuators.last(), Some(ActuatorCall::Stop));
    assert_eq!(rig.runner.machine().pid().state().last_time, None);
    assert_eq!(rig.runner.stats().lock_losses, 1);
}

#[test]
fn failed_distance_read_counts_as_lost_lock() {
    let mut frames = into_approach();
    frames.push(SensorFrame::seen(15.0, 15.0).with_distance_error(Side::Right));
    let mut rig = rig(frames);
    rig.runner.tick().unwrap();
    rig.runner.tick().unwrap();
    let event = rig.runner.tick().unwrap();
    assert_eq!(event.state, RobotState::Search);
    assert_eq!(rig.runner.perception_faults().distance_errors, 1);
}

#[test]
fn contact_sensor_starts_push() {
    let mut frames = into_approach();
    frames.push(SensorFrame::seen(15.0, 15.0).with_contact(true));
    frames.push(SensorFrame::seen(15.0, 15.0).with_contact(true));
    let mut rig = rig(frames);
    for _ in 0..3 {
        rig.runner.tick().unwrap();
    }
    assert_eq!(rig.runner.state(), RobotState::Push);
    let event = rig.runner.tick().unwrap();
    assert_eq!(event.command, MotorCommand::straight(85.0));
}

#[test]
fn push_timeout_backs_off_and_searches() {
    let mut frames = into_approach();
    frames.push(SensorFrame::seen(5.0, 5.0));
    let mut rig = rig(frames);
    run_ticks(&mut rig, 110);

    let events = rig.events.events();
    let push_start = events
        .iter()
        .find(|e| e.state == RobotState::Push)
        .map(|e| e.timestamp)
        .unwrap();
    let stall = events
        .iter()
        .position(|e| e.maneuver == Some(ManeuverKind::StallBackoff))
        .unwrap();

    assert_eq!(events[stall].state, RobotState::Search);
    assert_eq!(events[stall].command, MotorCommand::STOP);
    assert_eq!(events[stall - 1].state, RobotState::Push);
    assert!(events[stall].timestamp - push_start > Duration::from_secs(2));
    assert!(events[stall - 1].timestamp - push_start <= Duration::from_secs(2));
    assert_eq!(rig.runner.stats().stalls, 1);

    let reverse = rig
        .actuators
        .calls()
        .into_iter()
        .find(|c| matches!(c, ActuatorCall::RunFor { left, .. } if *left < 0.0))
        .unwrap();
    assert_eq!(
        reverse,
        ActuatorCall::RunFor {
            left: -40.0,
            right: -40.0,
            duration: Duration::from_millis(400),
        }
    );
}

#[test]
fn shorter_push_timeout_is_honored() {
    let mut params = ControlParams::default();
    params.push_timeout = Duration::from_millis(500);
    let mut frames = into_approach();
    frames.push(SensorFrame::seen(5.0, 5.0));
    let mut rig = rig_with(frames, &params);
    run_ticks(&mut rig, 40);
    assert_eq!(rig.runner.stats().stalls, 1);
}

#[test]
fn identical_inputs_give_identical_runs() {
    let frames = vec![
        SensorFrame::empty(),
        SensorFrame::seen(22.0, 24.0),
        SensorFrame::seen(21.0, 22.0),
        SensorFrame::seen(16.0, 19.0),
        SensorFrame::seen(13.0, 14.5),
        SensorFrame::seen(10.0, 9.0),
        SensorFrame::seen(6.0, 6.0),
        SensorFrame::seen(5.0, 5.0).with_floor(45.0, 8.0),
        SensorFrame::empty(),
    ];
    let mut a = rig(frames.clone());
    let mut b = rig(frames);
    run_ticks(&mut a, 12);
    run_ticks(&mut b, 12);
    assert_eq!(a.events.events(), b.events.events());
    assert_eq!(a.actuators.calls(), b.actuators.calls());
}
