//! Integration test: loop shutdown and tick log output.
//!
//! 1. A cleared running flag ends the loop after the current tick
//! 2. A maneuver in progress always completes before shutdown
//! 3. Motors are stopped on every exit path
//! 4. The tick that hits an actuator failure is still logged
//! 5. The CSV tick log on disk has one header and one row per tick

use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use sumo_common::clock::ManualClock;
use sumo_common::control_unit::state::{RobotState, TickEvent};
use sumo_control_unit::config::ControlParams;
use sumo_control_unit::cycle::{CycleError, CycleRunner};
use sumo_control_unit::tick_log::{CSV_HEADER, CsvTickLogger, TickLogError, TickLogger};
use sumo_hal::drivers::simulation::{ActuatorCall, RecordingActuators, ScriptedSensors, SensorFrame};

use super::MemoryLogger;

// ── Helpers ─────────────────────────────────────────────────────────

/// Clears the running flag once `after` ticks have been logged, like a
/// Ctrl+C arriving mid-run.
struct InterruptAfter {
    running: Arc<AtomicBool>,
    after: u64,
}

impl TickLogger for InterruptAfter {
    fn record(&mut self, event: &TickEvent) -> Result<(), TickLogError> {
        if event.tick + 1 >= self.after {
            self.running.store(false, Ordering::SeqCst);
        }
        Ok(())
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn cleared_flag_ends_loop_and_stops_motors() {
    let running = Arc::new(AtomicBool::new(true));
    let clock = ManualClock::new();
    let actuators = RecordingActuators::new(clock.clone());
    let log = actuators.log();
    let mut runner = CycleRunner::new(
        ScriptedSensors::constant(SensorFrame::empty()),
        actuators,
        clock,
        InterruptAfter {
            running: running.clone(),
            after: 7,
        },
        &ControlParams::default(),
    );

    runner.run(&running, None).unwrap();

    assert_eq!(runner.stats().ticks, 7);
    assert_eq!(log.last(), Some(ActuatorCall::Stop));
}

#[test]
fn maneuver_in_progress_completes_before_shutdown() {
    let running = Arc::new(AtomicBool::new(true));
    let clock = ManualClock::new();
    let actuators = RecordingActuators::new(clock.clone());
    let log = actuators.log();
    let mut runner = CycleRunner::new(
        ScriptedSensors::new(vec![
            SensorFrame::empty(),
            SensorFrame::empty().with_floor(70.0, 70.0),
        ]),
        actuators,
        clock,
        InterruptAfter {
            running: running.clone(),
            after: 2,
        },
        &ControlParams::default(),
    );

    runner.run(&running, None).unwrap();

    let run_for = log
        .calls()
        .iter()
        .filter(|c| matches!(c, ActuatorCall::RunFor { .. }))
        .count();
    assert_eq!(run_for, 2);
    assert_eq!(runner.stats().edge_recoveries, 1);
    assert_eq!(log.last(), Some(ActuatorCall::Stop));
}

#[test]
fn actuator_failure_is_fatal_but_motors_are_stopped() {
    let clock = ManualClock::new();
    let actuators = RecordingActuators::new(clock.clone()).failing_after(10);
    let log = actuators.log();
    let mut runner = CycleRunner::new(
        ScriptedSensors::constant(SensorFrame::empty()),
        actuators,
        clock,
        sumo_control_unit::tick_log::NullTickLogger,
        &ControlParams::default(),
    );

    let result = runner.run(&AtomicBool::new(true), None);
    assert!(matches!(result, Err(CycleError::Actuator(_))));
    assert_eq!(log.last(), Some(ActuatorCall::Stop));
}

#[test]
fn failing_tick_is_counted_and_logged() {
    let clock = ManualClock::new();
    let actuators = RecordingActuators::new(clock.clone()).failing_after(10);
    let logger = MemoryLogger::default();
    let mut runner = CycleRunner::new(
        ScriptedSensors::constant(SensorFrame::empty()),
        actuators,
        clock,
        logger.clone(),
        &ControlParams::default(),
    );

    assert!(runner.run(&AtomicBool::new(true), None).is_err());
    let events = logger.events();
    assert_eq!(runner.stats().ticks, 11);
    assert_eq!(events.len(), 11);
    assert_eq!(events[10].tick, 10);
    assert_eq!(events[10].state, RobotState::Search);
}

#[test]
fn csv_tick_log_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logs/sumo_test_log.csv");
    let clock = ManualClock::new();
    let mut runner = CycleRunner::new(
        ScriptedSensors::new(vec![
            SensorFrame::empty(),
            SensorFrame::seen(20.0, 20.0),
            SensorFrame::new(None, Some(30.0), 5.0, 5.0),
        ]),
        RecordingActuators::new(clock.clone()),
        clock,
        CsvTickLogger::create(&path).unwrap(),
        &ControlParams::default(),
    );

    runner.run(&AtomicBool::new(true), Some(10)).unwrap();
    drop(runner);

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 11);
    assert_eq!(lines[0], CSV_HEADER);
    assert!(lines[1].contains(",SEARCH,,,"));
    assert!(lines[2].contains(",LOCKON,20,20,"));
    for row in &lines[1..] {
        assert_eq!(row.split(',').count(), 10, "row {row}");
    }

    // Wall-clock stamps 20 ms apart on the virtual clock.
    let stamp = |row: &str| {
        let cell = row.split(',').next().unwrap();
        chrono::DateTime::parse_from_rfc3339(cell).unwrap()
    };
    assert_eq!(
        (stamp(lines[2]) - stamp(lines[1])).num_milliseconds(),
        20
    );
}
