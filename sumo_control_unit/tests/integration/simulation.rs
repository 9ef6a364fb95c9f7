//! Integration test: full bouts on the ring simulator.
//!
//! Runs the real control loop on the virtual clock; a simulated bout of
//! several seconds completes in milliseconds.

use std::sync::atomic::AtomicBool;

use sumo_common::clock::Clock;
use sumo_common::config::SumoConfig;
use sumo_common::control_unit::state::{ManeuverKind, RobotState};
use sumo_common::hal::config::{HalConfig, SimulationConfig};
use sumo_control_unit::config::{ControlParams, load_config_from_str};
use sumo_control_unit::cycle::{BoxedCycleRunner, CycleRunner};
use sumo_control_unit::tick_log::NullTickLogger;
use sumo_hal::DriverRegistry;
use sumo_hal::drivers::simulation::Simulation;

use super::MemoryLogger;

// ── Helpers ─────────────────────────────────────────────────────────

fn facing_opponent() -> SimulationConfig {
    SimulationConfig {
        robot_start: [-15.0, 0.0],
        robot_heading_deg: 0.0,
        opponent_start: [15.0, 0.0],
        ..Default::default()
    }
}

fn first_index(states: &[RobotState], state: RobotState) -> Option<usize> {
    states.iter().position(|s| *s == state)
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn head_on_bout_pushes_opponent_out_and_stays_in() {
    let sim = Simulation::new(facing_opponent());
    let logger = MemoryLogger::default();
    let mut runner = CycleRunner::new(
        sim.sensors(),
        sim.actuators(),
        sim.clock(),
        logger.clone(),
        &ControlParams::default(),
    );

    let tick = ControlParams::default().tick_interval;
    let mut escaped = false;
    for _ in 0..400 {
        let event = runner.tick().unwrap();
        assert!(!sim.arena().robot_out(), "robot left the ring at tick {}", event.tick);
        if event.maneuver == Some(ManeuverKind::EdgeEscape) {
            escaped = true;
            break;
        }
        sim.clock().sleep(tick);
    }
    runner.shutdown().unwrap();

    assert!(escaped, "no edge escape within 400 ticks");
    assert!(sim.arena().opponent_out());
    assert!(!sim.arena().robot_out());

    let states: Vec<RobotState> = logger.events().iter().map(|e| e.state).collect();
    let lockon = first_index(&states, RobotState::Lockon).unwrap();
    let approach = first_index(&states, RobotState::Approach).unwrap();
    let push = first_index(&states, RobotState::Push).unwrap();
    assert!(lockon < approach && approach < push);
    assert_eq!(runner.stats().stalls, 0);
}

#[test]
fn default_arena_acquires_the_opponent() {
    let sim = Simulation::new(SimulationConfig::default());
    let mut runner = CycleRunner::new(
        sim.sensors(),
        sim.actuators(),
        sim.clock(),
        NullTickLogger,
        &ControlParams::default(),
    );

    let tick = ControlParams::default().tick_interval;
    let mut seen = false;
    for _ in 0..300 {
        runner.tick().unwrap();
        if runner.state() == RobotState::Lockon {
            seen = true;
            break;
        }
        sim.clock().sleep(tick);
    }
    assert!(seen, "opponent never acquired");
}

#[test]
fn registry_backend_runs_with_tick_limit() {
    let loaded = load_config_from_str(
        r#"
[hal]
driver = "simulation"

[tick_log]
format = "none"
"#,
    )
    .unwrap();
    let registry = DriverRegistry::with_builtin_drivers();
    let drivers = registry.create(&loaded.config.hal.driver, &loaded.config.hal).unwrap();
    let mut runner = BoxedCycleRunner::from_drivers(
        drivers,
        Box::new(NullTickLogger),
        &loaded.params,
    );

    runner.run(&AtomicBool::new(true), Some(50)).unwrap();
    assert_eq!(runner.stats().ticks, 50);
    assert!(runner.clock().now() >= loaded.params.tick_interval * 50);
}

#[test]
fn unknown_backend_is_rejected() {
    let config = SumoConfig::default();
    let registry = DriverRegistry::with_builtin_drivers();
    let hal = HalConfig {
        driver: "canbus".to_string(),
        ..config.hal
    };
    assert!(registry.create(&hal.driver, &hal).is_err());
}
