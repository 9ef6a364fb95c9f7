//! Shared helpers for the integration tests.

mod edge_priority;
mod scenarios;
mod shutdown;
mod simulation;

use std::cell::RefCell;
use std::rc::Rc;

use sumo_common::clock::ManualClock;
use sumo_common::control_unit::state::TickEvent;
use sumo_control_unit::config::ControlParams;
use sumo_control_unit::cycle::CycleRunner;
use sumo_control_unit::tick_log::{TickLogError, TickLogger};
use sumo_hal::drivers::simulation::{ActuatorLog, RecordingActuators, ScriptedSensors, SensorFrame};

/// Tick logger keeping every event in memory.
#[derive(Clone, Default)]
pub struct MemoryLogger {
    events: Rc<RefCell<Vec<TickEvent>>>,
}

impl MemoryLogger {
    pub fn events(&self) -> Vec<TickEvent> {
        self.events.borrow().clone()
    }
}

impl TickLogger for MemoryLogger {
    fn record(&mut self, event: &TickEvent) -> Result<(), TickLogError> {
        self.events.borrow_mut().push(*event);
        Ok(())
    }
}

pub type ScriptedRunner =
    CycleRunner<ScriptedSensors, RecordingActuators, ManualClock, MemoryLogger>;

/// Runner over scripted frames with default tuning.
pub struct Rig {
    pub runner: ScriptedRunner,
    pub actuators: ActuatorLog,
    pub events: MemoryLogger,
    pub clock: ManualClock,
}

pub fn rig(frames: Vec<SensorFrame>) -> Rig {
    rig_with(frames, &ControlParams::default())
}

pub fn rig_with(frames: Vec<SensorFrame>, params: &ControlParams) -> Rig {
    let clock = ManualClock::new();
    let actuators = RecordingActuators::new(clock.clone());
    let log = actuators.log();
    let events = MemoryLogger::default();
    let runner = CycleRunner::new(
        ScriptedSensors::new(frames),
        actuators,
        clock.clone(),
        events.clone(),
        params,
    );
    Rig {
        runner,
        actuators: log,
        events,
        clock,
    }
}

/// Frames that bring a fresh runner to APPROACH in two ticks.
pub fn into_approach() -> Vec<SensorFrame> {
    vec![SensorFrame::seen(20.0, 20.0), SensorFrame::seen(20.0, 20.0)]
}
