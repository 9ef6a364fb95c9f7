//! Simulation driver implementation.
//!
//! [`Simulation`] owns one [`ArenaSimulator`] and one [`ManualClock`] and
//! hands out sensor and actuator drivers that share them. Every driver call
//! first integrates the arena up to the clock's current time, so motion
//! commanded with `set_speeds` continues while the control loop sleeps.

use std::cell::{Ref, RefCell};
use std::rc::Rc;
use std::time::Duration;

use sumo_common::clock::{Clock, ManualClock};
use sumo_common::hal::config::SimulationConfig;
use sumo_common::hal::driver::{ActuatorDriver, DriverError, DriverSet, SensorDriver};
use sumo_common::hal::types::Side;
use tracing::{debug, trace};

use super::physics::ArenaSimulator;

/// Gap below which the simulated bumper counts as pressed [cm].
const CONTACT_TOLERANCE_CM: f64 = 0.5;

type SharedArena = Rc<RefCell<ArenaSimulator>>;

fn sync(arena: &SharedArena, clock: &ManualClock) {
    arena.borrow_mut().advance_to(clock.now());
}

/// A simulated bout: arena, clock and the drivers bound to them.
#[derive(Debug, Clone)]
pub struct Simulation {
    arena: SharedArena,
    clock: ManualClock,
    contact_fitted: bool,
}

impl Simulation {
    /// Create a simulation in the configured start positions.
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            arena: Rc::new(RefCell::new(ArenaSimulator::new(config))),
            clock: ManualClock::new(),
            contact_fitted: false,
        }
    }

    /// Fit a simulated bumper.
    pub fn with_contact_sensor(mut self) -> Self {
        self.contact_fitted = true;
        self
    }

    /// The virtual clock driving the simulation.
    pub fn clock(&self) -> ManualClock {
        self.clock.clone()
    }

    /// Sensor driver bound to this simulation.
    pub fn sensors(&self) -> SimSensors {
        SimSensors {
            arena: Rc::clone(&self.arena),
            clock: self.clock.clone(),
            contact_fitted: self.contact_fitted,
        }
    }

    /// Actuator driver bound to this simulation.
    pub fn actuators(&self) -> SimActuators {
        SimActuators {
            arena: Rc::clone(&self.arena),
            clock: self.clock.clone(),
        }
    }

    /// Arena state, integrated up to the current time.
    pub fn arena(&self) -> Ref<'_, ArenaSimulator> {
        sync(&self.arena, &self.clock);
        self.arena.borrow()
    }

    /// Package as a backend for the control loop.
    pub fn into_driver_set(self) -> DriverSet {
        DriverSet {
            sensors: Box::new(self.sensors()),
            actuators: Box::new(self.actuators()),
            clock: Box::new(self.clock()),
        }
    }
}

/// Simulated ultrasonic, color and touch sensors.
#[derive(Debug)]
pub struct SimSensors {
    arena: SharedArena,
    clock: ManualClock,
    contact_fitted: bool,
}

impl SensorDriver for SimSensors {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn read_distance(&mut self, side: Side) -> Result<Option<f64>, DriverError> {
        sync(&self.arena, &self.clock);
        Ok(Some(self.arena.borrow().sonar(side)))
    }

    fn read_reflectance(&mut self, side: Side) -> Result<f64, DriverError> {
        sync(&self.arena, &self.clock);
        Ok(self.arena.borrow().reflectance(side))
    }

    fn is_contact_pressed(&mut self) -> Result<Option<bool>, DriverError> {
        if !self.contact_fitted {
            return Ok(None);
        }
        sync(&self.arena, &self.clock);
        let arena = self.arena.borrow();
        let (ox, oy) = arena.opponent();
        let robot = arena.robot();
        let gap = (ox - robot.x).hypot(oy - robot.y);
        // Bumper is on the front half only.
        let facing = (oy - robot.y).atan2(ox - robot.x) - robot.heading;
        let in_front = facing.cos() > 0.0;
        let touching = gap <= arena.contact_distance() + CONTACT_TOLERANCE_CM;
        Ok(Some(in_front && touching))
    }
}

/// Simulated tank drive.
#[derive(Debug)]
pub struct SimActuators {
    arena: SharedArena,
    clock: ManualClock,
}

impl ActuatorDriver for SimActuators {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn set_speeds(&mut self, left: f64, right: f64) -> Result<(), DriverError> {
        sync(&self.arena, &self.clock);
        trace!("sim set_speeds({left:.1}, {right:.1})");
        self.arena.borrow_mut().set_speeds(left, right);
        Ok(())
    }

    fn run_for(&mut self, left: f64, right: f64, duration: Duration) -> Result<(), DriverError> {
        sync(&self.arena, &self.clock);
        debug!(
            "sim run_for({left:.1}, {right:.1}, {} ms)",
            duration.as_millis()
        );
        self.arena.borrow_mut().set_speeds(left, right);
        self.clock.advance(duration);
        let mut arena = self.arena.borrow_mut();
        arena.advance_to(self.clock.now());
        arena.set_speeds(0.0, 0.0);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), DriverError> {
        sync(&self.arena, &self.clock);
        self.arena.borrow_mut().set_speeds(0.0, 0.0);
        Ok(())
    }
}
