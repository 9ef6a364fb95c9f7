//! Control cycle: sample → decide → act → log.
//!
//! ## Tick
//! 1. Read the clock once; that instant is the tick's `now`.
//! 2. Sample every sensor once into a `PerceptionSnapshot`.
//! 3. `StateMachine::step` picks an [`Action`].
//! 4. Apply it. A maneuver blocks until its last segment has stopped, then
//!    the post-maneuver state is committed before the tick ends.
//! 5. Hand a [`TickEvent`] to the tick logger.
//!
//! ## Loop
//! `tick()` then a fixed `sleep(tick_interval)`, until the running flag
//! clears, the tick limit is hit, or an actuator command fails. Every exit
//! path stops the motors.
//!
//! Sensor faults never end the loop (perception substitutes safe values).
//! Tick logger faults are counted and swallowed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Serialize;
use sumo_common::clock::Clock;
use sumo_common::control_unit::state::{ManeuverKind, MotorCommand, RobotState, TickEvent};
use sumo_common::hal::driver::{ActuatorDriver, DriverError, DriverSet, SensorDriver};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::ControlParams;
use crate::perception::{PerceptionAdapter, PerceptionFaults};
use crate::state::machine::{Action, StateMachine};
use crate::tick_log::TickLogger;

/// Logger failures are reported on the first and then every Nth occurrence.
const LOG_FAILURE_REPORT_EVERY: u64 = 100;

// ─── Cycle Statistics ───────────────────────────────────────────────

/// Per-run counters, logged at shutdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleStats {
    /// Ticks executed.
    pub ticks: u64,
    /// Last tick duration [ns].
    pub last_tick_ns: u64,
    /// Shortest tick [ns] (`u64::MAX` before the first tick).
    pub min_tick_ns: u64,
    /// Longest tick [ns].
    pub max_tick_ns: u64,
    /// Running sum for the average.
    pub sum_tick_ns: u64,
    /// Ticks longer than the tick interval (every maneuver is one).
    pub overruns: u64,
    /// Edge escapes executed.
    pub edge_recoveries: u64,
    /// Push timeouts (stall backoffs executed).
    pub stalls: u64,
    /// APPROACH → SEARCH because a side lost the target.
    pub lock_losses: u64,
    /// Lock-on nudges executed.
    pub nudges: u64,
    /// Tick events the logger rejected.
    pub log_failures: u64,
}

impl CycleStats {
    /// Zeroed statistics.
    pub const fn new() -> Self {
        Self {
            ticks: 0,
            last_tick_ns: 0,
            min_tick_ns: u64::MAX,
            max_tick_ns: 0,
            sum_tick_ns: 0,
            overruns: 0,
            edge_recoveries: 0,
            stalls: 0,
            lock_losses: 0,
            nudges: 0,
            log_failures: 0,
        }
    }

    /// Record one tick's duration against the interval budget.
    #[inline]
    pub fn record(&mut self, duration: Duration, budget: Duration) {
        let ns = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.ticks += 1;
        self.last_tick_ns = ns;
        self.min_tick_ns = self.min_tick_ns.min(ns);
        self.max_tick_ns = self.max_tick_ns.max(ns);
        self.sum_tick_ns = self.sum_tick_ns.saturating_add(ns);
        if duration > budget {
            self.overruns += 1;
        }
    }

    /// Count a maneuver by kind.
    #[inline]
    pub fn record_maneuver(&mut self, kind: ManeuverKind) {
        match kind {
            ManeuverKind::EdgeEscape => self.edge_recoveries += 1,
            ManeuverKind::StallBackoff => self.stalls += 1,
            ManeuverKind::ReacquireNudge => self.nudges += 1,
        }
    }

    /// Average tick duration [ns] (0 before the first tick).
    #[inline]
    pub fn avg_tick_ns(&self) -> u64 {
        if self.ticks == 0 {
            0
        } else {
            self.sum_tick_ns / self.ticks
        }
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Errors ─────────────────────────────────────────────────────────

/// Errors that end the control loop.
#[derive(Debug, Error)]
pub enum CycleError {
    /// A motor command failed. The robot can no longer be steered.
    #[error("actuator failure: {0}")]
    Actuator(#[from] DriverError),
}

// ─── Cycle Runner ───────────────────────────────────────────────────

/// Owns the drivers and the control state; runs the loop.
///
/// Motors are stopped when the runner is dropped if they may still be
/// moving.
pub struct CycleRunner<S, A, C, L>
where
    S: SensorDriver,
    A: ActuatorDriver,
    C: Clock,
    L: TickLogger,
{
    sensors: S,
    actuators: A,
    clock: C,
    logger: L,
    perception: PerceptionAdapter,
    machine: StateMachine,
    tick_interval: Duration,
    stats: CycleStats,
    last_command: MotorCommand,
    motors_idle: bool,
}

/// Runner over a backend from the driver registry.
pub type BoxedCycleRunner = CycleRunner<
    Box<dyn SensorDriver>,
    Box<dyn ActuatorDriver>,
    Box<dyn Clock>,
    Box<dyn TickLogger>,
>;

impl BoxedCycleRunner {
    /// Build from a registry [`DriverSet`].
    pub fn from_drivers(
        drivers: DriverSet,
        logger: Box<dyn TickLogger>,
        params: &ControlParams,
    ) -> Self {
        Self::new(
            drivers.sensors,
            drivers.actuators,
            drivers.clock,
            logger,
            params,
        )
    }
}

impl<S, A, C, L> CycleRunner<S, A, C, L>
where
    S: SensorDriver,
    A: ActuatorDriver,
    C: Clock,
    L: TickLogger,
{
    /// Create a runner in SEARCH.
    pub fn new(sensors: S, actuators: A, clock: C, logger: L, params: &ControlParams) -> Self {
        Self {
            sensors,
            actuators,
            clock,
            logger,
            perception: PerceptionAdapter::new(params.thresholds.max_range_cm),
            machine: StateMachine::new(params),
            tick_interval: params.tick_interval,
            stats: CycleStats::new(),
            last_command: MotorCommand::STOP,
            motors_idle: true,
        }
    }

    /// Current behavior state.
    #[inline]
    pub fn state(&self) -> RobotState {
        self.machine.state()
    }

    /// Statistics so far.
    #[inline]
    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    /// Sensor fault counters so far.
    #[inline]
    pub fn perception_faults(&self) -> PerceptionFaults {
        self.perception.faults()
    }

    /// The state machine (read-only).
    #[inline]
    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    /// Command currently applied to the motors.
    #[inline]
    pub fn last_command(&self) -> MotorCommand {
        self.last_command
    }

    /// The loop's time source.
    #[inline]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Run one tick.
    ///
    /// # Errors
    /// Returns [`CycleError::Actuator`] if a motor command fails. The state
    /// machine is still settled and the tick is still counted and logged,
    /// with `command` holding the last command that was applied.
    pub fn tick(&mut self) -> Result<TickEvent, CycleError> {
        let start = self.clock.now();
        let snapshot = self.perception.sample(&mut self.sensors);
        let before = self.machine.state();
        let decision = self.machine.step(&snapshot, start);
        let maneuver = decision.maneuver();

        let applied = self.apply(decision.action);

        let after = self.machine.state();
        let elapsed = self.clock.now().saturating_sub(start);
        self.stats.record(elapsed, self.tick_interval);
        if let Some(kind) = maneuver {
            self.stats.record_maneuver(kind);
        } else if before == RobotState::Approach && after == RobotState::Search {
            self.stats.lock_losses += 1;
        }

        let event = TickEvent {
            tick: self.stats.ticks - 1,
            timestamp: start,
            state: after,
            snapshot,
            error: decision.error,
            pid_output: decision.pid_output,
            command: self.last_command,
            maneuver,
        };
        self.trace_tick(&event);
        self.log_event(&event);
        applied.map(|()| event)
    }

    fn apply(&mut self, action: Action) -> Result<(), CycleError> {
        match action {
            Action::Drive(command) => {
                self.motors_idle = false;
                self.actuators.set_speeds(command.left, command.right)?;
                self.last_command = command;
            }
            Action::Stop => {
                self.actuators.stop()?;
                self.last_command = MotorCommand::STOP;
                self.motors_idle = true;
            }
            Action::Hold => {}
            Action::Maneuver(maneuver) => {
                info!(
                    "Executing {} ({} ms)",
                    maneuver.kind(),
                    maneuver.total_duration().as_millis()
                );
                self.motors_idle = false;
                let result = maneuver.execute(&mut self.actuators);
                self.machine.settle();
                result?;
                self.last_command = MotorCommand::STOP;
                self.motors_idle = true;
            }
        }
        Ok(())
    }

    fn trace_tick(&self, event: &TickEvent) {
        debug!(
            "tick {} {} L={:?} R={:?} cs=({:.1}, {:.1}) cmd=({:.1}, {:.1})",
            event.tick,
            event.state,
            event.snapshot.left_distance,
            event.snapshot.right_distance,
            event.snapshot.left_reflectance,
            event.snapshot.right_reflectance,
            event.command.left,
            event.command.right
        );
    }

    fn log_event(&mut self, event: &TickEvent) {
        if let Err(e) = self.logger.record(event) {
            self.stats.log_failures += 1;
            let n = self.stats.log_failures;
            if n == 1 || n % LOG_FAILURE_REPORT_EVERY == 0 {
                warn!("Tick log write failed ({n} so far): {e}");
            }
        }
    }

    /// Run until `running` clears or `max_ticks` ticks have executed.
    ///
    /// A cleared flag is noticed between ticks; a running maneuver always
    /// completes. Motors are stopped and the tick log flushed on every exit.
    ///
    /// # Errors
    /// The first actuator failure ends the loop and is returned after the
    /// stop attempt.
    pub fn run(&mut self, running: &AtomicBool, max_ticks: Option<u64>) -> Result<(), CycleError> {
        info!(
            "Control loop starting (tick interval {} ms)",
            self.tick_interval.as_millis()
        );
        let result = self.run_loop(running, max_ticks);
        if let Err(e) = &result {
            error!("Control loop aborted: {e}");
        }
        let stopped = self.shutdown();
        result.and(stopped)
    }

    fn run_loop(&mut self, running: &AtomicBool, max_ticks: Option<u64>) -> Result<(), CycleError> {
        while running.load(Ordering::SeqCst) {
            if max_ticks.is_some_and(|max| self.stats.ticks >= max) {
                info!("Tick limit {} reached", self.stats.ticks);
                break;
            }
            self.tick()?;
            self.clock.sleep(self.tick_interval);
        }
        Ok(())
    }

    /// Stop the motors and flush the tick log.
    ///
    /// # Errors
    /// Returns the stop failure; a flush failure is only reported.
    pub fn shutdown(&mut self) -> Result<(), CycleError> {
        let stopped = self.actuators.stop();
        if stopped.is_ok() {
            self.motors_idle = true;
            self.last_command = MotorCommand::STOP;
        }
        if let Err(e) = self.logger.flush() {
            warn!("Tick log flush failed: {e}");
        }
        info!("Motors stopped after {} ticks", self.stats.ticks);
        stopped.map_err(CycleError::from)
    }
}

impl<S, A, C, L> Drop for CycleRunner<S, A, C, L>
where
    S: SensorDriver,
    A: ActuatorDriver,
    C: Clock,
    L: TickLogger,
{
    fn drop(&mut self) {
        if !self.motors_idle {
            if let Err(e) = self.actuators.stop() {
                error!("Failed to stop motors on drop: {e}");
            }
        }
    }
}

impl<S, A, C, L> std::fmt::Debug for CycleRunner<S, A, C, L>
where
    S: SensorDriver,
    A: ActuatorDriver,
    C: Clock,
    L: TickLogger,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CycleRunner")
            .field("sensors", &self.sensors.name())
            .field("actuators", &self.actuators.name())
            .field("state", &self.machine.state())
            .field("ticks", &self.stats.ticks)
            .finish()
    }
}
