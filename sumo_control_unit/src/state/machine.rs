//! Behavior state machine: SEARCH → LOCKON → APPROACH → PUSH, with RECOVER
//! for the scripted escapes.
//!
//! Checked in this order every tick:
//!
//! 1. Edge override (any state): escape maneuver, then SEARCH.
//! 2. SEARCH: spin; opponent inside detection range → LOCKON.
//! 3. LOCKON: aligned → APPROACH; otherwise turn toward the closer side;
//!    one side lost → forward nudge, then SEARCH.
//! 4. APPROACH: PID steering; close enough or bumper pressed → PUSH;
//!    one side lost → stop, SEARCH.
//! 5. PUSH: full speed; timeout → stall backoff, then SEARCH.
//!
//! [`StateMachine::step`] only decides. The caller executes the returned
//! [`Action`] and, after a maneuver, calls [`StateMachine::settle`] to commit
//! the post-maneuver state within the same tick.

use std::time::Duration;

use sumo_common::control_unit::state::{ManeuverKind, MotorCommand, PerceptionSnapshot, RobotState};
use tracing::{debug, info};

use crate::config::ControlParams;
use crate::control::mixer::{mix, steering_error};
use crate::control::pid::PidController;
use crate::safety::edge::EdgeMonitor;
use crate::safety::maneuver::{Maneuver, ManeuverPlan};

/// What the caller must do with the actuators this tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Set continuous motor speeds.
    Drive(MotorCommand),
    /// Stop both motors.
    Stop,
    /// Leave the motors as they are.
    Hold,
    /// Execute a blocking maneuver, then call `settle()`.
    Maneuver(Maneuver),
}

/// Outcome of one `step`.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    /// Actuator action.
    pub action: Action,
    /// Steering error fed to the PID (0 outside APPROACH).
    pub error: f64,
    /// PID output (0 outside APPROACH).
    pub pid_output: f64,
}

impl Decision {
    fn action(action: Action) -> Self {
        Self {
            action,
            error: 0.0,
            pid_output: 0.0,
        }
    }

    /// Kind of maneuver requested, if any.
    pub fn maneuver(&self) -> Option<ManeuverKind> {
        match &self.action {
            Action::Maneuver(m) => Some(m.kind()),
            _ => None,
        }
    }
}

/// The robot's behavior state machine.
///
/// Owns the PID controller and the push timer; nothing else mutates them.
#[derive(Debug, Clone)]
pub struct StateMachine {
    state: RobotState,
    pid: PidController,
    edge: EdgeMonitor,
    plan: ManeuverPlan,
    params: ControlParams,
    push_started: Option<Duration>,
    /// State to commit once the running maneuver has finished.
    after_maneuver: Option<RobotState>,
}

impl StateMachine {
    /// Create a machine in SEARCH.
    pub fn new(params: &ControlParams) -> Self {
        Self {
            state: RobotState::Search,
            pid: PidController::from_config(&params.pid),
            edge: EdgeMonitor::new(params.thresholds.edge_reflectance),
            plan: ManeuverPlan::new(&params.speeds, &params.timing),
            params: params.clone(),
            push_started: None,
            after_maneuver: None,
        }
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> RobotState {
        self.state
    }

    /// When the current push started, if pushing.
    #[inline]
    pub fn push_started(&self) -> Option<Duration> {
        self.push_started
    }

    /// Steering controller (read-only).
    #[inline]
    pub fn pid(&self) -> &PidController {
        &self.pid
    }

    /// Edge monitor in use.
    #[inline]
    pub fn edge_monitor(&self) -> &EdgeMonitor {
        &self.edge
    }

    /// Whether a maneuver was requested and not yet settled.
    #[inline]
    pub fn maneuver_pending(&self) -> bool {
        self.after_maneuver.is_some()
    }

    fn transition(&mut self, next: RobotState) {
        if self.state != next {
            info!("{} -> {}", self.state, next);
            if self.state == RobotState::Push {
                self.push_started = None;
            }
            self.state = next;
        }
    }

    /// Commit the state that follows a finished maneuver.
    ///
    /// Escapes and the nudge all end in SEARCH; the escapes also reset the
    /// PID. No-op when nothing is pending.
    pub fn settle(&mut self) {
        if let Some(next) = self.after_maneuver.take() {
            if self.state == RobotState::Recover {
                self.pid.reset();
            }
            self.transition(next);
        }
    }

    /// Decide this tick's action from `snapshot` taken at clock time `now`.
    pub fn step(&mut self, snapshot: &PerceptionSnapshot, now: Duration) -> Decision {
        self.settle();

        if self.edge.is_edge(snapshot) {
            return self.edge_override(snapshot);
        }

        match self.state {
            RobotState::Search => self.search(snapshot),
            RobotState::Lockon => self.lockon(snapshot),
            RobotState::Approach => self.approach(snapshot, now),
            RobotState::Push => self.push(now),
            // Recover never outlives a tick; treat a stray one as SEARCH.
            RobotState::Recover => {
                self.transition(RobotState::Search);
                self.search(snapshot)
            }
        }
    }

    fn start_maneuver(&mut self, maneuver: Maneuver, during: RobotState) -> Decision {
        self.transition(during);
        self.after_maneuver = Some(RobotState::Search);
        Decision::action(Action::Maneuver(maneuver))
    }

    fn edge_override(&mut self, snapshot: &PerceptionSnapshot) -> Decision {
        let turn = self.edge.escape_turn(snapshot);
        info!(
            "Edge detected in {} (reflectance {:.1}/{:.1}), escaping toward {}",
            self.state, snapshot.left_reflectance, snapshot.right_reflectance, turn
        );
        let maneuver = self.plan.edge_escape(turn);
        self.start_maneuver(maneuver, RobotState::Recover)
    }

    fn search(&mut self, snapshot: &PerceptionSnapshot) -> Decision {
        let detect = self.params.thresholds.detect_cm;
        let seen = [snapshot.left_distance, snapshot.right_distance]
            .into_iter()
            .flatten()
            .any(|d| d < detect);
        if seen {
            self.transition(RobotState::Lockon);
            self.pid.reset();
            return Decision::action(Action::Stop);
        }
        Decision::action(Action::Drive(MotorCommand::spin(self.params.speeds.search)))
    }

    fn lockon(&mut self, snapshot: &PerceptionSnapshot) -> Decision {
        let Some((left, right)) = snapshot.both_distances() else {
            debug!("Lock-on lost one side, nudging forward");
            let nudge = self.plan.reacquire_nudge();
            return self.start_maneuver(nudge, RobotState::Lockon);
        };

        if (left - right).abs() < self.params.thresholds.align_tolerance_cm {
            self.transition(RobotState::Approach);
            self.pid.reset();
            return Decision::action(Action::Hold);
        }

        let speed = self.params.speeds.lockon;
        let command = if left < right {
            MotorCommand::spin(-speed)
        } else {
            MotorCommand::spin(speed)
        };
        Decision::action(Action::Drive(command))
    }

    fn approach(&mut self, snapshot: &PerceptionSnapshot, now: Duration) -> Decision {
        let Some((left, right)) = snapshot.both_distances() else {
            info!("Lock lost during approach");
            self.transition(RobotState::Search);
            self.pid.reset();
            return Decision::action(Action::Stop);
        };

        let error = steering_error(left, right);
        let pid_output = self.pid.compute(error, now);
        let command = mix(self.params.speeds.approach, pid_output);

        let close = snapshot
            .center_distance
            .is_some_and(|c| c <= self.params.thresholds.push_cm);
        if close || snapshot.contact_pressed() {
            self.transition(RobotState::Push);
            self.push_started = Some(now);
        }

        Decision {
            action: Action::Drive(command),
            error,
            pid_output,
        }
    }

    fn push(&mut self, now: Duration) -> Decision {
        let started = *self.push_started.get_or_insert(now);
        let elapsed = now.saturating_sub(started);
        if elapsed > self.params.push_timeout {
            info!("Push stalled after {} ms, backing off", elapsed.as_millis());
            let backoff = self.plan.stall_backoff();
            return self.start_maneuver(backoff, RobotState::Recover);
        }
        Decision::action(Action::Drive(MotorCommand::straight(self.params.speeds.push)))
    }
}
