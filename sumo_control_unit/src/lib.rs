//! # Sumo Control Unit Library
//!
//! Control brain of an autonomous mini-sumo robot: two front ultrasonic
//! sensors find the opponent, two downward color sensors watch for the white
//! ring border, and a tank drive is steered by a small state machine.
//!
//! ## Behavior
//!
//! 1. **SEARCH**: spin in place until something is inside detection range
//! 2. **LOCKON**: turn until both sensors report the same distance
//! 3. **APPROACH**: drive in under PID steering on the left/right imbalance
//! 4. **PUSH**: full power until the opponent is out or the push stalls
//! 5. **RECOVER**: scripted escape maneuver, then back to SEARCH
//!
//! The edge check overrides every state and always runs first.
//!
//! ## Loop
//!
//! One thread, one tick at a time: sample all sensors once, decide, command
//! the motors, log the tick. Escape maneuvers block inside their tick.
//! Hardware is reached only through the traits in
//! `sumo_common::hal::driver`, so the same loop drives the EV3 and the
//! simulator.

pub mod config;
pub mod control;
pub mod cycle;
pub mod perception;
pub mod safety;
pub mod state;
pub mod tick_log;
