//! Perception adapter.
//!
//! The only place the control loop touches sensor drivers. Each sensor is
//! read exactly once per sample; there are no retries. Raw readings become a
//! [`PerceptionSnapshot`]:
//!
//! | Channel | Failure or implausible value | Result |
//! |---------|------------------------------|--------|
//! | distance | error, NaN/inf, negative, ≥ max range | `None` |
//! | reflectance | error, NaN/inf | 100.0 (reads as border) |
//! | contact | error | `None` |

use sumo_common::consts::{REFLECTANCE_MAX, REFLECTANCE_MIN};
use sumo_common::control_unit::state::PerceptionSnapshot;
use sumo_common::hal::driver::SensorDriver;
use sumo_common::hal::types::Side;
use tracing::{debug, warn};

/// Reflectance substituted for a failed read.
pub const FAILSAFE_REFLECTANCE: f64 = REFLECTANCE_MAX;

/// Read counters, for shutdown statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerceptionFaults {
    /// Distance reads that errored.
    pub distance_errors: u64,
    /// Reflectance reads that errored or were not finite.
    pub reflectance_errors: u64,
    /// Contact reads that errored.
    pub contact_errors: u64,
}

/// Turns raw sensor reads into one snapshot per tick.
#[derive(Debug, Clone)]
pub struct PerceptionAdapter {
    max_range_cm: f64,
    faults: PerceptionFaults,
}

impl PerceptionAdapter {
    /// Create an adapter treating readings at or above `max_range_cm` as no echo.
    pub fn new(max_range_cm: f64) -> Self {
        Self {
            max_range_cm,
            faults: PerceptionFaults::default(),
        }
    }

    /// Fault counters so far.
    #[inline]
    pub fn faults(&self) -> PerceptionFaults {
        self.faults
    }

    /// Read every sensor once.
    pub fn sample<S: SensorDriver + ?Sized>(&mut self, sensors: &mut S) -> PerceptionSnapshot {
        let left_distance = self.distance(sensors, Side::Left);
        let right_distance = self.distance(sensors, Side::Right);
        let left_reflectance = self.reflectance(sensors, Side::Left);
        let right_reflectance = self.reflectance(sensors, Side::Right);
        let contact = self.contact(sensors);
        PerceptionSnapshot::new(
            left_distance,
            right_distance,
            left_reflectance,
            right_reflectance,
            contact,
        )
    }

    fn distance<S: SensorDriver + ?Sized>(&mut self, sensors: &mut S, side: Side) -> Option<f64> {
        match sensors.read_distance(side) {
            Ok(Some(cm)) if cm.is_finite() && cm >= 0.0 && cm < self.max_range_cm => Some(cm),
            Ok(Some(cm)) => {
                debug!("{side} distance {cm} out of range, no echo");
                None
            }
            Ok(None) => None,
            Err(e) => {
                self.faults.distance_errors += 1;
                debug!("{side} distance read failed: {e}");
                None
            }
        }
    }

    fn reflectance<S: SensorDriver + ?Sized>(&mut self, sensors: &mut S, side: Side) -> f64 {
        match sensors.read_reflectance(side) {
            Ok(value) if value.is_finite() => value.clamp(REFLECTANCE_MIN, REFLECTANCE_MAX),
            Ok(value) => {
                self.faults.reflectance_errors += 1;
                warn!("{side} reflectance {value} is not a reading, assuming border");
                FAILSAFE_REFLECTANCE
            }
            Err(e) => {
                self.faults.reflectance_errors += 1;
                warn!("{side} reflectance read failed, assuming border: {e}");
                FAILSAFE_REFLECTANCE
            }
        }
    }

    fn contact<S: SensorDriver + ?Sized>(&mut self, sensors: &mut S) -> Option<bool> {
        match sensors.is_contact_pressed() {
            Ok(pressed) => pressed,
            Err(e) => {
                self.faults.contact_errors += 1;
                debug!("contact read failed: {e}");
                None
            }
        }
    }
}
