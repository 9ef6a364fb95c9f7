//! Drive mixer and steering error.

use sumo_common::control_unit::state::MotorCommand;

/// Split a base speed and a steering correction into left/right commands.
///
/// `left = base − correction`, `right = base + correction`, each clamped on
/// its own: a large correction near full speed saturates one side instead of
/// reversing it.
#[inline]
pub fn mix(base: f64, correction: f64) -> MotorCommand {
    MotorCommand::new(base - correction, base + correction)
}

/// Normalized steering error from the two distances.
///
/// Positive when the right reading is the larger one; bounded to [-1, 1]
/// for non-negative readings. The denominator is floored at 1 so two
/// near-zero readings do not amplify noise.
#[inline]
pub fn steering_error(left: f64, right: f64) -> f64 {
    (right - left) / (right + left).max(1.0)
}
