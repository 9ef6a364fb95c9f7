//! Ring edge detection.
//!
//! Stateless threshold check on both reflectance readings. Evaluated first in
//! every tick, before any behavior logic.

use sumo_common::control_unit::state::PerceptionSnapshot;
use sumo_common::hal::types::Side;

/// Edge monitor holding the white-border threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeMonitor {
    threshold: f64,
}

impl EdgeMonitor {
    /// Create a monitor tripping at `threshold` reflectance or above.
    pub const fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Configured threshold.
    #[inline]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// True when either color sensor sees the border.
    #[inline]
    pub fn is_edge(&self, snapshot: &PerceptionSnapshot) -> bool {
        snapshot.left_reflectance >= self.threshold || snapshot.right_reflectance >= self.threshold
    }

    /// Side triggering the edge: the brighter reading. Ties count as left.
    #[inline]
    pub fn trigger_side(&self, snapshot: &PerceptionSnapshot) -> Side {
        if snapshot.right_reflectance > snapshot.left_reflectance {
            Side::Right
        } else {
            Side::Left
        }
    }

    /// Direction to turn away from the edge.
    ///
    /// Equal readings turn right, the same way as the default rotate.
    #[inline]
    pub fn escape_turn(&self, snapshot: &PerceptionSnapshot) -> Side {
        self.trigger_side(snapshot).opposite()
    }
}
