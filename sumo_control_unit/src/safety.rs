//! Safety module root.
//!
//! Ring edge detection and the scripted escape maneuvers it triggers.

pub mod edge;
pub mod maneuver;
