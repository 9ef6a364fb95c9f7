//! Control engine root.
//!
//! PID steering controller and the drive mixer that turns a base speed plus
//! a correction into motor commands.

pub mod mixer;
pub mod pid;
