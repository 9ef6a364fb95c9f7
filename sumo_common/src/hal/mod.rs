//! Hardware abstraction: driver traits, port configuration and sensor sides.

pub mod config;
pub mod driver;
pub mod types;
