//! Sumo Common Library
//!
//! Shared types, driver interfaces and configuration loading for all crates
//! of the sumo robot workspace.
//!
//! # Module Structure
//!
//! - [`hal`] - Driver traits, sensor sides and port configuration
//! - [`control_unit`] - Robot state, perception snapshot, tick events and control configuration
//! - [`clock`] - Monotonic and virtual clocks
//! - [`config`] - Configuration loading traits and the top-level [`config::SumoConfig`]
//! - [`consts`] - Defaults and limits
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use sumo_common::prelude::*;
//!
//! let snapshot = PerceptionSnapshot::new(Some(0.0), Some(12.0), 5.0, 5.0, None);
//! assert_eq!(snapshot.center_distance, Some(6.0));
//! ```

pub mod clock;
pub mod config;
pub mod consts;
pub mod control_unit;
pub mod hal;
pub mod prelude;
