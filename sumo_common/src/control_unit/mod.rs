//! Control unit data model and configuration.

pub mod config;
pub mod state;
