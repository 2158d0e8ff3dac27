//! Core domain models
//!
//! Configuration records, release steps and the release state machine.

pub mod config;
pub mod state;
pub mod step;

pub use config::{ApplicationConfig, Config, ConfigError, DeployConfig, PartConfig};
pub use state::*;
pub use step::*;
