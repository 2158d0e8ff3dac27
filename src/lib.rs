//! fsd - build, assemble and ship full-stack applications

pub mod cli;
pub mod core;
pub mod execution;
pub mod operator;
pub mod runner;
pub mod sync;

// Re-export commonly used types
pub use crate::core::{ApplicationConfig, Config, ConfigError, PipelineStep, ReleaseReport, ReleaseState};
pub use crate::execution::{BuildStage, DeployError, DeployEvent, Deployer, ReleasePipeline, SkipParts};
pub use crate::operator::{ConsoleOperator, Operator, PromptError};
pub use crate::runner::{Invocation, ProcessRunner, StepFailure, StepOutcome, StepRunner};
pub use crate::sync::{sync, SyncError, SyncStats};
