//! Deployment execution: build stage, release pipeline, orchestrator, database tasks

pub mod build;
pub mod database;
pub mod deploy;
pub mod events;
pub mod release;

pub use build::{BuildError, BuildStage};
pub use database::{DatabaseError, DatabaseTasks};
pub use deploy::{DeployError, Deployer, SkipParts};
pub use events::{DeployEvent, EventHandler, EventSink, Part};
pub use release::{parse_platform_version, ReleaseError, ReleasePipeline};
