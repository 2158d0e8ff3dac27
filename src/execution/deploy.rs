//! Deploy orchestrator - build, then release

use crate::{
    core::{Config, ConfigError, ReleaseReport},
    execution::{BuildError, BuildStage, DeployEvent, EventSink, ReleaseError, ReleasePipeline},
    operator::Operator,
    runner::StepRunner,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DeployError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Release(#[from] ReleaseError),
}

/// Parts to leave out of this run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipParts {
    pub backend: bool,
    pub frontend: bool,
}

/// Top-level entry point of the deploy command
pub struct Deployer<R, O> {
    runner: Arc<R>,
    operator: O,
    events: EventSink,
}

impl<R: StepRunner + 'static, O: Operator> Deployer<R, O> {
    pub fn new(runner: R, operator: O) -> Self {
        Self {
            runner: Arc::new(runner),
            operator,
            events: EventSink::new(),
        }
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(&DeployEvent) + Send + Sync + 'static,
    {
        self.events.add_handler(handler);
    }

    pub fn operator(&self) -> &O {
        &self.operator
    }

    /// Resolve `name`, check its configuration, build it and release it
    ///
    /// The configuration is checked before any process is spawned; the
    /// release only starts when the build stage succeeded.
    pub async fn deploy(
        &mut self,
        config: &Config,
        name: &str,
        skip: SkipParts,
    ) -> Result<ReleaseReport, DeployError> {
        let app = config.application(name)?.prepare(skip.backend, skip.frontend);
        app.validate_deploy()?;

        debug!("Deploying {}", app.name);
        self.events.emit(DeployEvent::DeployStarted {
            application: app.name.clone(),
        });

        BuildStage::new(self.runner.clone(), self.events.clone())
            .build_all(&app.backend, &app.frontend)
            .await?;

        let report = ReleasePipeline::new(self.runner.clone(), &mut self.operator, self.events.clone())
            .release(&app.deploy)
            .await?;

        Ok(report)
    }
}
