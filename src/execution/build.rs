//! Concurrent build stage - backend and frontend builds side by side

use crate::{
    core::PartConfig,
    execution::{DeployEvent, EventSink, Part},
    runner::{Invocation, StepFailure, StepOutcome, StepRunner},
};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::debug;

/// A part's build failed
#[derive(Debug, Clone, Error)]
#[error("{part} build failed: {failure}")]
pub struct BuildError {
    pub part: Part,
    #[source]
    pub failure: StepFailure,
}

/// Runs the backend and frontend builds concurrently
///
/// Both builds always run to completion before any outcome is looked at.
/// A backend failure takes precedence over a frontend failure, whichever
/// process finished first.
pub struct BuildStage<R> {
    runner: Arc<R>,
    events: EventSink,
}

impl<R: StepRunner + 'static> BuildStage<R> {
    pub fn new(runner: Arc<R>, events: EventSink) -> Self {
        Self { runner, events }
    }

    pub async fn build_all(
        &self,
        backend: &PartConfig,
        frontend: &PartConfig,
    ) -> Result<(), BuildError> {
        let parts = [(Part::Backend, backend), (Part::Frontend, frontend)];

        let active: Vec<Part> = parts
            .iter()
            .filter(|(_, cfg)| !cfg.skip)
            .map(|(part, _)| *part)
            .collect();
        debug!("Build stage starting for {:?}", active);
        self.events.emit(DeployEvent::BuildStageStarted {
            parts: active.clone(),
        });

        for (part, cfg) in &parts {
            if cfg.skip {
                self.events.emit(DeployEvent::PartSkipped { part: *part });
            } else {
                self.events.emit(DeployEvent::PartStarted {
                    part: *part,
                    label: cfg.label.clone(),
                });
            }
        }

        let receivers = parts.map(|(part, cfg)| self.launch(part, cfg));

        // Fixed-size slots, filled only once both units have reported
        let [backend_rx, frontend_rx] = receivers;
        let (backend_outcome, frontend_outcome) =
            tokio::join!(Self::collect(backend_rx), Self::collect(frontend_rx));
        let slots = [
            (Part::Backend, backend_outcome),
            (Part::Frontend, frontend_outcome),
        ];
        debug!("Build stage joined both units");
        self.events.emit(DeployEvent::BuildStageFinished);

        for (part, outcome) in &slots {
            match outcome {
                Some(Ok(output)) => self.events.emit(DeployEvent::PartSucceeded {
                    part: *part,
                    output: output.clone(),
                }),
                Some(Err(failure)) => self.events.emit(DeployEvent::PartFailed {
                    part: *part,
                    error: failure.to_string(),
                }),
                None => {}
            }
        }

        for (part, outcome) in slots {
            if let Some(Err(failure)) = outcome {
                return Err(BuildError { part, failure });
            }
        }
        debug!("Build stage succeeded");
        Ok(())
    }

    /// Start one build unit; `None` when the part is skipped
    fn launch(&self, part: Part, cfg: &PartConfig) -> Option<oneshot::Receiver<StepOutcome>> {
        if cfg.skip {
            debug!("Skipping {} build", part);
            return None;
        }

        let invocation = Invocation::new(&cfg.command)
            .args(cfg.args.iter().cloned())
            .envs(cfg.env_pairs())
            .current_dir(&cfg.path);
        let runner = self.runner.clone();
        let (tx, rx) = oneshot::channel();

        debug!("Launching {} build: {}", part, invocation.command_line());
        tokio::spawn(async move {
            let outcome = runner.run(&invocation).await;
            // The stage always waits, so the receiver is still there
            let _ = tx.send(outcome);
        });

        Some(rx)
    }

    /// Wait for a unit's single value; a skipped unit has none
    async fn collect(rx: Option<oneshot::Receiver<StepOutcome>>) -> Option<StepOutcome> {
        let rx = rx?;
        Some(rx.await.unwrap_or_else(|_| {
            Err(StepFailure::Launch {
                program: "build task".to_string(),
                message: "ended without reporting an outcome".to_string(),
            })
        }))
    }
}
