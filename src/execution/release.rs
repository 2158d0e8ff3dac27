//! Release pipeline - assemble the distribution tree and ship it
//!
//! Strictly sequential. Each stage aborts the run on failure, and nothing
//! already done is rolled back.

use crate::{
    core::{release_steps, DeployConfig, ReleaseReport, ReleaseState, DEFAULT_EXECUTABLE},
    execution::{DeployEvent, EventSink},
    operator::{Operator, PromptError},
    runner::{Invocation, StepFailure, StepRunner},
    sync::{self, SyncError, SyncStats},
};
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{debug, warn};
use uuid::Uuid;

/// Label preceding the deployed version in `eb status` output
pub const PLATFORM_VERSION_LABEL: &str = "Deployed Version:";

pub const VERSION_PROMPT: &str = "Version identifier";
pub const COMMENT_PROMPT: &str = "Comment";

#[derive(Debug, Error)]
pub enum ReleaseError {
    #[error("cannot assemble the distribution tree: {0}")]
    Sync(#[from] SyncError),

    #[error("distribution sync task aborted: {0}")]
    SyncTask(String),

    #[error(transparent)]
    Input(#[from] PromptError),

    #[error("release step {index} ({label}) failed: {failure}")]
    Step {
        /// One-based position in the release sequence
        index: usize,
        label: String,
        #[source]
        failure: StepFailure,
    },

    #[error("this release pipeline has already run ({0})")]
    AlreadyRun(ReleaseState),
}

/// One release run
///
/// A pipeline value is used for a single run; a failed run leaves it in
/// `ReleaseState::Failed` and must be restarted with a new pipeline.
pub struct ReleasePipeline<'a, R, O> {
    runner: Arc<R>,
    operator: &'a mut O,
    events: EventSink,
    state: ReleaseState,
}

impl<'a, R: StepRunner, O: Operator> ReleasePipeline<'a, R, O> {
    pub fn new(runner: Arc<R>, operator: &'a mut O, events: EventSink) -> Self {
        Self {
            runner,
            operator,
            events,
            state: ReleaseState::Idle,
        }
    }

    pub fn state(&self) -> &ReleaseState {
        &self.state
    }

    /// Run the whole release for `cfg`
    ///
    /// Only an `Idle` pipeline can run; any later call is refused and leaves
    /// the state untouched.
    pub async fn release(&mut self, cfg: &DeployConfig) -> Result<ReleaseReport, ReleaseError> {
        if self.state != ReleaseState::Idle {
            warn!("Refusing to rerun a release pipeline in state {}", self.state);
            return Err(ReleaseError::AlreadyRun(self.state.clone()));
        }

        match self.run_stages(cfg).await {
            Ok(report) => {
                self.advance(ReleaseState::Done);
                Ok(report)
            }
            Err(err) => {
                warn!("Release failed during {}: {}", self.state, err);
                let at = Box::new(self.state.clone());
                self.advance(ReleaseState::Failed {
                    at,
                    diagnostic: err.to_string(),
                });
                Err(err)
            }
        }
    }

    async fn run_stages(&mut self, cfg: &DeployConfig) -> Result<ReleaseReport, ReleaseError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let work_dir = Path::new(&cfg.path);
        debug!("Starting release {} in {}", run_id, work_dir.display());

        self.advance(ReleaseState::Syncing);
        let stats = self.assemble(cfg).await?;

        self.advance(ReleaseState::QueryingVersions);
        let platform_version = self.platform_version(work_dir).await;
        let vcs_version = self.vcs_version(work_dir).await;
        self.events.emit(DeployEvent::VersionsQueried {
            platform: platform_version.clone(),
            vcs: vcs_version.clone(),
        });

        self.advance(ReleaseState::AwaitingInput);
        let version = self.ask(VERSION_PROMPT)?;
        let comment = self.ask(COMMENT_PROMPT)?;

        let executable = cfg.app_source.as_deref().unwrap_or(DEFAULT_EXECUTABLE);
        let steps = release_steps(&version, &comment, executable);
        for (i, step) in steps.iter().enumerate() {
            self.advance(ReleaseState::Stepping(i));
            let index = i + 1;
            self.events.emit(DeployEvent::StepStarted {
                index,
                label: step.label.clone(),
            });

            match self.runner.run(&step.invocation(work_dir)).await {
                Ok(output) => self.events.emit(DeployEvent::StepCompleted {
                    index,
                    label: step.label.clone(),
                    output,
                }),
                Err(failure) => {
                    self.events.emit(DeployEvent::StepFailed {
                        index,
                        label: step.label.clone(),
                        error: failure.to_string(),
                    });
                    return Err(ReleaseError::Step {
                        index,
                        label: step.label.clone(),
                        failure,
                    });
                }
            }
        }

        self.events.emit(DeployEvent::ReleaseCompleted {
            version: version.clone(),
        });
        debug!("Release {} shipped version {}", run_id, version);

        Ok(ReleaseReport {
            run_id,
            version,
            comment,
            platform_version,
            vcs_version,
            files_synced: stats.files,
            steps_completed: steps.len(),
            started_at,
            completed_at: Utc::now(),
        })
    }

    /// Rebuild the distribution tree off the async executor
    async fn assemble(&self, cfg: &DeployConfig) -> Result<SyncStats, ReleaseError> {
        let source = cfg.dist_source();
        let dest = cfg.dist_destination();
        self.events.emit(DeployEvent::SyncStarted {
            source: source.clone(),
            dest: dest.clone(),
        });

        let stats = tokio::task::spawn_blocking(move || sync::sync(&source, &dest))
            .await
            .map_err(|e| ReleaseError::SyncTask(e.to_string()))??;

        self.events.emit(DeployEvent::SyncCompleted {
            files: stats.files,
            directories: stats.directories,
        });
        Ok(stats)
    }

    async fn platform_version(&self, work_dir: &Path) -> String {
        let query = Invocation::new("eb").arg("status").current_dir(work_dir);
        match self.runner.run(&query).await {
            Ok(output) => parse_platform_version(&output),
            Err(e) => {
                debug!("Platform version query failed: {}", e);
                String::new()
            }
        }
    }

    async fn vcs_version(&self, work_dir: &Path) -> String {
        let query = Invocation::new("git").arg("describe").current_dir(work_dir);
        match self.runner.run(&query).await {
            Ok(output) => output.trim_end_matches(['\r', '\n']).to_string(),
            Err(e) => {
                debug!("Source control version query failed: {}", e);
                String::new()
            }
        }
    }

    /// Operator answers are blocking reads; on a multi-threaded runtime the
    /// worker is handed over to the blocking pool while waiting
    fn ask(&mut self, label: &str) -> Result<String, PromptError> {
        let operator = &mut *self.operator;
        match Handle::try_current().map(|h| h.runtime_flavor()) {
            Ok(RuntimeFlavor::MultiThread) => {
                tokio::task::block_in_place(|| operator.ask(label))
            }
            _ => operator.ask(label),
        }
    }

    fn advance(&mut self, next: ReleaseState) {
        debug_assert!(
            self.state.can_advance_to(&next),
            "illegal release transition {} -> {}",
            self.state,
            next
        );
        debug!("Release state: {} -> {}", self.state, next);
        self.state = next;
    }
}

/// Token following `Deployed Version:` up to the next line break or end of output
///
/// Returns an empty string when the label is absent.
pub fn parse_platform_version(output: &str) -> String {
    let Some(idx) = output.find(PLATFORM_VERSION_LABEL) else {
        return String::new();
    };
    let rest = &output[idx + PLATFORM_VERSION_LABEL.len()..];
    let line = rest.split('\n').next().unwrap_or_default();
    line.trim().to_string()
}
