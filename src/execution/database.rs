//! Database tasks - pg_dump / pg_restore driven as opaque external steps

use crate::{
    core::{config::DatabaseConfig, ApplicationConfig, Config, ConfigError},
    execution::{DeployEvent, EventSink},
    runner::{Invocation, StepFailure, StepRunner},
};
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Marker in pg_restore diagnostics that makes a restore fatal
const FATAL_MARKER: &str = "FATAL";

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot handle the temporary dump file: {0}")]
    TempFile(#[source] io::Error),

    #[error("database dump failed: {0}")]
    Dump(#[source] StepFailure),

    #[error("database restore failed: {0}")]
    Restore(#[source] StepFailure),
}

/// How to treat a nonzero pg_restore exit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RestorePolicy {
    /// Every failure is fatal
    Strict,
    /// Exit errors are warnings unless stderr reports a FATAL condition
    TolerateWarnings,
}

pub struct DatabaseTasks<R> {
    runner: R,
    events: EventSink,
    pg_dump: String,
    pg_restore: String,
}

impl<R: StepRunner> DatabaseTasks<R> {
    pub fn new(runner: R, config: &Config) -> Self {
        Self {
            runner,
            events: EventSink::new(),
            pg_dump: config.pg_tool("pg_dump"),
            pg_restore: config.pg_tool("pg_restore"),
        }
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(&DeployEvent) + Send + Sync + 'static,
    {
        self.events.add_handler(handler);
    }

    /// Copy the remote database into the local one through a temporary dump
    pub async fn copy_remote_to_local(&self, app: &ApplicationConfig) -> Result<(), DatabaseError> {
        let (remote, local) = app.validate_databases()?;

        // Removed when dropped, on every exit path
        let dump = tempfile::Builder::new()
            .prefix("db.")
            .suffix(".dump")
            .tempfile()
            .map_err(DatabaseError::TempFile)?
            .into_temp_path();

        debug!("Copying remote database of {} into local database", app.name);
        self.dump(remote, &dump, "Dumping remote database", "Dump finished")
            .await?;
        self.restore(
            local,
            &dump,
            RestorePolicy::TolerateWarnings,
            "Restoring local database",
            "Restore finished",
        )
        .await?;

        dump.close().map_err(DatabaseError::TempFile)
    }

    /// Dump the local database into the test snapshot file
    pub async fn save_test_snapshot(&self, app: &ApplicationConfig) -> Result<(), DatabaseError> {
        let (local, repo) = app.validate_test_snapshot()?;

        self.dump(local, Path::new(repo), "Dumping local database", "Dump finished")
            .await
    }

    /// Restore the local database from the test snapshot file
    pub async fn restore_test_snapshot(
        &self,
        app: &ApplicationConfig,
    ) -> Result<(), DatabaseError> {
        let (local, repo) = app.validate_test_snapshot()?;

        self.restore(
            local,
            Path::new(repo),
            RestorePolicy::Strict,
            "Restoring from the test snapshot",
            "Restore finished",
        )
        .await
    }

    async fn dump(
        &self,
        db: &DatabaseConfig,
        file: &Path,
        label: &str,
        done: &str,
    ) -> Result<(), DatabaseError> {
        self.events.emit(DeployEvent::TaskStarted {
            label: label.to_string(),
        });
        let invocation = Invocation::new(&self.pg_dump)
            .arg("-d")
            .arg(db.connection_url())
            .arg("-Fc")
            .arg("-f")
            .arg(file.to_string_lossy());

        let output = self
            .runner
            .run(&invocation)
            .await
            .map_err(DatabaseError::Dump)?;
        self.report_output(output, done);
        Ok(())
    }

    async fn restore(
        &self,
        db: &DatabaseConfig,
        file: &Path,
        policy: RestorePolicy,
        label: &str,
        done: &str,
    ) -> Result<(), DatabaseError> {
        self.events.emit(DeployEvent::TaskStarted {
            label: label.to_string(),
        });
        let invocation = Invocation::new(&self.pg_restore)
            .arg("-d")
            .arg(db.connection_url())
            .arg("-cO")
            .arg(file.to_string_lossy());

        match self.runner.run(&invocation).await {
            Ok(output) => {
                self.report_output(output, done);
                Ok(())
            }
            Err(StepFailure::Exit { stderr, .. })
                if policy == RestorePolicy::TolerateWarnings && !stderr.contains(FATAL_MARKER) =>
            {
                warn!("pg_restore reported non-fatal errors");
                self.events.emit(DeployEvent::TaskWarning { message: stderr });
                self.report_output(String::new(), done);
                Ok(())
            }
            Err(failure) => Err(DatabaseError::Restore(failure)),
        }
    }

    fn report_output(&self, output: String, done: &str) {
        let output = if output.is_empty() {
            done.to_string()
        } else {
            output
        };
        self.events.emit(DeployEvent::TaskOutput { output });
    }
}
