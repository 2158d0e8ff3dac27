//! Step outcome types

use thiserror::Error;

/// Why an external step did not succeed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepFailure {
    /// The program ran and exited with a nonzero status
    #[error("{program} exited with code {code}: {stderr}")]
    Exit {
        program: String,
        code: i32,
        stderr: String,
    },

    /// The program could not be started at all
    #[error("cannot launch {program}: {message}")]
    Launch { program: String, message: String },
}

impl StepFailure {
    /// Captured diagnostic text (stderr for exit errors, launch description otherwise)
    pub fn diagnostic(&self) -> &str {
        match self {
            StepFailure::Exit { stderr, .. } => stderr,
            StepFailure::Launch { message, .. } => message,
        }
    }

    pub fn program(&self) -> &str {
        match self {
            StepFailure::Exit { program, .. } | StepFailure::Launch { program, .. } => program,
        }
    }
}

/// Result of one external step: captured stdout on success
pub type StepOutcome = Result<String, StepFailure>;
