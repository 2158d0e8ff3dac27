//! External step runner
//!
//! Every tool this program drives (build commands, git, eb, pg_dump,
//! pg_restore) is treated the same way: an external command that exits 0 or not.

pub mod outcome;
pub mod process;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub use outcome::{StepFailure, StepOutcome};
pub use process::ProcessRunner;

/// Trait for running one external command - allows for mock implementations
///
/// A runner executes exactly once; retries are the caller's business.
#[async_trait]
pub trait StepRunner: Send + Sync {
    /// Run the invocation to completion and classify its outcome
    async fn run(&self, invocation: &Invocation) -> StepOutcome;
}

/// A fully described external command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    /// Program name or path
    pub program: String,

    /// Ordered argument list
    pub args: Vec<String>,

    /// Working directory of the child (None = inherit)
    pub work_dir: Option<PathBuf>,

    /// Environment overrides applied to the child only
    pub env: Vec<(String, String)>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    pub fn args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.args.extend(args);
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.work_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((name.into(), value.into()));
        self
    }

    pub fn envs<I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.env.extend(vars);
        self
    }

    /// Program and arguments joined for display
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
