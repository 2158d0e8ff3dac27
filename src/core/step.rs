//! Release step model

use std::path::Path;

use crate::runner::Invocation;

/// Index path marked executable when the configuration names none
pub const DEFAULT_EXECUTABLE: &str = "bin/application";

/// One external command of the release sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStep {
    /// Short label used in messages ("git commit", "eb deploy", ...)
    pub label: String,

    /// Program name
    pub program: String,

    /// Arguments, with version and comment already substituted
    pub args: Vec<String>,
}

impl PipelineStep {
    pub fn new(program: &str, args: &[&str]) -> Self {
        let label = match args.first() {
            Some(action) => format!("{} {}", program, action),
            None => program.to_string(),
        };
        Self {
            label,
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Invocation of this step inside `work_dir`
    pub fn invocation(&self, work_dir: &Path) -> Invocation {
        Invocation::new(&self.program)
            .args(self.args.iter().cloned())
            .current_dir(work_dir)
    }
}

/// The fixed release sequence: stage, mark executable, commit, tag, deploy
pub fn release_steps(version: &str, comment: &str, executable: &str) -> Vec<PipelineStep> {
    vec![
        PipelineStep::new("git", &["add", "."]),
        PipelineStep::new("git", &["update-index", "--chmod=+x", executable]),
        PipelineStep::new("git", &["commit", "-m", comment]),
        PipelineStep::new("git", &["tag", "-a", version, "-m", comment]),
        PipelineStep::new("eb", &["deploy", "-l", version, "-m", comment]),
    ]
}
