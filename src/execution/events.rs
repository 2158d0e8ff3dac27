//! Events emitted while deploying

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// The two independently buildable parts of an application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Part {
    Backend,
    Frontend,
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Part::Backend => write!(f, "backend"),
            Part::Frontend => write!(f, "frontend"),
        }
    }
}

/// Events that can occur during a deploy or database task
#[derive(Debug, Clone)]
pub enum DeployEvent {
    DeployStarted {
        application: String,
    },
    BuildStageStarted {
        parts: Vec<Part>,
    },
    BuildStageFinished,
    PartStarted {
        part: Part,
        label: String,
    },
    PartSkipped {
        part: Part,
    },
    PartSucceeded {
        part: Part,
        output: String,
    },
    PartFailed {
        part: Part,
        error: String,
    },
    SyncStarted {
        source: PathBuf,
        dest: PathBuf,
    },
    SyncCompleted {
        files: usize,
        directories: usize,
    },
    VersionsQueried {
        platform: String,
        vcs: String,
    },
    StepStarted {
        index: usize,
        label: String,
    },
    StepCompleted {
        index: usize,
        label: String,
        output: String,
    },
    StepFailed {
        index: usize,
        label: String,
        error: String,
    },
    ReleaseCompleted {
        version: String,
    },
    TaskStarted {
        label: String,
    },
    TaskOutput {
        output: String,
    },
    TaskWarning {
        message: String,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(&DeployEvent) + Send + Sync>;

/// Fan-out of events to registered handlers
///
/// Events are only emitted from the orchestrating task, so handlers see them
/// in a deterministic order.
#[derive(Clone, Default)]
pub struct EventSink {
    handlers: Vec<EventHandler>,
}

impl EventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event handler
    pub fn add_handler<F>(&mut self, handler: F)
    where
        F: Fn(&DeployEvent) + Send + Sync + 'static,
    {
        self.handlers.push(Arc::new(handler));
    }

    /// Emit an event to all handlers
    pub fn emit(&self, event: DeployEvent) {
        for handler in &self.handlers {
            handler(&event);
        }
    }
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
