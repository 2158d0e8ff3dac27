//! Test utility functions for fsd

#![allow(dead_code)]

use async_trait::async_trait;
use fsd::core::config::{DeployConfig, DistSpec, EnvVar};
use fsd::core::PartConfig;
use fsd::execution::DeployEvent;
use fsd::operator::{Operator, PromptError};
use fsd::runner::{Invocation, StepFailure, StepOutcome, StepRunner};
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted reply for one command
#[derive(Clone)]
struct Reply {
    outcome: StepOutcome,
    delay: Option<Duration>,
}

/// Mock runner that returns predefined outcomes
///
/// Replies are keyed by "program first-arg" (e.g. "git commit") or by the
/// bare program name. Unscripted commands succeed with empty output.
/// Clones share their recordings.
#[derive(Clone, Default)]
pub struct MockRunner {
    replies: Arc<Mutex<HashMap<String, Reply>>>,
    invocations: Arc<Mutex<Vec<Invocation>>>,
    finished: Arc<Mutex<Vec<String>>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Succeed with `output`
    pub fn succeed(self, key: &str, output: &str) -> Self {
        self.reply(key, Ok(output.to_string()), None)
    }

    /// Exit with a nonzero code and `stderr`
    pub fn fail(self, key: &str, stderr: &str) -> Self {
        let program = key.split(' ').next().unwrap_or(key).to_string();
        self.reply(
            key,
            Err(StepFailure::Exit {
                program,
                code: 1,
                stderr: stderr.to_string(),
            }),
            None,
        )
    }

    /// Fail to launch at all
    pub fn missing(self, key: &str) -> Self {
        let program = key.split(' ').next().unwrap_or(key).to_string();
        self.reply(
            key,
            Err(StepFailure::Launch {
                program,
                message: "No such file or directory".to_string(),
            }),
            None,
        )
    }

    /// Delay the reply of `key` (scripted or default)
    pub fn delay(self, key: &str, delay: Duration) -> Self {
        {
            let mut replies = self.replies.lock().unwrap();
            let reply = replies.entry(key.to_string()).or_insert(Reply {
                outcome: Ok(String::new()),
                delay: None,
            });
            reply.delay = Some(delay);
        }
        self
    }

    fn reply(self, key: &str, outcome: StepOutcome, delay: Option<Duration>) -> Self {
        {
            let mut replies = self.replies.lock().unwrap();
            let previous = replies.get(key).and_then(|r| r.delay);
            replies.insert(
                key.to_string(),
                Reply {
                    outcome,
                    delay: delay.or(previous),
                },
            );
        }
        self
    }

    /// Every invocation received, in call order
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }

    /// "program first-arg" of every invocation, in call order
    pub fn calls(&self) -> Vec<String> {
        self.invocations().iter().map(key_of).collect()
    }

    /// Keys of the invocations that completed, in completion order
    pub fn finished(&self) -> Vec<String> {
        self.finished.lock().unwrap().clone()
    }

    pub fn find(&self, key: &str) -> Option<Invocation> {
        self.invocations().into_iter().find(|inv| key_of(inv) == key)
    }
}

/// "program first-arg", with the program reduced to its file name
pub fn key_of(invocation: &Invocation) -> String {
    let program = Path::new(&invocation.program)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| invocation.program.clone());
    match invocation.args.first() {
        Some(arg) => format!("{} {}", program, arg),
        None => program,
    }
}

#[async_trait]
impl StepRunner for MockRunner {
    async fn run(&self, invocation: &Invocation) -> StepOutcome {
        let key = key_of(invocation);
        self.invocations.lock().unwrap().push(invocation.clone());

        let reply = {
            let replies = self.replies.lock().unwrap();
            let program = key.split(' ').next().unwrap_or_default();
            replies.get(&key).or_else(|| replies.get(program)).cloned()
        };
        let reply = reply.unwrap_or(Reply {
            outcome: Ok(String::new()),
            delay: None,
        });

        if let Some(delay) = reply.delay {
            tokio::time::sleep(delay).await;
        }
        self.finished.lock().unwrap().push(key);
        reply.outcome
    }
}

/// Operator answering from a fixed list
///
/// An empty answer, or running out of answers, is reported as missing input.
#[derive(Debug, Default)]
pub struct ScriptedOperator {
    answers: VecDeque<String>,
    pub asked: Vec<String>,
}

impl ScriptedOperator {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| a.to_string()).collect(),
            asked: Vec::new(),
        }
    }
}

impl Operator for ScriptedOperator {
    fn ask(&mut self, label: &str) -> Result<String, PromptError> {
        self.asked.push(label.to_string());
        match self.answers.pop_front() {
            Some(answer) if !answer.trim().is_empty() => Ok(answer.trim().to_string()),
            _ => Err(PromptError::Required(label.to_string())),
        }
    }
}

/// Shared log of emitted events
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<DeployEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handler pushing into this log
    pub fn handler(&self) -> impl Fn(&DeployEvent) + Send + Sync + 'static {
        let events = self.events.clone();
        move |event| events.lock().unwrap().push(event.clone())
    }

    pub fn events(&self) -> Vec<DeployEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Variant names, in emission order
    pub fn names(&self) -> Vec<String> {
        self.events()
            .iter()
            .map(|e| {
                let debug = format!("{:?}", e);
                debug
                    .split(|c: char| !c.is_alphanumeric())
                    .next()
                    .unwrap_or_default()
                    .to_string()
            })
            .collect()
    }
}

/// Part configuration ready for a run
pub fn part(path: &str, command: &str, args: &[&str], label: &str) -> PartConfig {
    PartConfig {
        path: path.to_string(),
        command: command.to_string(),
        args: args.iter().map(|a| a.to_string()).collect(),
        environment: vec![EnvVar {
            name: "BUILD_ENV".to_string(),
            value: label.to_string(),
        }],
        label: label.to_string(),
        skip: false,
    }
}

pub fn skipped(mut cfg: PartConfig) -> PartConfig {
    cfg.skip = true;
    cfg
}

/// Release configuration rooted at `root`, shipping `root/build` as `root/dist`
pub fn deploy_config(root: &Path) -> DeployConfig {
    DeployConfig {
        path: root.to_string_lossy().into_owned(),
        dist: DistSpec {
            source: "build".to_string(),
            dest: "dist".to_string(),
        },
        app_source: None,
    }
}

/// Lay out a small build output under `root/build`
pub fn write_build_output(root: &Path) {
    let build = root.join("build");
    std::fs::create_dir_all(build.join("assets")).unwrap();
    std::fs::write(build.join("index.html"), "<html></html>").unwrap();
    std::fs::write(build.join("assets").join("app.js"), "console.log(1)").unwrap();
}

/// Calls that belong to the release sequence proper
pub const RELEASE_CALLS: [&str; 5] = [
    "git add",
    "git update-index",
    "git commit",
    "git tag",
    "eb deploy",
];

pub fn release_calls(runner: &MockRunner) -> Vec<String> {
    runner
        .calls()
        .into_iter()
        .filter(|c| RELEASE_CALLS.contains(&c.as_str()))
        .collect()
}
