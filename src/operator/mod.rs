//! Operator interaction - line-oriented prompts for required input

use console::style;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("{0} is required")]
    Required(String),

    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),
}

/// Source of human-supplied answers
pub trait Operator {
    /// Show `label`, read one line and return it trimmed
    ///
    /// Empty input is a `PromptError::Required`.
    fn ask(&mut self, label: &str) -> Result<String, PromptError>;
}

/// Prompts on a writer and reads answers from a line reader
pub struct ConsoleOperator<R, W> {
    input: R,
    output: W,
}

impl ConsoleOperator<io::StdinLock<'static>, io::Stderr> {
    /// Prompt on stderr, read from stdin
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> ConsoleOperator<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Operator for ConsoleOperator<R, W> {
    fn ask(&mut self, label: &str) -> Result<String, PromptError> {
        write!(self.output, "{} ", style(format!("{} :", label)).yellow())?;
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;

        let answer = line.trim();
        if answer.is_empty() {
            return Err(PromptError::Required(label.to_string()));
        }
        Ok(answer.to_string())
    }
}
