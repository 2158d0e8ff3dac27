//! CLI command definitions

use clap::Args;
use crate::execution::SkipParts;

/// Build and release an application
#[derive(Debug, Args, Clone)]
pub struct DeployCommand {
    /// Application name, as configured
    pub app: String,

    /// Don't rebuild the backend
    #[arg(short = 'b', long)]
    pub no_back: bool,

    /// Don't rebuild the frontend
    #[arg(short = 'f', long)]
    pub no_front: bool,
}

impl DeployCommand {
    pub fn skip_parts(&self) -> SkipParts {
        SkipParts {
            backend: self.no_back,
            frontend: self.no_front,
        }
    }
}

/// List configured applications
#[derive(Debug, Args, Clone)]
pub struct ListCommand {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// A command acting on one configured application
#[derive(Debug, Args, Clone)]
pub struct AppCommand {
    /// Application name, as configured
    pub app: String,
}
