//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{AppCommand, DeployCommand, ListCommand};
use std::ffi::OsString;
use std::path::PathBuf;

/// Deploy full-stack applications
#[derive(Debug, Parser, Clone)]
#[command(name = "fsd")]
#[command(version)]
#[command(about = "Build, assemble and ship full-stack applications", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to ~/.fsd.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Build the backend and frontend, then release the application
    Deploy(DeployCommand),

    /// List configured applications
    List(ListCommand),

    /// Copy the remote database into the local database
    DbCopy(AppCommand),

    /// Save the local database as the test snapshot
    TestSave(AppCommand),

    /// Restore the local database from the test snapshot
    TestRestore(AppCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
