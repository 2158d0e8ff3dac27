use anyhow::{Context, Result};
use fsd::cli::commands::{AppCommand, DeployCommand, ListCommand};
use fsd::cli::output::*;
use fsd::cli::{Cli, Command};
use fsd::execution::{DatabaseTasks, DeployEvent};
use fsd::{Config, ConsoleOperator, Deployer, ProcessRunner};
use indicatif::ProgressBar;
use std::sync::{Arc, Mutex};
use tracing::debug;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() {
    let cli = Cli::from_args();

    if let Err(err) = run(cli).await {
        eprintln!("{}", format_error(&err));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Initialize logging
    let log_level = if cli.verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    debug!("Loaded {} applications", config.application.len());

    match &cli.command {
        Command::Deploy(cmd) => deploy(&config, cmd).await,
        Command::List(cmd) => list_applications(&config, cmd),
        Command::DbCopy(cmd) => copy_database(&config, cmd).await,
        Command::TestSave(cmd) => save_test_snapshot(&config, cmd).await,
        Command::TestRestore(cmd) => restore_test_snapshot(&config, cmd).await,
    }
}

async fn deploy(config: &Config, cmd: &DeployCommand) -> Result<()> {
    let mut deployer = Deployer::new(ProcessRunner::new(), ConsoleOperator::stdio());

    // Spinner lives between the start and the end of the build stage
    let spinner: Arc<Mutex<Option<ProgressBar>>> = Arc::new(Mutex::new(None));
    deployer.add_event_handler(move |event| {
        let Ok(mut current) = spinner.lock() else {
            println!("{}", format_deploy_event(event));
            return;
        };
        match event {
            DeployEvent::BuildStageStarted { .. } => {
                *current = Some(create_spinner(&format_deploy_event(event)));
                return;
            }
            DeployEvent::BuildStageFinished => {
                if let Some(bar) = current.take() {
                    bar.finish_and_clear();
                }
                return;
            }
            _ => {}
        }
        match current.as_ref() {
            Some(bar) => bar.println(format_deploy_event(event)),
            None => println!("{}", format_deploy_event(event)),
        }
    });

    let report = deployer
        .deploy(config, &cmd.app, cmd.skip_parts())
        .await
        .with_context(|| format!("Deploy of {} failed", cmd.app))?;

    println!("\n{}", format_release_report(&report));
    Ok(())
}

fn list_applications(config: &Config, cmd: &ListCommand) -> Result<()> {
    if cmd.json {
        let names: Vec<&str> = config.application.iter().map(|a| a.name.as_str()).collect();
        let data = serde_json::json!({ "applications": names });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    if config.application.is_empty() {
        println!("{} No applications configured", WARN);
        return Ok(());
    }

    println!("{} Configured applications:", INFO);
    for (i, app) in config.application.iter().enumerate() {
        println!("  {}. {}", style(i + 1).dim(), style(&app.name).bold());
    }
    Ok(())
}

fn database_tasks(config: &Config) -> DatabaseTasks<ProcessRunner> {
    let mut tasks = DatabaseTasks::new(ProcessRunner::new(), config);
    tasks.add_event_handler(|event| println!("{}", format_deploy_event(event)));
    tasks
}

async fn copy_database(config: &Config, cmd: &AppCommand) -> Result<()> {
    let app = config.application(&cmd.app)?;
    database_tasks(config)
        .copy_remote_to_local(app)
        .await
        .context("Database copy failed")
}

async fn save_test_snapshot(config: &Config, cmd: &AppCommand) -> Result<()> {
    let app = config.application(&cmd.app)?;
    database_tasks(config)
        .save_test_snapshot(app)
        .await
        .context("Saving the test snapshot failed")
}

async fn restore_test_snapshot(config: &Config, cmd: &AppCommand) -> Result<()> {
    let app = config.application(&cmd.app)?;
    database_tasks(config)
        .restore_test_snapshot(app)
        .await
        .context("Restoring the test snapshot failed")
}
