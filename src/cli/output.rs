//! CLI output formatting

use crate::core::ReleaseReport;
use crate::execution::DeployEvent;
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Lines of captured output shown per step
pub const OUTPUT_LINES: usize = 10;

/// Create a spinner shown while the build stage runs
pub fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed}] {msg}") {
        spinner.set_style(template);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Format a deploy event for display
pub fn format_deploy_event(event: &DeployEvent) -> String {
    match event {
        DeployEvent::DeployStarted { application } => {
            format!("{} Deploying {}", ROCKET, style(application).bold())
        }
        DeployEvent::BuildStageStarted { parts } => {
            let names: Vec<String> = parts.iter().map(|p| p.to_string()).collect();
            format!("{} Building {}", SPINNER, style(names.join(" and ")).cyan())
        }
        DeployEvent::BuildStageFinished => format!("{} Build stage finished", INFO),
        DeployEvent::PartStarted { label, .. } => {
            format!("{} {}", SPINNER, style(label).cyan())
        }
        DeployEvent::PartSkipped { part } => {
            format!("{} Skipping {}", INFO, style(part).dim())
        }
        DeployEvent::PartSucceeded { part, output } => with_output(
            format!("{} {} built", CHECK, style(part).green()),
            output,
        ),
        DeployEvent::PartFailed { part, error } => {
            format!("{} {}: {}", CROSS, style(part).red(), style(error).dim())
        }
        DeployEvent::SyncStarted { source, dest } => format!(
            "{} Syncing {} → {}",
            SPINNER,
            style(source.display()).dim(),
            style(dest.display()).cyan()
        ),
        DeployEvent::SyncCompleted { files, directories } => format!(
            "{} Synced {} files in {} directories",
            CHECK,
            style(files).cyan(),
            style(directories).cyan()
        ),
        DeployEvent::VersionsQueried { platform, vcs } => format!(
            "{} Deployed version: {}\n{} Latest tag: {}",
            INFO,
            style(or_unknown(platform)).bold(),
            INFO,
            style(or_unknown(vcs)).bold()
        ),
        DeployEvent::StepStarted { index, label } => {
            format!("{} [{}] {}", SPINNER, style(index).dim(), style(label).cyan())
        }
        DeployEvent::StepCompleted {
            index,
            label,
            output,
        } => with_output(
            format!("{} [{}] {}", CHECK, style(index).dim(), style(label).green()),
            output,
        ),
        DeployEvent::StepFailed {
            index,
            label,
            error,
        } => format!(
            "{} [{}] {}: {}",
            CROSS,
            style(index).dim(),
            style(label).red(),
            style(error).dim()
        ),
        DeployEvent::ReleaseCompleted { version } => format!(
            "{} Released {} {}",
            CHECK,
            style(version).bold(),
            style("successfully").green()
        ),
        DeployEvent::TaskStarted { label } => format!("{} {}", SPINNER, style(label).cyan()),
        DeployEvent::TaskOutput { output } => format!("{} {}", CHECK, output.trim_end()),
        DeployEvent::TaskWarning { message } => {
            format!("{} {}", WARN, style(message.trim_end()).yellow())
        }
    }
}

/// Format the summary printed after a successful release
pub fn format_release_report(report: &ReleaseReport) -> String {
    format!(
        "{} {} released ({} steps, {} files synced) - {}",
        CHECK,
        style(&report.version).bold(),
        style(report.steps_completed).cyan(),
        style(report.files_synced).cyan(),
        style(&report.run_id.to_string()[..8]).dim()
    )
}

/// Format a top-level error
pub fn format_error(error: &anyhow::Error) -> String {
    format!("{} {}", CROSS, style(format!("Error: {:#}", error)).red())
}

/// Format step output with truncation
pub fn format_output(output: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = output.lines().collect();

    if lines.len() <= max_lines {
        output.to_string()
    } else {
        let truncated = lines[..max_lines].join("\n");
        format!(
            "{}\n{}... ({} more lines)",
            truncated,
            style("[truncated]").dim(),
            lines.len() - max_lines
        )
    }
}

fn with_output(headline: String, output: &str) -> String {
    let output = output.trim_end();
    if output.is_empty() {
        headline
    } else {
        format!("{}\n{}", headline, format_output(output, OUTPUT_LINES))
    }
}

fn or_unknown(value: &str) -> &str {
    if value.is_empty() {
        "unknown"
    } else {
        value
    }
}
