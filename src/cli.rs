//! Command-line interface.
//!
//! Parses arguments, assembles the run configuration, installs the run log and
//! hands a single pass to the coordinator.

use crate::config::{ConfigError, Overrides, WatchConfig};
use crate::coordinator::RunCoordinator;
use crate::error::WatchError;
use crate::logging::{LoggingError, init_file_logging};
use crate::output::OutputFormatter;
use clap::Parser;
use std::path::PathBuf;
use thiserror::Error;

/// Sweep an intake directory once, routing files by age, size and extension.
#[derive(Debug, Parser)]
#[command(name = "sortwatch", version, about)]
pub struct Args {
    /// Configuration file (defaults to ./.sortwatch.toml, then ~/.config/sortwatch/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory holding watch/, output/, archive/, quarantine/, reports and the log
    #[arg(short, long)]
    pub base_dir: Option<PathBuf>,

    /// Files older than this many days are archived
    #[arg(long)]
    pub max_age_days: Option<u32>,

    /// Files larger than this many MB are quarantined
    #[arg(long)]
    pub max_size_mb: Option<f64>,

    /// Accepted extension; repeat to accept several (replaces the configured set)
    #[arg(long = "allow-ext", value_name = "EXT")]
    pub allowed_extensions: Vec<String>,

    /// Show what would happen without moving files or writing a report
    #[arg(long)]
    pub dry_run: bool,

    /// Print the result as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            base_dir: self.base_dir.clone(),
            max_age_days: self.max_age_days,
            max_size_mb: self.max_size_mb,
            allowed_extensions: self.allowed_extensions.clone(),
        }
    }
}

/// Errors surfaced to the command line.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Logging(#[from] LoggingError),
    #[error(transparent)]
    Run(#[from] WatchError),
    #[error("Failed to encode JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Loads and validates configuration for `args`.
pub fn load_config(args: &Args) -> Result<WatchConfig, ConfigError> {
    let mut config = WatchConfig::load(args.config.as_deref())?;
    config.apply(args.overrides());
    config.validate()
}

/// Runs the command line with parsed arguments.
///
/// A dry run classifies and prints without installing the file log. A real
/// run appends to the configured log file and writes the report.
pub fn run_cli(args: Args) -> Result<(), CliError> {
    let config = load_config(&args)?;
    let coordinator = RunCoordinator::new(&config);

    if args.dry_run {
        let plan = coordinator.plan()?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&plan)?);
        } else {
            OutputFormatter::info(&format!(
                "Analyzing {}",
                coordinator.dirs().intake.display()
            ));
            OutputFormatter::plan(&plan);
        }
        return Ok(());
    }

    init_file_logging(&config.log_path(), config.logging.level_filter()?)?;

    let summary = coordinator.run()?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        OutputFormatter::run_summary(&summary);
    }

    Ok(())
}
