//! CLI entry point for legislator clustering.
//!
//! Provides commands for refreshing the stored clustering from a vote file
//! and for reading the stored results back.

use anyhow::Context;
use caucus::display::{create_results_table, create_summary_table};
use caucus::io::{ExitCode, OutputFormat, OutputManager};
use caucus::{
    CaucusError, CaucusResult, ClusteringService, JsonVoteSource, RefreshOutcome, ResultStore,
    Settings, logging,
};
use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Legislator clustering by voting behaviour
#[derive(Parser)]
#[command(
    name = "caucus",
    version = env!("CARGO_PKG_VERSION"),
    about = "Cluster legislators by how they vote",
    long_about = "Pivot votes into a legislator x bill matrix, project it onto two axes and group legislators with seeded k-means.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Initialize project
    #[command(about = "Set up .caucus directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show configuration
    #[command(about = "Display active settings")]
    Config,

    /// Recompute and store every legislator's cluster
    #[command(about = "Recompute clusters from the vote file and replace stored results")]
    Refresh {
        /// Vote file (defaults to source.path)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List stored results
    #[command(about = "List stored results ordered by cluster and similarity")]
    Results {
        /// Vote file providing legislator names (defaults to source.path)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Per-cluster overview
    #[command(about = "Show member counts and party mix per cluster")]
    Summary {
        /// Vote file providing legislator names (defaults to source.path)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::GeneralError
        }
    };
    std::process::exit(code.into());
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    if !matches!(cli.command, Commands::Init { .. }) && cli.config.is_none() {
        if let Err(warning) = Settings::check_init() {
            eprintln!("Warning: {warning}");
            eprintln!("Using default configuration for now.");
        }
    }

    // Load configuration
    let mut settings = match &cli.config {
        Some(config_path) => Settings::load_from(config_path).with_context(|| {
            format!("Configuration error loading from {}", config_path.display())
        })?,
        None => Settings::load().unwrap_or_else(|e| {
            eprintln!("Configuration error: {e}");
            Settings::default()
        }),
    };
    settings.debug |= cli.debug;
    logging::init(&settings.logging, settings.debug);

    match cli.command {
        Commands::Init { force } => {
            match Settings::init_config_file(force) {
                Ok(_) => println!("Edit this file to customize your settings."),
                Err(e) => {
                    eprintln!("Error: {e}");
                    return Ok(ExitCode::ConfigError);
                }
            }
            Ok(ExitCode::Success)
        }

        Commands::Config => {
            println!("Current Configuration:");
            println!("{}", "=".repeat(50));
            println!("{}", toml::to_string_pretty(&settings)?);
            Ok(ExitCode::Success)
        }

        Commands::Refresh { input, json } => {
            let mut output = OutputManager::new(OutputFormat::from_json_flag(json));
            let outcome = open_service(&settings, input.as_deref()).and_then(|s| s.refresh());
            let code = match outcome {
                Ok(RefreshOutcome::NoData) => output.not_found(
                    "vote data",
                    "Check that the vote file lists legislators with recorded positions",
                )?,
                Ok(outcome) => output.success(outcome)?,
                Err(e) => output.error(&e)?,
            };
            Ok(code)
        }

        Commands::Results { input, json } => {
            let mut output = OutputManager::new(OutputFormat::from_json_flag(json));
            let code = match open_service(&settings, input.as_deref()).and_then(|s| s.results())
            {
                Ok(views) => output.collection(
                    &views,
                    "results",
                    "Run 'caucus refresh' to compute clusters",
                    create_results_table,
                )?,
                Err(e) => output.error(&e)?,
            };
            Ok(code)
        }

        Commands::Summary { input, json } => {
            let mut output = OutputManager::new(OutputFormat::from_json_flag(json));
            let summary = open_service(&settings, input.as_deref())
                .and_then(|s| Ok((s.summary()?, s.last_run()?)));
            let code = match summary {
                Ok((clusters, run)) => output.collection(
                    &clusters,
                    "clusters",
                    "Run 'caucus refresh' to compute clusters",
                    |clusters| create_summary_table(clusters, run.as_ref()),
                )?,
                Err(e) => output.error(&e)?,
            };
            Ok(code)
        }
    }
}

/// Wire the JSON vote file and the on-disk store into a service.
fn open_service(settings: &Settings, input: Option<&Path>) -> CaucusResult<ClusteringService> {
    let vote_path = match input {
        Some(path) => path.to_path_buf(),
        None => settings.resolve_path(&settings.source.path),
    };
    let source = JsonVoteSource::new(vote_path);
    let roster = source.load().map_err(CaucusError::InputUnavailable)?.roster();
    let store = ResultStore::open(settings.resolve_path(&settings.store_path))?;

    ClusteringService::new(settings.clone(), Arc::new(source), Arc::new(roster), store)
}
