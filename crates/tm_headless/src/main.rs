//! Headless tournament telemetry driver.
//!
//! This binary plays scripted matches through the telemetry adapter and
//! reports what the adapter recorded.
//!
//! # Usage
//!
//! ```bash
//! # Play one match, adapter config from TM_* environment variables
//! cargo run -p tm_headless -- run --script scripts/marine_rush.ron
//!
//! # Play one match with a RON config, writing into out/
//! cargo run -p tm_headless -- run --script scripts/marine_rush.ron --config tm.ron --output out/
//!
//! # Play a directory of scripts, four at a time
//! cargo run -p tm_headless -- batch --scripts scripts/ --output results/ --parallel 4
//! ```
//!
//! # Output
//!
//! Match reports (stdout): JSON
//! Logs (stderr): Debug information

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tm_core::config::TelemetryConfig;
use tm_headless::{
    batch::{run_batch, BatchConfig},
    runner::run_match,
    script::MatchScript,
};

#[derive(Parser)]
#[command(name = "tm_headless")]
#[command(about = "Headless match driver for the tournament telemetry adapter")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single scripted match
    Run {
        /// Match script to play
        #[arg(short, long)]
        script: PathBuf,

        /// Adapter config (RON); defaults to the TM_* environment
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory for results.json, frametimes.csv and unit_events.csv
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Play every script in a directory
    Batch {
        /// Directory of match scripts
        #[arg(short, long)]
        scripts: PathBuf,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Maximum parallel matches (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Adapter config (RON) shared by every match
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for reports)
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    match cli.command {
        Commands::Run {
            script,
            config,
            output,
        } => cmd_run(&script, config.as_deref(), output.as_deref()),
        Commands::Batch {
            scripts,
            output,
            parallel,
            config,
        } => cmd_batch(&scripts, output, parallel, config.as_deref()),
    }
}

fn fatal(message: &str) -> ! {
    tracing::error!("{}", message);
    eprintln!("FATAL: {message}");
    std::process::exit(1);
}

/// Load adapter config from a RON file, or the environment without one
fn load_config(path: Option<&Path>) -> TelemetryConfig {
    match path {
        Some(path) => TelemetryConfig::load(path)
            .unwrap_or_else(|e| fatal(&format!("Cannot load config: {e}"))),
        None => TelemetryConfig::from_env(),
    }
}

fn ensure_dir(dir: &Path) {
    if let Err(e) = std::fs::create_dir_all(dir) {
        fatal(&format!(
            "Cannot create output directory '{}': {e}",
            dir.display()
        ));
    }
}

/// Play a single match
fn cmd_run(script_path: &Path, config_path: Option<&Path>, output: Option<&Path>) {
    let script = MatchScript::load(script_path)
        .unwrap_or_else(|e| fatal(&format!("Cannot load script: {e}")));

    let mut config = load_config(config_path);
    if let Some(dir) = output {
        ensure_dir(dir);
        config = config.with_output_dir(dir);
    }
    tracing::info!(
        script = %script_path.display(),
        config = ?config,
        "Match configuration"
    );

    let report =
        run_match(&script, config).unwrap_or_else(|e| fatal(&format!("Match failed: {e}")));

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => fatal(&format!("Cannot serialize report: {e}")),
    }
}

/// Play a directory of matches
fn cmd_batch(scripts: &Path, output: PathBuf, parallel: u32, config_path: Option<&Path>) {
    let batch_start = Instant::now();

    let num_cpus = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1);

    let config = BatchConfig::from_dir(scripts)
        .unwrap_or_else(|e| fatal(&format!("Cannot list scripts: {e}")))
        .with_output(output.clone())
        .with_parallel(parallel)
        .with_telemetry(load_config(config_path));

    tracing::info!(
        scripts = config.scripts.len(),
        parallel = parallel,
        output = %output.display(),
        cpus_available = num_cpus,
        "Batch configuration"
    );

    ensure_dir(&output);

    let results = run_batch(config);

    tracing::info!(
        matches_completed = results.matches.len(),
        matches_failed = results.errors.len(),
        total_duration_secs = format!("{:.1}", batch_start.elapsed().as_secs_f64()),
        "Batch execution finished"
    );

    let results_path = output.join("batch_results.json");
    if let Err(e) = results.save(&results_path) {
        fatal(&format!("Failed to save results: {e}"));
    }

    // Print summary
    let summary = &results.summary;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Matches played: {}", summary.total_matches);
    eprintln!("  Wins: {}", summary.wins);
    eprintln!("  Crashes: {}", summary.crashes);
    eprintln!("  Timeouts: {}", summary.timeouts);
    eprintln!("Frame time rows: {}", summary.frametime_rows);
    eprintln!("Unit event rows: {}", summary.unit_event_rows);
    eprintln!("Duration: {:.1}s", results.duration_seconds);

    if !results.errors.is_empty() {
        eprintln!("\nMATCH FAILURES:");
        for error in results.errors.iter().take(10) {
            eprintln!("  {}: {}", error.script.display(), error.message);
        }
        if results.errors.len() > 10 {
            eprintln!("  ... and {} more failures", results.errors.len() - 10);
        }
    }

    eprintln!("\nResults saved to: {}", results_path.display());
}
