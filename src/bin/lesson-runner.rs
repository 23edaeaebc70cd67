//! # Lesson Runner CLI
//!
//! Command-line tool for validating and running lesson files.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use lesson_runner::config::EngineConfig;
use lesson_runner::logging::init_structured_logging_with_level;
use lesson_runner::orchestration::{LessonEngine, RunReport};
use lesson_runner::{validate_lesson, LessonError};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "lesson-runner")]
#[command(about = "Validate and run guided-procedure lessons")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check a lesson file's structure without running it
    Validate {
        /// Lesson JSON file
        file: PathBuf,
    },

    /// Validate, then execute a lesson file step by step
    Run {
        /// Lesson JSON file
        file: PathBuf,

        /// Engine configuration file (TOML, YAML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Persisted preference file with `tts_enabled` and `tts_voice`
        #[arg(short, long)]
        preferences: Option<PathBuf>,

        /// Session-scope speech switch
        #[arg(long, value_enum)]
        speech: Option<Speech>,

        /// Seconds to wait for queued announcements before exiting
        #[arg(long, default_value_t = 30.0)]
        drain_timeout: f64,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Speech {
    On,
    Off,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    init_structured_logging_with_level(Some(level));

    let result = match &cli.command {
        Commands::Validate { file } => validate_file(file),
        Commands::Run {
            file,
            config,
            preferences,
            speech,
            drain_timeout,
        } => run_file(
            file,
            config.as_deref(),
            preferences.as_deref(),
            *speech,
            *drain_timeout,
        ),
    };

    if let Err(e) = result {
        match e.downcast_ref::<LessonError>() {
            Some(lesson_error) => report_failure(lesson_error),
            None => eprintln!("❌ {e:#}"),
        }
        error!("Lesson runner failed: {e:#}");
        process::exit(1);
    }
}

fn read_document(file: &Path) -> anyhow::Result<Value> {
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read lesson file {}", file.display()))?;
    let document: Value = serde_json::from_str(&contents).map_err(LessonError::Parse)?;
    Ok(document)
}

fn validate_file(file: &Path) -> anyhow::Result<()> {
    let document = read_document(file)?;
    validate_lesson(&document).map_err(LessonError::from)?;

    let steps = document
        .get("steps")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    println!("✅ {} is a valid lesson ({steps} steps)", file.display());
    Ok(())
}

fn run_file(
    file: &Path,
    config_path: Option<&Path>,
    preferences: Option<&Path>,
    speech: Option<Speech>,
    drain_timeout: f64,
) -> anyhow::Result<()> {
    let mut config = EngineConfig::load(config_path).context("failed to load engine configuration")?;
    if let Some(path) = preferences {
        config.preferences_path = Some(path.to_path_buf());
    }

    let engine = LessonEngine::builder(config).build();
    match speech {
        Some(Speech::On) => engine.session().set(true),
        Some(Speech::Off) => engine.session().set(false),
        None => {}
    }

    let document = read_document(file)?;
    let report = engine.run_document(&document)?;
    print_report(&report);

    if drain_timeout.is_finite() && drain_timeout > 0.0 {
        info!(timeout_secs = drain_timeout, "Waiting for queued announcements");
        let timeout = Duration::try_from_secs_f64(drain_timeout).unwrap_or(Duration::MAX);
        if !engine.drain(timeout) {
            warn!(
                queue_depth = engine.worker().queue_depth(),
                "Announcements still queued at exit; they will not be played"
            );
        }
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    println!("✅ Lesson '{}' completed", report.lesson_id);
    for outcome in &report.outcomes {
        println!(
            "   [{}] {:<14} {:<12} {:?}",
            outcome.step_id, outcome.command, outcome.result.status.to_string(), outcome.duration
        );
    }
    println!("   run {} finished in {:?}", report.run_id, report.elapsed);
}

fn report_failure(e: &LessonError) {
    match e.step_id() {
        Some(step_id) => eprintln!("❌ step {step_id}: {e}"),
        None => eprintln!("❌ {e}"),
    }
}
