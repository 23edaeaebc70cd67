//! # Structured Logging Module
//!
//! Environment-aware structured logging for lesson runs and the background
//! announcement worker.

use crate::constants::env;
use chrono::Utc;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
///
/// `RUST_LOG` takes precedence over the environment-derived level. Safe to
/// call repeatedly and alongside a subscriber installed by the host.
pub fn init_structured_logging() {
    init_structured_logging_with_level(None);
}

/// Same as [`init_structured_logging`], with an explicit fallback level
/// used instead of the environment-derived one when `RUST_LOG` is unset
pub fn init_structured_logging_with_level(level: Option<&str>) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let default_level = level
            .map(str::to_string)
            .unwrap_or_else(|| get_log_level(&environment));
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level));
        let json = use_json_format();

        let console = if json {
            fmt::layer()
                .with_target(true)
                .with_thread_names(true)
                .with_writer(std::io::stderr)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_names(true)
                .with_ansi(true)
                .with_writer(std::io::stderr)
                .with_filter(filter)
                .boxed()
        };

        if tracing_subscriber::registry().with(console).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            pid = std::process::id(),
            environment = %environment,
            json = json,
            "STRUCTURED LOGGING: Initialized"
        );
    });
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var(env::LESSON_ENV)
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> String {
    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

fn use_json_format() -> bool {
    std::env::var(env::LESSON_LOG_FORMAT)
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Log structured data for step operations
pub fn log_step_operation(
    operation: &str,
    run_id: &str,
    step_id: &str,
    command: &str,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        run_id = %run_id,
        step_id = %step_id,
        command = %command,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "STEP_OPERATION"
    );
}

/// Log structured data for registry operations
pub fn log_registry_operation(
    operation: &str,
    source: &str,
    handler_count: usize,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        source = %source,
        handler_count = handler_count,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "REGISTRY_OPERATION"
    );
}

/// Log structured data for announcement operations
pub fn log_announcement_operation(
    operation: &str,
    engine: Option<&str>,
    text_length: usize,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        engine = engine,
        text_length = text_length,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "ANNOUNCEMENT_OPERATION"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "ERROR"
    );
}
