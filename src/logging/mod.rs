/*!
 * Logging Module
 * Centralized logging configuration and utilities
 */
pub mod config;
pub mod middleware;

use std::io;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Writer guards; logs are flushed when these are dropped.
pub struct LogGuards {
    _file: WorkerGuard,
    _error: WorkerGuard,
    _console: WorkerGuard,
}

fn default_filter(log_level: &str) -> String {
    format!(
        "mwg_backend={},seed_content={},tower_http=debug,axum=debug,sqlx=warn",
        log_level, log_level
    )
}

/// Initialize the logging system. Hold the returned guards for the process lifetime.
/// `RUST_LOG`, when set, overrides `log_level`.
pub fn init(environment: &str, log_level: &str) -> LogGuards {
    let is_production = environment == "production";

    // Create log directory if it doesn't exist
    std::fs::create_dir_all("logs").ok();

    // File appender for all logs
    let (file_writer, file_guard) = non_blocking(rolling::daily("logs", "app.log"));

    // File appender for errors only
    let (error_writer, error_guard) = non_blocking(rolling::daily("logs", "error.log"));

    let (console_writer, console_guard) = non_blocking(io::stdout());

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(log_level)));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if is_production {
        // JSON format for production
        let file_layer = fmt::layer()
            .json()
            .with_writer(file_writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true);

        let error_layer = fmt::layer()
            .json()
            .with_writer(error_writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(tracing_subscriber::filter::LevelFilter::ERROR);

        let console_layer = fmt::layer()
            .json()
            .with_writer(console_writer)
            .with_target(false);

        subscriber
            .with(file_layer)
            .with(error_layer)
            .with(console_layer)
            .init();
    } else {
        // Pretty format for development
        let file_layer = fmt::layer()
            .with_writer(file_writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false);

        let error_layer = fmt::layer()
            .with_ansi(false)
            .with_writer(error_writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(tracing_subscriber::filter::LevelFilter::ERROR);

        let console_layer = fmt::layer()
            .with_writer(console_writer)
            .with_target(true)
            .pretty()
            .with_thread_ids(false)
            .with_thread_names(false);

        subscriber
            .with(file_layer)
            .with(error_layer)
            .with(console_layer)
            .init();
    }

    tracing::info!("Logging initialized for {} environment", environment);

    LogGuards {
        _file: file_guard,
        _error: error_guard,
        _console: console_guard,
    }
}
