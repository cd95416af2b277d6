//! tracing setup: a daily-rotated text log, a daily-rotated JSON log and a
//! compact stdout layer, all filtered by `RUST_LOG` (default `info`).

use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const TEXT_LOG_FILE: &str = "wiki_tfidf.log";
pub const JSON_LOG_FILE: &str = "wiki_tfidf.json.log";

/// Keeps the background log writers alive. Dropping it flushes and stops
/// file logging, so hold it for the lifetime of `main`.
#[must_use = "dropping the guards stops file logging"]
pub struct LoggingGuards {
    _text: WorkerGuard,
    _json: WorkerGuard,
    pub log_dir: PathBuf,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber writing into `log_dir`.
///
/// Fails if the directory cannot be created or a global subscriber is
/// already installed.
pub fn init_logging<P: AsRef<Path>>(log_dir: P) -> Result<LoggingGuards, Box<dyn std::error::Error>> {
    let log_path = log_dir.as_ref();
    std::fs::create_dir_all(log_path)?;

    let (text_writer, text_guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(log_path, TEXT_LOG_FILE));
    let (json_writer, json_guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(log_path, JSON_LOG_FILE));

    let text_layer = fmt::layer()
        .with_writer(text_writer)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_ansi(false)
        .compact()
        .with_filter(env_filter());

    let json_layer = fmt::layer()
        .json()
        .with_writer(json_writer)
        .with_target(true)
        .with_line_number(true)
        .with_current_span(true)
        .with_span_list(true)
        .with_filter(env_filter());

    let stdout_layer = fmt::layer()
        .with_target(false)
        .compact()
        .with_filter(env_filter());

    tracing_subscriber::registry()
        .with(text_layer)
        .with(json_layer)
        .with(stdout_layer)
        .try_init()?;

    tracing::info!("Logging initialized - logs will be written to {}", log_path.display());

    Ok(LoggingGuards {
        _text: text_guard,
        _json: json_guard,
        log_dir: log_path.to_path_buf(),
    })
}

/// Log into `<data_dir>/logs`.
pub fn init_logging_in_data_dir<P: AsRef<Path>>(
    data_dir: P,
) -> Result<LoggingGuards, Box<dyn std::error::Error>> {
    init_logging(data_dir.as_ref().join("logs"))
}
