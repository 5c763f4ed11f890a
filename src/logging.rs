//! Logging initialization for drive.
//!
//! Storage operations log at `debug` with `owner` and `path` fields, uploads
//! and writes at `info`, rejected requests at `warn` and internal failures at
//! `error`. Request spans come from `tower_http`. Both follow the configured
//! level; every other crate is held at `warn`.

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::Result;

/// Targets that follow the configured level.
const DRIVE_TARGETS: [&str; 2] = ["drive", "tower_http"];

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Filter directives for `level`, followed by any `RUST_LOG` directives so
/// those take precedence.
fn directives(level: &str, env: &str) -> String {
    let level = parse_level(level).as_str().to_ascii_lowercase();
    let mut parts: Vec<String> = DRIVE_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect();
    if !env.trim().is_empty() {
        parts.push(env.trim().to_string());
    }
    parts.join(",")
}

fn build_filter(level: &str) -> EnvFilter {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .parse_lossy(directives(level, &env))
}

/// Log to stdout and to the configured file.
pub fn init(config: &LoggingConfig) -> Result<()> {
    if let Some(dir) = Path::new(&config.file).parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir)?;
        }
    }

    let log_file = Arc::new(File::create(&config.file)?);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout.and(log_file))
                .with_ansi(false)
                .with_target(true),
        )
        .with(build_filter(&config.level))
        .init();

    Ok(())
}

/// Log to stdout only. Fallback when the log file cannot be opened.
pub fn init_console_only(level: &str) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(build_filter(level))
        .init();
}
