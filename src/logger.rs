//! Logging initialisation via tracing-subscriber.
//!
//! Call [`init`] once at startup, after config is resolved. Errors before
//! that point are printed to stderr by `main`.

use std::path::Path;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::error::AppError;

/// Build the filter for `level`.
///
/// If `prefer_level` is `true`, `level` wins and `RUST_LOG` is only consulted
/// when `level` does not parse. Otherwise `RUST_LOG` wins and `level` is the
/// fallback.
fn build_filter(level: &str, prefer_level: bool) -> Result<EnvFilter, AppError> {
    if prefer_level {
        match EnvFilter::try_new(level) {
            Ok(filter) => Ok(filter),
            Err(level_err) => EnvFilter::try_from_default_env().map_err(|env_err| {
                AppError::Logger(format!(
                    "invalid log level '{level}': {level_err}; RUST_LOG parse failed: {env_err}"
                ))
            }),
        }
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level))
            .map_err(|e| AppError::Logger(format!("invalid log level '{level}': {e}")))
    }
}

/// Initialise the global tracing subscriber.
///
/// Logs go to stderr unless `log_file` is given, in which case they are
/// appended there without ANSI colours. Stdout is left to chaincode payloads.
pub fn init(level: &str, prefer_level: bool, log_file: Option<&Path>) -> Result<(), AppError> {
    let filter = build_filter(level, prefer_level)?;

    let (writer, ansi) = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    AppError::Logger(format!("failed to open log file '{}': {e}", path.display()))
                })?;
            (BoxMakeWriter::new(file), false)
        }
        None => (BoxMakeWriter::new(std::io::stderr), true),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(false)
        .try_init()
        .map_err(|e| AppError::Logger(format!("failed to set subscriber: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_levels_build_filter() {
        for l in &["error", "warn", "info", "debug", "trace", "off"] {
            assert!(build_filter(l, true).is_ok(), "expected '{l}' to be valid");
        }
    }

    #[test]
    fn directives_build_filter() {
        assert!(build_filter("member_ledger=debug", true).is_ok());
        assert!(build_filter("warn,member_ledger::contract=trace", true).is_ok());
    }

    #[test]
    fn init_to_file_succeeds_or_already_init() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("logs").join("ledger.log");
        // A subscriber may already be installed by another test in this process.
        match init("warn,member_ledger=debug", true, Some(&path)) {
            Ok(()) => assert!(path.exists()),
            Err(AppError::Logger(msg)) if msg.contains("set subscriber") => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
}
