//! Debug logging support for lined
//!
//! When debug logging is enabled via config, editor activity is logged to
//! ~/.lined/lined.log. The `LINED_LOG` environment variable overrides the
//! default filter.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

const DEFAULT_FILTER: &str = "lined=debug";

/// Initialize the debug logging system
///
/// Returns the path to the log file, or None if logging is not enabled.
pub fn init_debug_logging(debug_enabled: bool) -> Result<Option<PathBuf>> {
    if !debug_enabled {
        return Ok(None);
    }

    let log_path = log_path()?;
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }

    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file: {}", log_path.display()));

    match file {
        Ok(log_file) => {
            let subscriber = registry()
                .with(
                    fmt::layer()
                        .with_writer(log_file)
                        .with_ansi(false)
                        .with_target(false),
                )
                .with(env_filter());

            tracing::subscriber::set_global_default(subscriber)
                .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

            Ok(Some(log_path))
        }
        Err(e) => {
            // Editing still works without a log.
            eprintln!("Warning: Could not create log file: {:#}", e);
            Ok(None)
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env("LINED_LOG").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Location of the debug log
pub fn log_path() -> Result<PathBuf> {
    Ok(crate::config::config_dir()?.join("lined.log"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_path_in_config_dir() {
        if let Ok(path) = log_path() {
            assert!(path.ends_with(".lined/lined.log"), "unexpected log path: {}", path.display());
        }
    }

    #[test]
    fn test_init_debug_logging_disabled() {
        let result = init_debug_logging(false);
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), None, "Should return None when debug is disabled");
    }
}
