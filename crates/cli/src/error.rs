//! Error types for CLI operations.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// An input file named on the command line could not be read
    #[error("Failed to read {what} from {}: {source}", path.display())]
    InputRead {
        what: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Sending was requested but no real transport was compiled in
    #[cfg_attr(feature = "smtp", allow(dead_code))]
    #[error("SMTP support is not enabled in this build; use --dry-run")]
    TransportUnavailable,
}

impl CliError {
    pub fn config_not_found(path: &Path) -> Self {
        Self::ConfigNotFound {
            path: path.display().to_string(),
        }
    }

    pub fn input_read(what: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::InputRead {
            what,
            path: path.to_path_buf(),
            source,
        }
    }
}
