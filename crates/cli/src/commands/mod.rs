//! Command implementations.

mod history;
mod send;
mod validate;

pub use history::run_history;
pub use send::run_send;
pub use validate::run_validate;

use anyhow::{Context, Result};
use contracts::MailerBlueprint;
use std::path::Path;
use tracing::info;

use crate::error::CliError;

/// Load and validate the configuration file
fn load_config(path: &Path) -> Result<MailerBlueprint> {
    info!(config = %path.display(), "Loading configuration");

    if !path.exists() {
        return Err(CliError::config_not_found(path).into());
    }

    config_loader::ConfigLoader::load_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}
