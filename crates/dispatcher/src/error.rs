//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Ledger creation error
    #[error("failed to create ledger '{name}': {message}")]
    LedgerCreation { name: String, message: String },

    /// Error from a contract collaborator
    #[error(transparent)]
    Contract(#[from] contracts::ContractError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatcherError {
    /// Create a ledger creation error
    pub fn ledger_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LedgerCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
