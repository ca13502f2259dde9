//! Mailer error types

use contracts::ContractError;
use thiserror::Error;

/// Mailer specific error
#[derive(Debug, Error)]
pub enum MailerError {
    /// Address could not be parsed
    #[error("invalid email address '{address}': {message}")]
    InvalidAddress { address: String, message: String },

    /// Transport could not be configured
    #[error("failed to configure SMTP transport for {host}: {message}")]
    Transport { host: String, message: String },

    /// Attachment could not be read from its storage path
    #[error("failed to read attachment '{path}': {source}")]
    AttachmentRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Message could not be assembled
    #[error("failed to build message: {message}")]
    Build { message: String },

    /// Server rejected the message or the connection failed
    #[error("SMTP error: {message}")]
    Smtp { message: String },

    /// Wrapped ContractError
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl MailerError {
    /// Create invalid address error
    pub fn invalid_address(address: impl Into<String>, message: impl ToString) -> Self {
        Self::InvalidAddress {
            address: address.into(),
            message: message.to_string(),
        }
    }

    /// Create build error
    pub fn build(message: impl ToString) -> Self {
        Self::Build {
            message: message.to_string(),
        }
    }

    /// Create SMTP error
    pub fn smtp(message: impl ToString) -> Self {
        Self::Smtp {
            message: message.to_string(),
        }
    }

    /// Fold into the per-recipient transmission error
    pub fn into_transmission(self, recipient: &str) -> ContractError {
        match self {
            Self::Contract(err @ ContractError::Transmission { .. }) => err,
            other => ContractError::transmission(recipient, other.to_string()),
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, MailerError>;
