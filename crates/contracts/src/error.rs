//! Layered error definitions
//!
//! Categorized by source: config / batch input / staging / transmission / ledger

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Batch Input Errors =====
    /// Missing or empty required input; the message is shown to the caller as is
    #[error("{message}")]
    Validation { message: String },

    /// Recipient table cannot be read or lacks a required column
    #[error("{message}")]
    SourceFormat { message: String },

    // ===== Staging Errors =====
    /// Attachment could not be written under any candidate name
    #[error("could not save attachment '{file_name}' after {attempts} attempts: {message}")]
    Attachment {
        file_name: String,
        attempts: usize,
        message: String,
    },

    // ===== Dispatch Errors =====
    /// One recipient's send failed
    #[error("failed to send to '{recipient}': {message}")]
    Transmission { recipient: String, message: String },

    /// Delivery record could not be appended
    #[error("ledger '{ledger}' write error: {message}")]
    LedgerWrite { ledger: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create batch validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create source format error
    pub fn source_format(message: impl Into<String>) -> Self {
        Self::SourceFormat {
            message: message.into(),
        }
    }

    /// Create attachment staging error
    pub fn attachment(
        file_name: impl Into<String>,
        attempts: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::Attachment {
            file_name: file_name.into(),
            attempts,
            message: message.into(),
        }
    }

    /// Create transmission error
    pub fn transmission(recipient: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transmission {
            recipient: recipient.into(),
            message: message.into(),
        }
    }

    /// Create ledger write error
    pub fn ledger_write(ledger: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LedgerWrite {
            ledger: ledger.into(),
            message: message.into(),
        }
    }

    /// Stable kind name, used by the persistent error log and metrics labels
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigParse { .. } => "ConfigParseError",
            Self::ConfigValidation { .. } => "ConfigValidationError",
            Self::Validation { .. } => "ValidationError",
            Self::SourceFormat { .. } => "SourceFormatError",
            Self::Attachment { .. } => "AttachmentError",
            Self::Transmission { .. } => "TransmissionError",
            Self::LedgerWrite { .. } => "LedgerWriteError",
            Self::Io(_) => "IoError",
            Self::Other(_) => "Error",
        }
    }

    /// Whether this error aborts a batch with a message meant for the caller
    ///
    /// Everything else reaching the batch boundary is unclassified.
    pub fn is_batch_abort(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::SourceFormat { .. } | Self::Attachment { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_is_verbatim() {
        let err = ContractError::validation("At least one recipient is required.");
        assert_eq!(err.to_string(), "At least one recipient is required.");
        assert_eq!(err.kind(), "ValidationError");
        assert!(err.is_batch_abort());
    }

    #[test]
    fn test_transmission_is_not_batch_abort() {
        let err = ContractError::transmission("a@x.com", "connection refused");
        assert!(!err.is_batch_abort());
        assert!(err.to_string().contains("a@x.com"));
    }

    #[test]
    fn test_attachment_error_names_file() {
        let err = ContractError::attachment("report.pdf", 8, "permission denied");
        let msg = err.to_string();
        assert!(msg.contains("report.pdf"), "got: {msg}");
        assert!(msg.contains("8 attempts"), "got: {msg}");
    }
}
