//! # Mailer
//!
//! Outbound transmission module.
//!
//! Responsibilities:
//! - Implement `MailTransport` over SMTP (lettre, async tokio transport)
//! - Attach staged files with a MIME type guessed from the extension
//! - Provide a recording mock for tests and dry runs
//!
//! ## Feature Flags
//!
//! - `smtp`: Enable the real SMTP mailer (requires lettre)

pub mod error;
pub mod mock_mailer;

#[cfg(feature = "smtp")]
pub mod smtp_mailer;

pub use contracts::{MailTransport, OutboundMessage};
pub use error::{MailerError, Result};
pub use mock_mailer::{MockMailer, MockMailerConfig, SentMessage};

#[cfg(feature = "smtp")]
pub use smtp_mailer::SmtpMailer;
