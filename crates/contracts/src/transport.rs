//! MailTransport trait - outbound transmission interface
//!
//! "Send one rendered message with an optional shared attachment set to one
//! address". Connection handling, credentials and TLS belong to the
//! implementation.

use crate::{AttachmentRef, ContractError};

/// A fully rendered message for one recipient
#[derive(Debug, Clone, Copy)]
pub struct OutboundMessage<'a> {
    /// Destination address
    pub to: &'a str,

    /// Subject line
    pub subject: &'a str,

    /// HTML body, footer included
    pub html_body: &'a str,

    /// Staged attachments shared by the whole batch
    pub attachments: &'a [AttachmentRef],
}

/// Outbound mail transport
#[trait_variant::make(MailTransport: Send)]
pub trait LocalMailTransport {
    /// Transport name (used for logging)
    fn name(&self) -> &str;

    /// Transmit one message
    ///
    /// # Errors
    /// Returns `ContractError::Transmission` describing why the send failed
    async fn send(&self, message: &OutboundMessage<'_>) -> Result<(), ContractError>;
}
