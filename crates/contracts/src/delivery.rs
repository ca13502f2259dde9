//! DeliveryRecord - one ledger entry per attempted send

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{ContractError, CorrelationToken, SenderIdentity};

/// Ledger message type for email sends
pub const MESSAGE_TYPE_EMAIL: &str = "E";

/// Audit entry for one attempted send
///
/// Written once per attempted recipient and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    /// Destination address
    pub recipient: String,

    /// Subject as sent
    pub subject: String,

    /// Rendered body as sent (footer included)
    pub body: String,

    /// When the attempt finished
    pub sent_at: DateTime<Local>,

    /// Whether the transport accepted the message
    pub sent: bool,

    /// Delivery confirmation is not observed, always `false`
    pub delivered: bool,

    /// Batch correlation token
    pub correlation_token: CorrelationToken,

    /// Operator who submitted the batch
    pub sender: SenderIdentity,

    /// Message channel, `"E"` for email
    #[serde(default = "default_message_type")]
    pub message_type: String,
}

fn default_message_type() -> String {
    MESSAGE_TYPE_EMAIL.to_string()
}

impl DeliveryRecord {
    /// Build an email record stamped with the current local time
    pub fn email(
        recipient: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
        sent: bool,
        correlation_token: CorrelationToken,
        sender: SenderIdentity,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            subject: subject.into(),
            body: body.into(),
            sent_at: Local::now(),
            sent,
            delivered: false,
            correlation_token,
            sender,
            message_type: default_message_type(),
        }
    }

    pub fn is_email(&self) -> bool {
        self.message_type == MESSAGE_TYPE_EMAIL
    }

    /// Local calendar day of the attempt
    pub fn sent_on(&self) -> NaiveDate {
        self.sent_at.date_naive()
    }

    pub fn status(&self) -> DeliveryStatus {
        if self.sent {
            DeliveryStatus::Sent
        } else {
            DeliveryStatus::Failed
        }
    }

    /// Project into the history view
    pub fn to_history_entry(&self) -> HistoryEntry {
        HistoryEntry {
            recipient: self.recipient.clone(),
            subject: self.subject.clone(),
            body: self.body.clone(),
            date_sent: self.sent_at.format("%d-%m-%Y").to_string(),
            sender: self.sender.user_name().to_string(),
            status: self.status(),
        }
    }
}

/// Send outcome as shown in history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryStatus {
    Sent,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "Sent",
            Self::Failed => "Failed",
        }
    }
}

/// Delivery history row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub recipient: String,
    pub subject: String,
    pub body: String,
    /// Day of the attempt, `dd-mm-yyyy`
    pub date_sent: String,
    pub sender: String,
    pub status: DeliveryStatus,
}

/// Inclusive range of calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// # Errors
    /// Returns a validation error when `start` is after `end`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ContractError> {
        if start > end {
            return Err(ContractError::validation(format!(
                "Start date {start} must not be after end date {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}
