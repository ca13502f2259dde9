//! Batch - Dispatcher input and output

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::{CorrelationToken, Recipient, SenderIdentity};

/// An uploaded blob (recipient table or attachment)
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-side file name
    pub file_name: String,

    /// Raw content
    pub content: Bytes,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
        }
    }

    /// Extension of the file name, without the dot
    pub fn extension(&self) -> Option<&str> {
        std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
    }
}

/// A staged attachment
///
/// `storage_path` is resolved once at staging time and shared by every
/// message of the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    /// Name the file was uploaded with
    pub original_name: String,

    /// Where the payload was written
    pub storage_path: PathBuf,
}

/// One submission as received from the caller
#[derive(Debug, Clone)]
pub struct BatchRequest {
    /// Recipient table upload (`None` when nothing was uploaded)
    pub recipient_file: Option<UploadedFile>,

    /// Subject line
    pub subject: String,

    /// Body template with `{title}` / `{name}` placeholders
    pub body_template: String,

    /// Zero or more attachment uploads
    pub attachments: Vec<UploadedFile>,

    /// Operator submitting the batch
    pub sender: SenderIdentity,
}

/// A validated, staged batch ready for the send loop
#[derive(Debug, Clone)]
pub struct Batch {
    pub subject: String,
    pub body_template: String,
    pub recipients: Vec<Recipient>,
    pub attachments: Vec<AttachmentRef>,
    pub correlation_token: CorrelationToken,
    pub sender: SenderIdentity,
}

/// Dispatcher state over one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    Validating,
    Staging,
    Sending,
    Completed,
    Failed,
}

impl BatchState {
    /// Whether `next` is a legal successor of `self`
    pub fn can_transition_to(self, next: BatchState) -> bool {
        matches!(
            (self, next),
            (Self::Validating, Self::Staging)
                | (Self::Validating, Self::Failed)
                | (Self::Staging, Self::Sending)
                | (Self::Staging, Self::Failed)
                | (Self::Sending, Self::Completed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validating => "validating",
            Self::Staging => "staging",
            Self::Sending => "sending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Aggregate result of a completed batch
///
/// `total_recipients` counts attempted recipients only; recipients skipped for
/// an invalid address are reported in `skipped_count` and are not failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    /// Recipients a send was attempted for
    pub total_recipients: usize,

    /// Sends that failed
    pub failed_count: usize,

    /// Rows skipped because the address failed syntactic validation
    pub skipped_count: usize,

    /// Token shared by the batch's delivery records
    pub correlation_token: CorrelationToken,
}

impl BatchResult {
    /// Number of successful sends
    pub fn sent_count(&self) -> usize {
        self.total_recipients.saturating_sub(self.failed_count)
    }
}
