//! FailureReporter - turns a batch outcome into the caller-facing summary

use contracts::{BatchResult, ContractError};
use observability::ErrorLog;
use tracing::warn;

use crate::dispatcher::BatchOutcome;

/// Summary when no send failed
pub const ALL_SENT_MESSAGE: &str = "Mail was sent to all recipients.";

/// Shown instead of the details of an unclassified error
pub const UNEXPECTED_ERROR_MESSAGE: &str =
    "An unexpected error occurred while sending the newsletter.";

/// Operation name used for error log entries
const OPERATION: &str = "send_newsletter";

/// Builds summaries; unclassified errors also go to the error log
#[derive(Debug, Clone, Default)]
pub struct FailureReporter {
    error_log: Option<ErrorLog>,
}

impl FailureReporter {
    pub fn new(error_log: ErrorLog) -> Self {
        Self {
            error_log: Some(error_log),
        }
    }

    /// Reporter that only logs unclassified errors through tracing
    pub fn without_error_log() -> Self {
        Self::default()
    }

    /// Summary line for any outcome
    pub fn report(&self, outcome: &BatchOutcome) -> String {
        match outcome {
            BatchOutcome::Completed(result) => Self::summarize(result),
            BatchOutcome::Aborted { error, .. } => self.report_error(error),
        }
    }

    /// Summary of a completed batch
    pub fn summarize(result: &BatchResult) -> String {
        if result.failed_count == 0 {
            ALL_SENT_MESSAGE.to_string()
        } else {
            format!(
                "{} of {} emails were sent. {} failed to deliver.",
                result.sent_count(),
                result.total_recipients,
                result.failed_count
            )
        }
    }

    /// `Error: <message>` for batch aborts, a generic line otherwise
    pub fn report_error(&self, error: &ContractError) -> String {
        if error.is_batch_abort() {
            return format!("Error: {error}");
        }

        match &self.error_log {
            Some(log) => {
                log.report(OPERATION, error);
            }
            None => warn!(kind = error.kind(), error = %error, "Unclassified batch error"),
        }
        format!("Error: {UNEXPECTED_ERROR_MESSAGE}")
    }
}
