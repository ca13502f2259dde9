//! LogLedger - emits delivery records as tracing events

use contracts::{ContractError, CorrelationToken, DateRange, DeliveryLedger, DeliveryRecord};
use tracing::{info, instrument};

/// Ledger that only logs; it keeps nothing to read back
pub struct LogLedger {
    name: String,
}

impl LogLedger {
    /// Create a new LogLedger with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl DeliveryLedger for LogLedger {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_ledger_record",
        skip(self, record),
        fields(ledger = %self.name)
    )]
    async fn record(&self, record: &DeliveryRecord) -> Result<(), ContractError> {
        info!(
            recipient = %record.recipient,
            subject = %record.subject,
            sent = record.sent,
            correlation_token = %record.correlation_token,
            sender = %record.sender,
            message_type = %record.message_type,
            "DeliveryRecord"
        );
        Ok(())
    }

    async fn history(&self, _range: &DateRange) -> Result<Vec<DeliveryRecord>, ContractError> {
        Ok(Vec::new())
    }

    async fn records_for_batch(
        &self,
        _token: &CorrelationToken,
    ) -> Result<Vec<DeliveryRecord>, ContractError> {
        Ok(Vec::new())
    }
}
