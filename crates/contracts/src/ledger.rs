//! DeliveryLedger trait - Dispatcher audit output interface
//!
//! The persistence engine behind a ledger is opaque; only append and read
//! operations are part of the contract.

use crate::{ContractError, CorrelationToken, DateRange, DeliveryRecord};

/// Append-only store of delivery attempts
///
/// There is no update or delete operation. Implementations must tolerate
/// concurrent `record` calls from independent batches.
#[trait_variant::make(DeliveryLedger: Send)]
pub trait LocalDeliveryLedger {
    /// Ledger name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Append one record
    ///
    /// # Errors
    /// Returns `ContractError::LedgerWrite` when the sink is unavailable
    async fn record(&self, record: &DeliveryRecord) -> Result<(), ContractError>;

    /// Email records whose local send day lies in `range`, ordered by send time
    async fn history(&self, range: &DateRange) -> Result<Vec<DeliveryRecord>, ContractError>;

    /// All records written for one batch, in write order
    async fn records_for_batch(
        &self,
        token: &CorrelationToken,
    ) -> Result<Vec<DeliveryRecord>, ContractError>;
}
