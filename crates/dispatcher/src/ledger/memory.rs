//! MemoryLedger - in-process ledger for tests and dry runs

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use contracts::{ContractError, CorrelationToken, DateRange, DeliveryLedger, DeliveryRecord};

/// Ledger keeping records in memory
#[derive(Debug)]
pub struct MemoryLedger {
    name: String,
    records: Mutex<Vec<DeliveryRecord>>,
    fail_writes: AtomicBool,
}

impl MemoryLedger {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: Mutex::new(Vec::new()),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make every following `record` call fail (simulates an unavailable store)
    pub fn set_failing(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::Relaxed);
    }

    /// Copy of every record, in write order
    pub fn records(&self) -> Vec<DeliveryRecord> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<DeliveryRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new("memory")
    }
}

impl DeliveryLedger for MemoryLedger {
    fn name(&self) -> &str {
        &self.name
    }

    async fn record(&self, record: &DeliveryRecord) -> Result<(), ContractError> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(ContractError::ledger_write(&self.name, "store unavailable"));
        }
        self.lock().push(record.clone());
        Ok(())
    }

    async fn history(&self, range: &DateRange) -> Result<Vec<DeliveryRecord>, ContractError> {
        let mut records: Vec<_> = self
            .lock()
            .iter()
            .filter(|r| r.is_email() && range.contains(r.sent_on()))
            .cloned()
            .collect();
        records.sort_by_key(|r| r.sent_at);
        Ok(records)
    }

    async fn records_for_batch(
        &self,
        token: &CorrelationToken,
    ) -> Result<Vec<DeliveryRecord>, ContractError> {
        Ok(self
            .lock()
            .iter()
            .filter(|r| &r.correlation_token == token)
            .cloned()
            .collect())
    }
}
