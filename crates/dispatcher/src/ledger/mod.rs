//! Ledger implementations
//!
//! Contains FileLedger, MemoryLedger, and LogLedger, plus the config-selected
//! `AnyLedger`.

mod file;
mod log;
mod memory;

pub use self::file::FileLedger;
pub use self::log::LogLedger;
pub use self::memory::MemoryLedger;

use contracts::{
    ContractError, CorrelationToken, DateRange, DeliveryLedger, DeliveryRecord, LedgerConfig,
    LedgerType,
};
use tracing::instrument;

use crate::error::DispatcherError;

/// Ledger chosen at runtime from configuration
pub enum AnyLedger {
    File(FileLedger),
    Memory(MemoryLedger),
    Log(LogLedger),
}

impl DeliveryLedger for AnyLedger {
    fn name(&self) -> &str {
        match self {
            Self::File(l) => l.name(),
            Self::Memory(l) => l.name(),
            Self::Log(l) => l.name(),
        }
    }

    async fn record(&self, record: &DeliveryRecord) -> Result<(), ContractError> {
        match self {
            Self::File(l) => l.record(record).await,
            Self::Memory(l) => l.record(record).await,
            Self::Log(l) => l.record(record).await,
        }
    }

    async fn history(&self, range: &DateRange) -> Result<Vec<DeliveryRecord>, ContractError> {
        match self {
            Self::File(l) => l.history(range).await,
            Self::Memory(l) => l.history(range).await,
            Self::Log(l) => l.history(range).await,
        }
    }

    async fn records_for_batch(
        &self,
        token: &CorrelationToken,
    ) -> Result<Vec<DeliveryRecord>, ContractError> {
        match self {
            Self::File(l) => l.records_for_batch(token).await,
            Self::Memory(l) => l.records_for_batch(token).await,
            Self::Log(l) => l.records_for_batch(token).await,
        }
    }
}

/// Create a ledger from configuration
#[instrument(
    name = "dispatcher_create_ledger",
    skip(config),
    fields(ledger_type = ?config.ledger_type)
)]
pub async fn create_ledger(config: &LedgerConfig) -> Result<AnyLedger, DispatcherError> {
    match config.ledger_type {
        LedgerType::File => {
            let path = config
                .path
                .as_ref()
                .ok_or_else(|| DispatcherError::ledger_creation("file", "no path configured"))?;
            let ledger = FileLedger::open("file", path)
                .await
                .map_err(|e| DispatcherError::ledger_creation("file", e.to_string()))?;
            Ok(AnyLedger::File(ledger))
        }
        LedgerType::Memory => Ok(AnyLedger::Memory(MemoryLedger::new("memory"))),
        LedgerType::Log => Ok(AnyLedger::Log(LogLedger::new("log"))),
    }
}
