//! FileLedger - appends delivery records to a JSON Lines file

use std::path::{Path, PathBuf};

use contracts::{ContractError, CorrelationToken, DateRange, DeliveryLedger, DeliveryRecord};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, error, instrument, warn};

/// Ledger that writes one JSON object per line
///
/// The file is opened in append mode and every record is written with a single
/// `write_all` under a lock, so concurrent batches never interleave lines.
pub struct FileLedger {
    name: String,
    path: PathBuf,
    file: Mutex<File>,
}

impl FileLedger {
    /// Open (or create) the ledger file, creating parent directories
    pub async fn open(name: impl Into<String>, path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        Ok(Self {
            name: name.into(),
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every parseable record in write order
    ///
    /// Unparseable lines are logged and skipped.
    async fn read_all(&self) -> Result<Vec<DeliveryRecord>, ContractError> {
        // hold the writer lock so no half-written line is read
        let _guard = self.file.lock().await;
        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| ContractError::ledger_write(&self.name, format!("read failed: {e}")))?;

        let mut records = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<DeliveryRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => warn!(
                    ledger = %self.name,
                    line = line_no + 1,
                    error = %e,
                    "Skipping unreadable ledger line"
                ),
            }
        }
        Ok(records)
    }

    async fn append_line(&self, line: &[u8]) -> std::io::Result<()> {
        let mut file = self.file.lock().await;
        file.write_all(line).await?;
        file.flush().await
    }
}

impl DeliveryLedger for FileLedger {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_ledger_record",
        skip(self, record),
        fields(ledger = %self.name, recipient = %record.recipient, sent = record.sent)
    )]
    async fn record(&self, record: &DeliveryRecord) -> Result<(), ContractError> {
        let mut line = serde_json::to_vec(record)
            .map_err(|e| ContractError::ledger_write(&self.name, e.to_string()))?;
        line.push(b'\n');

        self.append_line(&line).await.map_err(|e| {
            error!(ledger = %self.name, path = %self.path.display(), error = %e, "Write failed");
            ContractError::ledger_write(&self.name, e.to_string())
        })?;

        debug!(bytes = line.len(), "Record appended");
        Ok(())
    }

    #[instrument(name = "file_ledger_history", skip(self), fields(ledger = %self.name))]
    async fn history(&self, range: &DateRange) -> Result<Vec<DeliveryRecord>, ContractError> {
        let mut records: Vec<_> = self
            .read_all()
            .await?
            .into_iter()
            .filter(|r| r.is_email() && range.contains(r.sent_on()))
            .collect();
        records.sort_by_key(|r| r.sent_at);
        Ok(records)
    }

    async fn records_for_batch(
        &self,
        token: &CorrelationToken,
    ) -> Result<Vec<DeliveryRecord>, ContractError> {
        Ok(self
            .read_all()
            .await?
            .into_iter()
            .filter(|r| &r.correlation_token == token)
            .collect())
    }
}
