//! Dispatcher - runs one batch through Validating → Staging → Sending → Completed

use std::sync::Arc;
use std::time::Instant;

use contracts::{
    AttachmentRef, Batch, BatchRequest, BatchResult, BatchState, ContractError, CorrelationToken,
    DeliveryLedger, DeliveryRecord, MailTransport, MailerBlueprint, OutboundMessage, Recipient,
    SenderIdentity, StagingConfig, ThrottleConfig, UploadedFile,
};
use ingestion::{decode_table, AttachmentStager, RecipientSource};
use throttle::Throttle;
use tracing::{debug, error, info, instrument, warn, Span};
use validator::ValidateEmail;

use crate::metrics::{DispatchMetrics, MetricsSnapshot};
use crate::render::MessageRenderer;

/// Dispatcher configuration
#[derive(Debug, Clone, Default)]
pub struct DispatcherConfig {
    /// Per-batch send rate
    pub throttle: ThrottleConfig,
    /// Where uploads are written
    pub staging: StagingConfig,
}

impl DispatcherConfig {
    pub fn from_blueprint(blueprint: &MailerBlueprint) -> Self {
        Self {
            throttle: blueprint.throttle.clone(),
            staging: blueprint.staging.clone(),
        }
    }
}

/// How a submitted batch ended
#[derive(Debug)]
pub enum BatchOutcome {
    /// Every recipient was processed
    Completed(BatchResult),
    /// Nothing was sent; `during` is the state the batch failed in
    Aborted {
        during: BatchState,
        error: ContractError,
    },
}

impl BatchOutcome {
    pub fn result(&self) -> Option<&BatchResult> {
        match self {
            Self::Completed(result) => Some(result),
            Self::Aborted { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&ContractError> {
        match self {
            Self::Completed(_) => None,
            Self::Aborted { error, .. } => Some(error),
        }
    }
}

/// Tracks the state of one batch and refuses illegal moves
#[derive(Debug)]
struct BatchProgress {
    state: BatchState,
    token: CorrelationToken,
}

impl BatchProgress {
    fn new(token: CorrelationToken) -> Self {
        Self {
            state: BatchState::Validating,
            token,
        }
    }

    fn advance(&mut self, next: BatchState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal batch transition {} -> {}",
            self.state,
            next
        );
        debug!(
            correlation_token = %self.token,
            from = %self.state,
            to = %next,
            "Batch state changed"
        );
        self.state = next;
    }
}

/// Recipients and input checked during `Validating`
struct ValidatedInput {
    recipients: Vec<Recipient>,
}

/// Sends newsletter batches through a transport and records every attempt
///
/// Each `submit` call owns its own `Throttle`, so concurrent batches do not
/// share a rate budget.
pub struct Dispatcher<T, L> {
    config: DispatcherConfig,
    transport: T,
    ledger: L,
    renderer: MessageRenderer,
    attachment_stager: AttachmentStager,
    recipient_stager: Option<AttachmentStager>,
    metrics: Arc<DispatchMetrics>,
}

impl<T, L> Dispatcher<T, L>
where
    T: MailTransport + Sync,
    L: DeliveryLedger + Sync,
{
    /// Create a dispatcher over a transport and a ledger
    pub fn new(config: DispatcherConfig, transport: T, ledger: L) -> Self {
        Self {
            attachment_stager: AttachmentStager::for_attachments(&config.staging),
            recipient_stager: AttachmentStager::for_recipients(&config.staging),
            renderer: MessageRenderer::new(),
            metrics: Arc::new(DispatchMetrics::new()),
            config,
            transport,
            ledger,
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Get dispatch counters
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Run one batch to completion
    ///
    /// Structural problems abort before anything is sent. Once sending starts,
    /// per-recipient failures are counted and the loop carries on.
    #[instrument(
        name = "dispatcher_submit",
        skip(self, request),
        fields(
            sender = %request.sender,
            attachments = request.attachments.len(),
            correlation_token = tracing::field::Empty,
        )
    )]
    pub async fn submit(&self, request: BatchRequest) -> BatchOutcome {
        let token = CorrelationToken::generate();
        Span::current().record("correlation_token", tracing::field::display(&token));
        observability::record_batch_started();

        let mut progress = BatchProgress::new(token);

        let input = match self.validate(&request).await {
            Ok(input) => input,
            Err(error) => return self.abort(&mut progress, error),
        };

        progress.advance(BatchState::Staging);
        let attachments = match self.attachment_stager.stage(&request.attachments).await {
            Ok(attachments) => attachments,
            Err(error) => return self.abort(&mut progress, error),
        };

        progress.advance(BatchState::Sending);
        let batch = Batch {
            subject: request.subject,
            body_template: request.body_template,
            recipients: input.recipients,
            attachments,
            correlation_token: token,
            sender: request.sender,
        };
        let result = self.send_all(&batch).await;

        progress.advance(BatchState::Completed);
        self.metrics.inc_batches_completed();
        observability::record_batch_completed(&result);
        info!(
            total = result.total_recipients,
            failed = result.failed_count,
            skipped = result.skipped_count,
            "Batch completed"
        );

        BatchOutcome::Completed(result)
    }

    fn abort(&self, progress: &mut BatchProgress, error: ContractError) -> BatchOutcome {
        let during = progress.state;
        progress.advance(BatchState::Failed);
        self.metrics.inc_batches_aborted();
        observability::record_batch_aborted(error.kind());
        warn!(state = %during, kind = error.kind(), error = %error, "Batch aborted");

        BatchOutcome::Aborted { during, error }
    }

    /// Input checks in a fixed order; the first failure wins
    async fn validate(&self, request: &BatchRequest) -> Result<ValidatedInput, ContractError> {
        let file = request
            .recipient_file
            .as_ref()
            .filter(|f| !f.content.is_empty())
            .ok_or_else(|| ContractError::validation("Recipient file must be uploaded"))?;
        if request.subject.trim().is_empty() {
            return Err(ContractError::validation("Subject is required"));
        }
        if request.body_template.trim().is_empty() {
            return Err(ContractError::validation("Mail body is required"));
        }

        self.keep_recipient_copy(file, &request.sender).await;

        let source = RecipientSource::new(decode_table(file)?)?;
        debug!(rows = source.len(), "Recipient table accepted");

        Ok(ValidatedInput {
            recipients: source.into_iter().collect(),
        })
    }

    /// Store the uploaded table as `<user>_<file>`; failures only get logged
    async fn keep_recipient_copy(&self, file: &UploadedFile, sender: &SenderIdentity) {
        let Some(stager) = &self.recipient_stager else {
            return;
        };
        if let Err(e) = stager.stage_recipient_file(file, sender).await {
            warn!(file = %file.file_name, error = %e, "Could not keep a copy of the recipient file");
        }
    }

    async fn send_all(&self, batch: &Batch) -> BatchResult {
        let mut throttle = Throttle::from_config(&self.config.throttle);
        let mut result = BatchResult {
            total_recipients: 0,
            failed_count: 0,
            skipped_count: 0,
            correlation_token: batch.correlation_token,
        };

        for (row, recipient) in batch.recipients.iter().enumerate() {
            if !recipient.email.validate_email() {
                debug!(row, email = %recipient.email, "Skipping recipient with invalid address");
                result.skipped_count += 1;
                self.metrics.inc_skipped();
                observability::record_skipped();
                continue;
            }

            throttle.admit().await;
            result.total_recipients += 1;

            if !self.send_one(batch, recipient, &batch.attachments).await {
                result.failed_count += 1;
            }
        }

        result
    }

    /// Render, transmit and record one recipient; returns whether the send succeeded
    #[instrument(
        name = "dispatcher_send_one",
        skip(self, batch, recipient, attachments),
        fields(recipient = %recipient.email)
    )]
    async fn send_one(
        &self,
        batch: &Batch,
        recipient: &Recipient,
        attachments: &[AttachmentRef],
    ) -> bool {
        let rendered = self
            .renderer
            .render(&batch.subject, &batch.body_template, recipient);
        let message = OutboundMessage {
            to: &recipient.email,
            subject: &rendered.subject,
            html_body: &rendered.html_body,
            attachments,
        };

        let started = Instant::now();
        let sent = match self.transport.send(&message).await {
            Ok(()) => {
                self.metrics.inc_sent();
                true
            }
            Err(e) => {
                self.metrics.inc_failed();
                warn!(transport = self.transport.name(), error = %e, "Send failed");
                false
            }
        };
        observability::record_send(sent, started.elapsed().as_secs_f64() * 1000.0);

        let record = DeliveryRecord::email(
            recipient.email.clone(),
            rendered.subject,
            rendered.html_body,
            sent,
            batch.correlation_token,
            batch.sender.clone(),
        );
        if let Err(e) = self.ledger.record(&record).await {
            self.metrics.inc_ledger_failures();
            observability::record_ledger_failure(self.ledger.name());
            error!(ledger = self.ledger.name(), kind = e.kind(), error = %e, "Delivery record lost");
        }

        sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedger;
    use crate::render::FOOTER;
    use mailer::{MockMailer, MockMailerConfig};
    use std::time::Duration;
    use tempfile::TempDir;

    fn config(dir: &TempDir, cap: u32) -> DispatcherConfig {
        DispatcherConfig {
            throttle: ThrottleConfig {
                emails_per_hour: cap,
                window_secs: 3600,
            },
            staging: StagingConfig {
                attachments_dir: dir.path().join("attachments"),
                recipients_dir: None,
                max_attempts: 4,
            },
        }
    }

    fn dispatcher(
        dir: &TempDir,
        mailer: MockMailer,
    ) -> Dispatcher<MockMailer, MemoryLedger> {
        Dispatcher::new(config(dir, 100), mailer, MemoryLedger::default())
    }

    fn csv(rows: &[&str]) -> UploadedFile {
        let mut content = String::from("Email,Title,Name\n");
        for row in rows {
            content.push_str(row);
            content.push('\n');
        }
        UploadedFile::new("recipients.csv", content.into_bytes())
    }

    fn request(file: Option<UploadedFile>, subject: &str, body: &str) -> BatchRequest {
        BatchRequest {
            recipient_file: file,
            subject: subject.into(),
            body_template: body.into(),
            attachments: Vec::new(),
            sender: SenderIdentity::new("jdoe"),
        }
    }

    fn abort_message(outcome: &BatchOutcome) -> String {
        outcome.error().map(ToString::to_string).unwrap_or_default()
    }

    #[tokio::test]
    async fn test_valid_and_invalid_recipients() {
        let dir = TempDir::new().unwrap();
        let d = dispatcher(&dir, MockMailer::new());

        let outcome = d
            .submit(request(
                Some(csv(&["a@x.com,Dr,A. Bello", "not-an-email,,"])),
                "Update",
                "Hello {title} {name}",
            ))
            .await;

        let result = *outcome.result().unwrap();
        assert_eq!(result.total_recipients, 1);
        assert_eq!(result.failed_count, 0);
        assert_eq!(result.skipped_count, 1);

        let sent = d.transport().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "a@x.com");
        assert_eq!(sent[0].html_body, format!("Hello Dr A. Bello{FOOTER}"));

        let records = d.ledger().records_for_batch(&result.correlation_token).await.unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].sent);
        assert!(!records[0].delivered);
        assert_eq!(records[0].sender.user_name(), "jdoe");
    }

    #[tokio::test]
    async fn test_failures_are_counted_and_loop_continues() {
        let dir = TempDir::new().unwrap();
        let mailer = MockMailer::with_config(MockMailerConfig::failing(["b@x.com"]));
        let d = dispatcher(&dir, mailer);

        let outcome = d
            .submit(request(
                Some(csv(&["a@x.com,,A", "b@x.com,,B", "c@x.com,,C"])),
                "Update",
                "Hi {name}",
            ))
            .await;

        let result = *outcome.result().unwrap();
        assert_eq!(result.total_recipients, 3);
        assert_eq!(result.failed_count, 1);
        assert_eq!(d.transport().attempted(), vec!["a@x.com", "b@x.com", "c@x.com"]);

        let records = d.ledger().records_for_batch(&result.correlation_token).await.unwrap();
        let sent_records = records.iter().filter(|r| r.sent).count();
        assert_eq!(result.total_recipients - result.failed_count, sent_records);
        assert_eq!(records.len(), 3);
    }

    #[tokio::test]
    async fn test_validation_order() {
        let dir = TempDir::new().unwrap();
        let d = dispatcher(&dir, MockMailer::new());

        let outcome = d.submit(request(None, "", "")).await;
        assert_eq!(abort_message(&outcome), "Recipient file must be uploaded");

        let outcome = d.submit(request(Some(csv(&["a@x.com,,"])), "  ", "")).await;
        assert_eq!(abort_message(&outcome), "Subject is required");

        let outcome = d.submit(request(Some(csv(&["a@x.com,,"])), "s", " \n")).await;
        assert_eq!(abort_message(&outcome), "Mail body is required");

        let empty = UploadedFile::new("recipients.csv", Vec::new());
        let outcome = d.submit(request(Some(empty), "s", "b")).await;
        assert_eq!(abort_message(&outcome), "Recipient file must be uploaded");

        assert_eq!(d.transport().sent_count(), 0);
        assert!(d.ledger().is_empty());
        assert_eq!(d.metrics().batches_aborted, 4);
    }

    #[tokio::test]
    async fn test_empty_table_aborts_before_sending() {
        let dir = TempDir::new().unwrap();
        let d = dispatcher(&dir, MockMailer::new());

        let outcome = d.submit(request(Some(csv(&[])), "Update", "Hello")).await;

        match &outcome {
            BatchOutcome::Aborted { during, error } => {
                assert_eq!(*during, BatchState::Validating);
                assert_eq!(error.to_string(), "At least one recipient is required.");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(d.ledger().is_empty());
    }

    #[tokio::test]
    async fn test_missing_column_aborts() {
        let dir = TempDir::new().unwrap();
        let d = dispatcher(&dir, MockMailer::new());
        let file = UploadedFile::new("r.csv", "Email,Name\na@x.com,A\n");

        let outcome = d.submit(request(Some(file), "Update", "Hello")).await;

        assert_eq!(
            abort_message(&outcome),
            "Column Title is required in the recipients file uploaded."
        );
        assert_eq!(outcome.error().unwrap().kind(), "SourceFormatError");
    }

    #[tokio::test]
    async fn test_attachments_are_staged_once_and_shared() {
        let dir = TempDir::new().unwrap();
        let d = dispatcher(&dir, MockMailer::new());
        let mut req = request(
            Some(csv(&["a@x.com,,A", "b@x.com,,B"])),
            "Update",
            "Hello",
        );
        req.attachments = vec![
            UploadedFile::new("report.pdf", b"one".to_vec()),
            UploadedFile::new("report.pdf", b"two".to_vec()),
        ];

        let outcome = d.submit(req).await;
        assert!(outcome.result().is_some());

        let sent = d.transport().sent();
        assert_eq!(sent[0].attachments, sent[1].attachments);
        assert_eq!(sent[0].attachments.len(), 2);
        assert_ne!(
            sent[0].attachments[0].storage_path,
            sent[0].attachments[1].storage_path
        );
    }

    #[tokio::test]
    async fn test_attachment_exhaustion_aborts_during_staging() {
        let dir = TempDir::new().unwrap();
        let attachments_dir = dir.path().join("attachments");
        for name in ["a.txt", "a_1.txt", "a_2.txt", "a_3.txt"] {
            std::fs::create_dir_all(attachments_dir.join(name)).unwrap();
        }
        let d = dispatcher(&dir, MockMailer::new());
        let mut req = request(Some(csv(&["a@x.com,,A"])), "Update", "Hello");
        req.attachments = vec![UploadedFile::new("a.txt", b"x".to_vec())];

        let outcome = d.submit(req).await;

        match &outcome {
            BatchOutcome::Aborted { during, error } => {
                assert_eq!(*during, BatchState::Staging);
                assert_eq!(error.kind(), "AttachmentError");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(d.transport().sent_count(), 0);
    }

    #[tokio::test]
    async fn test_ledger_failure_does_not_stop_dispatch() {
        let dir = TempDir::new().unwrap();
        let d = dispatcher(&dir, MockMailer::new());
        d.ledger().set_failing(true);

        let outcome = d
            .submit(request(Some(csv(&["a@x.com,,A", "b@x.com,,B"])), "s", "b"))
            .await;

        let result = *outcome.result().unwrap();
        assert_eq!(result.failed_count, 0);
        assert_eq!(d.transport().sent_count(), 2);
        assert_eq!(d.metrics().ledger_failure_count, 2);
    }

    #[tokio::test]
    async fn test_recipient_file_copy_is_kept() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(&dir, 100);
        cfg.staging.recipients_dir = Some(dir.path().join("recipients"));
        let d = Dispatcher::new(cfg, MockMailer::new(), MemoryLedger::default());

        d.submit(request(Some(csv(&["a@x.com,,A"])), "s", "b")).await;

        assert!(dir.path().join("recipients/jdoe_recipients.csv").exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cap_pauses_once_per_window() {
        let dir = TempDir::new().unwrap();
        let d = Dispatcher::new(config(&dir, 2), MockMailer::new(), MemoryLedger::default());
        let started = tokio::time::Instant::now();

        let outcome = d
            .submit(request(
                Some(csv(&["a@x.com,,", "b@x.com,,", "c@x.com,,"])),
                "s",
                "b",
            ))
            .await;

        assert_eq!(outcome.result().unwrap().total_recipients, 3);
        assert!(tokio::time::Instant::now() - started >= Duration::from_secs(3600));
    }
}
