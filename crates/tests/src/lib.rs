//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 配置 -> 账本 -> 分发器 的装配测试
//! - 模拟 e2e 测试（内存传输，无需 SMTP 服务器）
//! - 限流时序测试（暂停时钟）

#[cfg(test)]
mod contract_tests {
    use contracts::{BatchState, ConfigVersion};

    #[test]
    fn test_contracts_compile() {
        let _ = ConfigVersion::V1;
    }

    #[test]
    fn test_terminal_states_have_no_successor() {
        let all = [
            BatchState::Validating,
            BatchState::Staging,
            BatchState::Sending,
            BatchState::Completed,
            BatchState::Failed,
        ];
        for state in all.into_iter().filter(|s| s.is_terminal()) {
            assert!(all.iter().all(|next| !state.can_transition_to(*next)));
        }
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::path::Path;

    use chrono::{Duration as Days, Local};
    use config_loader::ConfigLoader;
    use contracts::{
        BatchRequest, DateRange, DeliveryLedger, DeliveryStatus, MailerBlueprint, SenderIdentity,
        UploadedFile,
    };
    use dispatcher::{create_ledger, AnyLedger, BatchOutcome, Dispatcher, DispatcherConfig, FailureReporter};
    use mailer::{MockMailer, MockMailerConfig};
    use observability::ErrorLog;
    use tempfile::TempDir;

    fn write_config(dir: &Path, emails_per_hour: u32) -> MailerBlueprint {
        let toml = format!(
            r#"
[smtp]
host = "smtp.example.com"
username = "mailer"

[sender]
email = "news@example.com"
display_name = "Newsletter"

[throttle]
emails_per_hour = {emails_per_hour}

[staging]
attachments_dir = "{root}/uploads/newsletters"
recipients_dir = "{root}/uploads/recipients"

[ledger]
ledger_type = "file"
path = "{root}/ledger/deliveries.jsonl"

[error_log]
path = "{root}/Error_Log.txt"
"#,
            root = dir.display()
        );
        let path = dir.join("newsletter.toml");
        std::fs::write(&path, toml).unwrap();
        ConfigLoader::load_from_path(&path).unwrap()
    }

    fn request(table: &str, attachments: Vec<UploadedFile>) -> BatchRequest {
        BatchRequest {
            recipient_file: Some(UploadedFile::new("recipients.csv", table.to_string())),
            subject: "March update".into(),
            body_template: "<p>Dear {title} {name},</p><p>News inside.</p>".into(),
            attachments,
            sender: SenderIdentity::new("jdoe"),
        }
    }

    fn today() -> DateRange {
        let day = Local::now().date_naive();
        DateRange::new(day, day).unwrap()
    }

    async fn dispatcher_for(
        blueprint: &MailerBlueprint,
        mailer: MockMailer,
    ) -> Dispatcher<MockMailer, AnyLedger> {
        let ledger = create_ledger(&blueprint.ledger).await.unwrap();
        Dispatcher::new(DispatcherConfig::from_blueprint(blueprint), mailer, ledger)
    }

    /// End-to-end test: config file -> CSV upload -> dispatch -> file ledger -> history
    #[tokio::test]
    async fn test_e2e_config_to_history() {
        let dir = TempDir::new().unwrap();
        let blueprint = write_config(dir.path(), 100);
        let dispatcher = dispatcher_for(&blueprint, MockMailer::new()).await;

        let table = "Email,Title,Name,Department\n\
                     a@x.com,Dr,A. Bello,Research\n\
                     not-an-email,Mr,Nobody,\n\
                     b@x.com,Ms,B. Chen,Sales\n";
        let attachment = UploadedFile::new("agenda.pdf", b"%PDF-1.4".to_vec());

        let outcome = dispatcher.submit(request(table, vec![attachment])).await;
        let summary = FailureReporter::without_error_log().report(&outcome);
        assert_eq!(summary, "Mail was sent to all recipients.");

        let result = *outcome.result().unwrap();
        assert_eq!(result.total_recipients, 2);
        assert_eq!(result.skipped_count, 1);

        let sent = dispatcher.transport().sent();
        assert!(sent[0].html_body.starts_with("<p>Dear Dr A. Bello,</p>"));
        assert!(sent[1].html_body.starts_with("<p>Dear Ms B. Chen,</p>"));
        assert!(sent[0].attachments[0].storage_path.exists());

        assert!(dir
            .path()
            .join("uploads/recipients/jdoe_recipients.csv")
            .exists());

        let history = dispatcher.ledger().history(&today()).await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history
            .iter()
            .all(|r| r.correlation_token == result.correlation_token));
    }

    /// Records survive reopening the file ledger
    #[tokio::test]
    async fn test_file_ledger_history_persists() {
        let dir = TempDir::new().unwrap();
        let blueprint = write_config(dir.path(), 100);

        {
            let mailer = MockMailer::with_config(MockMailerConfig::failing(["b@x.com"]));
            let dispatcher = dispatcher_for(&blueprint, mailer).await;
            dispatcher
                .submit(request("Email,Title,Name\na@x.com,,A\nb@x.com,,B\n", vec![]))
                .await;
        }

        let ledger = create_ledger(&blueprint.ledger).await.unwrap();
        let entries: Vec<_> = ledger
            .history(&today())
            .await
            .unwrap()
            .iter()
            .map(|r| r.to_history_entry())
            .collect();

        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries.iter().filter(|e| e.status == DeliveryStatus::Failed).count(),
            1
        );
        assert!(entries.iter().all(|e| e.sender == "jdoe"));

        let yesterday = Local::now().date_naive() - Days::days(1);
        let past = DateRange::new(yesterday, yesterday).unwrap();
        assert!(ledger.history(&past).await.unwrap().is_empty());
    }

    /// Partial failure summary matches the ledger
    #[tokio::test]
    async fn test_partial_failure_summary() {
        let dir = TempDir::new().unwrap();
        let blueprint = write_config(dir.path(), 100);
        let mailer = MockMailer::with_config(MockMailerConfig::failing(["c@x.com", "d@x.com"]));
        let dispatcher = dispatcher_for(&blueprint, mailer).await;
        let reporter = FailureReporter::new(ErrorLog::from_config(&blueprint.error_log));

        let outcome = dispatcher
            .submit(request(
                "Email,Title,Name\na@x.com,,A\nb@x.com,,B\nc@x.com,,C\nd@x.com,,D\n",
                vec![],
            ))
            .await;

        assert_eq!(
            reporter.report(&outcome),
            "2 of 4 emails were sent. 2 failed to deliver."
        );

        let token = outcome.result().unwrap().correlation_token;
        let records = dispatcher.ledger().records_for_batch(&token).await.unwrap();
        assert_eq!(records.iter().filter(|r| r.sent).count(), 2);
        assert!(!blueprint.error_log.path.exists());
    }

    /// TSV uploads go through the same pipeline
    #[tokio::test]
    async fn test_tsv_upload() {
        let dir = TempDir::new().unwrap();
        let blueprint = write_config(dir.path(), 100);
        let dispatcher = dispatcher_for(&blueprint, MockMailer::new()).await;

        let mut req = request("", vec![]);
        req.recipient_file = Some(UploadedFile::new(
            "list.tsv",
            "Name\tTitle\tEmail\nA. Bello\tDr\ta@x.com\n",
        ));

        let outcome = dispatcher.submit(req).await;
        assert_eq!(outcome.result().unwrap().total_recipients, 1);
        assert_eq!(dispatcher.transport().sent()[0].to, "a@x.com");
    }

    /// Excel workbooks are read from their first sheet
    #[tokio::test]
    async fn test_xlsx_upload() {
        let dir = TempDir::new().unwrap();
        let blueprint = write_config(dir.path(), 100);
        let dispatcher = dispatcher_for(&blueprint, MockMailer::new()).await;

        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        for (row, cells) in [
            ["Email", "Title", "Name"],
            ["a@x.com", "Dr", "A. Bello"],
            ["b@x.com", "Ms", "B. Chen"],
        ]
        .iter()
        .enumerate()
        {
            for (col, cell) in cells.iter().enumerate() {
                sheet.write_string(row as u32, col as u16, *cell).unwrap();
            }
        }
        workbook.add_worksheet().write_string(0, 0, "ignored").unwrap();

        let mut req = request("", vec![]);
        req.recipient_file = Some(UploadedFile::new(
            "list.xlsx",
            workbook.save_to_buffer().unwrap(),
        ));

        let outcome = dispatcher.submit(req).await;
        assert_eq!(outcome.result().unwrap().total_recipients, 2);
        let sent = dispatcher.transport().sent();
        assert!(sent[1].html_body.starts_with("<p>Dear Ms B. Chen,</p>"));
        assert!(dir
            .path()
            .join("uploads/recipients/jdoe_list.xlsx")
            .exists());
    }

    /// Unsupported uploads abort with the format message
    #[tokio::test]
    async fn test_unsupported_upload_aborts() {
        let dir = TempDir::new().unwrap();
        let blueprint = write_config(dir.path(), 100);
        let dispatcher = dispatcher_for(&blueprint, MockMailer::new()).await;

        let mut req = request("", vec![]);
        req.recipient_file = Some(UploadedFile::new("list.json", b"[]".to_vec()));

        let outcome = dispatcher.submit(req).await;
        assert!(matches!(outcome, BatchOutcome::Aborted { .. }));
        assert_eq!(
            FailureReporter::without_error_log().report(&outcome),
            "Error: Unsupported recipient file format: .json"
        );
        assert!(dispatcher.ledger().history(&today()).await.unwrap().is_empty());
    }

    /// 120 recipients at 100 per hour pause exactly once
    #[tokio::test(start_paused = true)]
    async fn test_throttle_suspends_once_for_120_recipients() {
        let dir = TempDir::new().unwrap();
        let blueprint = write_config(dir.path(), 100);
        let ledger = create_ledger(&contracts::LedgerConfig {
            ledger_type: contracts::LedgerType::Memory,
            path: None,
        })
        .await
        .unwrap();
        let dispatcher = Dispatcher::new(
            DispatcherConfig::from_blueprint(&blueprint),
            MockMailer::new(),
            ledger,
        );

        let mut table = String::from("Email,Title,Name\n");
        for i in 0..120 {
            table.push_str(&format!("user{i}@x.com,,User {i}\n"));
        }

        let started = tokio::time::Instant::now();
        let outcome = dispatcher.submit(request(&table, vec![])).await;
        let elapsed = tokio::time::Instant::now() - started;

        assert_eq!(outcome.result().unwrap().total_recipients, 120);
        assert_eq!(dispatcher.transport().sent_count(), 120);
        assert!(elapsed >= std::time::Duration::from_secs(3600));
        assert!(elapsed < std::time::Duration::from_secs(7200));
    }

    /// Throttle used on its own keeps the same window semantics
    #[tokio::test(start_paused = true)]
    async fn test_throttle_window_counts() {
        let mut throttle = throttle::Throttle::new(100, std::time::Duration::from_secs(3600));
        for _ in 0..120 {
            throttle.admit().await;
        }
        assert_eq!(throttle.stats().suspensions, 1);
        assert_eq!(throttle.window().count_in_window, 20);
    }
}
