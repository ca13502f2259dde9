//! `send` command implementation.

use anyhow::{Context, Result};
use contracts::{BatchRequest, MailTransport, MailerBlueprint, SenderIdentity, UploadedFile};
use dispatcher::{
    create_ledger, AnyLedger, BatchOutcome, Dispatcher, DispatcherConfig, FailureReporter,
};
use observability::ErrorLog;
use std::path::Path;
use std::process::ExitCode;
use tracing::{info, warn};

use super::load_config;
use crate::cli::SendArgs;
use crate::error::CliError;

/// Execute the `send` command
pub async fn run_send(args: &SendArgs) -> Result<ExitCode> {
    let mut blueprint = load_config(&args.config.config)?;
    apply_overrides(&mut blueprint, args);
    config_loader::ConfigLoader::validate(&blueprint)
        .context("Configuration invalid after command-line overrides")?;

    info!(
        host = %blueprint.smtp.host,
        port = blueprint.smtp.port,
        emails_per_hour = blueprint.throttle.emails_per_hour,
        ledger = ?blueprint.ledger.ledger_type,
        "Configuration loaded"
    );

    let request = build_request(args).await?;
    let ledger = create_ledger(&blueprint.ledger)
        .await
        .context("Failed to open delivery ledger")?;
    let reporter = FailureReporter::new(ErrorLog::from_config(&blueprint.error_log));
    let config = DispatcherConfig::from_blueprint(&blueprint);

    if args.dry_run {
        info!("Dry run mode - messages are kept in memory");
        let transport = mailer::MockMailer::new();
        return dispatch(config, transport, ledger, request, &reporter).await;
    }

    #[cfg(feature = "smtp")]
    {
        let transport = mailer::SmtpMailer::new(&blueprint.smtp, &blueprint.sender)
            .context("Failed to set up SMTP transport")?;
        return dispatch(config, transport, ledger, request, &reporter).await;
    }

    #[cfg(not(feature = "smtp"))]
    {
        drop((config, ledger, request, reporter));
        return Err(CliError::TransportUnavailable.into());
    }
}

/// Submit one batch and print its summary
async fn dispatch<T>(
    config: DispatcherConfig,
    transport: T,
    ledger: AnyLedger,
    request: BatchRequest,
    reporter: &FailureReporter,
) -> Result<ExitCode>
where
    T: MailTransport + Sync,
{
    let dispatcher = Dispatcher::new(config, transport, ledger);
    info!(transport = dispatcher.transport().name(), "Starting batch...");

    let outcome = tokio::select! {
        outcome = dispatcher.submit(request) => outcome,
        _ = shutdown_signal() => {
            warn!("Received shutdown signal, stopping mid-batch");
            return Ok(ExitCode::from(130));
        }
    };

    println!("{}", reporter.report(&outcome));

    let stats = dispatcher.metrics();
    info!(
        sent = stats.sent_count,
        failed = stats.failed_count,
        skipped = stats.skipped_count,
        ledger_failures = stats.ledger_failure_count,
        "Newsletter finished"
    );

    Ok(match outcome {
        BatchOutcome::Completed(_) => ExitCode::SUCCESS,
        BatchOutcome::Aborted { .. } => ExitCode::FAILURE,
    })
}

/// Apply command-line and environment overrides to the loaded configuration
fn apply_overrides(blueprint: &mut MailerBlueprint, args: &SendArgs) {
    if let Some(ref host) = args.smtp_host {
        info!(host = %host, "Overriding SMTP host from CLI");
        blueprint.smtp.host = host.clone();
    }
    if let Some(port) = args.smtp_port {
        info!(port, "Overriding SMTP port from CLI");
        blueprint.smtp.port = port;
    }
    if let Some(ref password) = args.smtp_password {
        info!("Overriding SMTP password from environment");
        blueprint.smtp.password = password.clone();
    }
}

/// Read every input file into a batch request
async fn build_request(args: &SendArgs) -> Result<BatchRequest> {
    let recipient_file = read_upload("recipient table", &args.recipients).await?;

    let body_template = match (&args.body, &args.body_file) {
        (Some(body), _) => body.clone(),
        (None, Some(path)) => tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CliError::input_read("body template", path, e))?,
        (None, None) => String::new(),
    };

    let mut attachments = Vec::with_capacity(args.attachments.len());
    for path in &args.attachments {
        attachments.push(read_upload("attachment", path).await?);
    }

    Ok(BatchRequest {
        recipient_file: Some(recipient_file),
        subject: args.subject.clone(),
        body_template,
        attachments,
        sender: SenderIdentity::new(args.sender.clone()),
    })
}

async fn read_upload(what: &'static str, path: &Path) -> Result<UploadedFile, CliError> {
    let content = tokio::fs::read(path)
        .await
        .map_err(|e| CliError::input_read(what, path, e))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(UploadedFile::new(file_name, content))
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
