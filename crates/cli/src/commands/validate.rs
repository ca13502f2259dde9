//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{LedgerType, MailerBlueprint};
use serde::Serialize;
use std::process::ExitCode;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    smtp: String,
    sender: String,
    emails_per_hour: u32,
    window_secs: u64,
    attachments_dir: String,
    ledger: String,
    error_log: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<ExitCode> {
    let path = &args.config.config;
    info!(config = %path.display(), "Validating configuration");

    let result = match config_loader::ConfigLoader::load_from_path(path) {
        Ok(blueprint) => valid_result(path.display().to_string(), &blueprint),
        Err(e) => ValidationResult {
            valid: false,
            config_path: path.display().to_string(),
            error: Some(if path.exists() {
                e.to_string()
            } else {
                format!("File not found: {}", path.display())
            }),
            warnings: None,
            summary: None,
        },
    };

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    Ok(if result.valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn valid_result(config_path: String, blueprint: &MailerBlueprint) -> ValidationResult {
    let warnings = collect_warnings(blueprint);
    let ledger = match (&blueprint.ledger.ledger_type, &blueprint.ledger.path) {
        (LedgerType::File, Some(path)) => format!("file ({})", path.display()),
        (other, _) => format!("{other:?}").to_lowercase(),
    };

    ValidationResult {
        valid: true,
        config_path,
        error: None,
        warnings: if warnings.is_empty() {
            None
        } else {
            Some(warnings)
        },
        summary: Some(ConfigSummary {
            version: format!("{:?}", blueprint.version),
            smtp: format!("{}:{}", blueprint.smtp.host, blueprint.smtp.port),
            sender: blueprint.sender.email.clone(),
            emails_per_hour: blueprint.throttle.emails_per_hour,
            window_secs: blueprint.throttle.window_secs,
            attachments_dir: blueprint.staging.attachments_dir.display().to_string(),
            ledger,
            error_log: blueprint.error_log.path.display().to_string(),
        }),
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &MailerBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if !blueprint.smtp.use_tls {
        warnings.push("smtp.use_tls is false - credentials and mail go out unencrypted".to_string());
    }

    if !blueprint.smtp.username.is_empty() && blueprint.smtp.password.is_empty() {
        warnings.push(
            "smtp.password is empty - set NEWSLETTER_SMTP_PASSWORD before sending".to_string(),
        );
    }

    match blueprint.ledger.ledger_type {
        LedgerType::File => {}
        LedgerType::Memory | LedgerType::Log => warnings.push(format!(
            "ledger type {:?} does not persist records - history will be empty",
            blueprint.ledger.ledger_type
        )),
    }

    if blueprint.staging.recipients_dir.is_none() {
        warnings.push("staging.recipients_dir is not set - uploaded tables are not kept".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  SMTP: {}", summary.smtp);
            println!("  Sender: {}", summary.sender);
            println!(
                "  Throttle: {} per {}s",
                summary.emails_per_hour, summary.window_secs
            );
            println!("  Attachments: {}", summary.attachments_dir);
            println!("  Ledger: {}", summary.ledger);
            println!("  Error log: {}", summary.error_log);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
