//! `history` command implementation.

use anyhow::{Context, Result};
use contracts::{DateRange, DeliveryLedger, HistoryEntry, LedgerType};
use dispatcher::create_ledger;
use std::process::ExitCode;
use tracing::{info, warn};

use super::load_config;
use crate::cli::HistoryArgs;

/// Execute the `history` command
pub async fn run_history(args: &HistoryArgs) -> Result<ExitCode> {
    let blueprint = load_config(&args.config.config)?;
    let range = DateRange::new(args.from, args.to)?;

    if blueprint.ledger.ledger_type != LedgerType::File {
        warn!(
            ledger = ?blueprint.ledger.ledger_type,
            "Configured ledger does not persist records; history will be empty"
        );
    }

    let ledger = create_ledger(&blueprint.ledger)
        .await
        .context("Failed to open delivery ledger")?;
    let entries: Vec<HistoryEntry> = ledger
        .history(&range)
        .await
        .context("Failed to read delivery history")?
        .iter()
        .map(|r| r.to_history_entry())
        .collect();

    info!(
        from = %range.start(),
        to = %range.end(),
        entries = entries.len(),
        "History loaded"
    );

    if args.json {
        let json =
            serde_json::to_string_pretty(&entries).context("Failed to serialize history")?;
        println!("{}", json);
    } else {
        print_history(&entries);
    }

    Ok(ExitCode::SUCCESS)
}

fn print_history(entries: &[HistoryEntry]) {
    if entries.is_empty() {
        println!("No deliveries in range.");
        return;
    }

    println!(
        "{:<12} {:<8} {:<32} {:<16} Subject",
        "Date", "Status", "Recipient", "Sender"
    );
    for entry in entries {
        println!(
            "{:<12} {:<8} {:<32} {:<16} {}",
            entry.date_sent,
            entry.status.as_str(),
            entry.recipient,
            entry.sender,
            entry.subject
        );
    }
    println!("\n{} record(s)", entries.len());
}
