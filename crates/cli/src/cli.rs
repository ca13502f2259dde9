//! CLI argument definitions using clap.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Newsletter - rate-limited, personalized bulk mail dispatcher
#[derive(Parser, Debug)]
#[command(
    name = "newsletter",
    author,
    version,
    about = "Rate-limited personalized newsletter dispatcher",
    long_about = "Sends one personalized HTML message per row of an uploaded recipient table.\n\n\
                  Attachments are staged once per batch, sends are capped per time window, \n\
                  and every attempt is written to the delivery ledger."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "NEWSLETTER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "NEWSLETTER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    /// Serve Prometheus metrics on this port
    #[arg(long, global = true, env = "NEWSLETTER_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Error log used when a command fails before its configuration is loaded
    #[arg(
        long,
        global = true,
        default_value = "Error_Log.txt",
        env = "NEWSLETTER_ERROR_LOG"
    )]
    pub error_log: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send a newsletter batch
    Send(SendArgs),

    /// List delivery records between two days
    History(HistoryArgs),

    /// Validate configuration file without sending
    Validate(ValidateArgs),
}

/// Configuration file shared by every command
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "newsletter.toml",
        env = "NEWSLETTER_CONFIG"
    )]
    pub config: PathBuf,
}

/// Arguments for the `send` command
#[derive(Parser, Debug, Clone)]
pub struct SendArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Recipient table (CSV, TSV or Excel workbook with Email, Title and Name columns)
    #[arg(short, long)]
    pub recipients: PathBuf,

    /// Subject line
    #[arg(short, long)]
    pub subject: String,

    /// HTML body template; `{title}` and `{name}` are replaced per recipient
    #[arg(long, conflicts_with = "body_file", required_unless_present = "body_file")]
    pub body: Option<String>,

    /// Read the body template from a file
    #[arg(long)]
    pub body_file: Option<PathBuf>,

    /// File to attach to every message (repeatable)
    #[arg(short, long = "attachment")]
    pub attachments: Vec<PathBuf>,

    /// Operator name recorded with every delivery
    #[arg(long, default_value = "newsletter", env = "NEWSLETTER_SENDER")]
    pub sender: String,

    /// Override SMTP host from configuration
    #[arg(long, env = "NEWSLETTER_SMTP_HOST")]
    pub smtp_host: Option<String>,

    /// Override SMTP port from configuration
    #[arg(long, env = "NEWSLETTER_SMTP_PORT")]
    pub smtp_port: Option<u16>,

    /// Override SMTP password from configuration
    #[arg(long, env = "NEWSLETTER_SMTP_PASSWORD", hide_env_values = true)]
    pub smtp_password: Option<String>,

    /// Run the batch against an in-memory transport instead of SMTP
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `history` command
#[derive(Parser, Debug)]
pub struct HistoryArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// First day, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub from: NaiveDate,

    /// Last day, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub to: NaiveDate,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
