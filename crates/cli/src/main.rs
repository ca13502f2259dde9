//! # Newsletter CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载与验证
//! - 批次发送 (SMTP 或内存传输)
//! - 投递历史查询

mod cli;
mod commands;
mod error;

use clap::Parser;
use observability::{ErrorLog, ObservabilityConfig};
use std::path::Path;
use std::process::ExitCode;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_history, run_send, run_validate};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli) {
        eprintln!("Error: {e:#}");
        return ExitCode::FAILURE;
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Newsletter CLI starting"
    );

    let result = match &cli.command {
        Commands::Send(args) => run_send(args).await,
        Commands::History(args) => run_history(args).await,
        Commands::Validate(args) => run_validate(args),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            error_log_for(&cli).report(command_name(&cli.command), e.as_ref());
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Send(_) => "send",
        Commands::History(_) => "history",
        Commands::Validate(_) => "validate",
    }
}

fn config_path(command: &Commands) -> &Path {
    match command {
        Commands::Send(args) => &args.config.config,
        Commands::History(args) => &args.config.config,
        Commands::Validate(args) => &args.config.config,
    }
}

/// 配置可读时使用 `error_log.path`，否则退回 `--error-log`
fn error_log_for(cli: &Cli) -> ErrorLog {
    match config_loader::ConfigLoader::load_from_path(config_path(&cli.command)) {
        Ok(blueprint) => ErrorLog::from_config(&blueprint.error_log),
        Err(_) => ErrorLog::new(&cli.error_log),
    }
}

/// Initialize logging based on CLI options
fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let mut config =
        ObservabilityConfig::with_verbosity(cli.log_format.into(), cli.verbose, cli.quiet);
    config.metrics_port = cli.metrics_port;
    observability::init_with_config(config)
}
