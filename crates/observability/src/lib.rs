//! # Observability
//!
//! 日志、指标与持久化错误日志。
//!
//! - `init_with_config`: 安装 tracing subscriber，可选开启 Prometheus 端口
//! - `metrics`: `newsletter_*` 计数器与直方图
//! - `ErrorLog`: 追加式文本错误日志，自身失败只计数不传播
//!
//! ```ignore
//! use observability::{init_with_config, ErrorLog, ObservabilityConfig};
//!
//! init_with_config(ObservabilityConfig::with_verbosity(LogFormat::Pretty, 1, false))?;
//! ErrorLog::from_config(&blueprint.error_log).report("send", &err);
//! ```

pub mod error_log;
pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub use crate::error_log::{error_kind, logging_failures, ErrorLog};
pub use crate::metrics::{
    record_batch_aborted, record_batch_completed, record_batch_started, record_ledger_failure,
    record_send, record_skipped,
};

/// 日志与指标输出设置
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub log_format: LogFormat,
    /// Prometheus 端口 (None = 不导出)
    pub metrics_port: Option<u16>,
    /// `RUST_LOG` 未设置时使用的级别
    pub default_log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self::with_verbosity(LogFormat::default(), 0, false)
    }
}

impl ObservabilityConfig {
    /// `quiet` 只保留 warn 及以上；每个 `-v` 提升一级 (info → debug → trace)
    pub fn with_verbosity(log_format: LogFormat, verbose: u8, quiet: bool) -> Self {
        let level = match (quiet, verbose) {
            (true, _) => "warn",
            (false, 0) => "info",
            (false, 1) => "debug",
            (false, _) => "trace",
        };
        Self {
            log_format,
            metrics_port: None,
            default_log_level: level.to_string(),
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.default_log_level))
    }
}

/// 日志格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// 每行一个 JSON 对象，带当前 span
    #[default]
    Json,
    /// 多行，便于本地阅读
    Pretty,
    /// 单行
    Compact,
}

/// 安装全局 subscriber；若配置了端口则同时开启指标导出
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    let output = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Compact => fmt::layer().compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(config.filter())
        .with(output)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    if let Some(port) = config.metrics_port {
        serve_metrics(port)?;
    }

    tracing::debug!(
        log_format = ?config.log_format,
        level = %config.default_log_level,
        metrics_port = ?config.metrics_port,
        "Observability initialized"
    );
    Ok(())
}

/// 在 `0.0.0.0:<port>` 上暴露 Prometheus 抓取端点
pub fn serve_metrics(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .with_context(|| format!("Failed to start metrics listener on port {port}"))?;

    tracing::info!(port, "Prometheus metrics endpoint initialized");
    Ok(())
}
