//! 持久化错误日志
//!
//! 追加写入的文本文件，每条记录包含时间戳、错误类型、发生的操作、错误消息以及 source 链。
//! 写日志本身失败时不会向上传播，只会累加进程级计数器。

use std::error::Error;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Local;
use contracts::{ContractError, ErrorLogConfig};

/// 记录分隔线
const SEPARATOR: &str = "--------------------------------------------------";

/// 未分类错误的类型名
const UNCLASSIFIED_KIND: &str = "UnhandledError";

/// 进程级: 错误日志写入失败次数
static LOGGING_FAILURES: AtomicU64 = AtomicU64::new(0);

/// 错误日志写入失败的累计次数
pub fn logging_failures() -> u64 {
    LOGGING_FAILURES.load(Ordering::Relaxed)
}

/// 追加式错误日志
#[derive(Debug, Clone)]
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    /// 创建错误日志 (文件在首次写入时创建)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 从配置创建
    pub fn from_config(config: &ErrorLogConfig) -> Self {
        Self::new(&config.path)
    }

    /// 日志文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 记录一个错误
    ///
    /// 返回是否写入成功；失败只计数，不传播。
    pub fn report(&self, operation: &str, err: &(dyn Error + 'static)) -> bool {
        let entry = format_entry(operation, err);
        match self.append(&entry) {
            Ok(()) => true,
            Err(e) => {
                LOGGING_FAILURES.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("newsletter_error_log_failures_total").increment(1);
                tracing::error!(
                    path = %self.path.display(),
                    operation,
                    error = %e,
                    original_error = %err,
                    "Failed to write error log"
                );
                false
            }
        }
    }

    fn append(&self, entry: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(entry.as_bytes())
    }
}

/// 错误类型名: 取 source 链上第一个 `ContractError` 的 kind
pub fn error_kind(err: &(dyn Error + 'static)) -> &'static str {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(contract) = e.downcast_ref::<ContractError>() {
            return contract.kind();
        }
        current = e.source();
    }
    UNCLASSIFIED_KIND
}

fn format_entry(operation: &str, err: &(dyn Error + 'static)) -> String {
    let mut entry = format!(
        "[{}] {} in {}\nMessage: {}\n",
        Local::now().format("%d/%m/%Y %H:%M:%S"),
        error_kind(err),
        operation,
        err
    );

    let mut source = err.source();
    while let Some(cause) = source {
        entry.push_str(&format!("Caused by: {cause}\n"));
        source = cause.source();
    }

    entry.push_str(SEPARATOR);
    entry.push('\n');
    entry
}
