//! MailerBlueprint - Config Loader 输出
//!
//! 描述完整的发送配置：SMTP 服务器、发件人、限流、附件落盘、投递账本、错误日志。

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的发送配置蓝图
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MailerBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// SMTP 服务器设置
    #[validate(nested)]
    pub smtp: SmtpConfig,

    /// 发件人
    #[validate(nested)]
    pub sender: SenderConfig,

    /// 限流策略
    #[serde(default)]
    #[validate(nested)]
    pub throttle: ThrottleConfig,

    /// 上传文件落盘目录
    #[serde(default)]
    #[validate(nested)]
    pub staging: StagingConfig,

    /// 投递账本
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// 持久化错误日志
    #[serde(default)]
    pub error_log: ErrorLogConfig,
}

/// SMTP 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SmtpConfig {
    /// 服务器地址
    #[validate(length(min = 1, message = "smtp host cannot be empty"))]
    pub host: String,

    /// 服务器端口
    #[serde(default = "default_smtp_port")]
    #[validate(range(min = 1, message = "smtp port must be > 0"))]
    pub port: u16,

    /// 登录用户名 (为空时不认证)
    #[serde(default)]
    pub username: String,

    /// 登录密码
    #[serde(default)]
    pub password: String,

    /// 是否启用 STARTTLS
    #[serde(default = "default_use_tls")]
    pub use_tls: bool,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_use_tls() -> bool {
    true
}

/// 发件人配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SenderConfig {
    /// 发件地址
    #[validate(email(message = "sender email is not a valid address"))]
    pub email: String,

    /// 显示名称
    #[serde(default)]
    pub display_name: String,
}

/// 限流配置 (固定窗口)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ThrottleConfig {
    /// 每个窗口允许的最大发送数
    #[serde(default = "default_emails_per_hour")]
    #[validate(range(min = 1, message = "emails_per_hour must be >= 1"))]
    pub emails_per_hour: u32,

    /// 窗口长度 (秒)
    #[serde(default = "default_window_secs")]
    #[validate(range(min = 1, message = "window_secs must be >= 1"))]
    pub window_secs: u64,
}

fn default_emails_per_hour() -> u32 {
    100
}

fn default_window_secs() -> u64 {
    3600
}

impl ThrottleConfig {
    /// 窗口长度
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            emails_per_hour: default_emails_per_hour(),
            window_secs: default_window_secs(),
        }
    }
}

/// 附件落盘配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StagingConfig {
    /// 附件目录
    #[serde(default = "default_attachments_dir")]
    pub attachments_dir: PathBuf,

    /// 收件人表格副本目录 (可选)
    #[serde(default)]
    pub recipients_dir: Option<PathBuf>,

    /// 每个文件最多尝试的候选文件名数量
    #[serde(default = "default_max_attempts")]
    #[validate(range(min = 1, max = 64, message = "max_attempts must be within 1..=64"))]
    pub max_attempts: usize,
}

fn default_attachments_dir() -> PathBuf {
    PathBuf::from("uploads/newsletters")
}

fn default_max_attempts() -> usize {
    8
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            attachments_dir: default_attachments_dir(),
            recipients_dir: None,
            max_attempts: default_max_attempts(),
        }
    }
}

/// 账本类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerType {
    /// JSON Lines 文件
    #[default]
    File,
    /// 进程内存
    Memory,
    /// 仅输出日志
    Log,
}

/// 投递账本配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// 账本类型
    #[serde(default)]
    pub ledger_type: LedgerType,

    /// 文件路径 (file 类型必填)
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            ledger_type: LedgerType::File,
            path: Some(PathBuf::from("ledger/deliveries.jsonl")),
        }
    }
}

/// 错误日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorLogConfig {
    /// 日志文件路径
    #[serde(default = "default_error_log_path")]
    pub path: PathBuf,
}

fn default_error_log_path() -> PathBuf {
    PathBuf::from("Error_Log.txt")
}

impl Default for ErrorLogConfig {
    fn default() -> Self {
        Self {
            path: default_error_log_path(),
        }
    }
}
