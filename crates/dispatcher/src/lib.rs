//! # Dispatcher
//!
//! 批次分发模块。
//!
//! 负责：
//! - 校验输入并解析收件人表格
//! - 落盘附件（整批共享）
//! - 按限流逐个渲染、发送并记录投递账本
//! - 汇总批次结果为面向用户的消息

pub mod dispatcher;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod render;
pub mod report;

pub use contracts::{BatchRequest, BatchResult, DeliveryLedger, MailTransport};
pub use dispatcher::{BatchOutcome, Dispatcher, DispatcherConfig};
pub use error::DispatcherError;
pub use ledger::{create_ledger, AnyLedger, FileLedger, LogLedger, MemoryLedger};
pub use metrics::{DispatchMetrics, MetricsSnapshot};
pub use render::{MessageRenderer, RenderedMessage, FOOTER};
pub use report::{FailureReporter, ALL_SENT_MESSAGE, UNEXPECTED_ERROR_MESSAGE};
