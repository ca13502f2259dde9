//! Mock 发送器
//!
//! 用于单元测试与 dry-run 的 mock 实现，记录每封邮件并支持注入失败场景。

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use contracts::{AttachmentRef, ContractError, MailTransport, OutboundMessage};
use tracing::{debug, instrument};

/// Mock 发送器配置
#[derive(Debug, Default, Clone)]
pub struct MockMailerConfig {
    /// 应该发送失败的收件地址
    pub fail_recipients: HashSet<String>,
    /// 所有发送都失败
    pub fail_all: bool,
}

impl MockMailerConfig {
    /// 指定失败地址
    pub fn failing<I, S>(recipients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fail_recipients: recipients.into_iter().map(Into::into).collect(),
            fail_all: false,
        }
    }
}

/// 已"发送"的邮件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub attachments: Vec<AttachmentRef>,
}

impl From<&OutboundMessage<'_>> for SentMessage {
    fn from(message: &OutboundMessage<'_>) -> Self {
        Self {
            to: message.to.to_string(),
            subject: message.subject.to_string(),
            html_body: message.html_body.to_string(),
            attachments: message.attachments.to_vec(),
        }
    }
}

/// Mock 发送器
#[derive(Debug, Default)]
pub struct MockMailer {
    /// 配置（可注入失败场景）
    config: MockMailerConfig,
    /// 成功发送的邮件
    sent: Mutex<Vec<SentMessage>>,
    /// 所有发送尝试（含失败）
    attempts: Mutex<Vec<String>>,
}

impl MockMailer {
    /// 创建默认 mock 发送器
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用配置创建 mock 发送器
    pub fn with_config(config: MockMailerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// 成功发送的邮件
    pub fn sent(&self) -> Vec<SentMessage> {
        lock(&self.sent).clone()
    }

    /// 成功发送数量
    pub fn sent_count(&self) -> usize {
        lock(&self.sent).len()
    }

    /// 所有发送尝试的收件地址（按顺序）
    pub fn attempted(&self) -> Vec<String> {
        lock(&self.attempts).clone()
    }

    fn should_fail(&self, to: &str) -> bool {
        self.config.fail_all || self.config.fail_recipients.contains(to)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MailTransport for MockMailer {
    fn name(&self) -> &str {
        "mock"
    }

    #[instrument(name = "mock_send", skip(self, message), fields(recipient = %message.to))]
    async fn send(&self, message: &OutboundMessage<'_>) -> Result<(), ContractError> {
        lock(&self.attempts).push(message.to.to_string());

        if self.should_fail(message.to) {
            debug!("Injected send failure");
            return Err(ContractError::transmission(
                message.to,
                "mock transport rejected recipient",
            ));
        }

        lock(&self.sent).push(SentMessage::from(message));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(to: &str) -> OutboundMessage<'_> {
        OutboundMessage {
            to,
            subject: "Update",
            html_body: "<p>Hi</p>",
            attachments: &[],
        }
    }

    #[tokio::test]
    async fn test_records_sent_messages() {
        let mailer = MockMailer::new();
        mailer.send(&message("a@x.com")).await.unwrap();
        mailer.send(&message("b@x.com")).await.unwrap();

        assert_eq!(mailer.sent_count(), 2);
        assert_eq!(mailer.sent()[1].to, "b@x.com");
        assert_eq!(mailer.sent()[0].subject, "Update");
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let mailer = MockMailer::with_config(MockMailerConfig::failing(["b@x.com"]));

        assert!(mailer.send(&message("a@x.com")).await.is_ok());
        let err = mailer.send(&message("b@x.com")).await.unwrap_err();

        assert_eq!(err.kind(), "TransmissionError");
        assert_eq!(mailer.sent_count(), 1);
        assert_eq!(mailer.attempted(), vec!["a@x.com", "b@x.com"]);
    }

    #[tokio::test]
    async fn test_fail_all() {
        let mailer = MockMailer::with_config(MockMailerConfig {
            fail_all: true,
            ..Default::default()
        });
        assert!(mailer.send(&message("a@x.com")).await.is_err());
        assert_eq!(mailer.sent_count(), 0);
    }
}
