//! Newsletter 指标收集模块
//!
//! 记录批次、发送、跳过、账本写入等运行指标。

use contracts::BatchResult;
use metrics::{counter, gauge, histogram};

/// 记录批次开始
pub fn record_batch_started() {
    counter!("newsletter_batches_started_total").increment(1);
}

/// 记录批次完成
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_batch_completed;
///
/// if let BatchOutcome::Completed(result) = dispatcher.submit(request).await {
///     record_batch_completed(&result);
/// }
/// ```
pub fn record_batch_completed(result: &BatchResult) {
    counter!("newsletter_batches_completed_total").increment(1);
    gauge!("newsletter_last_batch_recipients").set(result.total_recipients as f64);
    gauge!("newsletter_last_batch_failed").set(result.failed_count as f64);

    if result.total_recipients > 0 {
        histogram!("newsletter_batch_failure_ratio")
            .record(result.failed_count as f64 / result.total_recipients as f64);
    }
}

/// 记录批次中止
pub fn record_batch_aborted(kind: &'static str) {
    counter!("newsletter_batches_aborted_total", "kind" => kind).increment(1);
}

/// 记录单次发送结果
pub fn record_send(success: bool, elapsed_ms: f64) {
    let status = if success { "sent" } else { "failed" };
    counter!("newsletter_sends_total", "status" => status).increment(1);
    histogram!("newsletter_send_latency_ms").record(elapsed_ms);
}

/// 记录被跳过的收件人 (地址不合法)
pub fn record_skipped() {
    counter!("newsletter_recipients_skipped_total").increment(1);
}

/// 记录账本写入失败
pub fn record_ledger_failure(ledger: &str) {
    counter!(
        "newsletter_ledger_write_failures_total",
        "ledger" => ledger.to_string()
    )
    .increment(1);
}
