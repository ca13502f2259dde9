//! # Throttle
//!
//! 固定窗口限流：每个窗口内最多放行 `cap` 次发送，超出后协作式等待到窗口结束。
//!
//! ## 使用示例
//!
//! ```ignore
//! use throttle::Throttle;
//!
//! let mut throttle = Throttle::from_config(&blueprint.throttle);
//! for recipient in recipients {
//!     throttle.admit().await;
//!     // send ...
//! }
//! ```

mod limiter;
mod window;

// Re-exports
pub use contracts::ThrottleConfig;
pub use limiter::{Admission, Throttle, ThrottleStats};
pub use window::ThrottleWindow;
