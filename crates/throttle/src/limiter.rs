//! Async throttle driving one batch's send loop.

use std::time::Duration;

use contracts::ThrottleConfig;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::window::{gate, Gate, ThrottleWindow};

/// Outcome of one `admit` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Admission {
    /// How long the caller was held back, if at all
    pub suspended: Option<Duration>,
}

impl Admission {
    pub fn was_suspended(&self) -> bool {
        self.suspended.is_some()
    }
}

/// Running totals for one throttle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThrottleStats {
    pub admitted: u64,
    pub suspensions: u64,
    pub suspended_for: Duration,
}

/// Fixed-window rate limiter
///
/// Admits up to `cap` sends per window immediately. The send after that
/// sleeps until the window ends, then opens a new one.
#[derive(Debug)]
pub struct Throttle {
    cap: u32,
    length: Duration,
    window: ThrottleWindow,
    stats: ThrottleStats,
}

impl Throttle {
    /// Create a throttle admitting `cap` sends per `length`
    ///
    /// `cap` and `length` are raised to their smallest useful values.
    pub fn new(cap: u32, length: Duration) -> Self {
        Self {
            cap: cap.max(1),
            length: length.max(Duration::from_millis(1)),
            window: ThrottleWindow::open(Instant::now()),
            stats: ThrottleStats::default(),
        }
    }

    pub fn from_config(config: &ThrottleConfig) -> Self {
        Self::new(config.emails_per_hour, config.window())
    }

    pub fn cap(&self) -> u32 {
        self.cap
    }

    pub fn window_length(&self) -> Duration {
        self.length
    }

    /// Read-only view of the current window
    pub fn window(&self) -> ThrottleWindow {
        self.window
    }

    pub fn stats(&self) -> ThrottleStats {
        self.stats
    }

    /// Wait until one more send is allowed, then count it
    pub async fn admit(&mut self) -> Admission {
        let now = Instant::now();
        let mut admission = Admission::default();

        match gate(&self.window, now, self.cap, self.length) {
            Gate::Open => {}
            Gate::Expired => {
                debug!(
                    count_in_window = self.window.count_in_window,
                    "Throttle window expired, opening a new one"
                );
                self.window = ThrottleWindow::open(now);
            }
            Gate::Full(remaining) => {
                info!(
                    cap = self.cap,
                    wait_secs = remaining.as_secs_f64(),
                    "Throttle cap reached, pausing until the window ends"
                );
                metrics::counter!("newsletter_throttle_suspensions_total").increment(1);
                metrics::histogram!("newsletter_throttle_suspended_seconds")
                    .record(remaining.as_secs_f64());

                sleep(remaining).await;

                self.window = ThrottleWindow::open(Instant::now());
                self.stats.suspensions += 1;
                self.stats.suspended_for += remaining;
                admission.suspended = Some(remaining);
            }
        }

        self.window.count_in_window += 1;
        self.stats.admitted += 1;
        metrics::gauge!("newsletter_throttle_window_count")
            .set(f64::from(self.window.count_in_window));

        admission
    }
}
