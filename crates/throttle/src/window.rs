//! Fixed-window admission rule.

use std::time::Duration;

use tokio::time::Instant;

/// Current throttle window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleWindow {
    /// When the window opened
    pub window_start: Instant,
    /// Sends admitted since `window_start`
    pub count_in_window: u32,
}

impl ThrottleWindow {
    /// Fresh empty window starting at `now`
    pub fn open(now: Instant) -> Self {
        Self {
            window_start: now,
            count_in_window: 0,
        }
    }
}

/// What `admit` has to do before counting a send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Gate {
    /// Room left in the current window
    Open,
    /// The window is over; start a new one right away
    Expired,
    /// The window is full; wait out the remaining time
    Full(Duration),
}

/// Decide admission for a send at `now`
///
/// Elapsed time is compared as a whole duration, so reaching the window length
/// exactly counts as expired.
pub(crate) fn gate(window: &ThrottleWindow, now: Instant, cap: u32, length: Duration) -> Gate {
    let elapsed = now.saturating_duration_since(window.window_start);
    if elapsed >= length {
        Gate::Expired
    } else if window.count_in_window >= cap {
        Gate::Full(length - elapsed)
    } else {
        Gate::Open
    }
}
