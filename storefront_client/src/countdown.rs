//! The payment countdown timer.
//!
//! Counts down to the payment instructions' expiry, once per second. The displayed value is always a clamped
//! whole number of seconds: a countdown never shows a negative number, no matter how stale the expiry is.

use chrono::{DateTime, Utc};

/// Remaining whole seconds until `expires_at`, clamped to ≥ 0.
pub fn remaining_seconds(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    ((expires_at - now).num_milliseconds() / 1000).max(0)
}

/// `MM:SS` rendering of a remaining-seconds value.
pub fn format_remaining(seconds: i64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Ticks once per second until the expiry passes, reporting the remaining seconds to `on_tick`.
pub struct PaymentCountdown {
    expires_at: DateTime<Utc>,
}

impl PaymentCountdown {
    pub fn until(expires_at: DateTime<Utc>) -> Self {
        Self { expires_at }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Runs to completion when the countdown hits zero. Racing this against the status poller (see
    /// [`crate::poller::await_payment`]) is what bounds the waiting period.
    pub async fn run(&self, mut on_tick: impl FnMut(i64)) {
        let mut timer = tokio::time::interval(std::time::Duration::from_secs(1));
        loop {
            timer.tick().await;
            let remaining = remaining_seconds(self.expires_at, Utc::now());
            on_tick(remaining);
            if remaining == 0 {
                return;
            }
        }
    }
}
