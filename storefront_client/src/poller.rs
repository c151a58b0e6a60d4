//! The payment status poller.
//!
//! After a transfer-based checkout, the storefront repeatedly asks the gateway "has this order been paid?" until
//! it observes a terminal answer or the payment window runs out. The poller is an explicitly cancellable task: it
//! stops when payment is confirmed, when its [`CancellationToken`] fires (the user navigated away), or when the
//! countdown it is raced against expires. It never relies on being garbage-collected.

use std::time::Duration;

use anyhow::Result;
use log::debug;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::countdown::PaymentCountdown;

/// How often the gateway is asked for the payment status.
pub const POLL_PERIOD: Duration = Duration::from_secs(2);

/// The status payload as polled off the wire. Fields stay as raw strings: the poller's contract is a
/// case-insensitive comparison against "paid", not an enum round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollStatus {
    pub status: String,
    pub payment_status: String,
    #[serde(default)]
    pub payment_ref: Option<String>,
}

impl PollStatus {
    pub fn is_confirmed(&self) -> bool {
        self.payment_status.eq_ignore_ascii_case("paid")
    }
}

/// Where the poller gets its answers from. Production uses [`crate::StorefrontClient`]; tests substitute
/// scripted sources.
#[allow(async_fn_in_trait)]
pub trait StatusSource {
    async fn fetch_status(&self, order_number: &str) -> Result<PollStatus>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The fetched payment status equalled "paid" (case-insensitively). No further requests are issued.
    Confirmed(PollStatus),
    /// The cancellation token fired.
    Cancelled,
}

/// Polls the order status on a fixed period until payment is confirmed or the poller is cancelled.
///
/// A failed poll is logged and silently ignored; the next tick retries. There is no backoff and no maximum retry
/// count — termination comes from confirmation or cancellation, never from giving up.
pub struct StatusPoller<S> {
    source: S,
    period: Duration,
    cancel: CancellationToken,
}

impl<S> StatusPoller<S> {
    pub fn new(source: S) -> Self {
        Self { source, period: POLL_PERIOD, cancel: CancellationToken::new() }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// A handle that stops the poller when fired, from anywhere.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl<S: StatusSource> StatusPoller<S> {
    pub async fn run(&self, order_number: &str) -> PollOutcome {
        let mut timer = tokio::time::interval(self.period);
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!("⏱️ Status poller for [{order_number}] cancelled");
                    return PollOutcome::Cancelled;
                },
                _ = timer.tick() => {
                    match self.source.fetch_status(order_number).await {
                        Ok(status) if status.is_confirmed() => {
                            debug!("⏱️ Payment for [{order_number}] confirmed");
                            return PollOutcome::Confirmed(status);
                        },
                        Ok(_) => {},
                        Err(e) => {
                            // Transient failure. The next tick retries.
                            debug!("⏱️ Poll for [{order_number}] failed: {e}");
                        },
                    }
                },
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaymentWaitOutcome {
    Confirmed(PollStatus),
    /// The countdown reached zero before a confirmation arrived. The poller is stopped at that instant — the
    /// waiting period ends deterministically with the displayed timer.
    Expired,
    Cancelled,
}

/// Races the status poller against the payment countdown. Whichever side finishes first decides the outcome, and
/// the other task is dropped on the spot, so neither timer can outlive the wait.
pub async fn await_payment<S: StatusSource>(
    poller: &StatusPoller<S>,
    countdown: &PaymentCountdown,
    order_number: &str,
    on_tick: impl FnMut(i64),
) -> PaymentWaitOutcome {
    tokio::select! {
        outcome = poller.run(order_number) => match outcome {
            PollOutcome::Confirmed(status) => PaymentWaitOutcome::Confirmed(status),
            PollOutcome::Cancelled => PaymentWaitOutcome::Cancelled,
        },
        _ = countdown.run(on_tick) => PaymentWaitOutcome::Expired,
    }
}

#[cfg(test)]
mod test {
    use std::{
        collections::VecDeque,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
            Mutex,
        },
    };

    use anyhow::anyhow;
    use chrono::Utc;

    use super::*;

    fn pending() -> PollStatus {
        PollStatus { status: "pending".into(), payment_status: "pending".into(), payment_ref: None }
    }

    fn paid() -> PollStatus {
        PollStatus { status: "confirmed".into(), payment_status: "PAID".into(), payment_ref: None }
    }

    /// Plays back a fixed script of responses, then keeps answering "pending". Counts every call.
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<PollStatus>>>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<PollStatus>>) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (Self { script: Mutex::new(script.into()), calls: calls.clone() }, calls)
        }
    }

    impl StatusSource for ScriptedSource {
        async fn fetch_status(&self, _order_number: &str) -> Result<PollStatus> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script.lock().unwrap().pop_front().unwrap_or_else(|| Ok(pending()))
        }
    }

    #[test]
    fn paid_comparison_is_case_insensitive() {
        assert!(paid().is_confirmed());
        assert!(PollStatus { payment_status: "Paid".into(), ..pending() }.is_confirmed());
        assert!(!pending().is_confirmed());
    }

    #[tokio::test(start_paused = true)]
    async fn the_poller_stops_requesting_once_paid() {
        let (source, calls) = ScriptedSource::new(vec![Ok(pending()), Ok(pending()), Ok(paid())]);
        let poller = StatusPoller::new(source);
        let outcome = poller.run("ORD-000123").await;
        assert!(matches!(outcome, PollOutcome::Confirmed(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // Let plenty of virtual polling periods elapse; a leaked timer would keep counting
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn poll_errors_are_swallowed_and_retried() {
        let (source, calls) = ScriptedSource::new(vec![Err(anyhow!("connection reset")), Err(anyhow!("timeout")), Ok(paid())]);
        let poller = StatusPoller::new(source);
        let outcome = poller.run("ORD-000123").await;
        assert!(matches!(outcome, PollOutcome::Confirmed(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_the_poller() {
        let (source, calls) = ScriptedSource::new(vec![]);
        let poller = StatusPoller::new(source);
        let cancel = poller.cancellation_token();
        let handle = tokio::spawn(async move { poller.run("ORD-000123").await });
        tokio::time::sleep(Duration::from_secs(7)).await;
        cancel.cancel();
        let outcome = handle.await.unwrap();
        assert_eq!(outcome, PollOutcome::Cancelled);
        // Interval fires immediately, then every 2s: ticks at 0, 2, 4, 6
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn an_expired_countdown_ends_the_wait() {
        let (source, _calls) = ScriptedSource::new(vec![]);
        let poller = StatusPoller::new(source);
        let countdown = PaymentCountdown::until(Utc::now() - chrono::Duration::seconds(5));
        let outcome = await_payment(&poller, &countdown, "ORD-000123", |_| {}).await;
        assert_eq!(outcome, PaymentWaitOutcome::Expired);
    }
}
