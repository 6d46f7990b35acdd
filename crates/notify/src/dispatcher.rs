//! Forwards alerts to a [`NotificationSink`].
//!
//! Sink failures, timeouts and panics are logged and folded into a
//! [`DispatchResult`]; nothing propagates to the caller. Dispatches can run
//! inline (`dispatch`) or in the background (`spawn_dispatch`). Finished
//! background tasks are released on the next spawn; `drain` waits for the
//! ones still tracked, with an upper bound.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::task::JoinSet;

use fittwin_core::Alert;

use crate::traits::{DispatchResult, NotificationSink, NotifyError};

/// Running delivery counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchStats {
    pub attempted: u64,
    pub delivered: u64,
    pub failed: u64,
}

#[derive(Default)]
struct Counters {
    attempted: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
}

pub struct Dispatcher {
    sink: Arc<dyn NotificationSink>,
    recipient: String,
    send_timeout: Duration,
    in_flight: Mutex<JoinSet<DispatchResult>>,
    counters: Arc<Counters>,
}

impl Dispatcher {
    pub fn new(
        sink: Arc<dyn NotificationSink>,
        recipient: impl Into<String>,
        send_timeout: Duration,
    ) -> Self {
        Self {
            sink,
            recipient: recipient.into(),
            send_timeout,
            in_flight: Mutex::new(JoinSet::new()),
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn channel_name(&self) -> &str {
        self.sink.channel_name()
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    /// Deliver one alert and wait for the outcome. Never fails.
    pub async fn dispatch(&self, alert: &Alert) -> DispatchResult {
        deliver(
            Arc::clone(&self.sink),
            self.recipient.clone(),
            alert.clone(),
            self.send_timeout,
            Arc::clone(&self.counters),
        )
        .await
    }

    /// Start delivering `alert` in the background and return immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_dispatch(&self, alert: Alert) {
        let task = deliver(
            Arc::clone(&self.sink),
            self.recipient.clone(),
            alert,
            self.send_timeout,
            Arc::clone(&self.counters),
        );
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        reap_finished(&mut in_flight, &self.counters);
        in_flight.spawn(task);
    }

    /// Number of background dispatches still running.
    pub fn pending(&self) -> usize {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        reap_finished(&mut in_flight, &self.counters);
        in_flight.len()
    }

    /// Wait up to `timeout` for background dispatches to finish and return
    /// the outcomes not yet released by an earlier spawn.
    ///
    /// Dispatches still running when the timeout expires are aborted and
    /// counted as failures.
    pub async fn drain(&self, timeout: Duration) -> Vec<DispatchResult> {
        let mut set = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *in_flight)
        };

        if set.is_empty() {
            return Vec::new();
        }

        let mut results = Vec::with_capacity(set.len());
        let finished = tokio::time::timeout(timeout, async {
            while let Some(joined) = set.join_next().await {
                match joined {
                    Ok(result) => results.push(result),
                    Err(e) => {
                        self.counters.failed.fetch_add(1, Ordering::Relaxed);
                        tracing::error!(error = %e, "Notification task panicked");
                    }
                }
            }
        })
        .await;

        if finished.is_err() {
            // Tasks that completed before the abort landed keep their own
            // outcome; only the ones actually cancelled count as failed.
            set.abort_all();
            let mut abandoned = 0u64;
            while let Some(joined) = set.join_next().await {
                match joined {
                    Ok(result) => results.push(result),
                    Err(e) => {
                        if e.is_panic() {
                            tracing::error!(error = %e, "Notification task panicked");
                        }
                        abandoned += 1;
                    }
                }
            }
            self.counters.failed.fetch_add(abandoned, Ordering::Relaxed);
            tracing::warn!(
                abandoned,
                timeout_ms = timeout.as_millis() as u64,
                "Drain timed out, aborted remaining notifications"
            );
        }

        results
    }

    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            attempted: self.counters.attempted.load(Ordering::Relaxed),
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }
}

/// Drop tasks that already finished. A completed `deliver` has logged and
/// counted its own outcome; a panicked one is counted here.
fn reap_finished(set: &mut JoinSet<DispatchResult>, counters: &Counters) {
    while let Some(joined) = set.try_join_next() {
        if let Err(e) = joined {
            counters.failed.fetch_add(1, Ordering::Relaxed);
            tracing::error!(error = %e, "Notification task panicked");
        }
    }
}

async fn deliver(
    sink: Arc<dyn NotificationSink>,
    recipient: String,
    alert: Alert,
    send_timeout: Duration,
    counters: Arc<Counters>,
) -> DispatchResult {
    counters.attempted.fetch_add(1, Ordering::Relaxed);
    let start = Instant::now();

    let result = match tokio::time::timeout(send_timeout, sink.send(&recipient, &alert.message)).await
    {
        Ok(r) => r,
        Err(_) => Err(NotifyError::Timeout(send_timeout.as_millis() as u64)),
    };
    let duration_ms = start.elapsed().as_millis() as u64;

    let (success, error) = match result {
        Ok(()) => {
            counters.delivered.fetch_add(1, Ordering::Relaxed);
            tracing::info!(
                channel = sink.channel_name(),
                recipient = %recipient,
                kind = %alert.kind,
                duration_ms,
                "Alert delivered"
            );
            (true, None)
        }
        Err(e) => {
            counters.failed.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                channel = sink.channel_name(),
                recipient = %recipient,
                kind = %alert.kind,
                error = %e,
                duration_ms,
                "Alert delivery failed"
            );
            (false, Some(e.to_string()))
        }
    };

    DispatchResult {
        channel: sink.channel_name().to_string(),
        recipient,
        alert_kind: alert.kind,
        message: alert.message,
        success,
        error,
        duration_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fittwin_core::AlertKind;
    use std::sync::atomic::AtomicUsize;

    struct MockSink {
        send_count: Arc<AtomicUsize>,
        should_fail: bool,
        delay: Duration,
    }

    impl MockSink {
        fn new(should_fail: bool) -> (Arc<Self>, Arc<AtomicUsize>) {
            let count = Arc::new(AtomicUsize::new(0));
            let sink = Arc::new(Self {
                send_count: count.clone(),
                should_fail,
                delay: Duration::ZERO,
            });
            (sink, count)
        }
    }

    #[async_trait::async_trait]
    impl NotificationSink for MockSink {
        async fn send(&self, _recipient: &str, _message: &str) -> Result<(), NotifyError> {
            self.send_count.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.should_fail {
                Err(NotifyError::Unavailable("mock failure".to_string()))
            } else {
                Ok(())
            }
        }

        fn channel_name(&self) -> &str {
            "mock"
        }
    }

    fn alert(value: f64) -> Alert {
        Alert {
            kind: AlertKind::Anomaly,
            message: format!("Unusual heart rate detected: {value} BPM"),
            value,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn dispatch_success() {
        let (sink, count) = MockSink::new(false);
        let dispatcher = Dispatcher::new(sink, "+15550001", Duration::from_secs(1));

        let result = dispatcher.dispatch(&alert(150.0)).await;
        assert!(result.success);
        assert_eq!(result.channel, "mock");
        assert_eq!(result.recipient, "+15550001");
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(
            dispatcher.stats(),
            DispatchStats { attempted: 1, delivered: 1, failed: 0 }
        );
    }

    #[tokio::test]
    async fn failure_is_absorbed_and_recorded() {
        let (sink, count) = MockSink::new(true);
        let dispatcher = Dispatcher::new(sink, "+15550001", Duration::from_secs(1));

        let result = dispatcher.dispatch(&alert(150.0)).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("mock failure"));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.stats().failed, 1);
    }

    #[tokio::test]
    async fn slow_sink_times_out() {
        let sink = Arc::new(MockSink {
            send_count: Arc::new(AtomicUsize::new(0)),
            should_fail: false,
            delay: Duration::from_secs(30),
        });
        let dispatcher = Dispatcher::new(sink, "+15550001", Duration::from_millis(20));

        let result = dispatcher.dispatch(&alert(150.0)).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn spawned_dispatches_are_drained() {
        let (sink, count) = MockSink::new(false);
        let dispatcher = Dispatcher::new(sink, "+15550001", Duration::from_secs(1));

        for v in [150.0, 160.0, 170.0] {
            dispatcher.spawn_dispatch(alert(v));
        }
        let results = dispatcher.drain(Duration::from_secs(5)).await;

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.success));
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert_eq!(dispatcher.pending(), 0);
    }

    #[tokio::test]
    async fn drain_is_bounded() {
        let sink = Arc::new(MockSink {
            send_count: Arc::new(AtomicUsize::new(0)),
            should_fail: false,
            delay: Duration::from_secs(30),
        });
        let dispatcher = Dispatcher::new(sink, "+15550001", Duration::from_secs(60));
        dispatcher.spawn_dispatch(alert(150.0));

        let start = Instant::now();
        let results = dispatcher.drain(Duration::from_millis(50)).await;
        assert!(results.is_empty());
        assert!(start.elapsed() < Duration::from_secs(5));
        assert_eq!(dispatcher.stats().failed, 1);
    }

    #[tokio::test]
    async fn finished_dispatches_are_released() {
        let (sink, count) = MockSink::new(false);
        let dispatcher = Dispatcher::new(sink, "+15550001", Duration::from_secs(1));

        for i in 0..500 {
            dispatcher.spawn_dispatch(alert(100.0 + f64::from(i)));
            tokio::task::yield_now().await;
        }
        tokio::task::yield_now().await;

        assert!(dispatcher.pending() <= 1);
        assert_eq!(count.load(Ordering::SeqCst), 500);
        assert_eq!(
            dispatcher.stats(),
            DispatchStats { attempted: 500, delivered: 500, failed: 0 }
        );
    }

    /// Sink that answers immediately for low values and stalls for high ones.
    struct SplitSink;

    #[async_trait::async_trait]
    impl NotificationSink for SplitSink {
        async fn send(&self, _recipient: &str, message: &str) -> Result<(), NotifyError> {
            if message.contains("999") {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            Ok(())
        }

        fn channel_name(&self) -> &str {
            "split"
        }
    }

    #[tokio::test]
    async fn timed_out_drain_counts_each_dispatch_once() {
        let dispatcher = Dispatcher::new(Arc::new(SplitSink), "+15550001", Duration::from_secs(60));
        for v in [150.0, 999.0, 160.0, 999.0, 170.0] {
            dispatcher.spawn_dispatch(alert(v));
        }

        let results = dispatcher.drain(Duration::from_millis(50)).await;

        let stats = dispatcher.stats();
        assert_eq!(results.len(), 3);
        assert_eq!(stats.attempted, 5);
        assert_eq!(stats.delivered, 3);
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.attempted, stats.delivered + stats.failed);
        assert_eq!(dispatcher.pending(), 0);
    }

    #[tokio::test]
    async fn drain_with_nothing_pending() {
        let (sink, _) = MockSink::new(false);
        let dispatcher = Dispatcher::new(sink, "+15550001", Duration::from_secs(1));
        assert!(dispatcher.drain(Duration::from_millis(10)).await.is_empty());
    }
}
