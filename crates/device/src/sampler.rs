//! Fixed-count, fixed-interval sampling loop.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use fittwin_core::{CancelSignal, Clock, FitTwinError, Reading, Result};

use crate::device::VirtualDevice;

/// Drives a connected device for a bounded number of ticks.
///
/// The interval between ticks is a throttling delay only. Simulated time
/// advances one second per tick regardless of how long the loop sleeps.
pub struct Sampler {
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl Sampler {
    pub fn new(clock: Arc<dyn Clock>, interval: Duration) -> Self {
        Self { clock, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Collect exactly `count` readings in ascending timestamp order.
    ///
    /// `cancel` is checked at every tick boundary. A cancelled sample
    /// discards everything collected so far.
    pub async fn sample(
        &self,
        device: &mut VirtualDevice,
        count: u32,
        cancel: &CancelSignal,
    ) -> Result<Vec<Reading>> {
        if !device.is_connected() {
            return Err(FitTwinError::NotConnected(device.address().to_string()));
        }
        if count == 0 {
            return Err(FitTwinError::InvalidDuration(count));
        }

        let mut readings = Vec::with_capacity(count as usize);
        for i in 0..count {
            if cancel.is_cancelled() {
                warn!(address = %device.address(), collected = i, "Sampling cancelled");
                return Err(FitTwinError::Cancelled);
            }
            readings.push(device.tick());
            self.clock.sleep(self.interval).await;
        }

        if cancel.is_cancelled() {
            warn!(address = %device.address(), collected = count, "Sampling cancelled");
            return Err(FitTwinError::Cancelled);
        }

        debug!(address = %device.address(), count, "Sampling complete");
        Ok(readings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fittwin_core::ManualClock;
    use proptest::prelude::*;

    fn connected_device() -> VirtualDevice {
        let mut device = VirtualDevice::seeded("Test Band", "00:11:22:33:44:55", 11);
        device.connect(Utc::now());
        device
    }

    #[tokio::test]
    async fn sample_returns_exact_count_with_one_second_steps() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let sampler = Sampler::new(clock.clone(), Duration::from_millis(100));
        let mut device = connected_device();

        let readings = sampler
            .sample(&mut device, 25, &CancelSignal::new())
            .await
            .unwrap();

        assert_eq!(readings.len(), 25);
        for pair in readings.windows(2) {
            assert_eq!(
                pair[1].timestamp - pair[0].timestamp,
                chrono::Duration::seconds(1)
            );
        }
        assert_eq!(clock.sleep_count(), 25);
        assert_eq!(clock.total_slept(), Duration::from_millis(2500));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn any_positive_count_yields_exactly_that_many(count in 1u32..200, seed in any::<u64>()) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .unwrap();
            let clock = Arc::new(ManualClock::new(Utc::now()));
            let sampler = Sampler::new(clock.clone(), Duration::from_millis(100));
            let mut device = VirtualDevice::seeded("Test Band", "00:11:22:33:44:55", seed);
            let start = Utc::now();
            device.connect(start);

            let readings = runtime
                .block_on(sampler.sample(&mut device, count, &CancelSignal::new()))
                .unwrap();

            prop_assert_eq!(readings.len(), count as usize);
            prop_assert_eq!(readings[0].timestamp, start + chrono::Duration::seconds(1));
            for pair in readings.windows(2) {
                prop_assert_eq!(
                    pair[1].timestamp - pair[0].timestamp,
                    chrono::Duration::seconds(1)
                );
            }
            prop_assert_eq!(clock.sleep_count(), u64::from(count));
        }
    }

    #[tokio::test]
    async fn sample_rejects_disconnected_device() {
        let sampler = Sampler::new(Arc::new(ManualClock::default()), Duration::ZERO);
        let mut device = VirtualDevice::seeded("Test Band", "00:11:22:33:44:55", 1);

        let err = sampler
            .sample(&mut device, 5, &CancelSignal::new())
            .await
            .unwrap_err();
        assert_eq!(err, FitTwinError::NotConnected("00:11:22:33:44:55".to_string()));
    }

    #[tokio::test]
    async fn sample_rejects_zero_count() {
        let sampler = Sampler::new(Arc::new(ManualClock::default()), Duration::ZERO);
        let mut device = connected_device();

        let err = sampler
            .sample(&mut device, 0, &CancelSignal::new())
            .await
            .unwrap_err();
        assert_eq!(err, FitTwinError::InvalidDuration(0));
    }

    #[tokio::test]
    async fn cancelled_before_start_yields_nothing() {
        let clock = Arc::new(ManualClock::default());
        let sampler = Sampler::new(clock.clone(), Duration::from_millis(100));
        let mut device = connected_device();
        let cancel = CancelSignal::new();
        cancel.cancel();

        let err = sampler.sample(&mut device, 10, &cancel).await.unwrap_err();
        assert_eq!(err, FitTwinError::Cancelled);
        assert_eq!(clock.sleep_count(), 0);
    }

    /// Clock that raises the cancel flag after a fixed number of sleeps.
    struct CancellingClock {
        inner: ManualClock,
        cancel: CancelSignal,
        after: u64,
    }

    #[async_trait::async_trait]
    impl Clock for CancellingClock {
        fn now(&self) -> chrono::DateTime<Utc> {
            self.inner.now()
        }

        async fn sleep(&self, duration: Duration) {
            self.inner.sleep(duration).await;
            if self.inner.sleep_count() >= self.after {
                self.cancel.cancel();
            }
        }
    }

    #[tokio::test]
    async fn cancel_mid_sample_discards_partial_results() {
        let cancel = CancelSignal::new();
        let clock = Arc::new(CancellingClock {
            inner: ManualClock::default(),
            cancel: cancel.clone(),
            after: 3,
        });
        let sampler = Sampler::new(clock.clone(), Duration::from_millis(100));
        let mut device = connected_device();

        let result = sampler.sample(&mut device, 10, &cancel).await;
        assert_eq!(result.unwrap_err(), FitTwinError::Cancelled);
        assert_eq!(clock.inner.sleep_count(), 3);
    }
}
