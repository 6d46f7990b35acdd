use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{error, info, warn};
use uuid::Uuid;

use fittwin_compute::{aggregate, heart_rate_series, AnomalyDetector, InformationalAlerts};
use fittwin_core::{
    Alert, CancelSignal, Clock, Config, DeviceInfo, FitTwinError, Reading, Result, SessionResult,
    SessionStatistics, SystemClock,
};
use fittwin_device::{DeviceRegistry, Sampler};
use fittwin_notify::{sink_from_config, DispatchResult, DispatchStats, Dispatcher};

/// Offset applied to the configured seed for the informational stream, so
/// it does not replay the first device's random sequence.
const INFORMATIONAL_SEED_OFFSET: u64 = 1_000;

/// Session context: owns the device registry and every pipeline stage.
///
/// Constructed explicitly and passed around (usually behind an `Arc`);
/// independent services share nothing.
pub struct MonitoringService {
    registry: DeviceRegistry,
    sampler: Sampler,
    detector: AnomalyDetector,
    informational: Option<Mutex<InformationalAlerts>>,
    dispatcher: Dispatcher,
    drain_timeout: Duration,
    default_duration: u32,
}

/// Sampled data handed from the device stage to the analysis stage.
struct Sampled {
    device: DeviceInfo,
    readings: Vec<Reading>,
    sleep_duration_hours: f64,
}

impl MonitoringService {
    pub fn new(
        registry: DeviceRegistry,
        sampler: Sampler,
        detector: AnomalyDetector,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            registry,
            sampler,
            detector,
            informational: None,
            dispatcher,
            drain_timeout: Duration::from_secs(10),
            default_duration: 10,
        }
    }

    /// Enable the random informational alert stream.
    pub fn with_informational_alerts(mut self, stream: InformationalAlerts) -> Self {
        self.informational = Some(Mutex::new(stream));
        self
    }

    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    pub fn with_default_duration(mut self, seconds: u32) -> Self {
        self.default_duration = seconds;
        self
    }

    /// Wire a service from configuration using the real clock and the
    /// default device catalogue.
    pub fn from_config(config: &Config) -> Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let seed = config.detection.seed;

        let registry =
            DeviceRegistry::with_default_devices(clock.clone(), config.discovery.clone(), seed);
        let sampler = Sampler::new(clock.clone(), config.sampling.interval());
        let detector = AnomalyDetector::with_threshold(clock.clone(), config.detection.anomaly_sigma);

        let sink = sink_from_config(&config.notify)
            .map_err(|e| FitTwinError::Config(e.to_string()))?;
        let recipient = config.notify.recipient.clone().unwrap_or_default();
        if recipient.is_empty() {
            warn!("ALERT_RECIPIENT not set, alerts will be sent without a recipient");
        }
        let dispatcher = Dispatcher::new(sink, recipient, config.notify.send_timeout());

        let mut service = Self::new(registry, sampler, detector, dispatcher)
            .with_drain_timeout(config.notify.drain_timeout())
            .with_default_duration(config.sampling.default_duration_secs);

        if config.detection.informational_alerts {
            let probability = config.detection.informational_probability;
            let stream = match seed {
                Some(s) => InformationalAlerts::seeded(
                    clock,
                    probability,
                    s.wrapping_add(INFORMATIONAL_SEED_OFFSET),
                ),
                None => InformationalAlerts::from_entropy(clock, probability),
            };
            service = service.with_informational_alerts(stream);
        }

        Ok(service)
    }

    pub fn default_duration(&self) -> u32 {
        self.default_duration
    }

    /// List devices available for connection.
    pub async fn scan(&self) -> Vec<DeviceInfo> {
        self.registry.scan().await
    }

    /// Connect to a device. Returns `false` if the address is unknown.
    pub async fn connect(&self, address: &str) -> bool {
        self.registry.connect(address).await
    }

    /// Run one monitoring session of `duration_seconds` readings.
    pub async fn run_session(&self, address: &str, duration_seconds: u32) -> SessionResult {
        self.run_session_with_cancel(address, duration_seconds, &CancelSignal::new())
            .await
    }

    /// Run one monitoring session, aborting at the next tick boundary once
    /// `cancel` is raised.
    ///
    /// Errors are converted into a `Failure` envelope; alert dispatch is
    /// started in the background and never affects the status.
    pub async fn run_session_with_cancel(
        &self,
        address: &str,
        duration_seconds: u32,
        cancel: &CancelSignal,
    ) -> SessionResult {
        let session_id = Uuid::new_v4();
        let start = Instant::now();
        info!(%session_id, address, duration_seconds, "Session started");

        let sampled = match self.sample(address, duration_seconds, cancel).await {
            Ok(s) => s,
            Err(e) => {
                warn!(%session_id, address, error = %e, "Session failed");
                return SessionResult::failure(session_id, e.to_string());
            }
        };

        let (statistics, alerts) = match self.analyse(&sampled, duration_seconds) {
            Ok(out) => out,
            Err(e) => {
                error!(%session_id, address, error = %e, "Analysis failed after a successful sample");
                return SessionResult::failure(session_id, e.to_string());
            }
        };

        for alert in &alerts {
            self.dispatcher.spawn_dispatch(alert.clone());
        }

        info!(
            %session_id,
            address,
            readings = sampled.readings.len(),
            alerts = alerts.len(),
            avg_heart_rate = statistics.avg_heart_rate,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Session complete"
        );

        SessionResult::success(
            session_id,
            sampled.device,
            statistics,
            alerts,
            sampled.readings,
        )
    }

    /// Hold the device lock for the whole sample: one in-flight sample per device.
    async fn sample(
        &self,
        address: &str,
        duration_seconds: u32,
        cancel: &CancelSignal,
    ) -> Result<Sampled> {
        let handle = self.registry.get(address)?;
        let mut device = handle.lock().await;
        let readings = self
            .sampler
            .sample(&mut device, duration_seconds, cancel)
            .await?;

        Ok(Sampled {
            device: device.info().clone(),
            readings,
            sleep_duration_hours: device.sleep_duration_hours(),
        })
    }

    fn analyse(
        &self,
        sampled: &Sampled,
        duration_seconds: u32,
    ) -> Result<(SessionStatistics, Vec<Alert>)> {
        let statistics = aggregate(
            &sampled.readings,
            sampled.sleep_duration_hours,
            duration_seconds,
        )?;

        let heart_rates = heart_rate_series(&sampled.readings);
        let mut alerts = self.detector.detect(&heart_rates)?;

        if let Some(stream) = &self.informational {
            let mut stream = stream.lock().unwrap_or_else(|e| e.into_inner());
            alerts.extend(stream.generate(&heart_rates));
        }

        Ok((statistics, alerts))
    }

    /// Wait (bounded) for background alert dispatches to finish.
    pub async fn shutdown(&self) -> Vec<DispatchResult> {
        let results = self.dispatcher.drain(self.drain_timeout).await;
        let stats = self.dispatcher.stats();
        info!(
            drained = results.len(),
            attempted = stats.attempted,
            delivered = stats.delivered,
            failed = stats.failed,
            "Monitoring service shut down"
        );
        results
    }

    /// Background alert dispatches still in flight.
    pub fn pending_notifications(&self) -> usize {
        self.dispatcher.pending()
    }

    pub fn dispatch_stats(&self) -> DispatchStats {
        self.dispatcher.stats()
    }

    pub fn notification_channel(&self) -> &str {
        self.dispatcher.channel_name()
    }
}
