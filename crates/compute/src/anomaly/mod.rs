//! Statistical heart-rate anomaly detection.
//!
//! A value is anomalous when it lies more than `sigma` population standard
//! deviations from the session mean.
//!
//! Sub-modules:
//! - [`population`] — population-level statistics (mean, std-dev)

pub mod population;

use std::sync::Arc;

use tracing::debug;

use fittwin_core::{Alert, AlertKind, Clock, FitTwinError, Result};

pub use population::compute_population_stats;

/// Default threshold, in standard deviations.
pub const DEFAULT_ANOMALY_SIGMA: f64 = 2.0;

/// Flags outliers in a heart-rate series.
pub struct AnomalyDetector {
    sigma: f64,
    clock: Arc<dyn Clock>,
}

impl AnomalyDetector {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_threshold(clock, DEFAULT_ANOMALY_SIGMA)
    }

    /// Create a detector with a configurable threshold.
    pub fn with_threshold(clock: Arc<dyn Clock>, sigma: f64) -> Self {
        Self { sigma, clock }
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Whether `value` deviates more than `sigma * std_dev` from `mean`.
    ///
    /// A zero std-dev never flags anything.
    pub fn is_anomalous(&self, value: f64, mean: f64, std_dev: f64) -> bool {
        (value - mean).abs() > self.sigma * std_dev
    }

    /// Produce one alert per flagged value, in input order.
    ///
    /// Alert timestamps are taken from the clock at detection time, not
    /// from the originating reading.
    pub fn detect(&self, heart_rates: &[f64]) -> Result<Vec<Alert>> {
        let (mean, std_dev) =
            compute_population_stats(heart_rates).ok_or(FitTwinError::EmptyInput)?;

        let alerts: Vec<Alert> = heart_rates
            .iter()
            .copied()
            .filter(|&hr| self.is_anomalous(hr, mean, std_dev))
            .map(|hr| Alert {
                kind: AlertKind::Anomaly,
                message: format!("Unusual heart rate detected: {hr} BPM"),
                value: hr,
                timestamp: self.clock.now(),
            })
            .collect();

        debug!(
            samples = heart_rates.len(),
            mean,
            std_dev,
            flagged = alerts.len(),
            "Anomaly detection complete"
        );
        Ok(alerts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fittwin_core::ManualClock;

    fn detector() -> AnomalyDetector {
        AnomalyDetector::new(Arc::new(ManualClock::new(Utc::now())))
    }

    #[test]
    fn flags_single_spike() {
        let mut series = vec![70.0; 9];
        series.push(150.0);

        let alerts = detector().detect(&series).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::Anomaly);
        assert_eq!(alerts[0].value, 150.0);
        assert_eq!(alerts[0].message, "Unusual heart rate detected: 150 BPM");
    }

    #[test]
    fn constant_series_has_no_anomalies() {
        let alerts = detector().detect(&[75.0; 10]).unwrap();
        assert!(alerts.is_empty());
    }

    #[test]
    fn empty_input_is_error() {
        assert_eq!(detector().detect(&[]).unwrap_err(), FitTwinError::EmptyInput);
    }

    #[test]
    fn alerts_preserve_input_order() {
        let mut series = vec![100.0; 20];
        series[3] = 40.0;
        series[15] = 160.0;

        let alerts = detector().detect(&series).unwrap();
        let values: Vec<f64> = alerts.iter().map(|a| a.value).collect();
        assert_eq!(values, vec![40.0, 160.0]);
    }

    #[test]
    fn timestamp_comes_from_clock() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let detector = AnomalyDetector::new(clock.clone());
        let mut series = vec![70.0; 9];
        series.push(150.0);

        let alerts = detector.detect(&series).unwrap();
        assert_eq!(alerts[0].timestamp, clock.now());
    }

    #[test]
    fn wider_threshold_suppresses_alert() {
        let mut series = vec![70.0; 9];
        series.push(150.0);
        // deviation is exactly 3 sigma (72 / 24)
        let strict = AnomalyDetector::with_threshold(Arc::new(ManualClock::default()), 3.0);
        assert!(strict.detect(&series).unwrap().is_empty());
    }

    #[test]
    fn deterministic_for_same_input() {
        let series = [72.0, 75.0, 71.0, 74.0, 120.0, 73.0, 72.0, 70.0, 76.0, 71.0];
        let a: Vec<f64> = detector().detect(&series).unwrap().iter().map(|x| x.value).collect();
        let b: Vec<f64> = detector().detect(&series).unwrap().iter().map(|x| x.value).collect();
        assert_eq!(a, b);
        assert_eq!(a, vec![120.0]);
    }
}
