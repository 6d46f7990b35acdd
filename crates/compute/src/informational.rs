//! Random informational alert stream.
//!
//! Independent of the data distribution: each reading fires an alert with a
//! fixed probability. Kept separate from [`crate::AnomalyDetector`] because
//! its output is not deterministic unless the random source is seeded.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use fittwin_core::{Alert, AlertKind, Clock};

pub const DEFAULT_PROBABILITY: f64 = 0.5;

pub struct InformationalAlerts {
    probability: f64,
    rng: StdRng,
    clock: Arc<dyn Clock>,
}

impl InformationalAlerts {
    /// `probability` is clamped to `[0, 1]`.
    pub fn new(clock: Arc<dyn Clock>, probability: f64, rng: StdRng) -> Self {
        Self {
            probability: probability.clamp(0.0, 1.0),
            rng,
            clock,
        }
    }

    pub fn seeded(clock: Arc<dyn Clock>, probability: f64, seed: u64) -> Self {
        Self::new(clock, probability, StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy(clock: Arc<dyn Clock>, probability: f64) -> Self {
        Self::new(clock, probability, StdRng::from_entropy())
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// Roll once per heart-rate value; fired alerts keep input order.
    pub fn generate(&mut self, heart_rates: &[f64]) -> Vec<Alert> {
        let mut alerts = Vec::new();
        for &hr in heart_rates {
            if self.rng.gen::<f64>() < self.probability {
                alerts.push(Alert {
                    kind: AlertKind::Informational,
                    message: format!("Random alert triggered: {hr} BPM"),
                    value: hr,
                    timestamp: self.clock.now(),
                });
            }
        }
        alerts
    }
}
