//! Session analytics: summary statistics and alert detection.

pub mod aggregate;
pub mod anomaly;
pub mod informational;

pub use aggregate::{aggregate, heart_rate_series};
pub use anomaly::{AnomalyDetector, DEFAULT_ANOMALY_SIGMA};
pub use informational::InformationalAlerts;
