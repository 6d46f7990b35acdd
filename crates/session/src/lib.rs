//! Monitoring session orchestration.
//!
//! Composes device sampling, statistics, anomaly detection and alert
//! dispatch into a single `run_session` call that never returns an error:
//! callers branch on `SessionResult::status`.

pub mod service;

pub use service::MonitoringService;
