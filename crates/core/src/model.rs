use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of one monitoring session.
pub type SessionId = Uuid;

/// Round to two decimal places, the precision used for calories and distance.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Identity of a simulated wearable as reported by a scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub name: String,
    /// Bluetooth-style address, unique within a registry.
    pub address: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connected => write!(f, "connected"),
        }
    }
}

/// One telemetry snapshot produced by a device tick.
///
/// `steps`, `calories` and `distance` are cumulative over the device's
/// lifetime, so the last reading of a session carries the session totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Beats per minute, rounded to the nearest integer.
    pub heart_rate: u32,
    pub steps: u64,
    /// Rounded to 2 decimals.
    pub calories: f64,
    /// Raw device units, rounded to 2 decimals.
    pub distance: f64,
    /// Simulated time of the tick (serialized as ISO-8601).
    pub timestamp: DateTime<Utc>,
}

/// Summary metrics reduced from the full reading sequence of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatistics {
    pub avg_heart_rate: f64,
    pub max_heart_rate: u32,
    pub total_steps: u64,
    pub calories_burned: f64,
    pub distance_traveled_km: f64,
    pub activity_duration_minutes: f64,
    pub sleep_duration_hours: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Statistical outlier (more than N standard deviations from the mean).
    Anomaly,
    /// Randomly fired notice, independent of the data distribution.
    Informational,
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertKind::Anomaly => write!(f, "anomaly"),
            AlertKind::Informational => write!(f, "informational"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
    pub value: f64,
    /// Wall-clock time at which the alert was raised, not the reading's time.
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Success,
    Failure,
}

/// Envelope returned by a monitoring session.
///
/// On `Failure`, `statistics` is `None` and `alerts`/`readings` are empty so
/// callers can render a neutral view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResult {
    pub session_id: SessionId,
    pub status: SessionStatus,
    pub device: Option<DeviceInfo>,
    pub statistics: Option<SessionStatistics>,
    pub alerts: Vec<Alert>,
    pub readings: Vec<Reading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SessionResult {
    pub fn success(
        session_id: SessionId,
        device: DeviceInfo,
        statistics: SessionStatistics,
        alerts: Vec<Alert>,
        readings: Vec<Reading>,
    ) -> Self {
        Self {
            session_id,
            status: SessionStatus::Success,
            device: Some(device),
            statistics: Some(statistics),
            alerts,
            readings,
            error: None,
        }
    }

    pub fn failure(session_id: SessionId, error: impl Into<String>) -> Self {
        Self {
            session_id,
            status: SessionStatus::Failure,
            device: None,
            statistics: None,
            alerts: Vec::new(),
            readings: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == SessionStatus::Success
    }
}
