//! Sink trait definition and shared error types.

use serde::Serialize;

use fittwin_core::AlertKind;

/// Errors that can occur during notification delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Sink unavailable: {0}")]
    Unavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Delivery timed out after {0}ms")]
    Timeout(u64),

    #[error("Rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
}

/// Outbound channel that delivers a message to a human operator.
///
/// Implementations report failure through the returned `Result`; they must
/// not panic. Retry policy and credentials belong to the implementation.
#[async_trait::async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, recipient: &str, message: &str) -> Result<(), NotifyError>;

    /// Human-readable name for this channel (e.g., "twilio", "webhook").
    fn channel_name(&self) -> &str;
}

/// Outcome of one delivery attempt.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchResult {
    pub channel: String,
    pub recipient: String,
    pub alert_kind: AlertKind,
    pub message: String,
    pub success: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
}
