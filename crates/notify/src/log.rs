//! Sink that only writes alerts to the log.
//!
//! Used when no outbound channel is configured.

use crate::traits::{NotificationSink, NotifyError};

#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait::async_trait]
impl NotificationSink for LogSink {
    async fn send(&self, recipient: &str, message: &str) -> Result<(), NotifyError> {
        tracing::info!(recipient, message, "ALERT");
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_sink_always_succeeds() {
        let sink = LogSink;
        assert!(sink.send("+15550001", "hello").await.is_ok());
        assert_eq!(sink.channel_name(), "log");
    }
}
