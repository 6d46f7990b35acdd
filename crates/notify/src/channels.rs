//! Sink selection from configuration.

use std::sync::Arc;

use fittwin_core::config::NotifyConfig;

use crate::log::LogSink;
use crate::traits::{NotificationSink, NotifyError};
use crate::twilio::TwilioSink;
use crate::webhook::WebhookSink;

/// Pick the outbound channel: Twilio when fully configured, then webhook,
/// then the log-only sink.
pub fn sink_from_config(config: &NotifyConfig) -> Result<Arc<dyn NotificationSink>, NotifyError> {
    if let (Some(sid), Some(token), Some(from)) = (
        config.twilio_account_sid.as_deref(),
        config.twilio_auth_token.as_deref(),
        config.twilio_from_number.as_deref(),
    ) {
        return Ok(Arc::new(TwilioSink::from_config(sid, token, from)?));
    }

    if let Some(url) = config.webhook_url.as_deref() {
        return Ok(Arc::new(WebhookSink::from_config(
            url,
            config.webhook_method.as_deref(),
            config.webhook_headers.clone(),
        )?));
    }

    Ok(Arc::new(LogSink))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_log() {
        let sink = sink_from_config(&NotifyConfig::default()).unwrap();
        assert_eq!(sink.channel_name(), "log");
    }

    #[test]
    fn webhook_when_url_set() {
        let config = NotifyConfig {
            webhook_url: Some("https://example.com/hook".to_string()),
            ..NotifyConfig::default()
        };
        assert_eq!(sink_from_config(&config).unwrap().channel_name(), "webhook");
    }

    #[test]
    fn webhook_method_from_config_is_validated() {
        let config = NotifyConfig {
            webhook_url: Some("https://example.com/hook".to_string()),
            webhook_method: Some("NOT A METHOD".to_string()),
            ..NotifyConfig::default()
        };
        assert!(sink_from_config(&config).is_err());
    }

    #[test]
    fn webhook_header_env_reference_must_resolve() {
        let mut config = NotifyConfig {
            webhook_url: Some("https://example.com/hook".to_string()),
            webhook_method: Some("put".to_string()),
            ..NotifyConfig::default()
        };
        config.webhook_headers.insert(
            "X-Api-Key".to_string(),
            "${FT_CHANNELS_MISSING_KEY_4821}".to_string(),
        );
        let err = sink_from_config(&config).err().unwrap();
        assert!(err.to_string().contains("FT_CHANNELS_MISSING_KEY_4821"));

        std::env::set_var("FT_CHANNELS_MISSING_KEY_4821", "k");
        assert_eq!(sink_from_config(&config).unwrap().channel_name(), "webhook");
        std::env::remove_var("FT_CHANNELS_MISSING_KEY_4821");
    }

    #[test]
    fn twilio_takes_precedence() {
        let config = NotifyConfig {
            twilio_account_sid: Some("AC1".to_string()),
            twilio_auth_token: Some("tok".to_string()),
            twilio_from_number: Some("+15550000".to_string()),
            webhook_url: Some("https://example.com/hook".to_string()),
            ..NotifyConfig::default()
        };
        assert_eq!(sink_from_config(&config).unwrap().channel_name(), "twilio");
    }

    #[test]
    fn partial_twilio_falls_through() {
        let config = NotifyConfig {
            twilio_account_sid: Some("AC1".to_string()),
            ..NotifyConfig::default()
        };
        assert_eq!(sink_from_config(&config).unwrap().channel_name(), "log");
    }
}
