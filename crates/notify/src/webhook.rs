//! Generic HTTP webhook sink.
//!
//! Delivers each alert as a JSON payload to a configured URL with optional
//! custom headers.

use std::collections::HashMap;

use serde::Serialize;

use crate::env::resolve_env_vars;
use crate::traits::{NotificationSink, NotifyError};

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    recipient: &'a str,
    message: &'a str,
    source: &'static str,
}

/// Delivers alerts as JSON over HTTP to a configured endpoint.
///
/// Environment variable references (`${VAR_NAME}`) in the URL and header
/// values are resolved at construction time.
#[derive(Debug)]
pub struct WebhookSink {
    url: String,
    method: reqwest::Method,
    headers: HashMap<String, String>,
    client: reqwest::Client,
}

impl WebhookSink {
    /// Create a new webhook sink. `method` defaults to `POST`.
    pub fn new(
        url: &str,
        method: Option<reqwest::Method>,
        headers: HashMap<String, String>,
    ) -> Result<Self, NotifyError> {
        let resolved_url = resolve_env_vars(url)?;
        if resolved_url.is_empty() {
            return Err(NotifyError::Config("webhook URL must not be empty".to_string()));
        }

        let mut resolved_headers = HashMap::with_capacity(headers.len());
        for (key, value) in &headers {
            resolved_headers.insert(key.clone(), resolve_env_vars(value)?);
        }

        Ok(Self {
            url: resolved_url,
            method: method.unwrap_or(reqwest::Method::POST),
            headers: resolved_headers,
            client: reqwest::Client::new(),
        })
    }

    /// Construct from config-level primitives; `method` is parsed from a string.
    pub fn from_config<I>(url: &str, method: Option<&str>, headers: I) -> Result<Self, NotifyError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let parsed_method = match method {
            Some(m) => Some(
                m.to_uppercase()
                    .parse::<reqwest::Method>()
                    .map_err(|_| NotifyError::Config(format!("invalid HTTP method: {m}")))?,
            ),
            None => None,
        };

        Self::new(url, parsed_method, headers.into_iter().collect())
    }
}

#[async_trait::async_trait]
impl NotificationSink for WebhookSink {
    async fn send(&self, recipient: &str, message: &str) -> Result<(), NotifyError> {
        let payload = WebhookPayload {
            recipient,
            message,
            source: "fittwin",
        };

        let mut request = self
            .client
            .request(self.method.clone(), &self.url)
            .json(&payload);

        for (key, value) in &self.headers {
            request = request.header(key.as_str(), value.as_str());
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            tracing::warn!(
                url = %self.url,
                %status,
                body = %body_text,
                "webhook returned non-2xx status"
            );
            return Err(NotifyError::Unavailable(format!(
                "webhook returned {status}: {body_text}"
            )));
        }

        tracing::debug!(url = %self.url, %status, "webhook notification delivered");
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "webhook"
    }
}
