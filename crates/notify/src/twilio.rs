//! Twilio SMS sink.
//!
//! Posts form-encoded messages to the Twilio Messages API using HTTP basic
//! auth (account SID / auth token).

use crate::env::resolve_env_vars;
use crate::traits::{NotificationSink, NotifyError};

pub const TWILIO_API_BASE: &str = "https://api.twilio.com";

#[derive(Debug)]
pub struct TwilioSink {
    account_sid: String,
    auth_token: String,
    from_number: String,
    base_url: String,
    client: reqwest::Client,
}

impl TwilioSink {
    /// Create a sink from credentials.
    ///
    /// Values of the form `${VAR}` are resolved from the environment.
    /// Empty values produce [`NotifyError::Config`].
    pub fn from_config(
        account_sid: &str,
        auth_token: &str,
        from_number: &str,
    ) -> Result<Self, NotifyError> {
        let account_sid = resolve_env_vars(account_sid)?;
        let auth_token = resolve_env_vars(auth_token)?;
        let from_number = resolve_env_vars(from_number)?;

        for (name, value) in [
            ("account SID", &account_sid),
            ("auth token", &auth_token),
            ("from number", &from_number),
        ] {
            if value.is_empty() {
                return Err(NotifyError::Config(format!(
                    "Twilio {name} must not be empty"
                )));
            }
        }

        Ok(Self {
            account_sid,
            auth_token,
            from_number,
            base_url: TWILIO_API_BASE.to_string(),
            client: reqwest::Client::new(),
        })
    }

    /// Point the sink at a different API host (test servers, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        )
    }
}

#[async_trait::async_trait]
impl NotificationSink for TwilioSink {
    async fn send(&self, recipient: &str, message: &str) -> Result<(), NotifyError> {
        let params = [
            ("To", recipient),
            ("From", self.from_number.as_str()),
            ("Body", message),
        ];

        tracing::debug!(to = %recipient, "Sending Twilio SMS");

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&params)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(30);
            return Err(NotifyError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        let body: serde_json::Value = response.json().await.unwrap_or_default();

        if !status.is_success() {
            let detail = body
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or("Unknown Twilio API error");
            return Err(NotifyError::Unavailable(format!(
                "Twilio returned {status}: {detail}"
            )));
        }

        let sid = body.get("sid").and_then(|v| v.as_str()).unwrap_or("?");
        tracing::info!(to = %recipient, sid, "Twilio SMS queued");
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "twilio"
    }
}
