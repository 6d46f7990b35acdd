use std::collections::BTreeMap;
use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u32(profile: &str, key: &str, default: u32) -> u32 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_f64(profile: &str, key: &str, default: f64) -> f64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parse `Name=Value` pairs separated by commas. Malformed entries are skipped.
fn parse_header_list(raw: &str) -> BTreeMap<String, String> {
    raw.split(',')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key) {
        Some(v) => matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        None => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub sampling: SamplingConfig,
    pub discovery: DiscoveryConfig,
    pub detection: DetectionConfig,
    pub notify: NotifyConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `FITTWIN_PROFILE`. When set (e.g. `DEMO`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("FITTWIN_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            sampling: SamplingConfig::from_env_profiled(p),
            discovery: DiscoveryConfig::from_env_profiled(p),
            detection: DetectionConfig::from_env_profiled(p),
            notify: NotifyConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  sampling:   interval={}ms, duration={}s",
            self.sampling.interval_ms,
            self.sampling.default_duration_secs
        );
        tracing::info!(
            "  discovery:  scan_delay={}ms, connect_delay={}ms",
            self.discovery.scan_delay_ms,
            self.discovery.connect_delay_ms
        );
        tracing::info!(
            "  detection:  sigma={}, informational={} (p={}), seed={}",
            self.detection.anomaly_sigma,
            self.detection.informational_alerts,
            self.detection.informational_probability,
            self.detection
                .seed
                .map(|s| s.to_string())
                .as_deref()
                .unwrap_or("(random)")
        );
        tracing::info!(
            "  notify:     channel={}, recipient={}",
            self.notify.channel_label(),
            self.notify.recipient.as_deref().unwrap_or("(none)")
        );
    }

    /// Return a redacted view safe for printing (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "sampling": {
                "interval_ms": self.sampling.interval_ms,
                "default_duration_secs": self.sampling.default_duration_secs,
            },
            "discovery": {
                "scan_delay_ms": self.discovery.scan_delay_ms,
                "connect_delay_ms": self.discovery.connect_delay_ms,
            },
            "detection": {
                "anomaly_sigma": self.detection.anomaly_sigma,
                "informational_alerts": self.detection.informational_alerts,
                "informational_probability": self.detection.informational_probability,
                "seed": self.detection.seed,
            },
            "notify": {
                "channel": self.notify.channel_label(),
                "recipient": self.notify.recipient,
                "twilio_configured": self.notify.twilio_configured(),
                "webhook_method": self.notify.webhook_method,
                "webhook_headers": self.notify.webhook_headers.keys().collect::<Vec<_>>(),
                "send_timeout_ms": self.notify.send_timeout_ms,
                "drain_timeout_ms": self.notify.drain_timeout_ms,
            },
        })
    }
}

// ── Sampling ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Throttling delay between ticks. Simulated time always advances 1s per tick.
    pub interval_ms: u64,
    /// Session length used when the caller does not specify one.
    pub default_duration_secs: u32,
}

impl SamplingConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            interval_ms: profiled_env_u64(p, "SAMPLE_INTERVAL_MS", 100),
            default_duration_secs: profiled_env_u32(p, "MONITOR_DURATION_SECS", 10),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 100,
            default_duration_secs: 10,
        }
    }
}

// ── Discovery ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Simulated BLE scan latency.
    pub scan_delay_ms: u64,
    /// Simulated connection handshake latency.
    pub connect_delay_ms: u64,
}

impl DiscoveryConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            scan_delay_ms: profiled_env_u64(p, "SCAN_DELAY_MS", 2000),
            connect_delay_ms: profiled_env_u64(p, "CONNECT_DELAY_MS", 1000),
        }
    }

    pub fn scan_delay(&self) -> Duration {
        Duration::from_millis(self.scan_delay_ms)
    }

    pub fn connect_delay(&self) -> Duration {
        Duration::from_millis(self.connect_delay_ms)
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            scan_delay_ms: 2000,
            connect_delay_ms: 1000,
        }
    }
}

// ── Detection ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Number of standard deviations beyond which a value is anomalous.
    pub anomaly_sigma: f64,
    /// Enable the random informational alert stream.
    pub informational_alerts: bool,
    /// Per-reading probability of an informational alert.
    pub informational_probability: f64,
    /// Seed for every random source (devices and informational alerts).
    pub seed: Option<u64>,
}

impl DetectionConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            anomaly_sigma: profiled_env_f64(p, "ANOMALY_SIGMA", 2.0),
            informational_alerts: profiled_env_bool(p, "INFORMATIONAL_ALERTS", false),
            informational_probability: profiled_env_f64(p, "INFORMATIONAL_PROBABILITY", 0.5)
                .clamp(0.0, 1.0),
            seed: profiled_env_opt(p, "SIMULATOR_SEED").and_then(|v| v.parse().ok()),
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            anomaly_sigma: 2.0,
            informational_alerts: false,
            informational_probability: 0.5,
            seed: None,
        }
    }
}

// ── Notifications ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Phone number or identifier that receives alerts.
    pub recipient: Option<String>,
    pub twilio_account_sid: Option<String>,
    pub twilio_auth_token: Option<String>,
    pub twilio_from_number: Option<String>,
    pub webhook_url: Option<String>,
    /// HTTP method for the webhook (defaults to POST).
    pub webhook_method: Option<String>,
    /// Extra webhook headers; values may reference `${VAR}`.
    pub webhook_headers: BTreeMap<String, String>,
    /// Upper bound on a single sink call.
    pub send_timeout_ms: u64,
    /// Upper bound on waiting for in-flight dispatches at shutdown.
    pub drain_timeout_ms: u64,
}

impl NotifyConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            recipient: profiled_env_opt(p, "ALERT_RECIPIENT"),
            twilio_account_sid: profiled_env_opt(p, "TWILIO_ACCOUNT_SID"),
            twilio_auth_token: profiled_env_opt(p, "TWILIO_AUTH_TOKEN"),
            twilio_from_number: profiled_env_opt(p, "TWILIO_PHONE_NUMBER"),
            webhook_url: profiled_env_opt(p, "ALERT_WEBHOOK_URL"),
            webhook_method: profiled_env_opt(p, "ALERT_WEBHOOK_METHOD"),
            webhook_headers: profiled_env_opt(p, "ALERT_WEBHOOK_HEADERS")
                .map(|raw| parse_header_list(&raw))
                .unwrap_or_default(),
            send_timeout_ms: profiled_env_u64(p, "NOTIFY_SEND_TIMEOUT_MS", 5000),
            drain_timeout_ms: profiled_env_u64(p, "NOTIFY_DRAIN_TIMEOUT_MS", 10_000),
        }
    }

    pub fn twilio_configured(&self) -> bool {
        self.twilio_account_sid.is_some()
            && self.twilio_auth_token.is_some()
            && self.twilio_from_number.is_some()
    }

    /// Which sink will be used: twilio, then webhook, then log.
    pub fn channel_label(&self) -> &'static str {
        if self.twilio_configured() {
            "twilio"
        } else if self.webhook_url.is_some() {
            "webhook"
        } else {
            "log"
        }
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            recipient: None,
            twilio_account_sid: None,
            twilio_auth_token: None,
            twilio_from_number: None,
            webhook_url: None,
            webhook_method: None,
            webhook_headers: BTreeMap::new(),
            send_timeout_ms: 5000,
            drain_timeout_ms: 10_000,
        }
    }
}
