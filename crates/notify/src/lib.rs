//! Alert delivery for monitoring sessions.
//!
//! This crate provides:
//! - `NotificationSink` trait for pluggable delivery channels
//! - Twilio SMS, JSON webhook, and log-only sink implementations
//! - `Dispatcher`, which isolates sink failures from the session pipeline

pub mod channels;
pub mod dispatcher;
mod env;
pub mod log;
pub mod traits;
pub mod twilio;
pub mod webhook;

pub use channels::sink_from_config;
pub use dispatcher::{DispatchStats, Dispatcher};
pub use traits::{DispatchResult, NotificationSink, NotifyError};
