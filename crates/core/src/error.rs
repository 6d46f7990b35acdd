use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitTwinError {
    #[error("Device not connected: {0}")]
    NotConnected(String),

    #[error("Unknown device: {0}")]
    UnknownDevice(String),

    #[error("Empty input: at least one reading is required")]
    EmptyInput,

    #[error("Invalid sample count: {0} (must be > 0)")]
    InvalidDuration(u32),

    #[error("Session cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, FitTwinError>;
