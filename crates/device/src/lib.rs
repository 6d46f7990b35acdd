//! Simulated wearable devices.
//!
//! This crate provides:
//! - `VirtualDevice`, a fitness band whose state advances one simulated second per tick
//! - `DeviceRegistry`, the scan/connect surface over a fixed device catalogue
//! - `Sampler`, the throttled fixed-count sampling loop

pub mod device;
pub mod registry;
pub mod sampler;

pub use device::VirtualDevice;
pub use registry::{DeviceRegistry, SharedDevice};
pub use sampler::Sampler;
