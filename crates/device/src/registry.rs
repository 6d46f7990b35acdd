//! Device catalogue with scan/connect semantics.
//!
//! Each device sits behind its own async mutex. A monitoring session holds
//! the guard for the whole sample, which keeps at most one in-flight
//! sampling operation per device while letting different devices run
//! concurrently.

use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::Mutex;
use tracing::{info, warn};

use fittwin_core::config::DiscoveryConfig;
use fittwin_core::{Clock, DeviceInfo, FitTwinError, Result};

use crate::device::VirtualDevice;

pub type SharedDevice = Arc<Mutex<VirtualDevice>>;

/// Wearables shipped with the simulator.
pub const DEFAULT_DEVICES: &[(&str, &str)] = &[
    ("Mi Band 6", "12:34:56:78:90:AB"),
    ("Fitbit Charge 5", "AB:CD:EF:12:34:56"),
    ("Apple Watch", "98:76:54:32:10:EF"),
];

struct Entry {
    info: DeviceInfo,
    handle: SharedDevice,
}

pub struct DeviceRegistry {
    /// Address → device, in registration order.
    devices: IndexMap<String, Entry>,
    clock: Arc<dyn Clock>,
    config: DiscoveryConfig,
}

impl DeviceRegistry {
    /// Create an empty registry.
    pub fn new(clock: Arc<dyn Clock>, config: DiscoveryConfig) -> Self {
        Self {
            devices: IndexMap::new(),
            clock,
            config,
        }
    }

    /// Create a registry populated with [`DEFAULT_DEVICES`].
    ///
    /// With a seed, device `i` is seeded with `seed + i`; otherwise each
    /// device draws from OS entropy.
    pub fn with_default_devices(
        clock: Arc<dyn Clock>,
        config: DiscoveryConfig,
        seed: Option<u64>,
    ) -> Self {
        let mut registry = Self::new(clock, config);
        for (i, (name, address)) in DEFAULT_DEVICES.iter().enumerate() {
            let device = match seed {
                Some(s) => VirtualDevice::seeded(*name, *address, s.wrapping_add(i as u64)),
                None => VirtualDevice::from_entropy(*name, *address),
            };
            registry.register(device);
        }
        registry
    }

    /// Add a device. A device with the same address replaces the old one.
    pub fn register(&mut self, device: VirtualDevice) {
        let info = device.info().clone();
        self.devices.insert(
            info.address.clone(),
            Entry {
                info,
                handle: Arc::new(Mutex::new(device)),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// List available devices after the simulated scan latency.
    pub async fn scan(&self) -> Vec<DeviceInfo> {
        self.clock.sleep(self.config.scan_delay()).await;
        let found: Vec<DeviceInfo> = self.devices.values().map(|e| e.info.clone()).collect();
        info!(count = found.len(), "Scan complete");
        found
    }

    /// Connect to the device at `address`. Returns `false` for unknown addresses.
    pub async fn connect(&self, address: &str) -> bool {
        self.clock.sleep(self.config.connect_delay()).await;

        let handle = match self.get(address) {
            Ok(h) => h,
            Err(e) => {
                warn!(address, error = %e, "Connect failed");
                return false;
            }
        };

        let now = self.clock.now();
        let connected = handle.lock().await.connect(now);
        if connected {
            info!(address, "Connected to device");
        }
        connected
    }

    /// Resolve a device handle by address.
    pub fn get(&self, address: &str) -> Result<SharedDevice> {
        self.devices
            .get(address)
            .map(|e| Arc::clone(&e.handle))
            .ok_or_else(|| FitTwinError::UnknownDevice(address.to_string()))
    }

    pub fn info(&self, address: &str) -> Option<&DeviceInfo> {
        self.devices.get(address).map(|e| &e.info)
    }
}
