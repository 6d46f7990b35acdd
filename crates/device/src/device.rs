//! A simulated fitness band.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use fittwin_core::{round2, ConnectionState, DeviceInfo, Reading};

pub const MIN_HEART_RATE: f64 = 60.0;
pub const MAX_HEART_RATE: f64 = 180.0;
const INITIAL_HEART_RATE: f64 = 70.0;
/// Distance units accumulated per step.
pub const STEP_DISTANCE: f64 = 0.0008;

/// Holds identity and mutable physiological state of one wearable.
///
/// Not safe for concurrent ticking; callers hold `&mut` (usually through the
/// registry's per-device lock) for the duration of a sample.
#[derive(Debug)]
pub struct VirtualDevice {
    info: DeviceInfo,
    heart_rate: f64,
    steps: u64,
    calories: f64,
    distance: f64,
    sleep_duration_hours: f64,
    state: ConnectionState,
    session_start: Option<DateTime<Utc>>,
    /// Simulated time of the last tick.
    sim_time: DateTime<Utc>,
    rng: StdRng,
}

impl VirtualDevice {
    /// Create a device driven by the given random source.
    pub fn new(name: impl Into<String>, address: impl Into<String>, mut rng: StdRng) -> Self {
        let sleep_duration_hours = rng.gen_range(6.0..8.0);
        Self {
            info: DeviceInfo {
                name: name.into(),
                address: address.into(),
            },
            heart_rate: INITIAL_HEART_RATE,
            steps: 0,
            calories: 0.0,
            distance: 0.0,
            sleep_duration_hours,
            state: ConnectionState::Disconnected,
            session_start: None,
            sim_time: DateTime::<Utc>::default(),
            rng,
        }
    }

    /// Create a device whose whole trajectory is reproducible from `seed`.
    pub fn seeded(name: impl Into<String>, address: impl Into<String>, seed: u64) -> Self {
        Self::new(name, address, StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self::new(name, address, StdRng::from_entropy())
    }

    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    pub fn address(&self) -> &str {
        &self.info.address
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn session_start(&self) -> Option<DateTime<Utc>> {
        self.session_start
    }

    pub fn sleep_duration_hours(&self) -> f64 {
        self.sleep_duration_hours
    }

    /// Unrounded heart rate.
    pub fn heart_rate(&self) -> f64 {
        self.heart_rate
    }

    /// Transition to `Connected` and start the simulated clock at `now`.
    ///
    /// Already-connected devices are left untouched.
    pub fn connect(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_connected() {
            return true;
        }
        self.state = ConnectionState::Connected;
        self.session_start = Some(now);
        self.sim_time = now;
        true
    }

    /// Advance the simulation by one second and snapshot the result.
    pub fn tick(&mut self) -> Reading {
        let variation: f64 = self.rng.gen_range(-5.0..=5.0);
        self.heart_rate = (self.heart_rate + variation).clamp(MIN_HEART_RATE, MAX_HEART_RATE);

        let new_steps: u64 = self.rng.gen_range(10..=30);
        self.steps += new_steps;
        self.distance += new_steps as f64 * STEP_DISTANCE;

        self.calories += self.rng.gen_range(0.05..=0.15);

        self.sim_time += Duration::seconds(1);

        let reading = Reading {
            heart_rate: self.heart_rate.round() as u32,
            steps: self.steps,
            calories: round2(self.calories),
            distance: round2(self.distance),
            timestamp: self.sim_time,
        };
        debug!(
            address = %self.info.address,
            heart_rate = reading.heart_rate,
            steps = reading.steps,
            "tick"
        );
        reading
    }
}
