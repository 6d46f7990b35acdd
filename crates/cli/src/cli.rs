use clap::{Parser, Subcommand};

/// Wearable fitness device simulator and health monitor.
///
/// Scans simulated wearables, connects to one, samples telemetry for a
/// bounded session and reports statistics and heart-rate alerts.
#[derive(Parser, Debug)]
#[command(name = "fittwin", version, about = "Wearable fitness device simulator and health monitor")]
pub struct CliArgs {
    /// Config profile; keys are looked up as {PROFILE}_{KEY} first
    #[arg(long, env = "FITTWIN_PROFILE")]
    pub profile: Option<String>,

    /// Seed for every random source (overrides SIMULATOR_SEED)
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Skip simulated scan/connect latency
    #[arg(long, global = true)]
    pub fast: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List available devices
    Scan {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Connect to a device and run one monitoring session
    Monitor {
        /// Device address, e.g. 12:34:56:78:90:AB
        #[arg(long)]
        address: String,

        /// Number of one-second readings (default: MONITOR_DURATION_SECS)
        #[arg(long)]
        duration: Option<u32>,

        /// Also fire random informational alerts
        #[arg(long)]
        informational: bool,

        /// Print the full session envelope as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration (secrets redacted)
    Config,
}
