mod cli;
mod terminal;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use fittwin_core::config::load_dotenv;
use fittwin_core::{CancelSignal, Config};
use fittwin_session::MonitoringService;

use crate::cli::{CliArgs, Command};
use crate::terminal::Terminal;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    load_dotenv();
    let args = CliArgs::parse();
    let terminal = Terminal::new();

    let mut config = match args.profile.as_deref() {
        Some(p) => Config::for_profile(p),
        None => Config::from_env(),
    };
    if args.seed.is_some() {
        config.detection.seed = args.seed;
    }
    if args.fast {
        config.discovery.scan_delay_ms = 0;
        config.discovery.connect_delay_ms = 0;
    }
    if let Command::Monitor { informational: true, .. } = args.command {
        config.detection.informational_alerts = true;
    }

    match args.command {
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config.redacted_summary())?);
        }
        Command::Scan { json } => {
            let service = build_service(&config)?;
            let devices = service.scan().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&devices)?);
            } else {
                terminal.print_devices(&devices)?;
            }
        }
        Command::Monitor {
            address,
            duration,
            json,
            ..
        } => {
            let service = build_service(&config)?;
            if !service.connect(&address).await {
                terminal.print_error("Failed to connect to the device.")?;
                return Ok(());
            }

            let cancel = CancelSignal::new();
            let ctrl_c = tokio::spawn({
                let cancel = cancel.clone();
                async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        warn!("Interrupt received, cancelling session");
                        cancel.cancel();
                    }
                }
            });

            let duration = duration.unwrap_or_else(|| service.default_duration());
            let result = service
                .run_session_with_cancel(&address, duration, &cancel)
                .await;
            ctrl_c.abort();

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                terminal.print_session(&result)?;
            }

            let delivered = service.shutdown().await;
            info!(
                channel = service.notification_channel(),
                notifications = delivered.len(),
                "Done"
            );
        }
    }

    Ok(())
}

fn build_service(config: &Config) -> Result<MonitoringService> {
    config.log_summary();
    MonitoringService::from_config(config).context("failed to build monitoring service")
}
