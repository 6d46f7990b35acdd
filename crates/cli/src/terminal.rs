use anyhow::Result;
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use std::io::{self, Write};

use fittwin_core::{AlertKind, DeviceInfo, SessionResult};

/// Color scheme for terminal output.
struct Colors;

impl Colors {
    const HEADER: Color = Color::Magenta;
    const LABEL: Color = Color::Cyan;
    const ANOMALY: Color = Color::Red;
    const INFO: Color = Color::Yellow;
    const DIM: Color = Color::DarkGrey;
}

/// Renders scan results and session envelopes for humans.
pub struct Terminal;

impl Terminal {
    pub fn new() -> Self {
        Self
    }

    pub fn print_devices(&self, devices: &[DeviceInfo]) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::HEADER),
            Print(format!("Found {} devices\n", devices.len())),
            ResetColor,
        )?;
        for d in devices {
            execute!(
                stdout,
                SetForegroundColor(Colors::LABEL),
                Print(format!("  {:<18}", d.address)),
                ResetColor,
                Print(format!("{}\n", d.name)),
            )?;
        }
        stdout.flush()?;
        Ok(())
    }

    pub fn print_error(&self, message: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::ANOMALY),
            Print(format!("{message}\n")),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Print statistics and alerts, or a neutral notice when the session failed.
    pub fn print_session(&self, result: &SessionResult) -> Result<()> {
        let mut stdout = io::stdout();

        let stats = match (&result.statistics, &result.device) {
            (Some(stats), Some(device)) => {
                execute!(
                    stdout,
                    SetForegroundColor(Colors::HEADER),
                    Print(format!("Monitoring {} ({})\n", device.name, device.address)),
                    ResetColor,
                )?;
                stats
            }
            _ => {
                execute!(
                    stdout,
                    SetForegroundColor(Colors::DIM),
                    Print("No monitoring data available.\n"),
                    ResetColor,
                )?;
                stdout.flush()?;
                return Ok(());
            }
        };

        let rows = [
            ("Average heart rate", format!("{:.1} BPM", stats.avg_heart_rate)),
            ("Max heart rate", format!("{} BPM", stats.max_heart_rate)),
            ("Total steps", stats.total_steps.to_string()),
            ("Calories burned", format!("{:.2} kcal", stats.calories_burned)),
            ("Distance", format!("{:.2} km", stats.distance_traveled_km)),
            ("Activity duration", format!("{:.2} min", stats.activity_duration_minutes)),
            ("Sleep duration", format!("{:.1} h", stats.sleep_duration_hours)),
        ];
        for (label, value) in rows {
            execute!(
                stdout,
                SetForegroundColor(Colors::LABEL),
                Print(format!("  {label:<20}")),
                ResetColor,
                Print(format!("{value}\n")),
            )?;
        }

        if result.alerts.is_empty() {
            execute!(
                stdout,
                SetForegroundColor(Colors::DIM),
                Print("No alerts.\n"),
                ResetColor,
            )?;
        } else {
            execute!(stdout, Print(format!("Alerts ({}):\n", result.alerts.len())))?;
            for alert in &result.alerts {
                let color = match alert.kind {
                    AlertKind::Anomaly => Colors::ANOMALY,
                    AlertKind::Informational => Colors::INFO,
                };
                execute!(
                    stdout,
                    SetForegroundColor(color),
                    Print(format!("  [{}] ", alert.kind)),
                    ResetColor,
                    Print(format!(
                        "{} ({})\n",
                        alert.message,
                        alert.timestamp.format("%H:%M:%S")
                    )),
                )?;
            }
        }

        stdout.flush()?;
        Ok(())
    }
}
