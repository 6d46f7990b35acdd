//! Reduction of a reading sequence into session statistics.

use fittwin_core::{round2, FitTwinError, Reading, Result, SessionStatistics};

/// Heart-rate sub-series used by the anomaly detector.
pub fn heart_rate_series(readings: &[Reading]) -> Vec<f64> {
    readings.iter().map(|r| f64::from(r.heart_rate)).collect()
}

/// Summarise a session in one pass.
///
/// Readings are cumulative, so step, calorie and distance totals take the
/// maximum observed value. Distance is converted to kilometres here
/// (divided by 1000, then rounded to 2 decimals).
pub fn aggregate(
    readings: &[Reading],
    sleep_duration_hours: f64,
    duration_seconds: u32,
) -> Result<SessionStatistics> {
    let first = readings.first().ok_or(FitTwinError::EmptyInput)?;

    let mut hr_sum = 0u64;
    let mut max_heart_rate = first.heart_rate;
    let mut total_steps = first.steps;
    let mut calories_burned = first.calories;
    let mut max_distance = first.distance;

    for r in readings {
        hr_sum += u64::from(r.heart_rate);
        max_heart_rate = max_heart_rate.max(r.heart_rate);
        total_steps = total_steps.max(r.steps);
        calories_burned = calories_burned.max(r.calories);
        max_distance = max_distance.max(r.distance);
    }

    Ok(SessionStatistics {
        avg_heart_rate: hr_sum as f64 / readings.len() as f64,
        max_heart_rate,
        total_steps,
        calories_burned,
        distance_traveled_km: round2(max_distance / 1000.0),
        activity_duration_minutes: f64::from(duration_seconds) / 60.0,
        sleep_duration_hours,
    })
}
