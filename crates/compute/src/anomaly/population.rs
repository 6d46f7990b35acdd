//! Population-level statistics for anomaly detection.
//!
//! Uses the population (divisor N) variance over the whole observed set.

/// Compute population mean and standard deviation.
///
/// Returns `None` for an empty slice. A constant series has a standard
/// deviation of exactly zero.
pub fn compute_population_stats(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;

    let variance = values
        .iter()
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f64>()
        / n;

    Some((mean, variance.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn population_stats_basic() {
        let (mean, std_dev) = compute_population_stats(&[1.0, 3.0]).unwrap();
        assert!((mean - 2.0).abs() < 1e-10);
        // sqrt(((1-2)^2 + (3-2)^2) / 2) = 1.0
        assert!((std_dev - 1.0).abs() < 1e-10);
    }

    #[test]
    fn population_stats_empty() {
        assert!(compute_population_stats(&[]).is_none());
    }

    #[test]
    fn constant_series_has_zero_std_dev() {
        let (mean, std_dev) = compute_population_stats(&[75.0; 10]).unwrap();
        assert_eq!(mean, 75.0);
        assert_eq!(std_dev, 0.0);
    }

    #[test]
    fn uses_population_divisor() {
        // Sample std-dev (N-1) would be ~2.138; population is 2.0.
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let (mean, std_dev) = compute_population_stats(&data).unwrap();
        assert!((mean - 5.0).abs() < 1e-10);
        assert!((std_dev - 2.0).abs() < 1e-10);
    }
}
