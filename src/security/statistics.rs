//! Running statistics over interaction timelines.
//!
//! Every ratio here guards its denominator and yields `0.0` instead of
//! `NaN`/`Infinity`, so results can be published as-is.

use crate::models::Timestamp;

/// Arithmetic mean, `0.0` for empty input
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by `n`), `0.0` for fewer than two values
pub fn pop_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let avg = mean(values);
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Standard deviation relative to the mean, `0.0` when the mean is zero
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    let avg = mean(values);
    if avg == 0.0 || !avg.is_finite() {
        return 0.0;
    }
    let cv = pop_std_dev(values) / avg;
    if cv.is_finite() {
        cv
    } else {
        0.0
    }
}

/// Events per second
pub fn rate(count: f64, elapsed_seconds: f64) -> f64 {
    if elapsed_seconds > 0.0 {
        count / elapsed_seconds
    } else {
        0.0
    }
}

/// Number of timestamps strictly newer than `now - window_ms`
pub fn windowed_count(timestamps: &[Timestamp], now: Timestamp, window_ms: Timestamp) -> usize {
    // Logs are append-only and non-decreasing, so scan from the newest end
    let cutoff = now as i128 - window_ms as i128;
    timestamps
        .iter()
        .rev()
        .take_while(|&&t| t as i128 > cutoff)
        .count()
}

/// Gaps between consecutive timestamps, in milliseconds
pub fn intervals(timestamps: &[Timestamp]) -> Vec<f64> {
    timestamps
        .windows(2)
        .map(|pair| pair[1].saturating_sub(pair[0]) as f64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[2.0, 4.0, 6.0]), 4.0);
    }

    #[test]
    fn test_pop_std_dev() {
        assert_eq!(pop_std_dev(&[]), 0.0);
        assert_eq!(pop_std_dev(&[5.0]), 0.0);
        // Population form: sqrt(((2-5)^2 + (8-5)^2) / 2) = 3
        assert_eq!(pop_std_dev(&[2.0, 8.0]), 3.0);
        assert_eq!(pop_std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 2.0);
    }

    #[test]
    fn test_coefficient_of_variation() {
        assert_eq!(coefficient_of_variation(&[200.0, 200.0, 200.0]), 0.0);
        assert_eq!(coefficient_of_variation(&[0.0, 0.0]), 0.0);
        assert_eq!(coefficient_of_variation(&[]), 0.0);
        assert_eq!(coefficient_of_variation(&[2.0, 8.0]), 0.6);
    }

    #[test]
    fn test_rate_guards_zero_elapsed() {
        assert_eq!(rate(10.0, 0.0), 0.0);
        assert_eq!(rate(10.0, 4.0), 2.5);
    }

    #[test]
    fn test_windowed_count_is_strict() {
        let timestamps = [1_000, 1_500, 2_000, 2_400];
        // cutoff 1_500 excludes the event exactly at the boundary
        assert_eq!(windowed_count(&timestamps, 2_500, 1_000), 2);
        assert_eq!(windowed_count(&timestamps, 2_400, 5_000), 4);
        assert_eq!(windowed_count(&[], 2_400, 1_000), 0);
    }

    #[test]
    fn test_intervals() {
        assert_eq!(intervals(&[0, 200, 450]), vec![200.0, 250.0]);
        assert!(intervals(&[10]).is_empty());
    }
}
