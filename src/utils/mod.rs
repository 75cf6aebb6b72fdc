pub mod clock;
pub mod logging;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::Timestamp;

/// Converts a timestamp in milliseconds to a DateTime<Utc>
pub fn timestamp_to_datetime(timestamp_ms: Timestamp) -> DateTime<Utc> {
    let naive = NaiveDateTime::from_timestamp_millis(timestamp_ms as i64)
        .unwrap_or_else(|| {
            // Fallback to current time if timestamp is invalid
            let now = Utc::now();
            now.naive_utc()
        });

    DateTime::from_naive_utc_and_offset(naive, Utc)
}

/// Formats a timestamp in milliseconds as an ISO-8601 string
pub fn timestamp_to_iso(timestamp_ms: Timestamp) -> String {
    timestamp_to_datetime(timestamp_ms).to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Rounds the exact binary value to a fixed number of decimal places, half
/// away from zero. `0.075` is stored just below the midpoint and rounds to
/// `0.07`.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }

    match Decimal::from_f64_retain(value) {
        Some(exact) => exact
            .round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero)
            .to_string()
            .parse()
            .unwrap_or(0.0),
        // Beyond the decimal range no fractional digits remain
        None => value.round(),
    }
}

/// Formats a metric for display without trailing zeros ("1.5", "75", "0")
pub fn format_metric(value: f64) -> String {
    let rounded = round_to(value, 2);
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        let text = format!("{:.2}", rounded);
        text.trim_end_matches('0').to_string()
    }
}

/// Sanitizes a string for use in logs (truncates and strips control characters)
pub fn sanitize_for_log(input: &str) -> String {
    const MAX_LOG_FIELD: usize = 256;

    let mut output: String = input
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_LOG_FIELD)
        .collect();

    if input.chars().count() > MAX_LOG_FIELD {
        output.push_str("...");
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_to_datetime() {
        let timestamp = 1620000000000; // May 3, 2021 12:00:00 AM GMT
        let dt = timestamp_to_datetime(timestamp);
        assert_eq!(dt.timestamp_millis(), timestamp as i64);
    }

    #[test]
    fn test_timestamp_to_iso() {
        assert_eq!(timestamp_to_iso(1620000000123), "2021-05-03T00:00:00.123Z");
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.41421356, 2), 1.41);
        assert_eq!(round_to(74.6, 0), 75.0);
        assert_eq!(round_to(12.34, 1), 12.3);
        assert_eq!(round_to(f64::NAN, 2), 0.0);
        assert_eq!(round_to(f64::INFINITY, 1), 0.0);
    }

    #[test]
    fn test_round_to_uses_exact_binary_value() {
        // Stored just below the midpoint
        assert_eq!(round_to(0.075, 2), 0.07);
        assert_eq!(round_to(1.005, 2), 1.0);
        assert_eq!(round_to(4.5 / 60.0, 2), 0.07);
        // Exact midpoints round away from zero
        assert_eq!(round_to(0.125, 2), 0.13);
        assert_eq!(round_to(2.5, 0), 3.0);
        assert_eq!(round_to(1e30, 2), 1e30);
    }

    #[test]
    fn test_format_metric() {
        assert_eq!(format_metric(75.0), "75");
        assert_eq!(format_metric(1.25), "1.25");
        assert_eq!(format_metric(1.5), "1.5");
        assert_eq!(format_metric(0.0), "0");
    }

    #[test]
    fn test_sanitize_for_log() {
        let input = "line one\nline two\u{7}";
        assert_eq!(sanitize_for_log(input), "line oneline two");

        let long = "x".repeat(300);
        let sanitized = sanitize_for_log(&long);
        assert!(sanitized.ends_with("..."));
        assert_eq!(sanitized.len(), 259);
    }
}
