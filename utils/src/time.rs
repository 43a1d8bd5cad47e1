//! Time formatting helpers for alert texts and logs.

use std::time::Duration;

/// Compact rendering with every non-zero unit, e.g. `1d 2h 5s` or `45s`.
///
/// Sub-second remainders are dropped; anything shorter than a second is `0s`.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let units = [
        (secs / 86_400, 'd'),
        (secs / 3_600 % 24, 'h'),
        (secs / 60 % 60, 'm'),
        (secs % 60, 's'),
    ];
    let parts: Vec<String> = units
        .iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, unit)| format!("{n}{unit}"))
        .collect();
    if parts.is_empty() {
        "0s".to_string()
    } else {
        parts.join(" ")
    }
}

/// Render milliseconds as seconds with two decimals, e.g. `6.25s`.
pub fn format_millis_as_secs(ms: f64) -> String {
    format!("{:.2}s", ms / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_durations_are_seconds() {
        assert_eq!(format_duration(Duration::from_secs(45)), "45s");
        assert_eq!(format_duration(Duration::from_millis(999)), "0s");
    }

    #[test]
    fn zero_units_are_skipped() {
        assert_eq!(format_duration(Duration::from_secs(60)), "1m");
        assert_eq!(format_duration(Duration::from_secs(3_605)), "1h 5s");
        assert_eq!(format_duration(Duration::from_secs(93_784)), "1d 2h 3m 4s");
    }

    #[test]
    fn millis_render_with_two_decimals() {
        assert_eq!(format_millis_as_secs(6_250.0), "6.25s");
        assert_eq!(format_millis_as_secs(999.4), "1.00s");
        assert_eq!(format_millis_as_secs(-500.0), "-0.50s");
    }
}
