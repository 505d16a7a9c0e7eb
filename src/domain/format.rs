// Numeric and time formatting for single-value widgets
use chrono::DateTime;

const SUFFIXES: [&str; 5] = ["", "K", "M", "B", "T"];
const EPS: f64 = 0.0001;

/// True when `n` is within `EPS` of its integer part.
pub fn is_int(n: f64) -> bool {
    (n - n.trunc()).abs() <= EPS
}

/// Formats a value for display.
///
/// Values below 1000 print as plain integers when integral, otherwise with
/// three decimals. Larger values are scaled down by powers of 1000 and get a
/// magnitude suffix, capped at `T`.
pub fn format_value(n: f64) -> String {
    if n.abs() < 1000.0 {
        return if is_int(n) {
            format!("{}", n.trunc() as i64)
        } else {
            format!("{:.3}", n)
        };
    }

    let mut n = n;
    let mut mag = 0;
    while n.abs() >= 1000.0 && mag < SUFFIXES.len() - 1 {
        mag += 1;
        n /= 1000.0;
    }

    format!("{:.3}{}", n, SUFFIXES[mag])
}

/// Formats a unix timestamp (seconds, UTC) as `YYYY-MM-DD HH:MM`.
pub fn format_time(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

/// Same as [`format_time`] for a millisecond timestamp.
pub fn format_time_ms(ms: i64) -> String {
    format_time(ms.div_euclid(1000))
}
