// Human interval parsing ("1d", "2h", "30") into seconds
use serde_json::Value;

const MULTIPLIERS: [(char, u64); 4] = [('s', 1), ('m', 60), ('h', 3600), ('d', 86400)];

/// Parses an interval such as `"2h"` into seconds. Bare integers, with or
/// without quotes, are taken as seconds.
pub fn parse_interval(text: &str) -> Option<u64> {
    let text = text.trim();
    let last = text.chars().last()?;

    let (digits, multiplier) = match MULTIPLIERS.iter().find(|(suffix, _)| *suffix == last) {
        Some((_, multiplier)) => (&text[..text.len() - 1], *multiplier),
        None => (text, 1),
    };

    digits.trim().parse::<u64>().ok()?.checked_mul(multiplier)
}

/// Parses an interval from a config value, which may be a number or a string.
pub fn interval_from_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => parse_interval(s),
        _ => None,
    }
}
