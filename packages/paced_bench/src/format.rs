//! Rendering of throughput figures for humans.

/// Thousands separator used when the caller does not provide one.
pub const DEFAULT_THOUSANDS_SEPARATOR: &str = ",";

/// Decimal separator used when the caller does not provide one.
pub const DEFAULT_DECIMAL_SEPARATOR: &str = ".";

const UNIT_SUFFIX: &str = " ops/s";

/// Renders a frequency rounded to two decimal places, e.g. `1234567.89 ops/s`.
pub(crate) fn fixed(frequency: f64) -> String {
    format!("{frequency:.2}{UNIT_SUFFIX}")
}

/// Renders a frequency with separators, e.g. `1,234,567.89 ops/s`.
///
/// The fractional part is truncated (not rounded) to two digits. Empty separators fall back
/// to the defaults. Values without a digit run (`NaN`, `inf`) are passed through as-is.
pub(crate) fn grouped(
    frequency: f64,
    thousands_separator: &str,
    decimal_separator: &str,
) -> String {
    let thousands_separator = if thousands_separator.is_empty() {
        DEFAULT_THOUSANDS_SEPARATOR
    } else {
        thousands_separator
    };

    let decimal_separator = if decimal_separator.is_empty() {
        DEFAULT_DECIMAL_SEPARATOR
    } else {
        decimal_separator
    };

    // Shortest representation that round-trips, never in exponent notation.
    let text = frequency.to_string();

    let (integer, fraction) = match text.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (text.as_str(), None),
    };

    let mut result = group_thousands(integer, thousands_separator);

    if let Some(fraction) = fraction {
        result.push_str(decimal_separator);
        result.extend(fraction.chars().take(2));
    }

    result.push_str(UNIT_SUFFIX);
    result
}

fn group_thousands(integer: &str, separator: &str) -> String {
    let digits_start = integer
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(integer.len());
    let (sign, digits) = integer.split_at(digits_start);

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return integer.to_string();
    }

    let mut result = String::with_capacity(integer.len().saturating_mul(2));
    result.push_str(sign);

    let mut remaining = digits.len();

    for digit in digits.chars() {
        if remaining != digits.len() && remaining % 3 == 0 {
            result.push_str(separator);
        }

        result.push(digit);
        remaining = remaining.saturating_sub(1);
    }

    result
}
