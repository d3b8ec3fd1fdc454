//! Utility functions and helpers

use rust_decimal::Decimal;

/// Format a monetary amount with grouped thousands and a fixed number of
/// decimals, e.g. 1234567.5 -> "1 234 567,50" with French separators.
pub fn format_amount(
    value: Decimal,
    decimal_places: u32,
    thousands_separator: &str,
    decimal_separator: &str,
) -> String {
    let rounded = value.round_dp(decimal_places);
    let text = format!("{:.prec$}", rounded, prec = decimal_places as usize);
    let (raw, negative) = match text.strip_prefix('-') {
        Some(rest) => (rest, true),
        None => (text.as_str(), false),
    };
    let (integer, fraction) = match raw.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (raw, None),
    };

    let mut grouped = String::new();
    for (count, c) in integer.chars().rev().enumerate() {
        if count > 0 && count % 3 == 0 {
            grouped.push_str(&thousands_separator.chars().rev().collect::<String>());
        }
        grouped.push(c);
    }
    let mut result: String = grouped.chars().rev().collect();

    if let Some(fraction) = fraction {
        result.push_str(decimal_separator);
        result.push_str(fraction);
    }
    if negative {
        result.insert(0, '-');
    }
    result
}
