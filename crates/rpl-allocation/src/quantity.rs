//! Free-text quantity parsing.
//!
//! Listings and claims arrive with quantities like `"10 units"`, `"5kg"`,
//! or `"20 servings"`. The numeric prefix is the magnitude; whatever trails
//! it (trimmed) is the unit. Parsing happens exactly once at the input
//! boundary — downstream code only ever sees the typed [`Quantity`].
//!
//! Input with no parseable numeric prefix defaults to a zero magnitude and
//! emits a `quantity_parse_defaulted` warning. This is NOT an error: the
//! record is accepted, the anomaly is logged for operators.

use rpl_schemas::{Quantity, MILLI_SCALE};
use tracing::warn;

/// Parse a free-text quantity into a typed [`Quantity`].
///
/// The magnitude is the longest decimal prefix (`123`, `2.5`); fractional
/// digits beyond milli precision are truncated. Everything after the prefix,
/// trimmed, becomes the unit. A missing or malformed prefix yields a zero
/// magnitude with the whole input as the unit.
pub fn parse_quantity(text: &str) -> Quantity {
    let trimmed = text.trim();

    let digits_end = trimmed
        .char_indices()
        .take_while(|(i, c)| c.is_ascii_digit() || (*c == '.' && *i > 0))
        .map(|(i, c)| i + c.len_utf8())
        .last()
        .unwrap_or(0);

    let (num, unit) = trimmed.split_at(digits_end);

    match decimal_to_milli(num) {
        Some(amount_milli) => Quantity::new(amount_milli, unit.trim()),
        None => {
            warn!(
                event = "quantity_parse_defaulted",
                input = %text,
                "unparseable quantity defaulted to zero magnitude"
            );
            Quantity::new(0, trimmed)
        }
    }
}

/// Convert a decimal string (`"10"`, `"2.5"`) to millis. Returns `None` for
/// empty input, multiple dots, or overflow.
fn decimal_to_milli(num: &str) -> Option<i64> {
    if num.is_empty() {
        return None;
    }

    let mut parts = num.splitn(2, '.');
    let int_part = parts.next().unwrap_or("");
    let frac_part = parts.next().unwrap_or("");
    if frac_part.contains('.') {
        return None;
    }

    let int_val: i64 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().ok()?
    };

    // Milli precision: keep at most 3 fractional digits, truncate the rest.
    let mut frac_milli: i64 = 0;
    let mut scale = MILLI_SCALE / 10;
    for c in frac_part.chars().take(3) {
        let d = c.to_digit(10)? as i64;
        frac_milli += d * scale;
        scale /= 10;
    }

    int_val
        .checked_mul(MILLI_SCALE)
        .and_then(|v| v.checked_add(frac_milli))
}

/// Render a milli magnitude back to a decimal string with trailing zeros
/// trimmed: `4_000 → "4"`, `2_500 → "2.5"`.
pub fn format_amount_milli(amount_milli: i64) -> String {
    let whole = amount_milli / MILLI_SCALE;
    let frac = (amount_milli % MILLI_SCALE).abs();
    if frac == 0 {
        return whole.to_string();
    }
    let s = format!("{whole}.{frac:03}");
    s.trim_end_matches('0').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_magnitude_and_unit() {
        assert_eq!(parse_quantity("10 units"), Quantity::new(10_000, "units"));
        assert_eq!(parse_quantity("5kg"), Quantity::new(5_000, "kg"));
        assert_eq!(
            parse_quantity("20 servings"),
            Quantity::new(20_000, "servings")
        );
        assert_eq!(parse_quantity("2.5 kg"), Quantity::new(2_500, "kg"));
    }

    #[test]
    fn unparseable_defaults_to_zero() {
        assert_eq!(parse_quantity("a few bags"), Quantity::new(0, "a few bags"));
        assert_eq!(parse_quantity(""), Quantity::new(0, ""));
        assert_eq!(parse_quantity(".5"), Quantity::new(0, ".5"));
    }

    #[test]
    fn fractional_digits_truncate_at_milli() {
        assert_eq!(parse_quantity("1.2345 kg"), Quantity::new(1_234, "kg"));
    }

    #[test]
    fn formats_without_trailing_zeros() {
        assert_eq!(format_amount_milli(4_000), "4");
        assert_eq!(format_amount_milli(2_500), "2.5");
        assert_eq!(format_amount_milli(1_234), "1.234");
        assert_eq!(format_amount_milli(0), "0");
    }
}
