//! # Quantity Scaler
//!
//! Rewrites the numbers inside a free-text ingredient amount for a different
//! serving count. Amounts come from the generation service as arbitrary text
//! ("2 顆", "1.5 杯", "100-150 克", "鹽 少許"), so there is no unit model here:
//! every maximal run of digits (optionally with a decimal point) is scaled in
//! place and everything else is left exactly where it was.
//!
//! Scaling is always applied once, from a recipe's base amount. Rounding to one
//! decimal place happens on every call, including a ratio of exactly 1, so
//! results are never compounded across renders.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use tracing::trace;

/// Integers and decimals in ASCII or full-width digits, e.g. "2", "1.5", ".5", "２"
pub const NUMBER_PATTERN: &str = r"[0-9０-９]*\.?[0-9０-９]+";

lazy_static! {
    static ref NUMBER_REGEX: Regex =
        Regex::new(NUMBER_PATTERN).expect("Number pattern should be valid");
}

/// Ratio between the desired and the base serving count
///
/// A base of zero is treated as one serving so a malformed recipe still
/// produces a finite ratio.
///
/// # Examples
///
/// ```rust
/// use recipe_chef::quantity_scaler::serving_ratio;
///
/// assert_eq!(serving_ratio(4, 2), 2.0);
/// assert_eq!(serving_ratio(3, 0), 3.0);
/// ```
pub fn serving_ratio(desired: u32, base: u32) -> f64 {
    f64::from(desired) / f64::from(base.max(1))
}

/// Round to one decimal place and drop a trailing ".0"
///
/// # Examples
///
/// ```rust
/// use recipe_chef::quantity_scaler::format_scaled_value;
///
/// assert_eq!(format_scaled_value(3.0), "3");
/// assert_eq!(format_scaled_value(0.333), "0.3");
/// assert_eq!(format_scaled_value(2.25), "2.3");
/// ```
pub fn format_scaled_value(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{:.1}", rounded)
    }
}

/// Map full-width digits to ASCII so the token parses
fn to_ascii_digits(token: &str) -> String {
    token
        .chars()
        .map(|c| match c {
            '０'..='９' => char::from_digit(c as u32 - '０' as u32, 10).unwrap_or(c),
            _ => c,
        })
        .collect()
}

/// Scale every number inside `amount` by `ratio`
///
/// Non-numeric characters (units, separators, CJK text) keep their original
/// positions. Amounts without digits are returned unchanged. A zero or
/// negative ratio is not clamped; the result simply carries the scaled value.
///
/// # Examples
///
/// ```rust
/// use recipe_chef::quantity_scaler::scale_amount;
///
/// assert_eq!(scale_amount("2 顆蛋", 1.5), "3 顆蛋");
/// assert_eq!(scale_amount("1.5 杯水", 2.0), "3 杯水");
/// assert_eq!(scale_amount("100-150 克", 0.5), "50-75 克");
/// assert_eq!(scale_amount("少許", 3.0), "少許");
/// ```
pub fn scale_amount(amount: &str, ratio: f64) -> String {
    let scaled = NUMBER_REGEX.replace_all(amount, |caps: &Captures| {
        let token = &caps[0];
        match to_ascii_digits(token).parse::<f64>() {
            Ok(value) => format_scaled_value(value * ratio),
            Err(_) => token.to_string(),
        }
    });

    trace!(amount, ratio, scaled = %scaled, "Scaled ingredient amount");
    scaled.into_owned()
}
