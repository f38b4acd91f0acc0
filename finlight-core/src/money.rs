//! Rounding and display of monetary values.

/// Relative nudge applied before rounding so that values like `19.005`,
/// stored as `19.00499999...`, round the way they read.
const ROUNDING_NUDGE: f64 = 4.0 * f64::EPSILON;

/// Round to 2 decimal places, half away from zero.
pub fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    (scaled * (1.0 + ROUNDING_NUDGE)).round() / 100.0
}

/// Rounded amount followed by the currency label, e.g. `80 лв` or `12.5 лв`.
pub fn format_money(value: f64, currency: &str) -> String {
    let rounded = round2(value);
    if currency.is_empty() {
        format!("{rounded}")
    } else {
        format!("{rounded} {currency}")
    }
}
