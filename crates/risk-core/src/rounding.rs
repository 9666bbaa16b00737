//! Decimal rounding for reported risk values.
//!
//! Values are rounded on their exact binary expansion rather than on a scaled
//! copy, so `0.1235` style boundaries are never nudged by multiplication error.

/// Decimal places used for recommendation risk fields.
pub const RECOMMENDATION_PRECISION: usize = 3;

/// Decimal places used for top-level probabilities echoed to callers.
pub const PROBABILITY_PRECISION: usize = 4;

/// Round `value` to `places` decimal digits.
pub fn round_to(value: f64, places: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{:.*}", places, value)
        .parse::<f64>()
        .unwrap_or(value)
}

/// Serde helper: serialize an `f64` rounded to three decimals.
pub fn serialize_round3<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_f64(round_to(*value, RECOMMENDATION_PRECISION))
}

/// Serde helper: serialize an `f64` rounded to four decimals.
pub fn serialize_round4<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_f64(round_to(*value, PROBABILITY_PRECISION))
}
