//! Decimal facade — exact fixed-point arithmetic for money.
//!
//! All prices, sizes, profits, balances, and equity samples are
//! [`Decimal`]. Floats are permitted only for statistical metrics and the
//! sizer's intermediate growth factor; these helpers are the single
//! crossing point between the two worlds.

pub use rust_decimal::Decimal;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

/// Build a decimal from a float, truncating binary noise.
///
/// Non-finite inputs map to zero: a sizer that divides by a zero risk
/// must not poison the ledger with NaN.
pub fn from_f64(value: f64) -> Decimal {
    if !value.is_finite() {
        return Decimal::ZERO;
    }
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}

/// Lossy conversion for statistics. Exact for every value the ledger
/// produces in practice.
pub fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn from_f64_is_exact_for_ledger_values() {
        assert_eq!(from_f64(1000.0), dec!(1000));
        assert_eq!(from_f64(0.25), dec!(0.25));
    }

    #[test]
    fn non_finite_maps_to_zero() {
        assert_eq!(from_f64(f64::NAN), Decimal::ZERO);
        assert_eq!(from_f64(f64::INFINITY), Decimal::ZERO);
    }

    #[test]
    fn round_trip() {
        assert_eq!(to_f64(dec!(10.5)), 10.5);
    }
}
