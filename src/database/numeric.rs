//! Conversion between domain decimals and stored `DOUBLE PRECISION` columns
//!
//! Writes round to [`PRICE_SCALE`] fractional digits (midpoint away from
//! zero) before narrowing to `f64`. Reads take the stored value as canonical
//! and apply no rounding.

use crate::database::connection::DatabaseError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Fractional digits kept for every stored monetary value
pub const PRICE_SCALE: u32 = 4;

/// Round a domain value to the stored precision
pub fn round_price(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Domain decimal -> stored float
pub fn to_stored(value: Decimal) -> Result<f64, DatabaseError> {
    let rounded = round_price(value);
    rounded
        .to_f64()
        .ok_or_else(|| DatabaseError::NumericConversion(format!("{} does not fit in f64", rounded)))
}

/// Stored float -> domain decimal
///
/// Goes through the shortest decimal representation of the float so that a
/// stored `12.3457` reads back as exactly `12.3457`.
pub fn from_stored(value: f64) -> Result<Decimal, DatabaseError> {
    if !value.is_finite() {
        return Err(DatabaseError::NumericConversion(format!(
            "non-finite stored value {}",
            value
        )));
    }

    Decimal::from_str(&value.to_string())
        .map_err(|e| DatabaseError::NumericConversion(format!("{}: {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_rounds_to_four_digits_before_narrowing() {
        assert_eq!(to_stored(dec!(12.345678)).unwrap(), 12.3457);
        assert_eq!(from_stored(12.3457).unwrap(), dec!(12.3457));
    }

    #[test]
    fn test_midpoint_rounds_up() {
        assert_eq!(round_price(dec!(1.00005)), dec!(1.0001));
        assert_eq!(round_price(dec!(1.00004)), dec!(1.0000));
        assert_eq!(round_price(dec!(-1.00005)), dec!(-1.0001));
    }

    #[test]
    fn test_rewrite_is_a_fixed_point() {
        let first = from_stored(to_stored(dec!(12.345678)).unwrap()).unwrap();
        let second = from_stored(to_stored(first).unwrap()).unwrap();
        assert_eq!(first, second);
        assert_eq!(second, dec!(12.3457));
    }

    #[test]
    fn test_read_applies_no_rounding() {
        assert_eq!(from_stored(0.123456).unwrap(), dec!(0.123456));
    }

    #[test]
    fn test_whole_numbers() {
        assert_eq!(to_stored(dec!(100)).unwrap(), 100.0);
        assert_eq!(from_stored(100.0).unwrap(), dec!(100));
    }

    #[test]
    fn test_rejects_non_finite() {
        assert!(from_stored(f64::NAN).is_err());
        assert!(from_stored(f64::INFINITY).is_err());
    }
}
