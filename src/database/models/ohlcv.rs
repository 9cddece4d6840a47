use crate::database::connection::DatabaseError;
use crate::database::numeric::{from_stored, to_stored};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Value columns shared by every daily time series
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Ohlcv {
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub adjusted_close: Decimal,
    pub volume: u64,
}

/// [`Ohlcv`] in its stored representation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoredOhlcv {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adjusted_close: f64,
    pub volume: i64,
}

impl Ohlcv {
    pub fn new(open: Decimal, high: Decimal, low: Decimal, close: Decimal, volume: u64) -> Self {
        Self {
            open,
            high,
            low,
            close,
            adjusted_close: close,
            volume,
        }
    }

    pub fn with_adjusted_close(mut self, adjusted_close: Decimal) -> Self {
        self.adjusted_close = adjusted_close;
        self
    }

    /// Round and narrow every column for writing
    pub fn to_stored(&self) -> Result<StoredOhlcv, DatabaseError> {
        let volume = i64::try_from(self.volume).map_err(|_| {
            DatabaseError::NumericConversion(format!("volume {} exceeds i64", self.volume))
        })?;

        Ok(StoredOhlcv {
            open: to_stored(self.open)?,
            high: to_stored(self.high)?,
            low: to_stored(self.low)?,
            close: to_stored(self.close)?,
            adjusted_close: to_stored(self.adjusted_close)?,
            volume,
        })
    }
}

impl TryFrom<StoredOhlcv> for Ohlcv {
    type Error = DatabaseError;

    fn try_from(stored: StoredOhlcv) -> Result<Self, Self::Error> {
        let volume = u64::try_from(stored.volume).map_err(|_| {
            DatabaseError::NumericConversion(format!("negative stored volume {}", stored.volume))
        })?;

        Ok(Self {
            open: from_stored(stored.open)?,
            high: from_stored(stored.high)?,
            low: from_stored(stored.low)?,
            close: from_stored(stored.close)?,
            adjusted_close: from_stored(stored.adjusted_close)?,
            volume,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_to_stored_rounds_prices() {
        let ohlcv = Ohlcv::new(dec!(100.123456), dec!(101), dec!(99.5), dec!(100.00005), 1_200);
        let stored = ohlcv.to_stored().unwrap();

        assert_eq!(stored.open, 100.1235);
        assert_eq!(stored.close, 100.0001);
        assert_eq!(stored.adjusted_close, 100.0001);
        assert_eq!(stored.volume, 1_200);
    }

    #[test]
    fn test_volume_out_of_range() {
        let ohlcv = Ohlcv::new(dec!(1), dec!(1), dec!(1), dec!(1), u64::MAX);
        assert!(matches!(
            ohlcv.to_stored(),
            Err(DatabaseError::NumericConversion(_))
        ));

        let stored = StoredOhlcv {
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            adjusted_close: 1.0,
            volume: -1,
        };
        assert!(Ohlcv::try_from(stored).is_err());
    }
}
