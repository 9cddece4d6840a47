use crate::database::connection::DatabaseError;
use crate::database::models::ohlcv::{Ohlcv, StoredOhlcv};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Double, Text, Timestamptz};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Broad-market index with its own daily series
///
/// Each index is a single global series keyed by date alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketIndex {
    Nikkei,
    Topix,
}

impl MarketIndex {
    /// Table holding the series for this index
    pub fn table_name(&self) -> &'static str {
        match self {
            MarketIndex::Nikkei => "nikkei_daily_prices",
            MarketIndex::Topix => "topix_daily_prices",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MarketIndex::Nikkei => "nikkei",
            MarketIndex::Topix => "topix",
        }
    }
}

impl FromStr for MarketIndex {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nikkei" => Ok(MarketIndex::Nikkei),
            "topix" => Ok(MarketIndex::Topix),
            other => Err(DatabaseError::InvalidInput(format!("unknown market index: {}", other))),
        }
    }
}

impl fmt::Display for MarketIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One day of an index series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDailyPrice {
    pub id: String,
    pub date: DateTime<Utc>,
    #[serde(flatten)]
    pub ohlcv: Ohlcv,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewIndexDailyPrice {
    pub date: DateTime<Utc>,
    #[serde(flatten)]
    pub ohlcv: Ohlcv,
}

impl NewIndexDailyPrice {
    pub fn new(date: DateTime<Utc>, ohlcv: Ohlcv) -> Self {
        Self { date, ohlcv }
    }
}

// Index tables share one shape; rows are read by name from whichever table
// the index maps to.
#[derive(QueryableByName, Debug)]
pub(crate) struct IndexDailyPriceRow {
    #[diesel(sql_type = Text)]
    pub id: String,
    #[diesel(sql_type = Timestamptz)]
    pub date: DateTime<Utc>,
    #[diesel(sql_type = Double)]
    pub open: f64,
    #[diesel(sql_type = Double)]
    pub high: f64,
    #[diesel(sql_type = Double)]
    pub low: f64,
    #[diesel(sql_type = Double)]
    pub close: f64,
    #[diesel(sql_type = Double)]
    pub adjusted_close: f64,
    #[diesel(sql_type = BigInt)]
    pub volume: i64,
    #[diesel(sql_type = Timestamptz)]
    pub created_at: DateTime<Utc>,
    #[diesel(sql_type = Timestamptz)]
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<IndexDailyPriceRow> for IndexDailyPrice {
    type Error = DatabaseError;

    fn try_from(row: IndexDailyPriceRow) -> Result<Self, Self::Error> {
        let ohlcv = Ohlcv::try_from(StoredOhlcv {
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            adjusted_close: row.adjusted_close,
            volume: row.volume,
        })?;

        Ok(IndexDailyPrice {
            id: row.id,
            date: row.date,
            ohlcv,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_mapping() {
        assert_eq!(MarketIndex::Nikkei.table_name(), "nikkei_daily_prices");
        assert_eq!(MarketIndex::Topix.table_name(), "topix_daily_prices");
    }

    #[test]
    fn test_string_round_trip() {
        for index in [MarketIndex::Nikkei, MarketIndex::Topix] {
            assert_eq!(index.as_str().parse::<MarketIndex>().unwrap(), index);
            assert_eq!(index.to_string(), index.as_str());
        }
        assert!("dow".parse::<MarketIndex>().unwrap_err().is_invalid_input());
    }
}
