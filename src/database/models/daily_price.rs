use crate::database::connection::DatabaseError;
use crate::database::models::ohlcv::{Ohlcv, StoredOhlcv};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Daily price of one stock brand
///
/// Exactly one row exists per (ticker symbol, date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPrice {
    pub id: String,
    pub ticker_symbol: String,
    pub stock_brand_id: String,
    pub date: DateTime<Utc>,
    #[serde(flatten)]
    pub ohlcv: Ohlcv,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Daily price as ingested; the row ID is assigned on first insert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDailyPrice {
    pub ticker_symbol: String,
    pub stock_brand_id: String,
    pub date: DateTime<Utc>,
    #[serde(flatten)]
    pub ohlcv: Ohlcv,
}

impl NewDailyPrice {
    pub fn new(
        ticker_symbol: impl Into<String>,
        stock_brand_id: impl Into<String>,
        date: DateTime<Utc>,
        ohlcv: Ohlcv,
    ) -> Self {
        Self {
            ticker_symbol: ticker_symbol.into(),
            stock_brand_id: stock_brand_id.into(),
            date,
            ohlcv,
        }
    }

    pub(crate) fn to_row(&self, now: DateTime<Utc>) -> Result<NewDailyPriceRow, DatabaseError> {
        let stored = self.ohlcv.to_stored()?;
        Ok(NewDailyPriceRow {
            id: Uuid::new_v4().to_string(),
            ticker_symbol: self.ticker_symbol.clone(),
            stock_brand_id: self.stock_brand_id.clone(),
            date: self.date,
            open: stored.open,
            high: stored.high,
            low: stored.low,
            close: stored.close,
            adjusted_close: stored.adjusted_close,
            volume: stored.volume,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Stored daily price row
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::database::schema::daily_prices)]
pub(crate) struct DailyPriceRow {
    pub id: String,
    pub ticker_symbol: String,
    pub stock_brand_id: String,
    pub date: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adjusted_close: f64,
    pub volume: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::database::schema::daily_prices)]
pub(crate) struct NewDailyPriceRow {
    pub id: String,
    pub ticker_symbol: String,
    pub stock_brand_id: String,
    pub date: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adjusted_close: f64,
    pub volume: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DailyPriceRow> for DailyPrice {
    type Error = DatabaseError;

    fn try_from(row: DailyPriceRow) -> Result<Self, Self::Error> {
        let ohlcv = Ohlcv::try_from(StoredOhlcv {
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            adjusted_close: row.adjusted_close,
            volume: row.volume,
        })?;

        Ok(DailyPrice {
            id: row.id,
            ticker_symbol: row.ticker_symbol,
            stock_brand_id: row.stock_brand_id,
            date: row.date,
            ohlcv,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
