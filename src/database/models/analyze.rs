use crate::database::connection::DatabaseError;
use crate::database::models::daily_price::NewDailyPrice;
use crate::database::models::ohlcv::{Ohlcv, StoredOhlcv};
use crate::database::numeric::{from_stored, to_stored};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Symbol-only projection of [`crate::database::models::DailyPrice`] used by
/// analytics pipelines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPriceForAnalyze {
    pub id: String,
    pub ticker_symbol: String,
    pub date: DateTime<Utc>,
    #[serde(flatten)]
    pub ohlcv: Ohlcv,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDailyPriceForAnalyze {
    pub ticker_symbol: String,
    pub date: DateTime<Utc>,
    #[serde(flatten)]
    pub ohlcv: Ohlcv,
}

impl NewDailyPriceForAnalyze {
    pub fn new(ticker_symbol: impl Into<String>, date: DateTime<Utc>, ohlcv: Ohlcv) -> Self {
        Self {
            ticker_symbol: ticker_symbol.into(),
            date,
            ohlcv,
        }
    }

    pub(crate) fn to_row(
        &self,
        now: DateTime<Utc>,
    ) -> Result<NewDailyPriceForAnalyzeRow, DatabaseError> {
        let stored = self.ohlcv.to_stored()?;
        Ok(NewDailyPriceForAnalyzeRow {
            id: Uuid::new_v4().to_string(),
            ticker_symbol: self.ticker_symbol.clone(),
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

impl From<&NewDailyPrice> for NewDailyPriceForAnalyze {
    fn from(price: &NewDailyPrice) -> Self {
        Self {
            ticker_symbol: price.ticker_symbol.clone(),
            date: price.date,
            ohlcv: price.ohlcv.clone(),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::database::schema::daily_prices_for_analyze)]
pub(crate) struct DailyPriceForAnalyzeRow {
    pub id: String,
    pub ticker_symbol: String,
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
#[diesel(table_name = crate::database::schema::daily_prices_for_analyze)]
pub(crate) struct NewDailyPriceForAnalyzeRow {
    pub id: String,
    pub ticker_symbol: String,
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

impl TryFrom<DailyPriceForAnalyzeRow> for DailyPriceForAnalyze {
    type Error = DatabaseError;

    fn try_from(row: DailyPriceForAnalyzeRow) -> Result<Self, Self::Error> {
        let ohlcv = Ohlcv::try_from(StoredOhlcv {
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            adjusted_close: row.adjusted_close,
            volume: row.volume,
        })?;

        Ok(DailyPriceForAnalyze {
            id: row.id,
            ticker_symbol: row.ticker_symbol,
            date: row.date,
            ohlcv,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Current-price snapshot kept per stock brand for analysis
///
/// Upserts only ever overwrite `current_price`; the trade price and the
/// free-text fields belong to whoever created the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeStockBrandPriceHistory {
    pub id: String,
    pub stock_brand_id: String,
    /// Price of the last trade taken on this brand
    pub trade_price: Decimal,
    pub current_price: Decimal,
    pub action: String,
    pub method: String,
    pub memo: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAnalyzeStockBrandPriceHistory {
    pub stock_brand_id: String,
    pub trade_price: Decimal,
    pub current_price: Decimal,
    pub action: String,
    pub method: String,
    pub memo: String,
}

impl NewAnalyzeStockBrandPriceHistory {
    /// Snapshot with only a current price; the trade price starts equal to it
    pub fn new(stock_brand_id: impl Into<String>, current_price: Decimal) -> Self {
        Self {
            stock_brand_id: stock_brand_id.into(),
            trade_price: current_price,
            current_price,
            action: String::new(),
            method: String::new(),
            memo: String::new(),
        }
    }

    pub fn with_trade(
        mut self,
        trade_price: Decimal,
        action: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        self.trade_price = trade_price;
        self.action = action.into();
        self.method = method.into();
        self
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }

    pub(crate) fn to_row(
        &self,
        now: DateTime<Utc>,
    ) -> Result<NewAnalyzeStockBrandPriceHistoryRow, DatabaseError> {
        Ok(NewAnalyzeStockBrandPriceHistoryRow {
            id: Uuid::new_v4().to_string(),
            stock_brand_id: self.stock_brand_id.clone(),
            trade_price: to_stored(self.trade_price)?,
            current_price: to_stored(self.current_price)?,
            action: self.action.clone(),
            method: self.method.clone(),
            memo: self.memo.clone(),
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::database::schema::analyze_stock_brand_price_histories)]
pub(crate) struct AnalyzeStockBrandPriceHistoryRow {
    pub id: String,
    pub stock_brand_id: String,
    pub trade_price: f64,
    pub current_price: f64,
    pub action: String,
    pub method: String,
    pub memo: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::database::schema::analyze_stock_brand_price_histories)]
pub(crate) struct NewAnalyzeStockBrandPriceHistoryRow {
    pub id: String,
    pub stock_brand_id: String,
    pub trade_price: f64,
    pub current_price: f64,
    pub action: String,
    pub method: String,
    pub memo: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<AnalyzeStockBrandPriceHistoryRow> for AnalyzeStockBrandPriceHistory {
    type Error = DatabaseError;

    fn try_from(row: AnalyzeStockBrandPriceHistoryRow) -> Result<Self, Self::Error> {
        Ok(AnalyzeStockBrandPriceHistory {
            id: row.id,
            stock_brand_id: row.stock_brand_id,
            trade_price: from_stored(row.trade_price)?,
            current_price: from_stored(row.current_price)?,
            action: row.action,
            method: row.method,
            memo: row.memo,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_projection_from_daily_price() {
        let date = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let price = NewDailyPrice::new(
            "1001",
            "b1",
            date,
            Ohlcv::new(dec!(100), dec!(110), dec!(95), dec!(105), 500),
        );

        let projected = NewDailyPriceForAnalyze::from(&price);
        assert_eq!(projected.ticker_symbol, "1001");
        assert_eq!(projected.date, date);
        assert_eq!(projected.ohlcv, price.ohlcv);
    }

    #[test]
    fn test_snapshot_builder_and_rounding() {
        let snapshot = NewAnalyzeStockBrandPriceHistory::new("b1", dec!(1500.123449))
            .with_trade(dec!(1490), "buy", "breakout")
            .with_memo("watch earnings");

        let row = snapshot.to_row(Utc::now()).unwrap();
        assert_eq!(row.current_price, 1500.1234);
        assert_eq!(row.trade_price, 1490.0);
        assert_eq!(row.action, "buy");
        assert_eq!(row.method, "breakout");
        assert_eq!(row.memo, "watch earnings");
    }
}
