#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use diesel::prelude::*;
use market_data_store::database::models::{NewDailyPrice, NewStockBrand, Ohlcv};
use market_data_store::database::{establish_connection_pool, Database, DbContext};
use rust_decimal::Decimal;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

static SERIAL: Mutex<()> = Mutex::new(());

/// Test database handle
///
/// Holds a process-wide lock so tests sharing the tables never interleave.
pub struct TestDatabase {
    pub database: Database,
    _serial: MutexGuard<'static, ()>,
}

impl TestDatabase {
    /// Connect to `TEST_DATABASE_URL`, migrate and empty every table
    ///
    /// Returns `None` when no test database is configured so the calling
    /// test can skip.
    pub fn connect() -> Option<Self> {
        let database_url = std::env::var("TEST_DATABASE_URL").ok()?;
        let serial = SERIAL.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let database = establish_connection_pool(&database_url, 4, Duration::from_secs(10))
            .expect("Failed to create test database pool");
        database.run_migrations().expect("Failed to run migrations");

        let db = Self {
            database,
            _serial: serial,
        };
        db.cleanup();
        Some(db)
    }

    pub fn context(&self) -> DbContext<'_> {
        self.database.context()
    }

    /// Clean up all test data
    pub fn cleanup(&self) {
        let mut conn = self.database.get_conn().expect("Failed to get connection");
        diesel::sql_query(
            "TRUNCATE TABLE stock_brands, daily_prices, daily_prices_for_analyze, \
             analyze_stock_brand_price_histories, nikkei_daily_prices, topix_daily_prices, \
             volume_average_per_tickers",
        )
        .execute(&mut conn)
        .expect("Failed to cleanup test data");
    }

    /// Seed a precomputed volume average; nothing in the crate writes these
    pub fn insert_volume_average(&self, ticker_symbol: &str, volume_average: f64) {
        use market_data_store::database::schema::volume_average_per_tickers as va;

        let mut conn = self.database.get_conn().expect("Failed to get connection");
        diesel::insert_into(va::table)
            .values((
                va::ticker_symbol.eq(ticker_symbol),
                va::volume_average.eq(volume_average),
            ))
            .execute(&mut conn)
            .expect("Failed to insert volume average");
    }
}

pub fn day(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

pub fn brand(id: &str, ticker_symbol: &str, market_code: &str) -> NewStockBrand {
    NewStockBrand::new(
        id,
        ticker_symbol,
        format!("Brand {}", ticker_symbol),
        market_code,
        "Market",
    )
}

pub fn flat(price: Decimal, volume: u64) -> Ohlcv {
    Ohlcv::new(price, price, price, price, volume)
}

pub fn daily(ticker_symbol: &str, stock_brand_id: &str, date: DateTime<Utc>, open: Decimal) -> NewDailyPrice {
    NewDailyPrice::new(
        ticker_symbol,
        stock_brand_id,
        date,
        Ohlcv::new(open, open, open, open, 1_000),
    )
}
