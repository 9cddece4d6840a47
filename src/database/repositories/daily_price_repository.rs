use crate::database::connection::DatabaseError;
use crate::database::context::DbContext;
use crate::database::models::daily_price::{DailyPriceRow, NewDailyPriceRow};
use crate::database::models::{DailyPrice, DailyPriceFilter, NewDailyPrice};
use crate::database::repositories::{last_per_key, UPSERT_CHUNK_SIZE};
use crate::database::schema::daily_prices;
use chrono::Utc;
use diesel::prelude::*;
use diesel::upsert::excluded;

/// Daily price repository trait - per-symbol daily OHLCV keyed by
/// (ticker symbol, date)
pub trait DailyPriceRepository: Send + Sync {
    /// Insert or update by (ticker symbol, date)
    ///
    /// On conflict the OHLCV columns and `updated_at` are overwritten; the
    /// row ID, stock brand ID and `created_at` are kept.
    fn create_or_update(
        &self,
        ctx: &mut DbContext<'_>,
        prices: &[NewDailyPrice],
    ) -> Result<usize, DatabaseError>;

    /// Row with the latest date for the symbol; `NotFound` when there is none
    fn get_latest_price_by_symbol(
        &self,
        ctx: &mut DbContext<'_>,
        ticker_symbol: &str,
    ) -> Result<DailyPrice, DatabaseError>;

    /// Rows for one symbol within an inclusive day range, oldest first
    fn list_by_symbol(
        &self,
        ctx: &mut DbContext<'_>,
        filter: &DailyPriceFilter,
    ) -> Result<Vec<DailyPrice>, DatabaseError>;

    fn delete_by_stock_brand_ids(
        &self,
        ctx: &mut DbContext<'_>,
        stock_brand_ids: &[String],
    ) -> Result<usize, DatabaseError>;

    fn delete_by_symbols(
        &self,
        ctx: &mut DbContext<'_>,
        ticker_symbols: &[String],
    ) -> Result<usize, DatabaseError>;
}

/// Concrete implementation of DailyPriceRepository
#[derive(Debug, Clone, Copy, Default)]
pub struct DailyPriceRepositoryImpl;

impl DailyPriceRepositoryImpl {
    pub fn new() -> Self {
        Self
    }
}

impl DailyPriceRepository for DailyPriceRepositoryImpl {
    fn create_or_update(
        &self,
        ctx: &mut DbContext<'_>,
        prices: &[NewDailyPrice],
    ) -> Result<usize, DatabaseError> {
        if prices.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let rows = last_per_key(prices, |p| (p.ticker_symbol.clone(), p.date))
            .into_iter()
            .map(|p| p.to_row(now))
            .collect::<Result<Vec<NewDailyPriceRow>, _>>()?;

        let mut count = 0;
        for chunk in rows.chunks(UPSERT_CHUNK_SIZE) {
            count += ctx.run("upsert daily prices", |conn| {
                diesel::insert_into(daily_prices::table)
                    .values(chunk)
                    .on_conflict((daily_prices::ticker_symbol, daily_prices::date))
                    .do_update()
                    .set((
                        daily_prices::open.eq(excluded(daily_prices::open)),
                        daily_prices::high.eq(excluded(daily_prices::high)),
                        daily_prices::low.eq(excluded(daily_prices::low)),
                        daily_prices::close.eq(excluded(daily_prices::close)),
                        daily_prices::adjusted_close.eq(excluded(daily_prices::adjusted_close)),
                        daily_prices::volume.eq(excluded(daily_prices::volume)),
                        daily_prices::updated_at.eq(excluded(daily_prices::updated_at)),
                    ))
                    .execute(conn)
            })?;
        }

        tracing::debug!(
            "Upserted {} daily prices (received {})",
            count,
            prices.len()
        );

        Ok(count)
    }

    fn get_latest_price_by_symbol(
        &self,
        ctx: &mut DbContext<'_>,
        ticker_symbol: &str,
    ) -> Result<DailyPrice, DatabaseError> {
        let row = ctx.run("get latest daily price", |conn| {
            daily_prices::table
                .filter(daily_prices::ticker_symbol.eq(ticker_symbol))
                .order(daily_prices::date.desc())
                .select(DailyPriceRow::as_select())
                .first(conn)
                .optional()
        })?;

        row.ok_or_else(|| DatabaseError::NotFound(format!("daily price for {}", ticker_symbol)))?
            .try_into()
    }

    fn list_by_symbol(
        &self,
        ctx: &mut DbContext<'_>,
        filter: &DailyPriceFilter,
    ) -> Result<Vec<DailyPrice>, DatabaseError> {
        filter.validate()?;

        let lower = filter.range.lower_bound();
        let upper = filter.range.upper_bound();

        let rows = ctx.run("list daily prices by symbol", |conn| {
            let mut query = daily_prices::table
                .select(DailyPriceRow::as_select())
                .filter(daily_prices::ticker_symbol.eq(&filter.ticker_symbol))
                .order(daily_prices::date.asc())
                .into_boxed();

            if let Some(lower) = lower {
                query = query.filter(daily_prices::date.ge(lower));
            }

            if let Some(upper) = upper {
                query = query.filter(daily_prices::date.lt(upper));
            }

            query.load(conn)
        })?;

        rows.into_iter().map(DailyPrice::try_from).collect()
    }

    fn delete_by_stock_brand_ids(
        &self,
        ctx: &mut DbContext<'_>,
        stock_brand_ids: &[String],
    ) -> Result<usize, DatabaseError> {
        if stock_brand_ids.is_empty() {
            return Ok(0);
        }

        let deleted = ctx.run("delete daily prices by stock brand", |conn| {
            diesel::delete(
                daily_prices::table.filter(daily_prices::stock_brand_id.eq_any(stock_brand_ids)),
            )
            .execute(conn)
        })?;

        tracing::debug!("Deleted {} daily prices for {} stock brand(s)", deleted, stock_brand_ids.len());

        Ok(deleted)
    }

    fn delete_by_symbols(
        &self,
        ctx: &mut DbContext<'_>,
        ticker_symbols: &[String],
    ) -> Result<usize, DatabaseError> {
        if ticker_symbols.is_empty() {
            return Ok(0);
        }

        let deleted = ctx.run("delete daily prices by symbol", |conn| {
            diesel::delete(
                daily_prices::table.filter(daily_prices::ticker_symbol.eq_any(ticker_symbols)),
            )
            .execute(conn)
        })?;

        tracing::debug!("Deleted {} daily prices for {} symbol(s)", deleted, ticker_symbols.len());

        Ok(deleted)
    }
}
