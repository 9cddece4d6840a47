use crate::database::connection::DatabaseError;
use crate::database::context::DbContext;
use crate::database::models::analyze::{DailyPriceForAnalyzeRow, NewDailyPriceForAnalyzeRow};
use crate::database::models::{DailyPriceFilter, DailyPriceForAnalyze, NewDailyPriceForAnalyze};
use crate::database::repositories::{last_per_key, UPSERT_CHUNK_SIZE};
use crate::database::schema::daily_prices_for_analyze;
use chrono::Utc;
use diesel::prelude::*;
use diesel::upsert::excluded;

/// Analyze daily price repository trait - the symbol-only daily series
pub trait DailyPriceForAnalyzeRepository: Send + Sync {
    /// Insert or update by (ticker symbol, date); same overwrite scope as
    /// the daily price table
    fn create_or_update(
        &self,
        ctx: &mut DbContext<'_>,
        prices: &[NewDailyPriceForAnalyze],
    ) -> Result<usize, DatabaseError>;

    fn get_latest_price_by_symbol(
        &self,
        ctx: &mut DbContext<'_>,
        ticker_symbol: &str,
    ) -> Result<DailyPriceForAnalyze, DatabaseError>;

    fn list_by_symbol(
        &self,
        ctx: &mut DbContext<'_>,
        filter: &DailyPriceFilter,
    ) -> Result<Vec<DailyPriceForAnalyze>, DatabaseError>;

    fn delete_by_symbols(
        &self,
        ctx: &mut DbContext<'_>,
        ticker_symbols: &[String],
    ) -> Result<usize, DatabaseError>;
}

/// Concrete implementation of DailyPriceForAnalyzeRepository
#[derive(Debug, Clone, Copy, Default)]
pub struct DailyPriceForAnalyzeRepositoryImpl;

impl DailyPriceForAnalyzeRepositoryImpl {
    pub fn new() -> Self {
        Self
    }
}

impl DailyPriceForAnalyzeRepository for DailyPriceForAnalyzeRepositoryImpl {
    fn create_or_update(
        &self,
        ctx: &mut DbContext<'_>,
        prices: &[NewDailyPriceForAnalyze],
    ) -> Result<usize, DatabaseError> {
        if prices.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let rows = last_per_key(prices, |p| (p.ticker_symbol.clone(), p.date))
            .into_iter()
            .map(|p| p.to_row(now))
            .collect::<Result<Vec<NewDailyPriceForAnalyzeRow>, _>>()?;

        let mut count = 0;
        for chunk in rows.chunks(UPSERT_CHUNK_SIZE) {
            count += ctx.run("upsert analyze daily prices", |conn| {
                diesel::insert_into(daily_prices_for_analyze::table)
                    .values(chunk)
                    .on_conflict((
                        daily_prices_for_analyze::ticker_symbol,
                        daily_prices_for_analyze::date,
                    ))
                    .do_update()
                    .set((
                        daily_prices_for_analyze::open.eq(excluded(daily_prices_for_analyze::open)),
                        daily_prices_for_analyze::high.eq(excluded(daily_prices_for_analyze::high)),
                        daily_prices_for_analyze::low.eq(excluded(daily_prices_for_analyze::low)),
                        daily_prices_for_analyze::close
                            .eq(excluded(daily_prices_for_analyze::close)),
                        daily_prices_for_analyze::adjusted_close
                            .eq(excluded(daily_prices_for_analyze::adjusted_close)),
                        daily_prices_for_analyze::volume
                            .eq(excluded(daily_prices_for_analyze::volume)),
                        daily_prices_for_analyze::updated_at
                            .eq(excluded(daily_prices_for_analyze::updated_at)),
                    ))
                    .execute(conn)
            })?;
        }

        tracing::debug!(
            "Upserted {} analyze daily prices (received {})",
            count,
            prices.len()
        );

        Ok(count)
    }

    fn get_latest_price_by_symbol(
        &self,
        ctx: &mut DbContext<'_>,
        ticker_symbol: &str,
    ) -> Result<DailyPriceForAnalyze, DatabaseError> {
        let row = ctx.run("get latest analyze daily price", |conn| {
            daily_prices_for_analyze::table
                .filter(daily_prices_for_analyze::ticker_symbol.eq(ticker_symbol))
                .order(daily_prices_for_analyze::date.desc())
                .select(DailyPriceForAnalyzeRow::as_select())
                .first(conn)
                .optional()
        })?;

        row.ok_or_else(|| {
            DatabaseError::NotFound(format!("analyze daily price for {}", ticker_symbol))
        })?
        .try_into()
    }

    fn list_by_symbol(
        &self,
        ctx: &mut DbContext<'_>,
        filter: &DailyPriceFilter,
    ) -> Result<Vec<DailyPriceForAnalyze>, DatabaseError> {
        filter.validate()?;

        let lower = filter.range.lower_bound();
        let upper = filter.range.upper_bound();

        let rows = ctx.run("list analyze daily prices by symbol", |conn| {
            let mut query = daily_prices_for_analyze::table
                .select(DailyPriceForAnalyzeRow::as_select())
                .filter(daily_prices_for_analyze::ticker_symbol.eq(&filter.ticker_symbol))
                .order(daily_prices_for_analyze::date.asc())
                .into_boxed();

            if let Some(lower) = lower {
                query = query.filter(daily_prices_for_analyze::date.ge(lower));
            }

            if let Some(upper) = upper {
                query = query.filter(daily_prices_for_analyze::date.lt(upper));
            }

            query.load(conn)
        })?;

        rows.into_iter().map(DailyPriceForAnalyze::try_from).collect()
    }

    fn delete_by_symbols(
        &self,
        ctx: &mut DbContext<'_>,
        ticker_symbols: &[String],
    ) -> Result<usize, DatabaseError> {
        if ticker_symbols.is_empty() {
            return Ok(0);
        }

        let deleted = ctx.run("delete analyze daily prices by symbol", |conn| {
            diesel::delete(
                daily_prices_for_analyze::table
                    .filter(daily_prices_for_analyze::ticker_symbol.eq_any(ticker_symbols)),
            )
            .execute(conn)
        })?;

        tracing::debug!(
            "Deleted {} analyze daily prices for {} symbol(s)",
            deleted,
            ticker_symbols.len()
        );

        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::context::tests::unconnected_pool;

    #[test]
    fn test_list_by_symbol_requires_symbol() {
        let pool = unconnected_pool();
        let mut ctx = DbContext::Pool(&pool);
        let repo = DailyPriceForAnalyzeRepositoryImpl::new();

        let result = repo.list_by_symbol(&mut ctx, &DailyPriceFilter::new(""));
        assert!(result.unwrap_err().is_invalid_input());
    }
}
