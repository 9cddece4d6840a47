use crate::database::connection::DatabaseError;
use crate::database::context::DbContext;
use crate::database::models::{NewStockBrand, StockBrand, StockBrandFilter};
use crate::database::repositories::{last_per_key, UPSERT_CHUNK_SIZE};
use crate::database::schema::stock_brands;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::upsert::excluded;
use std::collections::HashSet;

/// Stock brand repository trait - issuer listings
///
/// Reads only ever see active (not soft-deleted) rows.
pub trait StockBrandRepository: Send + Sync {
    /// All active stock brands; no rows is an empty result
    fn find_all(&self, ctx: &mut DbContext<'_>) -> Result<Vec<StockBrand>, DatabaseError>;

    /// Active stock brand with the given ticker symbol
    fn find_by_symbol(
        &self,
        ctx: &mut DbContext<'_>,
        ticker_symbol: &str,
    ) -> Result<Option<StockBrand>, DatabaseError>;

    /// Insert or update by ID
    ///
    /// Rows whose existing record is soft-deleted are skipped rather than
    /// resurrected. On conflict only the name, market and sector fields and
    /// `updated_at` change. Returns the number of rows written.
    fn upsert_stock_brands(
        &self,
        ctx: &mut DbContext<'_>,
        brands: &[NewStockBrand],
    ) -> Result<usize, DatabaseError>;

    /// Main-market brands with a ticker symbol strictly greater than
    /// `symbol_cursor`, ascending; `limit <= 0` means unbounded
    fn find_from_symbol(
        &self,
        ctx: &mut DbContext<'_>,
        symbol_cursor: &str,
        limit: i64,
    ) -> Result<Vec<StockBrand>, DatabaseError>;

    /// Brands matching `filter`, ascending by ticker symbol
    fn find_with_filter(
        &self,
        ctx: &mut DbContext<'_>,
        filter: &StockBrandFilter,
    ) -> Result<Vec<StockBrand>, DatabaseError>;

    /// IDs of active brands not refreshed since `threshold`
    fn find_delisting_stock_brands_from_update_time(
        &self,
        ctx: &mut DbContext<'_>,
        threshold: DateTime<Utc>,
    ) -> Result<Vec<String>, DatabaseError>;

    /// Physically delete the active brands among `ids`, returning them as
    /// they were before deletion so the caller can cascade
    fn delete_delisting_stock_brands(
        &self,
        ctx: &mut DbContext<'_>,
        ids: &[String],
    ) -> Result<Vec<StockBrand>, DatabaseError>;

    /// Soft-delete active brands whose last refresh is older than
    /// `refreshed_at`
    fn soft_delete_not_refreshed_since(
        &self,
        ctx: &mut DbContext<'_>,
        refreshed_at: DateTime<Utc>,
    ) -> Result<usize, DatabaseError>;
}

/// Concrete implementation of StockBrandRepository
#[derive(Debug, Clone, Copy, Default)]
pub struct StockBrandRepositoryImpl;

impl StockBrandRepositoryImpl {
    pub fn new() -> Self {
        Self
    }
}

impl StockBrandRepository for StockBrandRepositoryImpl {
    fn find_all(&self, ctx: &mut DbContext<'_>) -> Result<Vec<StockBrand>, DatabaseError> {
        ctx.run("find all stock brands", |conn| {
            stock_brands::table
                .filter(stock_brands::deleted_at.is_null())
                .order(stock_brands::ticker_symbol.asc())
                .select(StockBrand::as_select())
                .load(conn)
        })
    }

    fn find_by_symbol(
        &self,
        ctx: &mut DbContext<'_>,
        ticker_symbol: &str,
    ) -> Result<Option<StockBrand>, DatabaseError> {
        ctx.run("find stock brand by symbol", |conn| {
            stock_brands::table
                .filter(stock_brands::deleted_at.is_null())
                .filter(stock_brands::ticker_symbol.eq(ticker_symbol))
                .select(StockBrand::as_select())
                .first(conn)
                .optional()
        })
    }

    fn upsert_stock_brands(
        &self,
        ctx: &mut DbContext<'_>,
        brands: &[NewStockBrand],
    ) -> Result<usize, DatabaseError> {
        if brands.is_empty() {
            return Ok(0);
        }

        let ids: Vec<&str> = brands.iter().map(|b| b.id.as_str()).collect();
        let soft_deleted: HashSet<String> = ctx
            .run("load soft-deleted stock brand ids", |conn| {
                stock_brands::table
                    .filter(stock_brands::id.eq_any(ids))
                    .filter(stock_brands::deleted_at.is_not_null())
                    .select(stock_brands::id)
                    .load::<String>(conn)
            })?
            .into_iter()
            .collect();

        // Soft-deleted rows keep their state even when their ID shows up again
        let upserts: Vec<NewStockBrand> = last_per_key(brands, |b| b.id.clone())
            .into_iter()
            .filter(|b| !soft_deleted.contains(&b.id))
            .cloned()
            .collect();

        let skipped = brands.iter().filter(|b| soft_deleted.contains(&b.id)).count();
        if skipped > 0 {
            tracing::debug!("Skipping {} soft-deleted stock brand(s) on upsert", skipped);
        }

        let mut count = 0;
        for chunk in upserts.chunks(UPSERT_CHUNK_SIZE) {
            count += ctx.run("upsert stock brands", |conn| {
                diesel::insert_into(stock_brands::table)
                    .values(chunk)
                    .on_conflict(stock_brands::id)
                    .do_update()
                    .set((
                        stock_brands::name.eq(excluded(stock_brands::name)),
                        stock_brands::market_code.eq(excluded(stock_brands::market_code)),
                        stock_brands::market_name.eq(excluded(stock_brands::market_name)),
                        stock_brands::sector33_code.eq(excluded(stock_brands::sector33_code)),
                        stock_brands::sector33_name.eq(excluded(stock_brands::sector33_name)),
                        stock_brands::sector17_code.eq(excluded(stock_brands::sector17_code)),
                        stock_brands::sector17_name.eq(excluded(stock_brands::sector17_name)),
                        stock_brands::updated_at.eq(excluded(stock_brands::updated_at)),
                    ))
                    .execute(conn)
            })?;
        }

        tracing::debug!("Upserted {} stock brands (received {})", count, brands.len());

        Ok(count)
    }

    fn find_from_symbol(
        &self,
        ctx: &mut DbContext<'_>,
        symbol_cursor: &str,
        limit: i64,
    ) -> Result<Vec<StockBrand>, DatabaseError> {
        let filter = StockBrandFilter::main_markets()
            .after(symbol_cursor)
            .with_limit(limit);

        self.find_with_filter(ctx, &filter)
    }

    fn find_with_filter(
        &self,
        ctx: &mut DbContext<'_>,
        filter: &StockBrandFilter,
    ) -> Result<Vec<StockBrand>, DatabaseError> {
        let market_codes = filter.effective_market_codes();
        let limit = filter.effective_limit();

        ctx.run("find stock brands with filter", |conn| {
            let mut query = stock_brands::table
                .select(StockBrand::as_select())
                .filter(stock_brands::deleted_at.is_null())
                .filter(stock_brands::ticker_symbol.gt(&filter.symbol_cursor))
                .order(stock_brands::ticker_symbol.asc())
                .into_boxed();

            if let Some(codes) = market_codes {
                query = query.filter(stock_brands::market_code.eq_any(codes));
            }

            if let Some(limit_val) = limit {
                query = query.limit(limit_val);
            }

            query.load(conn)
        })
    }

    fn find_delisting_stock_brands_from_update_time(
        &self,
        ctx: &mut DbContext<'_>,
        threshold: DateTime<Utc>,
    ) -> Result<Vec<String>, DatabaseError> {
        ctx.run("find delisting stock brands", |conn| {
            stock_brands::table
                .filter(stock_brands::deleted_at.is_null())
                .filter(stock_brands::updated_at.lt(threshold))
                .order(stock_brands::id.asc())
                .select(stock_brands::id)
                .load::<String>(conn)
        })
    }

    fn delete_delisting_stock_brands(
        &self,
        ctx: &mut DbContext<'_>,
        ids: &[String],
    ) -> Result<Vec<StockBrand>, DatabaseError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let doomed = ctx.run("load delisting stock brands", |conn| {
            stock_brands::table
                .filter(stock_brands::id.eq_any(ids))
                .filter(stock_brands::deleted_at.is_null())
                .order(stock_brands::ticker_symbol.asc())
                .select(StockBrand::as_select())
                .load::<StockBrand>(conn)
        })?;

        if doomed.is_empty() {
            return Ok(doomed);
        }

        let doomed_ids: Vec<&str> = doomed.iter().map(|b| b.id.as_str()).collect();
        let deleted = ctx.run("delete delisting stock brands", |conn| {
            diesel::delete(stock_brands::table.filter(stock_brands::id.eq_any(doomed_ids)))
                .execute(conn)
        })?;

        tracing::info!("Deleted {} delisting stock brand(s)", deleted);

        Ok(doomed)
    }

    fn soft_delete_not_refreshed_since(
        &self,
        ctx: &mut DbContext<'_>,
        refreshed_at: DateTime<Utc>,
    ) -> Result<usize, DatabaseError> {
        let now = Utc::now();

        let count = ctx.run("soft-delete stale stock brands", |conn| {
            diesel::update(
                stock_brands::table
                    .filter(stock_brands::deleted_at.is_null())
                    .filter(stock_brands::updated_at.lt(refreshed_at)),
            )
            .set(stock_brands::deleted_at.eq(Some(now)))
            .execute(conn)
        })?;

        if count > 0 {
            tracing::info!("Soft-deleted {} stock brand(s) not refreshed since {}", count, refreshed_at);
        }

        Ok(count)
    }
}
