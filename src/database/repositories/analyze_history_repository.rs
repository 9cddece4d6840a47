use crate::database::connection::DatabaseError;
use crate::database::context::DbContext;
use crate::database::models::analyze::{
    AnalyzeStockBrandPriceHistoryRow, NewAnalyzeStockBrandPriceHistoryRow,
};
use crate::database::models::{AnalyzeStockBrandPriceHistory, NewAnalyzeStockBrandPriceHistory};
use crate::database::repositories::{last_per_key, UPSERT_CHUNK_SIZE};
use crate::database::schema::analyze_stock_brand_price_histories as histories;
use chrono::Utc;
use diesel::prelude::*;
use diesel::upsert::excluded;

/// Analyze history repository trait - one current-price snapshot per stock
/// brand
pub trait AnalyzeHistoryRepository: Send + Sync {
    /// Insert or update by stock brand ID
    ///
    /// An existing snapshot only gets its `current_price` (and
    /// `updated_at`) replaced; trade price, action, method and memo stay.
    fn upsert_current_prices(
        &self,
        ctx: &mut DbContext<'_>,
        snapshots: &[NewAnalyzeStockBrandPriceHistory],
    ) -> Result<usize, DatabaseError>;

    fn find_by_stock_brand_id(
        &self,
        ctx: &mut DbContext<'_>,
        stock_brand_id: &str,
    ) -> Result<Option<AnalyzeStockBrandPriceHistory>, DatabaseError>;

    fn delete_by_stock_brand_ids(
        &self,
        ctx: &mut DbContext<'_>,
        stock_brand_ids: &[String],
    ) -> Result<usize, DatabaseError>;
}

/// Concrete implementation of AnalyzeHistoryRepository
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyzeHistoryRepositoryImpl;

impl AnalyzeHistoryRepositoryImpl {
    pub fn new() -> Self {
        Self
    }
}

impl AnalyzeHistoryRepository for AnalyzeHistoryRepositoryImpl {
    fn upsert_current_prices(
        &self,
        ctx: &mut DbContext<'_>,
        snapshots: &[NewAnalyzeStockBrandPriceHistory],
    ) -> Result<usize, DatabaseError> {
        if snapshots.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let rows = last_per_key(snapshots, |s| s.stock_brand_id.clone())
            .into_iter()
            .map(|s| s.to_row(now))
            .collect::<Result<Vec<NewAnalyzeStockBrandPriceHistoryRow>, _>>()?;

        let mut count = 0;
        for chunk in rows.chunks(UPSERT_CHUNK_SIZE) {
            count += ctx.run("upsert analyze current prices", |conn| {
                diesel::insert_into(histories::table)
                    .values(chunk)
                    .on_conflict(histories::stock_brand_id)
                    .do_update()
                    .set((
                        histories::current_price.eq(excluded(histories::current_price)),
                        histories::updated_at.eq(excluded(histories::updated_at)),
                    ))
                    .execute(conn)
            })?;
        }

        tracing::debug!("Upserted {} analyze current price(s)", count);

        Ok(count)
    }

    fn find_by_stock_brand_id(
        &self,
        ctx: &mut DbContext<'_>,
        stock_brand_id: &str,
    ) -> Result<Option<AnalyzeStockBrandPriceHistory>, DatabaseError> {
        let row = ctx.run("find analyze history by stock brand", |conn| {
            histories::table
                .filter(histories::stock_brand_id.eq(stock_brand_id))
                .select(AnalyzeStockBrandPriceHistoryRow::as_select())
                .first(conn)
                .optional()
        })?;

        row.map(AnalyzeStockBrandPriceHistory::try_from).transpose()
    }

    fn delete_by_stock_brand_ids(
        &self,
        ctx: &mut DbContext<'_>,
        stock_brand_ids: &[String],
    ) -> Result<usize, DatabaseError> {
        if stock_brand_ids.is_empty() {
            return Ok(0);
        }

        ctx.run("delete analyze histories by stock brand", |conn| {
            diesel::delete(histories::table.filter(histories::stock_brand_id.eq_any(stock_brand_ids)))
                .execute(conn)
        })
    }
}
