use crate::database::connection::DatabaseError;
use crate::database::context::DbContext;
use crate::database::models::HighVolumeStockBrand;
use crate::database::schema::{stock_brands, volume_average_per_tickers};
use diesel::prelude::*;

/// High volume stock brand repository trait - read-only join of volume
/// averages onto issuer listings
pub trait HighVolumeStockBrandRepository: Send + Sync {
    /// Brands with a volume average and a ticker symbol strictly greater than
    /// `symbol_cursor`, ascending by symbol
    ///
    /// `limit` must be positive; `InvalidInput` otherwise.
    fn find_with_pagination(
        &self,
        ctx: &mut DbContext<'_>,
        symbol_cursor: &str,
        limit: i64,
    ) -> Result<Vec<HighVolumeStockBrand>, DatabaseError>;
}

/// Concrete implementation of HighVolumeStockBrandRepository
#[derive(Debug, Clone, Copy, Default)]
pub struct HighVolumeStockBrandRepositoryImpl;

impl HighVolumeStockBrandRepositoryImpl {
    pub fn new() -> Self {
        Self
    }
}

impl HighVolumeStockBrandRepository for HighVolumeStockBrandRepositoryImpl {
    fn find_with_pagination(
        &self,
        ctx: &mut DbContext<'_>,
        symbol_cursor: &str,
        limit: i64,
    ) -> Result<Vec<HighVolumeStockBrand>, DatabaseError> {
        if limit <= 0 {
            return Err(DatabaseError::InvalidInput(format!(
                "high volume page limit must be positive, got {}",
                limit
            )));
        }

        ctx.run("find high volume stock brands", |conn| {
            volume_average_per_tickers::table
                .inner_join(
                    stock_brands::table
                        .on(stock_brands::ticker_symbol.eq(volume_average_per_tickers::ticker_symbol)),
                )
                .filter(stock_brands::deleted_at.is_null())
                .filter(volume_average_per_tickers::ticker_symbol.gt(symbol_cursor))
                .order(volume_average_per_tickers::ticker_symbol.asc())
                .limit(limit)
                .select((
                    volume_average_per_tickers::ticker_symbol,
                    stock_brands::name,
                    volume_average_per_tickers::volume_average,
                ))
                .load::<HighVolumeStockBrand>(conn)
        })
    }
}
