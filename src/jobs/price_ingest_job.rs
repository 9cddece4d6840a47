use crate::database::models::{NewAnalyzeStockBrandPriceHistory, NewDailyPrice, NewDailyPriceForAnalyze};
use crate::database::repositories::{
    AnalyzeHistoryRepository, AnalyzeHistoryRepositoryImpl, DailyPriceForAnalyzeRepository,
    DailyPriceForAnalyzeRepositoryImpl, DailyPriceRepository, DailyPriceRepositoryImpl,
};
use crate::database::{Database, DatabaseError};
use crate::jobs::JobError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Rows written by one ingest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub daily_prices: usize,
    pub analyze_daily_prices: usize,
    pub current_prices: usize,
}

/// Daily price ingest job
///
/// Stores already-fetched daily prices in both daily series and refreshes
/// each stock brand's analyze snapshot with its latest close.
#[derive(Clone)]
pub struct DailyPriceIngestJob {
    database: Database,
    daily_price_repository: Arc<dyn DailyPriceRepository>,
    analyze_daily_price_repository: Arc<dyn DailyPriceForAnalyzeRepository>,
    analyze_history_repository: Arc<dyn AnalyzeHistoryRepository>,
}

impl DailyPriceIngestJob {
    pub fn new(
        database: Database,
        daily_price_repository: Arc<dyn DailyPriceRepository>,
        analyze_daily_price_repository: Arc<dyn DailyPriceForAnalyzeRepository>,
        analyze_history_repository: Arc<dyn AnalyzeHistoryRepository>,
    ) -> Self {
        Self {
            database,
            daily_price_repository,
            analyze_daily_price_repository,
            analyze_history_repository,
        }
    }

    pub fn with_default_repositories(database: Database) -> Self {
        Self::new(
            database,
            Arc::new(DailyPriceRepositoryImpl::new()),
            Arc::new(DailyPriceForAnalyzeRepositoryImpl::new()),
            Arc::new(AnalyzeHistoryRepositoryImpl::new()),
        )
    }

    /// Write `prices` as one unit of work; nothing is stored if any write fails
    pub fn ingest(&self, prices: &[NewDailyPrice]) -> Result<IngestReport, JobError> {
        if prices.is_empty() {
            tracing::info!("No daily prices to ingest");
            return Ok(IngestReport::default());
        }

        tracing::info!("Starting daily price ingest: {} price(s)", prices.len());

        let analyze_prices: Vec<NewDailyPriceForAnalyze> =
            prices.iter().map(NewDailyPriceForAnalyze::from).collect();
        let snapshots = latest_closes(prices);

        let report = self.database.do_in_tx(|tx| {
            Ok::<_, DatabaseError>(IngestReport {
                daily_prices: self.daily_price_repository.create_or_update(tx, prices)?,
                analyze_daily_prices: self
                    .analyze_daily_price_repository
                    .create_or_update(tx, &analyze_prices)?,
                current_prices: self
                    .analyze_history_repository
                    .upsert_current_prices(tx, &snapshots)?,
            })
        })?;

        tracing::info!(
            "Daily price ingest completed: {} daily, {} analyze, {} current price(s)",
            report.daily_prices,
            report.analyze_daily_prices,
            report.current_prices
        );

        Ok(report)
    }

    /// Ingest on the blocking pool
    pub async fn ingest_async(&self, prices: Vec<NewDailyPrice>) -> Result<IngestReport, JobError> {
        let job = self.clone();
        tokio::task::spawn_blocking(move || job.ingest(&prices)).await?
    }
}

/// One snapshot per stock brand carrying the close of its latest day
fn latest_closes(prices: &[NewDailyPrice]) -> Vec<NewAnalyzeStockBrandPriceHistory> {
    let mut latest: BTreeMap<&str, (DateTime<Utc>, Decimal)> = BTreeMap::new();

    for price in prices {
        let entry = latest
            .entry(price.stock_brand_id.as_str())
            .or_insert((price.date, price.ohlcv.close));
        if price.date >= entry.0 {
            *entry = (price.date, price.ohlcv.close);
        }
    }

    latest
        .into_iter()
        .map(|(stock_brand_id, (_, close))| NewAnalyzeStockBrandPriceHistory::new(stock_brand_id, close))
        .collect()
}
