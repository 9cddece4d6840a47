use crate::database::repositories::{
    AnalyzeHistoryRepository, AnalyzeHistoryRepositoryImpl, DailyPriceForAnalyzeRepository,
    DailyPriceForAnalyzeRepositoryImpl, DailyPriceRepository, DailyPriceRepositoryImpl,
    StockBrandRepository, StockBrandRepositoryImpl,
};
use crate::database::{Database, DatabaseError};
use crate::jobs::JobError;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};

/// Outcome of one delisting cleanup run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DelistingReport {
    /// Brands last refreshed before this instant were removed
    pub threshold: DateTime<Utc>,
    pub stock_brand_ids: Vec<String>,
    pub ticker_symbols: Vec<String>,
    pub daily_prices_deleted: usize,
    pub analyze_daily_prices_deleted: usize,
    pub analyze_histories_deleted: usize,
}

impl DelistingReport {
    fn empty(threshold: DateTime<Utc>) -> Self {
        Self {
            threshold,
            stock_brand_ids: Vec::new(),
            ticker_symbols: Vec::new(),
            daily_prices_deleted: 0,
            analyze_daily_prices_deleted: 0,
            analyze_histories_deleted: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stock_brand_ids.is_empty()
    }
}

/// Delisting cleanup job
///
/// Removes stock brands that have not been refreshed within the retention
/// window together with everything stored for them, all in one transaction.
#[derive(Clone)]
pub struct DelistingCleanupJob {
    database: Database,
    stock_brand_repository: Arc<dyn StockBrandRepository>,
    daily_price_repository: Arc<dyn DailyPriceRepository>,
    analyze_daily_price_repository: Arc<dyn DailyPriceForAnalyzeRepository>,
    analyze_history_repository: Arc<dyn AnalyzeHistoryRepository>,
    retention_days: i64,
}

impl DelistingCleanupJob {
    /// Create a new delisting cleanup job
    pub fn new(
        database: Database,
        stock_brand_repository: Arc<dyn StockBrandRepository>,
        daily_price_repository: Arc<dyn DailyPriceRepository>,
        analyze_daily_price_repository: Arc<dyn DailyPriceForAnalyzeRepository>,
        analyze_history_repository: Arc<dyn AnalyzeHistoryRepository>,
        retention_days: i64,
    ) -> Self {
        Self {
            database,
            stock_brand_repository,
            daily_price_repository,
            analyze_daily_price_repository,
            analyze_history_repository,
            retention_days,
        }
    }

    /// Job wired to the default repository implementations
    pub fn with_default_repositories(database: Database, retention_days: i64) -> Self {
        Self::new(
            database,
            Arc::new(StockBrandRepositoryImpl::new()),
            Arc::new(DailyPriceRepositoryImpl::new()),
            Arc::new(DailyPriceForAnalyzeRepositoryImpl::new()),
            Arc::new(AnalyzeHistoryRepositoryImpl::new()),
            retention_days,
        )
    }

    pub fn threshold(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.retention_days)
    }

    /// Perform the cleanup as of `now`
    ///
    /// Blocking; any failure rolls back every deletion of the run.
    pub fn run(&self, now: DateTime<Utc>) -> Result<DelistingReport, JobError> {
        let threshold = self.threshold(now);

        tracing::info!("Starting delisting cleanup (threshold {})", threshold);

        let report = self.database.do_in_tx(|tx| {
            let ids = self
                .stock_brand_repository
                .find_delisting_stock_brands_from_update_time(tx, threshold)?;

            if ids.is_empty() {
                return Ok::<_, DatabaseError>(DelistingReport::empty(threshold));
            }

            let deleted = self
                .stock_brand_repository
                .delete_delisting_stock_brands(tx, &ids)?;

            let stock_brand_ids: Vec<String> = deleted.iter().map(|b| b.id.clone()).collect();
            let ticker_symbols: Vec<String> =
                deleted.iter().map(|b| b.ticker_symbol.clone()).collect();

            let daily_prices_deleted = self
                .daily_price_repository
                .delete_by_stock_brand_ids(tx, &stock_brand_ids)?;
            let analyze_daily_prices_deleted = self
                .analyze_daily_price_repository
                .delete_by_symbols(tx, &ticker_symbols)?;
            let analyze_histories_deleted = self
                .analyze_history_repository
                .delete_by_stock_brand_ids(tx, &stock_brand_ids)?;

            Ok(DelistingReport {
                threshold,
                stock_brand_ids,
                ticker_symbols,
                daily_prices_deleted,
                analyze_daily_prices_deleted,
                analyze_histories_deleted,
            })
        })?;

        tracing::info!(
            "Delisting cleanup completed: {} stock brand(s), {} daily price(s), {} analyze daily price(s), {} analyze histories",
            report.stock_brand_ids.len(),
            report.daily_prices_deleted,
            report.analyze_daily_prices_deleted,
            report.analyze_histories_deleted
        );

        Ok(report)
    }

    /// Run the cleanup immediately on the blocking pool (manual trigger)
    pub async fn run_now(&self) -> Result<DelistingReport, JobError> {
        let job = self.clone();
        tokio::task::spawn_blocking(move || job.run(Utc::now())).await?
    }

    /// Register this job with the scheduler
    ///
    /// `schedule` is a six-field cron expression, e.g. `0 0 3 * * *` for
    /// daily at 03:00 UTC.
    pub async fn register(self, scheduler: &JobScheduler, schedule: &str) -> Result<(), JobError> {
        let job = Job::new_async(schedule, move |_uuid, _lock| {
            let cleanup = self.clone();

            Box::pin(async move {
                match cleanup.run_now().await {
                    Ok(report) if report.is_empty() => {
                        tracing::debug!("Delisting cleanup found nothing to remove");
                    }
                    Ok(report) => {
                        tracing::info!(
                            "Delisting cleanup removed: {}",
                            report.ticker_symbols.join(", ")
                        );
                    }
                    Err(e) => tracing::error!("Delisting cleanup job failed: {}", e),
                }
            })
        })?;

        scheduler.add(job).await?;

        tracing::info!("Delisting cleanup job registered ({})", schedule);

        Ok(())
    }
}
