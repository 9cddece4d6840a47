/// Scheduled and on-demand batch jobs
///
/// Contains the jobs that write through the repositories as one unit of work:
/// - Delisting cleanup (cron, daily)
/// - Daily price ingest

pub mod delisting_job;
pub mod price_ingest_job;

pub use delisting_job::{DelistingCleanupJob, DelistingReport};
pub use price_ingest_job::{DailyPriceIngestJob, IngestReport};

use crate::database::DatabaseError;
use thiserror::Error;
use tokio_cron_scheduler::JobSchedulerError;

/// Job errors
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] JobSchedulerError),

    #[error("Job task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
