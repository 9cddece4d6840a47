// Library Crate Root
// lib.rs

// Persistence and transaction layer for daily market data: issuer listings,
// per-symbol and index daily prices, analyze snapshots and volume rankings.
pub mod config;
pub mod database;
pub mod jobs;

// pub use = re-export at crate root
pub use config::{AppConfig, DatabaseConfig, JobConfig};
pub use database::{establish_connection_pool, Database, DatabaseError, DbContext};
pub use jobs::{DailyPriceIngestJob, DelistingCleanupJob, JobError};
