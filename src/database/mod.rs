/// Database module for the market data store
///
/// This module provides:
/// - The shared PostgreSQL connection pool and embedded migrations
/// - `DbContext` and `do_in_tx` for running repository calls as one unit of work
/// - Repository pattern implementations, one per table
/// - Database models, schema and price precision helpers
/// - Diesel ORM integration

pub mod connection;
pub mod context;
pub mod models;
pub mod numeric;
pub mod repositories;
pub mod schema;
pub mod transaction;

pub use connection::{establish_connection_pool, run_migrations, Database, DatabaseError, PgPool};
pub use context::DbContext;
