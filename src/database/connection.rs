use crate::database::context::DbContext;
use diesel::pg::PgConnection;
use diesel::r2d2::{self, ConnectionManager, Pool, PooledConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Type alias for PostgreSQL connection pool
pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Type alias for pooled connection
pub type PgPooledConnection = PooledConnection<ConnectionManager<PgConnection>>;

/// Schema migrations compiled into the binary
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Owner of the shared connection pool
///
/// Every repository call either runs on a connection checked out from this
/// pool or on the connection of an open transaction (see [`DbContext`]).
#[derive(Clone)]
pub struct Database {
    pool: Arc<PgPool>,
}

impl Database {
    /// Wrap an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Get a reference to the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check a connection out of the pool
    pub fn get_conn(&self) -> Result<PgPooledConnection, DatabaseError> {
        self.pool
            .get()
            .map_err(|e| DatabaseError::ConnectionPoolError(e.to_string()))
    }

    /// Context that is not bound to any transaction
    pub fn context(&self) -> DbContext<'_> {
        DbContext::Pool(&self.pool)
    }

    /// Apply pending embedded migrations, returning how many ran
    pub fn run_migrations(&self) -> Result<usize, DatabaseError> {
        let mut conn = self.get_conn()?;
        run_migrations(&mut conn)
    }
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    ConnectionPoolError(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Failed to {operation}: {source}")]
    Query {
        operation: &'static str,
        #[source]
        source: diesel::result::Error,
    },

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Numeric conversion error: {0}")]
    NumericConversion(String),

    #[error("Nested transactions are not supported")]
    NestedTransaction,

    #[error(
        "Failed to commit transaction: {source}{}",
        .rollback
            .as_ref()
            .map(|e| format!(" (rollback also failed: {})", e))
            .unwrap_or_default()
    )]
    CommitFailed {
        #[source]
        source: diesel::result::Error,
        rollback: Option<diesel::result::Error>,
    },
}

impl DatabaseError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound(_))
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, DatabaseError::InvalidInput(_))
    }
}

/// Establish the shared connection pool
///
/// # Arguments
/// * `database_url` - PostgreSQL connection URL
/// * `pool_size` - Maximum number of pooled connections
/// * `connection_timeout` - How long a checkout may wait for a free connection
///
/// # Returns
/// * `Result<Database, DatabaseError>` - Pool owner or error
pub fn establish_connection_pool(
    database_url: &str,
    pool_size: u32,
    connection_timeout: Duration,
) -> Result<Database, DatabaseError> {
    tracing::info!("Establishing database connection pool...");

    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = r2d2::Pool::builder()
        .max_size(pool_size)
        .connection_timeout(connection_timeout)
        .build(manager)
        .map_err(|e| DatabaseError::ConnectionPoolError(e.to_string()))?;

    tracing::info!("Database pool created with max size: {}", pool_size);

    // Test connection
    let _ = pool
        .get()
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

    tracing::info!("Database connection successful");

    Ok(Database::new(pool))
}

/// Apply pending embedded migrations on the given connection
pub fn run_migrations(conn: &mut PgConnection) -> Result<usize, DatabaseError> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;

    tracing::info!("Applied {} pending migration(s)", applied.len());

    Ok(applied.len())
}
