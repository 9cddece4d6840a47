use crate::database::connection::{Database, DatabaseError};
use crate::database::context::DbContext;
use diesel::connection::{AnsiTransactionManager, TransactionManager};
use diesel::pg::PgConnection;

impl<'a> DbContext<'a> {
    /// Run `work` as one unit of work
    ///
    /// Checks a connection out of the pool, opens a transaction on it and hands
    /// `work` a context bound to that transaction. Commits when `work` returns
    /// `Ok`; rolls back and returns the work error otherwise.
    ///
    /// Only one level is supported: calling this on a context that is already
    /// bound to a transaction fails with [`DatabaseError::NestedTransaction`].
    pub fn do_in_tx<T, E, F>(&mut self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut DbContext<'_>) -> Result<T, E>,
        E: From<DatabaseError>,
    {
        let pool = match self {
            DbContext::Pool(pool) => *pool,
            DbContext::Transaction(_) => return Err(DatabaseError::NestedTransaction.into()),
        };

        let mut conn = pool
            .get()
            .map_err(|e| DatabaseError::ConnectionPoolError(e.to_string()))?;
        let conn: &mut PgConnection = &mut conn;

        AnsiTransactionManager::begin_transaction(conn).map_err(|source| DatabaseError::Query {
            operation: "begin transaction",
            source,
        })?;

        let outcome = {
            let mut tx_ctx = DbContext::Transaction(&mut *conn);
            work(&mut tx_ctx)
        };

        match outcome {
            Ok(value) => {
                commit(conn)?;
                Ok(value)
            }
            Err(err) => {
                // The work error wins; a failed rollback leaves the connection
                // marked broken, so the pool discards it on return.
                if let Err(rollback_err) = AnsiTransactionManager::rollback_transaction(conn) {
                    tracing::error!("Failed to roll back transaction: {}", rollback_err);
                } else {
                    tracing::debug!("Transaction rolled back");
                }
                Err(err)
            }
        }
    }
}

impl Database {
    /// Shorthand for `self.context().do_in_tx(work)`
    pub fn do_in_tx<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut DbContext<'_>) -> Result<T, E>,
        E: From<DatabaseError>,
    {
        self.context().do_in_tx(work)
    }
}

/// Commit the outermost transaction
///
/// On a failed COMMIT diesel already attempts the rollback; its failure, if
/// any, is carried next to the commit error.
fn commit(conn: &mut PgConnection) -> Result<(), DatabaseError> {
    match AnsiTransactionManager::commit_transaction(conn) {
        Ok(()) => {
            tracing::debug!("Transaction committed");
            Ok(())
        }
        Err(diesel::result::Error::RollbackErrorOnCommit {
            rollback_error,
            commit_error,
        }) => {
            tracing::error!(
                "Failed to commit transaction: {}; rollback also failed: {}",
                commit_error,
                rollback_error
            );
            Err(DatabaseError::CommitFailed {
                source: *commit_error,
                rollback: Some(*rollback_error),
            })
        }
        Err(source) => {
            tracing::error!("Failed to commit transaction: {}", source);
            Err(DatabaseError::CommitFailed {
                source,
                rollback: None,
            })
        }
    }
}
