//! PostgreSQL implementation of UnitOfWork
//!
//! The transaction is opened, committed and rolled back here and nowhere
//! else. Work bodies only ever see it through the [`TxRepositories`] bundle.

use std::future::Future;

use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, error, instrument};

use orion_core::traits::{
    CommentTxRepository, LikeTxRepository, RepoResult, SubjectTxRepository, TxFuture,
    TxRepositories, UnitOfWork,
};

use super::error::map_db_error;

/// Repositories bound to one open PostgreSQL transaction
pub struct PgTxRepositories {
    pub(crate) tx: Transaction<'static, Postgres>,
}

impl TxRepositories for PgTxRepositories {
    fn likes(&mut self) -> &mut dyn LikeTxRepository {
        self
    }

    fn subjects(&mut self) -> &mut dyn SubjectTxRepository {
        self
    }

    fn comments(&mut self) -> &mut dyn CommentTxRepository {
        self
    }
}

/// PostgreSQL implementation of UnitOfWork
#[derive(Clone)]
pub struct PgUnitOfWork {
    pool: PgPool,
}

impl PgUnitOfWork {
    /// Create a new PgUnitOfWork
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[instrument(skip_all)]
    async fn run<T, F>(&self, work: F) -> RepoResult<T>
    where
        T: Send,
        F: for<'t> FnOnce(&'t mut dyn TxRepositories) -> TxFuture<'t, T> + Send,
    {
        let tx = self.pool.begin().await.map_err(map_db_error)?;
        let mut repos = PgTxRepositories { tx };

        // If this future is dropped here (timeout, cancellation) `repos`
        // drops with it and sqlx rolls the transaction back.
        let outcome = work(&mut repos).await;

        match outcome {
            Ok(value) => {
                repos.tx.commit().await.map_err(map_db_error)?;
                debug!("Transaction committed");
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = repos.tx.rollback().await {
                    error!(error = %rollback_err, cause = %e, "Transaction rollback failed");
                } else {
                    debug!(cause = %e, "Transaction rolled back");
                }
                Err(e)
            }
        }
    }
}

impl UnitOfWork for PgUnitOfWork {
    fn execute<T, F>(&self, work: F) -> impl Future<Output = RepoResult<T>> + Send
    where
        T: Send,
        F: for<'t> FnOnce(&'t mut dyn TxRepositories) -> TxFuture<'t, T> + Send,
    {
        self.run(work)
    }
}
