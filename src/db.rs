use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;

use crate::config::{DbOptions, DbOptionsBuilder};
use crate::error::SqlFacadeError;
use crate::naming::NameConvention;
use crate::ops::QueryOps;
use crate::pool::DbPool;
use crate::results::ResultSet;
use crate::transaction::Tx;
use crate::tx_outcome::{TransactionError, TransactionPanic};
use crate::types::{DatabaseType, RowValues};

/// A pooled database handle.
///
/// Cheap to clone; clones share the pool. Each [`QueryOps`] call checks a connection out
/// for the duration of that one statement.
#[derive(Debug, Clone)]
pub struct Db {
    pool: DbPool,
    convention: NameConvention,
}

impl Db {
    /// Open a pool and make sure the database answers.
    ///
    /// # Errors
    /// `ConfigError` for a malformed connection string, `ConnectionError` if the pool cannot
    /// be built or the ping fails.
    pub async fn connect(
        db_type: DatabaseType,
        conn_str: &str,
        convention: NameConvention,
    ) -> Result<Self, SqlFacadeError> {
        Self::from_options(DbOptions::new(db_type, conn_str).with_name_convention(convention)).await
    }

    #[must_use]
    pub fn builder(db_type: DatabaseType, conn_str: impl Into<String>) -> DbOptionsBuilder {
        DbOptionsBuilder::new(db_type, conn_str)
    }

    /// [`connect`](Self::connect) for programs that cannot run without their database.
    ///
    /// # Panics
    /// Panics with the connection error.
    pub async fn must_connect(
        db_type: DatabaseType,
        conn_str: &str,
        convention: NameConvention,
    ) -> Self {
        match Self::connect(db_type, conn_str, convention).await {
            Ok(db) => db,
            Err(e) => panic!("{e}"),
        }
    }

    /// Open a pool from prepared options.
    ///
    /// # Errors
    /// See [`connect`](Self::connect).
    pub async fn from_options(opts: DbOptions) -> Result<Self, SqlFacadeError> {
        let pool = DbPool::build(opts.db_type, &opts.conn_str, opts.max_size).await?;
        let db = Self {
            pool,
            convention: opts.name_convention,
        };
        db.ping().await?;
        tracing::debug!(db = ?opts.db_type, convention = ?opts.name_convention, "connected");
        Ok(db)
    }

    /// Round-trip a trivial query.
    ///
    /// # Errors
    /// `ConnectionError` naming the underlying failure.
    pub async fn ping(&self) -> Result<(), SqlFacadeError> {
        self.fetch("SELECT 1", &[])
            .await
            .map(|_| ())
            .map_err(|e| SqlFacadeError::ConnectionError(format!("could not ping database ({e})")))
    }

    /// A handle on the same pool that maps fields through `convention`.
    #[must_use]
    pub fn with_name_convention(&self, convention: NameConvention) -> Self {
        Self {
            pool: self.pool.clone(),
            convention,
        }
    }

    #[must_use]
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Run `f` inside a transaction on one pooled connection.
    ///
    /// The callback's `Ok` commits and `Err` rolls back. Either failure is reported as a
    /// [`TransactionError`] carrying the callback's error and any rollback or commit error.
    /// If `BEGIN` itself fails that error is returned and `f` never runs.
    ///
    /// ```rust,no_run
    /// # use sql_facade::prelude::*;
    /// # async fn demo(db: &Db) -> Result<(), SqlFacadeError> {
    /// let id = db
    ///     .transact(async |tx: &Tx| {
    ///         let id = tx.insert("INSERT INTO people (name) VALUES (?)", &params!["Ada"]).await?;
    ///         tx.update_one("UPDATE people SET name = ? WHERE id = ?", &params!["Ada L.", id])
    ///             .await?;
    ///         Ok(id)
    ///     })
    ///     .await?;
    /// # let _ = id;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    /// The `BEGIN` failure, or `SqlFacadeError::Transaction`.
    ///
    /// # Panics
    /// A panic inside `f` is caught, the transaction is rolled back, and the panic resumes
    /// with a [`TransactionPanic`] payload wrapping the original one.
    pub async fn transact<T, F>(&self, f: F) -> Result<T, SqlFacadeError>
    where
        F: AsyncFnOnce(&Tx) -> Result<T, SqlFacadeError>,
    {
        let session = self.pool.session().await?;
        let tx = Tx::begin(session, self.convention).await?;

        let outcome = AssertUnwindSafe(f(&tx)).catch_unwind().await;
        match outcome {
            Err(payload) => {
                let rollback = tx.rollback().await.map_err(|e| e.to_string());
                let panic = TransactionPanic::new(payload, rollback);
                tracing::error!(panic = %panic.message(), rollback = ?panic.rollback(), "transaction callback panicked");
                std::panic::resume_unwind(Box::new(panic))
            }
            Ok(Err(original)) => match tx.rollback().await {
                Ok(()) => Err(TransactionError::rolled_back(original).into()),
                Err(rollback) => Err(TransactionError::rollback_failed(original, rollback).into()),
            },
            Ok(Ok(value)) => match tx.commit().await {
                Ok(()) => Ok(value),
                Err(commit) => {
                    tracing::warn!(error = %commit, "transaction commit failed");
                    Err(TransactionError::commit_failed(commit).into())
                }
            },
        }
    }
}

impl QueryOps for Db {
    fn database_type(&self) -> DatabaseType {
        self.pool.database_type()
    }

    fn name_convention(&self) -> NameConvention {
        self.convention
    }

    #[allow(clippy::manual_async_fn)]
    fn fetch(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> impl Future<Output = Result<ResultSet, SqlFacadeError>> {
        async move { self.pool.session().await?.fetch(sql, params).await }
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> impl Future<Output = Result<u64, SqlFacadeError>> {
        async move { self.pool.session().await?.execute(sql, params).await }
    }

    #[allow(clippy::manual_async_fn)]
    fn execute_returning_rowid(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> impl Future<Output = Result<i64, SqlFacadeError>> {
        async move {
            self.pool
                .session()
                .await?
                .execute_returning_rowid(sql, params)
                .await
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn execute_batch(&self, sql: &str) -> impl Future<Output = Result<(), SqlFacadeError>> {
        async move { self.pool.session().await?.execute_batch(sql).await }
    }
}
