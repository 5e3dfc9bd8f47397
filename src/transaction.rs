use std::future::Future;

use crate::error::SqlFacadeError;
use crate::naming::NameConvention;
use crate::ops::QueryOps;
use crate::pool::Session;
use crate::results::ResultSet;
use crate::types::{DatabaseType, RowValues};

/// An open transaction on one pooled connection.
///
/// Handed to the callback of [`Db::transact`](crate::Db::transact) by reference; the wrapper
/// commits or rolls it back when the callback finishes. Every [`QueryOps`] method runs on
/// the transaction's connection.
#[derive(Debug)]
pub struct Tx {
    session: Option<Session>,
    db_type: DatabaseType,
    convention: NameConvention,
}

impl Tx {
    /// Issue `BEGIN` on `session`.
    ///
    /// The handle owns the session before `BEGIN` is sent: if this future is dropped while
    /// `BEGIN` is in flight, `Drop` still rolls the connection back. A `BEGIN` that fails
    /// returns the session untouched.
    pub(crate) async fn begin(
        session: Session,
        convention: NameConvention,
    ) -> Result<Self, SqlFacadeError> {
        let db_type = session.database_type();
        let mut tx = Self {
            session: Some(session),
            db_type,
            convention,
        };
        let begun = tx.session()?.execute_batch("BEGIN").await;
        if let Err(e) = begun {
            tx.session = None;
            return Err(e);
        }
        tracing::debug!(db = ?db_type, "transaction started");
        Ok(tx)
    }

    pub(crate) async fn commit(mut self) -> Result<(), SqlFacadeError> {
        let session = self.take_session()?;
        session.execute_batch("COMMIT").await?;
        tracing::debug!(db = ?self.db_type, "transaction committed");
        Ok(())
    }

    pub(crate) async fn rollback(mut self) -> Result<(), SqlFacadeError> {
        let session = self.take_session()?;
        match session.execute_batch("ROLLBACK").await {
            Ok(()) => {
                tracing::debug!(db = ?self.db_type, "transaction rolled back");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(db = ?self.db_type, error = %e, "transaction rollback failed");
                Err(e)
            }
        }
    }

    fn session(&self) -> Result<&Session, SqlFacadeError> {
        self.session
            .as_ref()
            .ok_or_else(|| SqlFacadeError::ExecutionError("transaction already finished".into()))
    }

    fn take_session(&mut self) -> Result<Session, SqlFacadeError> {
        self.session
            .take()
            .ok_or_else(|| SqlFacadeError::ExecutionError("transaction already finished".into()))
    }
}

impl QueryOps for Tx {
    fn database_type(&self) -> DatabaseType {
        self.db_type
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
        async move { self.session()?.fetch(sql, params).await }
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> impl Future<Output = Result<u64, SqlFacadeError>> {
        async move { self.session()?.execute(sql, params).await }
    }

    #[allow(clippy::manual_async_fn)]
    fn execute_returning_rowid(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> impl Future<Output = Result<i64, SqlFacadeError>> {
        async move { self.session()?.execute_returning_rowid(sql, params).await }
    }

    #[allow(clippy::manual_async_fn)]
    fn execute_batch(&self, sql: &str) -> impl Future<Output = Result<(), SqlFacadeError>> {
        async move { self.session()?.execute_batch(sql).await }
    }
}

impl Drop for Tx {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let db_type = self.db_type;
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            tracing::warn!(db = ?db_type, "transaction dropped unfinished; rolling back in the background");
            handle.spawn(async move {
                if let Err(e) = session.execute_batch("ROLLBACK").await {
                    tracing::warn!(db = ?db_type, error = %e, "background rollback failed");
                }
            });
        } else {
            tracing::warn!(db = ?db_type, "transaction dropped outside a tokio runtime; connection not rolled back");
        }
    }
}
