//! The query facade shared by [`Db`](crate::Db) and [`Tx`](crate::Tx).
//!
//! Implementors supply four raw primitives (`fetch`, `execute`, `execute_returning_rowid`,
//! `execute_batch`); everything else is provided on top of them. Placeholders are rebound
//! for the backend's dialect before any statement runs, so `?`, `?N` and `$N` all work on
//! every backend.

use std::future::Future;

use serde::de::DeserializeOwned;

use crate::dialect::InsertIdStrategy;
use crate::error::SqlFacadeError;
use crate::naming::NameConvention;
use crate::record::{from_result_set, from_row};
use crate::results::ResultSet;
use crate::types::{DatabaseType, RowValues};

pub trait QueryOps {
    fn database_type(&self) -> DatabaseType;

    /// Convention used to find the column for each record field.
    fn name_convention(&self) -> NameConvention;

    /// Run a statement and return its raw rows.
    fn fetch(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> impl Future<Output = Result<ResultSet, SqlFacadeError>>;

    /// Run a statement and return the number of rows it affected.
    fn execute(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> impl Future<Output = Result<u64, SqlFacadeError>>;

    /// Run an INSERT and return the driver's last-insert rowid.
    fn execute_returning_rowid(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> impl Future<Output = Result<i64, SqlFacadeError>>;

    /// Run semicolon-separated statements without parameters or rebinding.
    fn execute_batch(&self, sql: &str) -> impl Future<Output = Result<(), SqlFacadeError>>;

    /// Every matching row, mapped onto `T`.
    #[allow(clippy::manual_async_fn)]
    fn select<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> impl Future<Output = Result<Vec<T>, SqlFacadeError>> {
        async move {
            let rs = self.fetch(sql, params).await?;
            from_result_set(&rs, self.name_convention())
        }
    }

    /// The first matching row.
    ///
    /// # Errors
    /// `SqlFacadeError::NoRows` when nothing matched.
    #[allow(clippy::manual_async_fn)]
    fn select_one<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> impl Future<Output = Result<T, SqlFacadeError>> {
        async move {
            let rs = self.fetch(sql, params).await?;
            let row = rs.first().ok_or(SqlFacadeError::NoRows)?;
            from_row(row, self.name_convention())
        }
    }

    /// Like [`select_one`](Self::select_one), but zero rows is `Ok(None)`.
    #[allow(clippy::manual_async_fn)]
    fn select_one_maybe<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> impl Future<Output = Result<Option<T>, SqlFacadeError>> {
        async move {
            let rs = self.fetch(sql, params).await?;
            match rs.first() {
                Some(row) => from_row(row, self.name_convention()).map(Some),
                None => Ok(None),
            }
        }
    }

    /// Insert a row and return its generated id.
    ///
    /// On `SQLite` this is the connection's last-insert rowid. On Postgres the statement must
    /// carry a `RETURNING` clause; the first column of the first returned row is the id.
    #[allow(clippy::manual_async_fn)]
    fn insert(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> impl Future<Output = Result<i64, SqlFacadeError>> {
        async move {
            match self.database_type().dialect().insert_id_strategy() {
                InsertIdStrategy::LastInsertRowId => {
                    self.execute_returning_rowid(sql, params).await
                }
                InsertIdStrategy::Returning => {
                    let rs = self.fetch(sql, params).await?;
                    let row = rs.first().ok_or(SqlFacadeError::NoRows)?;
                    match row.get_by_index(0) {
                        Some(RowValues::Int(id)) => Ok(*id),
                        Some(other) => Err(SqlFacadeError::Mapping(format!(
                            "insert returned a non-integer id: {other:?}"
                        ))),
                        None => Err(SqlFacadeError::Mapping(
                            "insert returned a row without columns".into(),
                        )),
                    }
                }
            }
        }
    }

    /// Insert a row, discarding any generated id.
    #[allow(clippy::manual_async_fn)]
    fn insert_ignore_id(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> impl Future<Output = Result<(), SqlFacadeError>> {
        async move { self.execute(sql, params).await.map(|_| ()) }
    }

    /// Insert a row, treating a uniqueness violation as success.
    ///
    /// Returns `true` when the row already existed. Any other failure is returned unchanged.
    /// On Postgres a violation still aborts the surrounding transaction.
    #[allow(clippy::manual_async_fn)]
    fn insert_ignore_duplicate(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> impl Future<Output = Result<bool, SqlFacadeError>> {
        async move {
            match self.execute(sql, params).await {
                Ok(_) => Ok(false),
                Err(e) if self.database_type().dialect().is_duplicate_key(&e) => Ok(true),
                Err(e) => Err(e),
            }
        }
    }

    /// Run an UPDATE (or DELETE) and return the affected row count.
    #[allow(clippy::manual_async_fn)]
    fn update(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> impl Future<Output = Result<u64, SqlFacadeError>> {
        async move { self.execute(sql, params).await }
    }

    #[allow(clippy::manual_async_fn)]
    fn update_one(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> impl Future<Output = Result<(), SqlFacadeError>> {
        async move { self.update_num(1, sql, params).await }
    }

    /// Run an UPDATE that must touch exactly `expected` rows.
    ///
    /// # Errors
    /// `SqlFacadeError::RowsAffected` when the count differs. The statement has already run
    /// by then; inside a transaction the error causes a rollback.
    #[allow(clippy::manual_async_fn)]
    fn update_num(
        &self,
        expected: u64,
        sql: &str,
        params: &[RowValues],
    ) -> impl Future<Output = Result<(), SqlFacadeError>> {
        async move {
            let actual = self.execute(sql, params).await?;
            if actual == expected {
                Ok(())
            } else {
                Err(SqlFacadeError::RowsAffected { expected, actual })
            }
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn exec(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> impl Future<Output = Result<(), SqlFacadeError>> {
        async move { self.execute(sql, params).await.map(|_| ()) }
    }

    /// [`exec`](Self::exec) for statements that cannot reasonably fail.
    ///
    /// # Panics
    /// Panics with the error message if the statement fails.
    #[allow(clippy::manual_async_fn)]
    fn must_exec(&self, sql: &str, params: &[RowValues]) -> impl Future<Output = ()> {
        async move {
            if let Err(e) = self.exec(sql, params).await {
                panic!("{e}");
            }
        }
    }
}
