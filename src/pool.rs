use std::fmt;
#[cfg(feature = "sqlite")]
use std::sync::Arc;

use bb8::PooledConnection;

use crate::error::SqlFacadeError;
use crate::results::ResultSet;
use crate::translation::rebind;
use crate::types::{DatabaseType, RowValues};

#[cfg(feature = "postgres")]
use crate::postgres::{PgManager, PgPool, executor as pg_exec};
#[cfg(feature = "sqlite")]
use crate::sqlite::{SqliteManager, SqlitePool, executor as sqlite_exec, params as sqlite_params};

/// Connection pool for one of the supported backends.
#[derive(Clone)]
pub enum DbPool {
    #[cfg(feature = "postgres")]
    Postgres(PgPool),
    #[cfg(feature = "sqlite")]
    Sqlite(SqlitePool),
}

// bb8 pools only implement Debug when their manager does
impl fmt::Debug for DbPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(pool) => f.debug_tuple("Postgres").field(&pool.state()).finish(),
            #[cfg(feature = "sqlite")]
            Self::Sqlite(pool) => f.debug_tuple("Sqlite").field(&pool.state()).finish(),
        }
    }
}

impl DbPool {
    /// Build the pool for `db_type` from a connection string.
    ///
    /// # Errors
    /// Returns `ConfigError` for an unparseable connection string and `ConnectionError` if the
    /// pool cannot be built.
    pub(crate) async fn build(
        db_type: DatabaseType,
        conn_str: &str,
        max_size: Option<u32>,
    ) -> Result<Self, SqlFacadeError> {
        match db_type {
            #[cfg(feature = "postgres")]
            DatabaseType::Postgres => {
                let manager = PgManager::from_conn_str(conn_str)?;
                Ok(DbPool::Postgres(manager.build_pool(max_size).await?))
            }
            #[cfg(feature = "sqlite")]
            DatabaseType::Sqlite => {
                let manager = SqliteManager::new(conn_str);
                Ok(DbPool::Sqlite(manager.build_pool(max_size).await?))
            }
        }
    }

    #[must_use]
    pub fn database_type(&self) -> DatabaseType {
        match self {
            #[cfg(feature = "postgres")]
            DbPool::Postgres(_) => DatabaseType::Postgres,
            #[cfg(feature = "sqlite")]
            DbPool::Sqlite(_) => DatabaseType::Sqlite,
        }
    }

    /// Check a session out of the pool.
    ///
    /// # Errors
    /// Returns `ConnectionError` if the pool cannot hand out a connection.
    pub(crate) async fn session(&self) -> Result<Session, SqlFacadeError> {
        match self {
            #[cfg(feature = "postgres")]
            DbPool::Postgres(pool) => Ok(Session::Postgres(pool.get_owned().await?)),
            #[cfg(feature = "sqlite")]
            DbPool::Sqlite(pool) => Ok(Session::Sqlite(pool.get_owned().await?)),
        }
    }
}

/// One pooled connection; returned to the pool on drop.
///
/// Every statement passes through placeholder rebinding for the session's dialect before it
/// reaches the driver.
pub(crate) enum Session {
    #[cfg(feature = "postgres")]
    Postgres(PooledConnection<'static, PgManager>),
    #[cfg(feature = "sqlite")]
    Sqlite(PooledConnection<'static, SqliteManager>),
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(_) => f.write_str("Session::Postgres"),
            #[cfg(feature = "sqlite")]
            Self::Sqlite(_) => f.write_str("Session::Sqlite"),
        }
    }
}

impl Session {
    pub(crate) fn database_type(&self) -> DatabaseType {
        match self {
            #[cfg(feature = "postgres")]
            Session::Postgres(_) => DatabaseType::Postgres,
            #[cfg(feature = "sqlite")]
            Session::Sqlite(_) => DatabaseType::Sqlite,
        }
    }

    fn rebind<'q>(&self, sql: &'q str) -> std::borrow::Cow<'q, str> {
        rebind(sql, self.database_type().dialect().placeholder_style())
    }

    pub(crate) async fn fetch(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, SqlFacadeError> {
        let sql = self.rebind(sql);
        match self {
            #[cfg(feature = "postgres")]
            Session::Postgres(client) => pg_exec::fetch(client, &sql, params).await,
            #[cfg(feature = "sqlite")]
            Session::Sqlite(conn) => {
                sqlite_exec::fetch(
                    Arc::clone(&**conn),
                    sql.into_owned(),
                    sqlite_params::convert(params),
                )
                .await
            }
        }
    }

    pub(crate) async fn execute(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<u64, SqlFacadeError> {
        let sql = self.rebind(sql);
        match self {
            #[cfg(feature = "postgres")]
            Session::Postgres(client) => pg_exec::execute(client, &sql, params).await,
            #[cfg(feature = "sqlite")]
            Session::Sqlite(conn) => {
                sqlite_exec::execute(
                    Arc::clone(&**conn),
                    sql.into_owned(),
                    sqlite_params::convert(params),
                )
                .await
            }
        }
    }

    /// Only drivers that expose a last-insert rowid support this.
    pub(crate) async fn execute_returning_rowid(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<i64, SqlFacadeError> {
        match self {
            #[cfg(feature = "postgres")]
            Session::Postgres(_) => Err(SqlFacadeError::Unimplemented(format!(
                "postgres has no last-insert rowid; add RETURNING to `{sql}` ({} params)",
                params.len()
            ))),
            #[cfg(feature = "sqlite")]
            Session::Sqlite(conn) => {
                sqlite_exec::execute_returning_rowid(
                    Arc::clone(&**conn),
                    self.rebind(sql).into_owned(),
                    sqlite_params::convert(params),
                )
                .await
            }
        }
    }

    pub(crate) async fn execute_batch(&self, sql: &str) -> Result<(), SqlFacadeError> {
        match self {
            #[cfg(feature = "postgres")]
            Session::Postgres(client) => pg_exec::execute_batch(client, sql).await,
            #[cfg(feature = "sqlite")]
            Session::Sqlite(conn) => {
                sqlite_exec::execute_batch(Arc::clone(&**conn), sql.to_owned()).await
            }
        }
    }
}
