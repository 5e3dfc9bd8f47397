use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bb8::{ManageConnection, Pool};
use tokio::sync::Mutex;

use crate::error::SqlFacadeError;

/// A rusqlite connection shared between the pool and blocking tasks.
pub type SharedSqliteConnection = Arc<Mutex<rusqlite::Connection>>;

pub type SqlitePool = Pool<SqliteManager>;

const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// bb8 manager for `SQLite` connections.
#[derive(Debug, Clone)]
pub struct SqliteManager {
    path: String,
}

impl SqliteManager {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// True for the private in-memory database, which exists once per connection.
    #[must_use]
    pub fn is_memory(&self) -> bool {
        self.path.is_empty() || self.path == ":memory:"
    }

    /// Build a pool from this manager.
    ///
    /// An in-memory database is pinned to a single connection that is never recycled, so
    /// every caller sees the same data.
    ///
    /// # Errors
    /// Returns `SqlFacadeError::ConnectionError` if the pool cannot be built.
    pub async fn build_pool(self, max_size: Option<u32>) -> Result<SqlitePool, SqlFacadeError> {
        let mut builder = Pool::builder();
        if self.is_memory() {
            builder = builder.max_size(1).idle_timeout(None).max_lifetime(None);
        } else if let Some(size) = max_size {
            builder = builder.max_size(size);
        }
        builder
            .build(self)
            .await
            .map_err(|e| SqlFacadeError::ConnectionError(format!("sqlite pool error: {e}")))
    }
}

impl ManageConnection for SqliteManager {
    type Connection = SharedSqliteConnection;
    type Error = rusqlite::Error;

    #[allow(clippy::manual_async_fn)]
    fn connect(&self) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send {
        let path = self.path.clone();
        let memory = self.is_memory();
        async move {
            let conn = if memory {
                rusqlite::Connection::open_in_memory()?
            } else {
                rusqlite::Connection::open(&path)?
            };
            conn.busy_timeout(BUSY_TIMEOUT)?;
            if !memory {
                conn.execute_batch("PRAGMA journal_mode = WAL;")?;
            }
            tracing::debug!(path = %path, "opened sqlite connection");
            Ok(Arc::new(Mutex::new(conn)))
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn is_valid(
        &self,
        conn: &mut Self::Connection,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        async move {
            let guard = conn.lock().await;
            guard.query_row("SELECT 1", [], |_| Ok(()))
        }
    }

    /// A file connection still inside a transaction (a failed `COMMIT`, or a dropped
    /// transaction that could not be rolled back) is discarded instead of reused. The
    /// in-memory database cannot be reopened, so it is always kept.
    fn has_broken(&self, conn: &mut Self::Connection) -> bool {
        !self.is_memory() && conn.try_lock().is_ok_and(|c| !c.is_autocommit())
    }
}
