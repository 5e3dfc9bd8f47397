//! Per-database behavior that differs between drivers.
//!
//! Each [`DatabaseType`] selects a [`Dialect`] strategy: how placeholders are written, how an
//! insert reports its generated identifier, and how a uniqueness violation is recognised.

use std::fmt::Debug;

use crate::error::SqlFacadeError;
use crate::translation::PlaceholderStyle;
use crate::types::DatabaseType;

/// How `insert` obtains the generated identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertIdStrategy {
    /// Execute the statement and read the connection's last-insert rowid.
    LastInsertRowId,
    /// The statement carries a `RETURNING` clause; read the first column of the first row.
    Returning,
}

/// Strategy object for one database dialect.
pub trait Dialect: Debug + Send + Sync {
    fn placeholder_style(&self) -> PlaceholderStyle;

    fn insert_id_strategy(&self) -> InsertIdStrategy;

    /// Whether `err` reports a unique or primary-key violation.
    fn is_duplicate_key(&self, err: &SqlFacadeError) -> bool;
}

#[cfg(feature = "postgres")]
#[derive(Debug)]
pub struct PostgresDialect;

#[cfg(feature = "postgres")]
impl Dialect for PostgresDialect {
    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Dollar
    }

    fn insert_id_strategy(&self) -> InsertIdStrategy {
        InsertIdStrategy::Returning
    }

    fn is_duplicate_key(&self, err: &SqlFacadeError) -> bool {
        if let SqlFacadeError::PostgresError(pg) = err
            && let Some(code) = pg.code()
        {
            return *code == tokio_postgres::error::SqlState::UNIQUE_VIOLATION;
        }
        is_duplicate_entry_error(err)
    }
}

#[cfg(feature = "sqlite")]
#[derive(Debug)]
pub struct SqliteDialect;

#[cfg(feature = "sqlite")]
impl Dialect for SqliteDialect {
    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Question
    }

    fn insert_id_strategy(&self) -> InsertIdStrategy {
        InsertIdStrategy::LastInsertRowId
    }

    fn is_duplicate_key(&self, err: &SqlFacadeError) -> bool {
        if let SqlFacadeError::SqliteError(rusqlite::Error::SqliteFailure(failure, _)) = err {
            return failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY;
        }
        is_duplicate_entry_error(err)
    }
}

#[cfg(feature = "postgres")]
static POSTGRES: PostgresDialect = PostgresDialect;
#[cfg(feature = "sqlite")]
static SQLITE: SqliteDialect = SqliteDialect;

pub(crate) fn for_database(db_type: DatabaseType) -> &'static dyn Dialect {
    match db_type {
        #[cfg(feature = "postgres")]
        DatabaseType::Postgres => &POSTGRES,
        #[cfg(feature = "sqlite")]
        DatabaseType::Sqlite => &SQLITE,
    }
}

/// Best-effort duplicate-key check on the error message.
///
/// This is a substring heuristic: it matches MySQL's `Duplicate entry`, Postgres and
/// CockroachDB's `duplicate key value`, and SQLite's `UNIQUE constraint failed`. Message
/// wording can change between driver versions, so the dialects consult structured error
/// codes first and only fall back to this.
#[must_use]
pub fn is_duplicate_entry_error(err: &SqlFacadeError) -> bool {
    let msg = err.to_string();
    msg.contains("Duplicate entry")
        || msg.contains("duplicate key value")
        || msg.contains("UNIQUE constraint failed")
}
