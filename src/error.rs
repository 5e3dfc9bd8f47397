use thiserror::Error;

use crate::tx_outcome::TransactionError;

#[derive(Debug, Error)]
pub enum SqlFacadeError {
    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PostgresError(#[from] tokio_postgres::Error),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parameter conversion error: {0}")]
    ParameterError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    /// The query matched no rows where exactly one was required.
    #[error("no rows in result set")]
    NoRows,

    /// An update affected a different number of rows than the caller expected.
    #[error("affected unexpected number of rows: expected {expected}, got {actual}")]
    RowsAffected { expected: u64, actual: u64 },

    #[error("Row mapping error: {0}")]
    Mapping(String),

    #[error(transparent)]
    Transaction(Box<TransactionError>),

    #[error("Unimplemented feature: {0}")]
    Unimplemented(String),

    #[error("Other database error: {0}")]
    Other(String),
}

impl SqlFacadeError {
    /// True for the "no matching rows" sentinel.
    #[must_use]
    pub fn is_no_rows(&self) -> bool {
        matches!(self, SqlFacadeError::NoRows)
    }

    /// True for the "unexpected affected-row count" sentinel.
    #[must_use]
    pub fn is_rows_affected(&self) -> bool {
        matches!(self, SqlFacadeError::RowsAffected { .. })
    }

    /// Borrow the transaction composite, if this error came out of `Db::transact`.
    #[must_use]
    pub fn as_transaction(&self) -> Option<&TransactionError> {
        match self {
            SqlFacadeError::Transaction(tx) => Some(tx),
            _ => None,
        }
    }
}

impl From<TransactionError> for SqlFacadeError {
    fn from(err: TransactionError) -> Self {
        SqlFacadeError::Transaction(Box::new(err))
    }
}

impl<E: std::error::Error + 'static> From<bb8::RunError<E>> for SqlFacadeError {
    fn from(err: bb8::RunError<E>) -> Self {
        SqlFacadeError::ConnectionError(format!("pool checkout error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_messages() {
        assert_eq!(SqlFacadeError::NoRows.to_string(), "no rows in result set");
        let err = SqlFacadeError::RowsAffected {
            expected: 1,
            actual: 2,
        };
        assert!(err.is_rows_affected());
        assert_eq!(
            err.to_string(),
            "affected unexpected number of rows: expected 1, got 2"
        );
    }

    #[test]
    fn pool_errors_become_connection_errors() {
        let err: SqlFacadeError = bb8::RunError::User(std::io::Error::other("refused")).into();
        assert!(matches!(err, SqlFacadeError::ConnectionError(ref m) if m.contains("refused")));
    }
}
