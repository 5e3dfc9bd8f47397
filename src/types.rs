use std::str::FromStr;

use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde_json::Value as JsonValue;

use crate::dialect::Dialect;
use crate::error::SqlFacadeError;

/// Values that can be stored in a database row or used as query parameters.
///
/// Reuse the same enum across backends so helper functions do not need to branch on driver
/// types:
/// ```rust
/// use sql_facade::prelude::*;
///
/// let params = vec![
///     RowValues::Int(1),
///     RowValues::Text("alice".into()),
///     RowValues::Bool(true),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value
    JSON(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
}

impl RowValues {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let RowValues::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<&bool> {
        if let RowValues::Bool(value) = self {
            return Some(value);
        } else if let Some(i) = self.as_int() {
            if *i == 1 {
                return Some(&true);
            } else if *i == 0 {
                return Some(&false);
            }
        }
        None
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        if let RowValues::Timestamp(value) = self {
            return Some(*value);
        } else if let Some(s) = self.as_text() {
            // Try "YYYY-MM-DD HH:MM:SS"
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Some(dt);
            }
            // Try "YYYY-MM-DD HH:MM:SS.SSS"
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
                return Some(dt);
            }
        }
        None
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let RowValues::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let RowValues::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }
}

impl From<i64> for RowValues {
    fn from(value: i64) -> Self {
        RowValues::Int(value)
    }
}

impl From<i32> for RowValues {
    fn from(value: i32) -> Self {
        RowValues::Int(i64::from(value))
    }
}

impl From<f64> for RowValues {
    fn from(value: f64) -> Self {
        RowValues::Float(value)
    }
}

impl From<bool> for RowValues {
    fn from(value: bool) -> Self {
        RowValues::Bool(value)
    }
}

impl From<String> for RowValues {
    fn from(value: String) -> Self {
        RowValues::Text(value)
    }
}

impl From<&str> for RowValues {
    fn from(value: &str) -> Self {
        RowValues::Text(value.to_owned())
    }
}

impl From<NaiveDateTime> for RowValues {
    fn from(value: NaiveDateTime) -> Self {
        RowValues::Timestamp(value)
    }
}

impl From<JsonValue> for RowValues {
    fn from(value: JsonValue) -> Self {
        RowValues::JSON(value)
    }
}

impl From<Vec<u8>> for RowValues {
    fn from(value: Vec<u8>) -> Self {
        RowValues::Blob(value)
    }
}

impl<T: Into<RowValues>> From<Option<T>> for RowValues {
    fn from(value: Option<T>) -> Self {
        value.map_or(RowValues::Null, Into::into)
    }
}

/// Build a `[RowValues; N]` parameter array from plain Rust values.
///
/// ```rust
/// use sql_facade::{params, prelude::*};
///
/// let p = params![7, "alice", None::<i64>];
/// assert_eq!(p[1], RowValues::Text("alice".into()));
/// assert!(p[2].is_null());
/// ```
#[macro_export]
macro_rules! params {
    () => {{
        let empty: [$crate::RowValues; 0] = [];
        empty
    }};
    ($($value:expr),+ $(,)?) => {
        [$($crate::RowValues::from($value)),+]
    };
}

/// The database type supported by this facade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum DatabaseType {
    /// `PostgreSQL` database
    #[cfg(feature = "postgres")]
    #[value(alias = "postgresql", alias = "pgx")]
    Postgres,
    /// `SQLite` database
    #[cfg(feature = "sqlite")]
    #[value(alias = "sqlite3")]
    Sqlite,
}

impl DatabaseType {
    /// Dialect strategy for this database.
    #[must_use]
    pub fn dialect(self) -> &'static dyn Dialect {
        crate::dialect::for_database(self)
    }
}

impl FromStr for DatabaseType {
    type Err = SqlFacadeError;

    /// Parse a driver name (`postgres`, `postgresql`, `pgx`, `sqlite`, `sqlite3`).
    fn from_str(driver: &str) -> Result<Self, Self::Err> {
        match driver.to_ascii_lowercase().as_str() {
            #[cfg(feature = "postgres")]
            "postgres" | "postgresql" | "pgx" => Ok(DatabaseType::Postgres),
            #[cfg(feature = "sqlite")]
            "sqlite" | "sqlite3" => Ok(DatabaseType::Sqlite),
            other => Err(SqlFacadeError::ConfigError(format!(
                "unknown or disabled database driver: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_params_become_null() {
        let none: RowValues = None::<String>.into();
        assert!(none.is_null());
        let some: RowValues = Some(5_i32).into();
        assert_eq!(some, RowValues::Int(5));
    }

    #[test]
    fn params_macro_converts_each_value() {
        let p = crate::params![1_i64, "bob", 2.5, true];
        assert_eq!(
            p,
            [
                RowValues::Int(1),
                RowValues::Text("bob".into()),
                RowValues::Float(2.5),
                RowValues::Bool(true),
            ]
        );
        let empty = crate::params![];
        assert!(empty.is_empty());
    }

    #[test]
    fn sqlite_text_timestamps_parse() {
        let v = RowValues::Text("2024-03-01 12:30:00".into());
        let ts = v.as_timestamp().unwrap();
        assert_eq!(ts.format("%H:%M").to_string(), "12:30");
    }

    #[test]
    fn driver_names_parse() {
        #[cfg(feature = "postgres")]
        {
            assert_eq!("pgx".parse::<DatabaseType>().unwrap(), DatabaseType::Postgres);
            assert_eq!("Postgres".parse::<DatabaseType>().unwrap(), DatabaseType::Postgres);
        }
        #[cfg(feature = "sqlite")]
        assert_eq!("sqlite3".parse::<DatabaseType>().unwrap(), DatabaseType::Sqlite);
        let err = "oracle".parse::<DatabaseType>().unwrap_err();
        assert!(matches!(err, SqlFacadeError::ConfigError(_)));
    }
}
