use std::sync::Arc;

use rusqlite::Statement;
use rusqlite::types::Value;

use crate::error::SqlFacadeError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Extract a `RowValues` from a `SQLite` row.
///
/// # Errors
/// Returns `SqlFacadeError::SqliteError` if the column cannot be read.
pub fn sqlite_extract_value(row: &rusqlite::Row, idx: usize) -> Result<RowValues, SqlFacadeError> {
    let value: Value = row.get(idx)?;
    Ok(match value {
        Value::Null => RowValues::Null,
        Value::Integer(i) => RowValues::Int(i),
        Value::Real(f) => RowValues::Float(f),
        Value::Text(s) => RowValues::Text(s),
        Value::Blob(b) => RowValues::Blob(b),
    })
}

/// Run a prepared statement and collect every row.
///
/// # Errors
/// Returns the driver error if binding or stepping the statement fails.
pub fn build_result_set(stmt: &mut Statement, params: &[Value]) -> Result<ResultSet, SqlFacadeError> {
    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let col_count = column_names.len();

    let mut result_set = ResultSet::with_capacity(10);
    result_set.set_column_names(Arc::new(column_names));

    let mut rows_iter = stmt.query(rusqlite::params_from_iter(params.iter()))?;
    while let Some(row) = rows_iter.next()? {
        let mut row_values = Vec::with_capacity(col_count);
        for i in 0..col_count {
            row_values.push(sqlite_extract_value(row, i)?);
        }
        result_set.add_row_values(row_values);
    }

    Ok(result_set)
}
