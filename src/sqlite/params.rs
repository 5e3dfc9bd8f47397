use rusqlite::types::Value;

use crate::types::RowValues;

/// Convert a single `RowValues` to a rusqlite `Value`.
///
/// `SQLite` has no boolean, timestamp or JSON storage class: booleans become 0/1,
/// timestamps become `YYYY-MM-DD HH:MM:SS[.f]` text and JSON is stored as its text form.
#[must_use]
pub fn row_value_to_sqlite_value(value: &RowValues) -> Value {
    match value {
        RowValues::Int(i) => Value::Integer(*i),
        RowValues::Float(f) => Value::Real(*f),
        RowValues::Text(s) => Value::Text(s.clone()),
        RowValues::Bool(b) => Value::Integer(i64::from(*b)),
        RowValues::Timestamp(dt) => Value::Text(dt.format("%F %T%.f").to_string()),
        RowValues::Null => Value::Null,
        RowValues::JSON(jval) => Value::Text(jval.to_string()),
        RowValues::Blob(bytes) => Value::Blob(bytes.clone()),
    }
}

/// Owned parameter list, movable into a blocking task.
#[must_use]
pub fn convert(params: &[RowValues]) -> Vec<Value> {
    params.iter().map(row_value_to_sqlite_value).collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn values_without_a_storage_class() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        let out = convert(&[
            RowValues::Bool(true),
            RowValues::Timestamp(ts),
            RowValues::JSON(serde_json::json!({"k": 1})),
        ]);
        assert_eq!(out[0], Value::Integer(1));
        assert_eq!(out[1], Value::Text("2024-01-02 03:04:05".into()));
        assert_eq!(out[2], Value::Text("{\"k\":1}".into()));
    }
}
