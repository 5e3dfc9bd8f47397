use std::error::Error;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use tokio_postgres::Statement;
use tokio_postgres::types::{FromSql, Type};

use crate::error::SqlFacadeError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Extracts a `RowValues` from a `tokio_postgres` Row at the given index.
///
/// # Errors
/// Returns `SqlFacadeError::PostgresError` if the column cannot be decoded.
pub fn postgres_extract_value(
    row: &tokio_postgres::Row,
    idx: usize,
) -> Result<RowValues, SqlFacadeError> {
    let ty = row.columns()[idx].type_();

    let value = match *ty {
        Type::INT2 => row
            .try_get::<_, Option<i16>>(idx)?
            .map_or(RowValues::Null, |v| RowValues::Int(i64::from(v))),
        Type::INT4 => row
            .try_get::<_, Option<i32>>(idx)?
            .map_or(RowValues::Null, |v| RowValues::Int(i64::from(v))),
        Type::INT8 => row
            .try_get::<_, Option<i64>>(idx)?
            .map_or(RowValues::Null, RowValues::Int),
        Type::FLOAT4 => row
            .try_get::<_, Option<f32>>(idx)?
            .map_or(RowValues::Null, |v| RowValues::Float(f64::from(v))),
        Type::FLOAT8 => row
            .try_get::<_, Option<f64>>(idx)?
            .map_or(RowValues::Null, RowValues::Float),
        Type::BOOL => row
            .try_get::<_, Option<bool>>(idx)?
            .map_or(RowValues::Null, RowValues::Bool),
        Type::TIMESTAMP => row
            .try_get::<_, Option<NaiveDateTime>>(idx)?
            .map_or(RowValues::Null, RowValues::Timestamp),
        Type::TIMESTAMPTZ => row
            .try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx)?
            .map_or(RowValues::Null, |v| RowValues::Timestamp(v.naive_utc())),
        Type::JSON | Type::JSONB => row
            .try_get::<_, Option<Value>>(idx)?
            .map_or(RowValues::Null, RowValues::JSON),
        Type::BYTEA => row
            .try_get::<_, Option<Vec<u8>>>(idx)?
            .map_or(RowValues::Null, RowValues::Blob),
        Type::NUMERIC => row
            .try_get::<_, Option<Numeric>>(idx)?
            .map_or(RowValues::Null, |n| RowValues::Float(n.0)),
        Type::DATE => row
            .try_get::<_, Option<NaiveDate>>(idx)?
            .map_or(RowValues::Null, |d| RowValues::Timestamp(d.and_time(chrono::NaiveTime::MIN))),
        // text, varchar, bpchar, name and anything else with a text decoding
        _ => match row.try_get::<_, Option<String>>(idx) {
            Ok(text) => text.map_or(RowValues::Null, RowValues::Text),
            Err(e) => {
                return Err(SqlFacadeError::ExecutionError(format!(
                    "unsupported postgres type {ty} in column {}; cast it in the query \
                     (::text, ::float8, ::bigint): {e}",
                    row.columns()[idx].name()
                )));
            }
        },
    };
    Ok(value)
}

/// `NUMERIC` decoded from its binary form into an `f64`; precision beyond a double is lost.
struct Numeric(f64);

const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;

impl<'a> FromSql<'a> for Numeric {
    fn from_sql(_: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        let header = |at: usize| u16::from_be_bytes([raw[at], raw[at + 1]]);
        if raw.len() < 8 {
            return Err("numeric value shorter than its header".into());
        }
        let ndigits = usize::from(header(0));
        let weight = i32::from(i16::from_be_bytes([raw[2], raw[3]]));
        let sign = header(4);
        if raw.len() != 8 + 2 * ndigits {
            return Err(format!("numeric value has {} bytes for {ndigits} digits", raw.len()).into());
        }

        match sign {
            NUMERIC_NAN => return Ok(Numeric(f64::NAN)),
            NUMERIC_PINF => return Ok(Numeric(f64::INFINITY)),
            NUMERIC_NINF => return Ok(Numeric(f64::NEG_INFINITY)),
            _ => {}
        }

        // base-10000 digits; the first one is scaled by 10000^weight
        let mut value = 0.0_f64;
        for (i, pair) in raw[8..].chunks_exact(2).enumerate() {
            let digit = f64::from(u16::from_be_bytes([pair[0], pair[1]]));
            value += digit * 10_000_f64.powi(weight - i32::try_from(i)?);
        }
        Ok(Numeric(if sign == NUMERIC_NEG { -value } else { value }))
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::NUMERIC
    }
}

/// Build a result set using statement metadata for column names, so an empty result still
/// knows its columns.
///
/// # Errors
/// Returns errors from row value extraction.
pub fn build_result_set(
    stmt: &Statement,
    rows: &[tokio_postgres::Row],
) -> Result<ResultSet, SqlFacadeError> {
    let column_names: Vec<String> = stmt
        .columns()
        .iter()
        .map(|col| col.name().to_string())
        .collect();
    let column_count = column_names.len();

    let mut result_set = ResultSet::with_capacity(rows.len());
    result_set.set_column_names(Arc::new(column_names));

    for row in rows {
        let mut row_values = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            row_values.push(postgres_extract_value(row, idx)?);
        }
        result_set.add_row_values(row_values);
    }

    Ok(result_set)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric(weight: i16, sign: u16, digits: &[u16]) -> Vec<u8> {
        let mut raw = Vec::new();
        raw.extend_from_slice(&u16::try_from(digits.len()).unwrap().to_be_bytes());
        raw.extend_from_slice(&weight.to_be_bytes());
        raw.extend_from_slice(&sign.to_be_bytes());
        raw.extend_from_slice(&0_u16.to_be_bytes());
        for d in digits {
            raw.extend_from_slice(&d.to_be_bytes());
        }
        raw
    }

    #[test]
    fn numeric_decodes_to_float() {
        let n = Numeric::from_sql(&Type::NUMERIC, &numeric(0, 0, &[1, 5000])).unwrap();
        assert!((n.0 - 1.5).abs() < f64::EPSILON);

        let n = Numeric::from_sql(&Type::NUMERIC, &numeric(1, NUMERIC_NEG, &[1, 2345, 6780]))
            .unwrap();
        assert!((n.0 + 12_345.678).abs() < 1e-9);

        let n = Numeric::from_sql(&Type::NUMERIC, &numeric(-1, 0, &[25])).unwrap();
        assert!((n.0 - 0.0025).abs() < 1e-12);

        let zero = Numeric::from_sql(&Type::NUMERIC, &numeric(0, 0, &[])).unwrap();
        assert!(zero.0.abs() < f64::EPSILON);

        let nan = Numeric::from_sql(&Type::NUMERIC, &numeric(0, NUMERIC_NAN, &[])).unwrap();
        assert!(nan.0.is_nan());
    }

    #[test]
    fn truncated_numeric_is_an_error() {
        assert!(Numeric::from_sql(&Type::NUMERIC, &[0, 1]).is_err());
        let mut raw = numeric(0, 0, &[1, 2]);
        raw.pop();
        assert!(Numeric::from_sql(&Type::NUMERIC, &raw).is_err());
    }
}
