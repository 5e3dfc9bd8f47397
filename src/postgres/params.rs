use std::error::Error;

use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};
use tokio_util::bytes;

use crate::types::RowValues;

/// Borrowed Postgres parameter list.
pub struct Params<'a> {
    references: Vec<&'a (dyn ToSql + Sync)>,
}

impl<'a> Params<'a> {
    #[must_use]
    pub fn convert(params: &'a [RowValues]) -> Params<'a> {
        let references = params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
        Params { references }
    }

    #[must_use]
    pub fn as_refs(&self) -> &[&(dyn ToSql + Sync)] {
        &self.references
    }
}

impl ToSql for RowValues {
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut bytes::BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        // The server decodes the bytes as the parameter's type, so every value is written in
        // exactly that type's wire format or refused.
        match (self, ty) {
            (RowValues::Null, _) => Ok(IsNull::Yes),
            (RowValues::Int(i), &Type::INT2) => i16::try_from(*i)?.to_sql(ty, out),
            (RowValues::Int(i), &Type::INT4) => i32::try_from(*i)?.to_sql(ty, out),
            (RowValues::Int(i), &Type::INT8) => i.to_sql(ty, out),
            (RowValues::Int(i), &Type::FLOAT4) => (*i as f32).to_sql(ty, out),
            (RowValues::Int(i), &Type::FLOAT8) => (*i as f64).to_sql(ty, out),
            (RowValues::Float(f), &Type::FLOAT4) => (*f as f32).to_sql(ty, out),
            (RowValues::Float(f), &Type::FLOAT8) => f.to_sql(ty, out),
            (RowValues::Text(s), t) if is_text(t) => s.to_sql(ty, out),
            (RowValues::Bool(b), &Type::BOOL) => b.to_sql(ty, out),
            (RowValues::Timestamp(dt), &Type::TIMESTAMP) => dt.to_sql(ty, out),
            (RowValues::Timestamp(dt), &Type::TIMESTAMPTZ) => dt.and_utc().to_sql(ty, out),
            (RowValues::Timestamp(dt), &Type::DATE) => dt.date().to_sql(ty, out),
            (RowValues::JSON(jsval), &Type::JSON | &Type::JSONB) => jsval.to_sql(ty, out),
            (RowValues::Blob(bytes), &Type::BYTEA) => bytes.to_sql(ty, out),
            (value, _) => Err(format!(
                "cannot bind {} parameter to postgres type {ty}",
                kind(value)
            )
            .into()),
        }
    }

    fn accepts(ty: &Type) -> bool {
        matches!(
            *ty,
            Type::INT2
                | Type::INT4
                | Type::INT8
                | Type::FLOAT4
                | Type::FLOAT8
                | Type::TEXT
                | Type::VARCHAR
                | Type::BPCHAR
                | Type::NAME
                | Type::UNKNOWN
                | Type::BOOL
                | Type::TIMESTAMP
                | Type::TIMESTAMPTZ
                | Type::DATE
                | Type::JSON
                | Type::JSONB
                | Type::BYTEA
        )
    }

    to_sql_checked!();
}

fn is_text(ty: &Type) -> bool {
    matches!(
        *ty,
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN
    )
}

fn kind(value: &RowValues) -> &'static str {
    match value {
        RowValues::Int(_) => "integer",
        RowValues::Float(_) => "float",
        RowValues::Text(_) => "text",
        RowValues::Bool(_) => "bool",
        RowValues::Timestamp(_) => "timestamp",
        RowValues::Null => "null",
        RowValues::JSON(_) => "json",
        RowValues::Blob(_) => "blob",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ints_are_narrowed_to_the_column_width() {
        let mut buf = bytes::BytesMut::new();
        RowValues::Int(7).to_sql(&Type::INT4, &mut buf).unwrap();
        assert_eq!(&buf[..], &7_i32.to_be_bytes());

        buf.clear();
        RowValues::Int(7).to_sql(&Type::INT2, &mut buf).unwrap();
        assert_eq!(&buf[..], &7_i16.to_be_bytes());

        buf.clear();
        assert!(
            RowValues::Int(i64::from(i32::MAX) + 1)
                .to_sql(&Type::INT4, &mut buf)
                .is_err()
        );
    }

    #[test]
    fn ints_bound_to_float_columns_are_converted() {
        let mut buf = bytes::BytesMut::new();
        RowValues::Int(2).to_sql(&Type::FLOAT8, &mut buf).unwrap();
        assert_eq!(&buf[..], &2.0_f64.to_be_bytes());

        buf.clear();
        RowValues::Int(2).to_sql(&Type::FLOAT4, &mut buf).unwrap();
        assert_eq!(&buf[..], &2.0_f32.to_be_bytes());

        buf.clear();
        RowValues::Float(2.5).to_sql(&Type::FLOAT4, &mut buf).unwrap();
        assert_eq!(&buf[..], &2.5_f32.to_be_bytes());
    }

    #[test]
    fn mismatched_types_are_refused() {
        let mut buf = bytes::BytesMut::new();
        for (value, ty) in [
            (RowValues::Float(2.5), Type::INT8),
            (RowValues::Float(2.5), Type::INT4),
            (RowValues::Int(1), Type::BOOL),
            (RowValues::Int(1), Type::TEXT),
            (RowValues::Bool(true), Type::INT4),
            (RowValues::Text("1".into()), Type::INT8),
            (RowValues::Text("{}".into()), Type::JSONB),
            (RowValues::Blob(vec![1, 2]), Type::TEXT),
        ] {
            let err = value.to_sql_checked(&ty, &mut buf).err().expect("expected bind error");
            assert!(err.to_string().contains("cannot bind"), "{value:?} as {ty}: {err}");
        }
        assert!(buf.is_empty());
    }

    #[test]
    fn text_binds_to_character_types() {
        let mut buf = bytes::BytesMut::new();
        RowValues::Text("ab".into())
            .to_sql(&Type::VARCHAR, &mut buf)
            .unwrap();
        assert_eq!(&buf[..], b"ab");
    }

    #[test]
    fn null_is_null_for_any_type() {
        let mut buf = bytes::BytesMut::new();
        assert!(matches!(
            RowValues::Null.to_sql(&Type::INT8, &mut buf).unwrap(),
            IsNull::Yes
        ));
    }
}
