//! Mapping result rows onto `serde` types.
//!
//! Struct targets are matched field by field: each field name the type declares is passed
//! through the active [`NameConvention`] and the resulting column is looked up in the row.
//! Missing columns are left out (so `Option` fields become `None`), extra columns are
//! ignored. Map targets are keyed by raw column names, tuples and sequences take the columns
//! in order, and anything else must come from a single-column row.
//!
//! ```rust
//! use std::sync::Arc;
//! use serde::Deserialize;
//! use sql_facade::prelude::*;
//! use sql_facade::record::from_row;
//!
//! #[derive(Deserialize)]
//! #[serde(rename_all = "PascalCase")]
//! struct Person {
//!     first_name: String,
//!     age: Option<i64>,
//! }
//!
//! let row = CustomDbRow::new(
//!     Arc::new(vec!["first_name".into(), "age".into()]),
//!     vec![RowValues::Text("Ada".into()), RowValues::Null],
//! );
//! let person: Person = from_row(&row, NameConvention::UnderScore)?;
//! assert_eq!(person.first_name, "Ada");
//! assert_eq!(person.age, None);
//! # Ok::<(), SqlFacadeError>(())
//! ```

use std::fmt;

use serde::de::value::{Error as DeError, MapDeserializer, SeqDeserializer};
use serde::de::{self, DeserializeOwned, Deserializer, IntoDeserializer, Visitor};
use serde::forward_to_deserialize_any;

use crate::error::SqlFacadeError;
use crate::naming::NameConvention;
use crate::results::{CustomDbRow, ResultSet};
use crate::types::RowValues;

/// Map one row onto `T`.
///
/// # Errors
/// Returns `SqlFacadeError::Mapping` if a column cannot be converted into the target field.
pub fn from_row<T: DeserializeOwned>(
    row: &CustomDbRow,
    convention: NameConvention,
) -> Result<T, SqlFacadeError> {
    let result: Result<T, DeError> = match probe_shape::<T>() {
        Shape::Struct(fields) => {
            let entries = fields.iter().filter_map(|field| {
                let column = convention.apply(field);
                row.get(&column).map(|value| (*field, ColumnValue(value)))
            });
            T::deserialize(MapDeserializer::new(entries))
        }
        Shape::Map => T::deserialize(MapDeserializer::new(
            row.iter().map(|(name, value)| (name, ColumnValue(value))),
        )),
        Shape::Seq => T::deserialize(SeqDeserializer::new(row.rows.iter().map(ColumnValue))),
        Shape::Scalar => match row.rows.as_slice() {
            [value] => T::deserialize(ColumnValue(value)),
            other => Err(de::Error::custom(format!(
                "expected a single column, found {}",
                other.len()
            ))),
        },
    };
    result.map_err(|e| SqlFacadeError::Mapping(e.to_string()))
}

/// Map every row of a result set onto `T`.
///
/// # Errors
/// Returns the first mapping failure.
pub fn from_result_set<T: DeserializeOwned>(
    rs: &ResultSet,
    convention: NameConvention,
) -> Result<Vec<T>, SqlFacadeError> {
    rs.results
        .iter()
        .map(|row| from_row(row, convention))
        .collect()
}

/// One column value viewed as a `serde` deserializer.
#[derive(Clone, Copy)]
struct ColumnValue<'a>(&'a RowValues);

impl<'de> IntoDeserializer<'de, DeError> for ColumnValue<'_> {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

impl<'de> Deserializer<'de> for ColumnValue<'_> {
    type Error = DeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        match self.0 {
            RowValues::Int(i) => visitor.visit_i64(*i),
            RowValues::Float(f) => visitor.visit_f64(*f),
            RowValues::Text(s) => visitor.visit_str(s),
            RowValues::Bool(b) => visitor.visit_bool(*b),
            // chrono's `FromStr` format, so `NaiveDateTime` fields round-trip.
            RowValues::Timestamp(ts) => {
                visitor.visit_string(ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
            }
            RowValues::Null => visitor.visit_unit(),
            RowValues::JSON(json) => json
                .clone()
                .deserialize_any(visitor)
                .map_err(de::Error::custom),
            RowValues::Blob(bytes) => {
                let mut seq = SeqDeserializer::<_, DeError>::new(bytes.iter().copied());
                let value = visitor.visit_seq(&mut seq)?;
                seq.end()?;
                Ok(value)
            }
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        match self.0 {
            // SQLite has no boolean storage class.
            RowValues::Int(i) => visitor.visit_bool(*i != 0),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        match self.0 {
            RowValues::Null | RowValues::JSON(serde_json::Value::Null) => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        match self.0 {
            RowValues::Blob(bytes) => visitor.visit_bytes(bytes),
            RowValues::Text(s) => visitor.visit_bytes(s.as_bytes()),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DeError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DeError> {
        match self.0 {
            RowValues::Text(s) => {
                visitor.visit_enum(IntoDeserializer::<DeError>::into_deserializer(s.as_str()))
            }
            RowValues::JSON(json) => json
                .clone()
                .deserialize_enum(name, variants, visitor)
                .map_err(de::Error::custom),
            _ => self.deserialize_any(visitor),
        }
    }

    forward_to_deserialize_any! {
        i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        unit unit_struct seq tuple tuple_struct map struct identifier ignored_any
    }
}

/// What a target type asks its deserializer for.
enum Shape {
    Struct(&'static [&'static str]),
    Map,
    Seq,
    Scalar,
}

fn probe_shape<T: DeserializeOwned>() -> Shape {
    match T::deserialize(ShapeProbe) {
        Err(ProbeStop(Some(shape))) => shape,
        _ => Shape::Scalar,
    }
}

/// Deserializer that never yields data; it stops at the first request and reports its shape.
struct ShapeProbe;

struct ProbeStop(Option<Shape>);

impl fmt::Debug for ProbeStop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ProbeStop")
    }
}

impl fmt::Display for ProbeStop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("shape probe finished")
    }
}

impl std::error::Error for ProbeStop {}

impl de::Error for ProbeStop {
    fn custom<T: fmt::Display>(_msg: T) -> Self {
        ProbeStop(None)
    }
}

impl<'de> Deserializer<'de> for ShapeProbe {
    type Error = ProbeStop;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, ProbeStop> {
        Err(ProbeStop(Some(Shape::Scalar)))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, ProbeStop> {
        Err(ProbeStop(Some(Shape::Struct(fields))))
    }

    fn deserialize_map<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, ProbeStop> {
        Err(ProbeStop(Some(Shape::Map)))
    }

    fn deserialize_seq<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, ProbeStop> {
        Err(ProbeStop(Some(Shape::Seq)))
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value, ProbeStop> {
        Err(ProbeStop(Some(Shape::Seq)))
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value, ProbeStop> {
        Err(ProbeStop(Some(Shape::Seq)))
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct enum identifier ignored_any
    }
}
