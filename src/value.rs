use std::fmt::Display;

use sqlx::{Any, QueryBuilder, Row, any::AnyRow};

use crate::{error::Result, query::PushToQuery};

/// The scalar kind of a column, used for decoding rows, checking filter values and emitting DDL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Bool,
    Integer,
    Real,
    Text,
    Blob,
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Bool => "bool",
                Self::Integer => "integer",
                Self::Real => "real",
                Self::Text => "text",
                Self::Blob => "blob",
            }
        )
    }
}

/// A dynamically typed SQL value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(e) => Some(*e),
            _ => None,
        }
    }

    /// Whether this value may be stored in, or compared against, a column of type `ty`.
    #[must_use]
    pub const fn fits(&self, ty: ColumnType) -> bool {
        matches!(
            (self, ty),
            (Self::Null, _)
                | (Self::Bool(_), ColumnType::Bool)
                | (Self::Int(_), ColumnType::Integer | ColumnType::Real)
                | (Self::Float(_), ColumnType::Real)
                | (Self::Text(_), ColumnType::Text)
                | (Self::Blob(_), ColumnType::Blob)
        )
    }

    /// Read the column labelled `label` from `row`, decoding it as `ty`.
    pub(crate) fn decode(row: &AnyRow, label: &str, ty: ColumnType) -> Result<Self> {
        let value = match ty {
            ColumnType::Bool => match row.try_get::<Option<bool>, _>(label) {
                Ok(e) => e.map(Self::Bool),
                // SQLite hands booleans back as plain integers outside of declared columns.
                Err(_) => row
                    .try_get::<Option<i64>, _>(label)?
                    .map(|e| Self::Bool(e != 0)),
            },
            ColumnType::Integer => row.try_get::<Option<i64>, _>(label)?.map(Self::Int),
            ColumnType::Real => row.try_get::<Option<f64>, _>(label)?.map(Self::Float),
            ColumnType::Text => row.try_get::<Option<String>, _>(label)?.map(Self::Text),
            ColumnType::Blob => row.try_get::<Option<Vec<u8>>, _>(label)?.map(Self::Blob),
        };

        Ok(value.unwrap_or(Self::Null))
    }

    /// Read a nullable integer key labelled `label` from `row`.
    pub(crate) fn decode_key(row: &AnyRow, label: &str) -> Result<Option<i64>> {
        Ok(row.try_get::<Option<i64>, _>(label)?)
    }
}

impl PushToQuery for Value {
    fn push_to(&self, builder: &mut QueryBuilder<'_, Any>) {
        match self {
            Self::Null => {
                builder.push("NULL");
            }
            Self::Bool(e) => {
                builder.push_bind(*e);
            }
            Self::Int(e) => {
                builder.push_bind(*e);
            }
            Self::Float(e) => {
                builder.push_bind(*e);
            }
            Self::Text(e) => {
                builder.push_bind(e.clone());
            }
            Self::Blob(e) => {
                builder.push_bind(e.clone());
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Blob(value)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Self>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// A Rust type that can be held by a scalar entity field.
pub trait SqlValue: Sized + Send + Sync + 'static {
    /// The column type this Rust type maps onto.
    const COLUMN_TYPE: ColumnType;

    /// Whether the column accepts `NULL`.
    const NULLABLE: bool = false;

    fn to_value(&self) -> Value;

    /// Convert a stored value back, returning `None` if the kinds do not match.
    fn from_value(value: Value) -> Option<Self>;
}

impl SqlValue for bool {
    const COLUMN_TYPE: ColumnType = ColumnType::Bool;

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Bool(e) => Some(e),
            Value::Int(e) => Some(e != 0),
            _ => None,
        }
    }
}

impl SqlValue for i64 {
    const COLUMN_TYPE: ColumnType = ColumnType::Integer;

    fn to_value(&self) -> Value {
        Value::Int(*self)
    }

    fn from_value(value: Value) -> Option<Self> {
        value.as_int()
    }
}

impl SqlValue for i32 {
    const COLUMN_TYPE: ColumnType = ColumnType::Integer;

    fn to_value(&self) -> Value {
        Value::Int((*self).into())
    }

    fn from_value(value: Value) -> Option<Self> {
        value.as_int().and_then(|e| e.try_into().ok())
    }
}

impl SqlValue for f64 {
    const COLUMN_TYPE: ColumnType = ColumnType::Real;

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    #[allow(clippy::cast_precision_loss)]
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Float(e) => Some(e),
            Value::Int(e) => Some(e as f64),
            _ => None,
        }
    }
}

impl SqlValue for String {
    const COLUMN_TYPE: ColumnType = ColumnType::Text;

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Text(e) => Some(e),
            _ => None,
        }
    }
}

impl SqlValue for Vec<u8> {
    const COLUMN_TYPE: ColumnType = ColumnType::Blob;

    fn to_value(&self) -> Value {
        Value::Blob(self.clone())
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Blob(e) => Some(e),
            _ => None,
        }
    }
}

impl<T> SqlValue for Option<T>
where
    T: SqlValue,
{
    const COLUMN_TYPE: ColumnType = T::COLUMN_TYPE;

    const NULLABLE: bool = true;

    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, SqlValue::to_value)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            e => T::from_value(e).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_fit_real_columns() {
        assert!(Value::Int(3).fits(ColumnType::Real));
        assert!(!Value::Float(3.5).fits(ColumnType::Integer));
        assert!(Value::Null.fits(ColumnType::Blob));
        assert!(!Value::from("x").fits(ColumnType::Integer));
    }

    #[test]
    fn optional_values_round_through_null() {
        assert_eq!(Option::<i64>::None.to_value(), Value::Null);
        assert_eq!(Option::<i64>::from_value(Value::Null), Some(None));
        assert_eq!(Option::<i64>::from_value(Value::Int(4)), Some(Some(4)));
        assert_eq!(Option::<i64>::from_value(Value::from("4")), None);
    }

    #[test]
    fn narrow_integers_reject_overflow() {
        assert_eq!(i32::from_value(Value::Int(i64::MAX)), None);
        assert_eq!(i32::from_value(Value::Int(12)), Some(12));
    }
}
