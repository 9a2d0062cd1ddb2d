//! Runtime attribute values.
//!
//! Columns are not known at compile time, so attributes live in a map of
//! loosely typed scalars instead of struct fields. The scalar set matches
//! what the `Any` driver can hand back across backends.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::{Column, Row, any::AnyRow};

use crate::error::Error;

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    Null,
}

impl ScalarValue {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for ScalarValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<ScalarValue> for serde_json::Value {
    fn from(value: ScalarValue) -> Self {
        match value {
            ScalarValue::Int(v) => Self::from(v),
            ScalarValue::Float(v) => serde_json::Number::from_f64(v).map_or(Self::Null, Self::Number),
            ScalarValue::Text(v) => Self::String(v),
            ScalarValue::Bool(v) => Self::Bool(v),
            ScalarValue::Null => Self::Null,
        }
    }
}

impl From<serde_json::Value> for ScalarValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(v) => Self::Bool(v),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map_or_else(|| n.as_f64().map_or(Self::Null, Self::Float), Self::Int),
            serde_json::Value::String(v) => Self::Text(v),
            // Nested structures have no column representation; keep their
            // JSON rendering.
            other => Self::Text(other.to_string()),
        }
    }
}

/// The attribute bag of one entity instance, keyed by column name.
pub type Attributes = BTreeMap<String, ScalarValue>;

/// Decode every column of `row` into a [`ScalarValue`].
///
/// The `Any` driver exposes no column type metadata worth trusting across
/// backends, so decoding probes the scalar types in a fixed order.
pub fn row_to_attributes(row: &AnyRow) -> Result<Attributes, Error> {
    let mut attributes = Attributes::new();

    for column in row.columns() {
        attributes.insert(column.name().to_string(), decode_column(row, column.ordinal())?);
    }

    Ok(attributes)
}

fn decode_column(row: &AnyRow, index: usize) -> Result<ScalarValue, Error> {
    if let Ok(value) = row.try_get::<Option<i64>, _>(index) {
        return Ok(value.map_or(ScalarValue::Null, ScalarValue::Int));
    }

    if let Ok(value) = row.try_get::<Option<f64>, _>(index) {
        return Ok(value.map_or(ScalarValue::Null, ScalarValue::Float));
    }

    if let Ok(value) = row.try_get::<Option<bool>, _>(index) {
        return Ok(value.map_or(ScalarValue::Null, ScalarValue::Bool));
    }

    let value = row.try_get::<Option<String>, _>(index)?;

    Ok(value.map_or(ScalarValue::Null, ScalarValue::Text))
}

#[cfg(test)]
mod tests {
    use super::{Attributes, ScalarValue};

    #[test]
    fn test_from_rust_scalars() {
        assert_eq!(ScalarValue::from(7_i64), ScalarValue::Int(7));
        assert_eq!(ScalarValue::from(7_i32), ScalarValue::Int(7));
        assert_eq!(ScalarValue::from(0.5), ScalarValue::Float(0.5));
        assert_eq!(ScalarValue::from(true), ScalarValue::Bool(true));
        assert_eq!(ScalarValue::from("bolt"), ScalarValue::Text("bolt".to_string()));
    }

    #[test]
    fn test_attributes_serialize_untagged() {
        let mut attributes = Attributes::new();
        attributes.insert("name".to_string(), "bolt".into());
        attributes.insert("qty".to_string(), 12_i64.into());
        attributes.insert("retired_at".to_string(), ScalarValue::Null);

        let rendered = serde_json::to_string(&attributes).unwrap();

        assert_eq!(rendered, r#"{"name":"bolt","qty":12,"retired_at":null}"#);
    }

    #[test]
    fn test_json_number_prefers_int() {
        assert_eq!(ScalarValue::from(serde_json::json!(3)), ScalarValue::Int(3));
        assert_eq!(ScalarValue::from(serde_json::json!(3.5)), ScalarValue::Float(3.5));
    }

    #[test]
    fn test_nan_float_renders_as_json_null() {
        let value = serde_json::Value::from(ScalarValue::Float(f64::NAN));

        assert_eq!(value, serde_json::Value::Null);
    }
}
