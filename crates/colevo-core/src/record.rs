//! Row-oriented domain records.
//!
//! A `Record` is a flat name -> `Scalar` map with no schema attached. The
//! conversion engine projects records onto a schema's column layout; the
//! record itself never knows which schema it will be stored under.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::schema::DataType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    /// Structured value (map, list, list of maps) kept as a JSON tree.
    Json(Value),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Short variant name, used in mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Scalar::Null => "null",
            Scalar::Bool(_) => "bool",
            Scalar::I32(_) => "i32",
            Scalar::I64(_) => "i64",
            Scalar::F32(_) => "f32",
            Scalar::F64(_) => "f64",
            Scalar::Str(_) => "string",
            Scalar::Json(_) => "json",
        }
    }

    /// The value a null cell reads back as for a column of type `dt`.
    pub fn zero_for(dt: DataType) -> Scalar {
        match dt {
            DataType::Int32 => Scalar::I32(0),
            DataType::Int64 => Scalar::I64(0),
            DataType::Float32 => Scalar::F32(0.0),
            DataType::Float64 => Scalar::F64(0.0),
            DataType::Boolean => Scalar::Bool(false),
            DataType::String | DataType::LargeString => Scalar::Str(String::new()),
            DataType::SerializedJson => Scalar::Json(Value::Null),
        }
    }

    /// Domain "not applicable" sentinel: empty string, numeric zero, `false`.
    pub fn is_empty_sentinel(&self) -> bool {
        match self {
            Scalar::Null => true,
            Scalar::Bool(b) => !*b,
            Scalar::I32(v) => *v == 0,
            Scalar::I64(v) => *v == 0,
            Scalar::F32(v) => *v == 0.0,
            Scalar::F64(v) => *v == 0.0,
            Scalar::Str(s) => s.is_empty(),
            Scalar::Json(v) => v.is_null(),
        }
    }

    /// Untyped mapping from JSON; the engine coerces to the declared type later.
    pub fn from_json(value: &Value) -> Scalar {
        match value {
            Value::Null => Scalar::Null,
            Value::Bool(b) => Scalar::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Scalar::I64(i),
                None => Scalar::F64(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => Scalar::Str(s.clone()),
            Value::Array(_) | Value::Object(_) => Scalar::Json(value.clone()),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::I32(v) => Value::from(*v),
            Scalar::I64(v) => Value::from(*v),
            Scalar::F32(v) => serde_json::Number::from_f64(f64::from(*v))
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Scalar::F64(v) => serde_json::Number::from_f64(*v)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Scalar::Str(s) => Value::String(s.clone()),
            Scalar::Json(v) => v.clone(),
        }
    }

    /// Key-friendly rendering (no quotes around strings).
    pub fn render(&self) -> String {
        match self {
            Scalar::Str(s) => s.clone(),
            other => other.to_json().to_string(),
        }
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::I32(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::I64(v)
    }
}

impl From<f32> for Scalar {
    fn from(v: f32) -> Self {
        Scalar::F32(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::F64(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Str(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Str(v)
    }
}

impl From<Value> for Scalar {
    fn from(v: Value) -> Self {
        Scalar::Json(v)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    values: BTreeMap<String, Scalar>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Scalar>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Scalar> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Value of the primary-key field, rendered for error messages.
    pub fn key(&self, key_field: &str) -> Option<String> {
        self.values
            .get(key_field)
            .filter(|v| !v.is_null())
            .map(Scalar::render)
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| {
            Error::InvalidArgument(format!("record must be a JSON object, got {value}"))
        })?;
        Ok(Self {
            values: obj
                .iter()
                .map(|(k, v)| (k.clone(), Scalar::from_json(v)))
                .collect(),
        })
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl FromIterator<(String, Scalar)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Scalar)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
