//! Logical schema types. Pure data; no Arrow dependency here.
//!
//! `colevo-convert` maps these onto Arrow arrays. Every consumer matches on
//! `DataType` exhaustively, so adding a variant forces the builder, the
//! reader, and the compatibility table to be updated together.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::hash::{hash_str, Hash256};

/// Closed set of column types the engine knows how to materialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    #[serde(rename = "int32")]
    Int32,
    #[serde(rename = "int64")]
    Int64,
    #[serde(rename = "float32")]
    Float32,
    #[serde(rename = "float64")]
    Float64,
    #[serde(rename = "bool")]
    Boolean,
    #[serde(rename = "utf8")]
    String,
    #[serde(rename = "large_utf8")]
    LargeString,
    /// Nested maps/lists with no native columnar form, stored as JSON text.
    #[serde(rename = "json")]
    SerializedJson,
}

impl DataType {
    pub const ALL: [DataType; 8] = [
        DataType::Int32,
        DataType::Int64,
        DataType::Float32,
        DataType::Float64,
        DataType::Boolean,
        DataType::String,
        DataType::LargeString,
        DataType::SerializedJson,
    ];

    /// Stable name used in persisted documents and fingerprints.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Int32 => "int32",
            DataType::Int64 => "int64",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
            DataType::Boolean => "bool",
            DataType::String => "utf8",
            DataType::LargeString => "large_utf8",
            DataType::SerializedJson => "json",
        }
    }

    /// Whether stored values of `self` can be read as `target` without a rewrite.
    ///
    /// Fixed table: identity, `Int32 -> Int64`, `Float32 -> Float64`,
    /// `String -> LargeString`. Never the reverse.
    pub fn can_promote_to(&self, target: DataType) -> bool {
        if *self == target {
            return true;
        }
        matches!(
            (self, target),
            (DataType::Int32, DataType::Int64)
                | (DataType::Float32, DataType::Float64)
                | (DataType::String, DataType::LargeString)
        )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DataType::ALL
            .iter()
            .copied()
            .find(|dt| dt.as_str() == s)
            .ok_or_else(|| Error::UnknownType(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
    pub nullable: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: DataType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable,
        }
    }

    /// `name:type:nullable;` fragment of the schema fingerprint.
    fn fingerprint_fragment(&self) -> String {
        format!("{}:{}:{};", self.name, self.data_type, self.nullable)
    }
}

/// Ordered, immutable list of fields. Field order defines column position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SchemaDoc")]
pub struct Schema {
    fields: Vec<Field>,
}

/// Unchecked wire form; converted through `Schema::try_new` on load.
#[derive(Deserialize)]
struct SchemaDoc {
    fields: Vec<Field>,
}

impl TryFrom<SchemaDoc> for Schema {
    type Error = Error;

    fn try_from(doc: SchemaDoc) -> Result<Self> {
        Schema::try_new(doc.fields)
    }
}

impl Schema {
    /// Build a schema, rejecting empty or duplicate field names.
    pub fn try_new(fields: Vec<Field>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(fields.len());
        for field in &fields {
            if field.name.is_empty() {
                return Err(Error::InvalidArgument("field name cannot be empty".into()));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(Error::DuplicateField(field.name.clone()));
            }
        }
        Ok(Self { fields })
    }

    /// For static schemas whose names are known to be unique.
    pub(crate) fn from_unique_fields(fields: Vec<Field>) -> Self {
        debug_assert!(Schema::try_new(fields.clone()).is_ok());
        Self { fields }
    }

    /// Zero-field schema. Validation treats it as an absent schema.
    pub fn empty() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, idx: usize) -> Option<&Field> {
        self.fields.get(idx)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Deterministic identity string: `name:type:nullable;` per field, in order.
    pub fn fingerprint(&self) -> String {
        self.fields.iter().map(Field::fingerprint_fragment).collect()
    }

    /// BLAKE3 digest of the fingerprint; handy for logs and map keys.
    pub fn digest(&self) -> Hash256 {
        hash_str(&self.fingerprint())
    }

    /// Cheap identity check through the fingerprint.
    pub fn same_shape(&self, other: &Schema) -> bool {
        self.fingerprint() == other.fingerprint()
    }
}
