//! Mapping between the logical `DataType` set and Arrow types.
//!
//! `SerializedJson` has no Arrow counterpart of its own: it is stored as
//! Utf8 and tagged through field metadata so the logical type survives a
//! trip through a plain `RecordBatch`.

use std::collections::HashMap;

use arrow_schema::{ArrowError, DataType as ArrowDataType, Field as ArrowField, Schema as ArrowSchema};

use colevo_core::error::{Error, Result};
use colevo_core::schema::{DataType, Field, Schema};

/// Field-metadata key carrying the logical type of tagged columns.
pub const LOGICAL_TYPE_META_KEY: &str = "colevo.logical_type";
const JSON_LOGICAL_TYPE: &str = "json";

/// Convert a colevo `DataType` to the Arrow type its column is stored as.
pub fn data_type_to_arrow(dt: DataType) -> ArrowDataType {
    match dt {
        DataType::Int32 => ArrowDataType::Int32,
        DataType::Int64 => ArrowDataType::Int64,
        DataType::Float32 => ArrowDataType::Float32,
        DataType::Float64 => ArrowDataType::Float64,
        DataType::Boolean => ArrowDataType::Boolean,
        DataType::String => ArrowDataType::Utf8,
        DataType::LargeString => ArrowDataType::LargeUtf8,
        DataType::SerializedJson => ArrowDataType::Utf8,
    }
}

pub fn field_to_arrow(field: &Field) -> ArrowField {
    let arrow = ArrowField::new(
        field.name.clone(),
        data_type_to_arrow(field.data_type),
        field.nullable,
    );
    match field.data_type {
        DataType::SerializedJson => arrow.with_metadata(HashMap::from([(
            LOGICAL_TYPE_META_KEY.to_string(),
            JSON_LOGICAL_TYPE.to_string(),
        )])),
        _ => arrow,
    }
}

/// Convert a colevo `Schema` to an Arrow `Schema`.
pub fn schema_to_arrow(schema: &Schema) -> ArrowSchema {
    ArrowSchema::new(schema.fields().iter().map(field_to_arrow).collect::<Vec<_>>())
}

/// Recover the logical field from an Arrow field.
///
/// Arrow types outside the closed set are `UnsupportedColumnType`.
pub fn field_from_arrow(field: &ArrowField) -> Result<Field> {
    let tagged_json = field
        .metadata()
        .get(LOGICAL_TYPE_META_KEY)
        .is_some_and(|v| v == JSON_LOGICAL_TYPE);

    let data_type = match field.data_type() {
        ArrowDataType::Utf8 if tagged_json => DataType::SerializedJson,
        ArrowDataType::Int32 => DataType::Int32,
        ArrowDataType::Int64 => DataType::Int64,
        ArrowDataType::Float32 => DataType::Float32,
        ArrowDataType::Float64 => DataType::Float64,
        ArrowDataType::Boolean => DataType::Boolean,
        ArrowDataType::Utf8 => DataType::String,
        ArrowDataType::LargeUtf8 => DataType::LargeString,
        other => {
            return Err(Error::UnsupportedColumnType {
                field: field.name().clone(),
                // Closest declared meaning for an unmapped column.
                declared: DataType::String,
                actual: other.to_string(),
            })
        }
    };
    Ok(Field::new(field.name().clone(), data_type, field.is_nullable()))
}

pub fn schema_from_arrow(schema: &ArrowSchema) -> Result<Schema> {
    let fields = schema
        .fields()
        .iter()
        .map(|f| field_from_arrow(f))
        .collect::<Result<Vec<_>>>()?;
    Schema::try_new(fields)
}

pub(crate) fn arrow_err(e: ArrowError) -> Error {
    Error::Arrow(e.to_string())
}
