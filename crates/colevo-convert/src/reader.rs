//! Typed column readers for the column -> row direction.
//!
//! Each column is downcast once, up front, against the declared field type.
//! A runtime array that does not match is `UnsupportedColumnType`.

use arrow_array::{
    Array, ArrayRef, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    LargeStringArray, StringArray,
};

use colevo_core::error::{Error, Result};
use colevo_core::record::Scalar;
use colevo_core::schema::{DataType, Field};

pub(crate) enum ColumnReader<'a> {
    Int32(&'a Int32Array),
    Int64(&'a Int64Array),
    Float32(&'a Float32Array),
    Float64(&'a Float64Array),
    Boolean(&'a BooleanArray),
    Utf8(&'a StringArray),
    LargeUtf8(&'a LargeStringArray),
    Json(&'a StringArray),
}

fn downcast<'a, T: 'static>(field: &Field, array: &'a ArrayRef) -> Result<&'a T> {
    array
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| Error::UnsupportedColumnType {
            field: field.name.clone(),
            declared: field.data_type,
            actual: array.data_type().to_string(),
        })
}

impl<'a> ColumnReader<'a> {
    pub(crate) fn new(field: &Field, array: &'a ArrayRef) -> Result<Self> {
        Ok(match field.data_type {
            DataType::Int32 => ColumnReader::Int32(downcast(field, array)?),
            DataType::Int64 => ColumnReader::Int64(downcast(field, array)?),
            DataType::Float32 => ColumnReader::Float32(downcast(field, array)?),
            DataType::Float64 => ColumnReader::Float64(downcast(field, array)?),
            DataType::Boolean => ColumnReader::Boolean(downcast(field, array)?),
            DataType::String => ColumnReader::Utf8(downcast(field, array)?),
            DataType::LargeString => ColumnReader::LargeUtf8(downcast(field, array)?),
            DataType::SerializedJson => ColumnReader::Json(downcast(field, array)?),
        })
    }

    fn is_null(&self, row: usize) -> bool {
        match self {
            ColumnReader::Int32(a) => a.is_null(row),
            ColumnReader::Int64(a) => a.is_null(row),
            ColumnReader::Float32(a) => a.is_null(row),
            ColumnReader::Float64(a) => a.is_null(row),
            ColumnReader::Boolean(a) => a.is_null(row),
            ColumnReader::Utf8(a) => a.is_null(row),
            ColumnReader::LargeUtf8(a) => a.is_null(row),
            ColumnReader::Json(a) => a.is_null(row),
        }
    }

    /// Read one cell. Nulls come back as `None`; JSON text is parsed.
    pub(crate) fn read(&self, row: usize) -> std::result::Result<Option<Scalar>, serde_json::Error> {
        if self.is_null(row) {
            return Ok(None);
        }
        let value = match self {
            ColumnReader::Int32(a) => Scalar::I32(a.value(row)),
            ColumnReader::Int64(a) => Scalar::I64(a.value(row)),
            ColumnReader::Float32(a) => Scalar::F32(a.value(row)),
            ColumnReader::Float64(a) => Scalar::F64(a.value(row)),
            ColumnReader::Boolean(a) => Scalar::Bool(a.value(row)),
            ColumnReader::Utf8(a) => Scalar::Str(a.value(row).to_string()),
            ColumnReader::LargeUtf8(a) => Scalar::Str(a.value(row).to_string()),
            ColumnReader::Json(a) => Scalar::Json(serde_json::from_str(a.value(row))?),
        };
        Ok(Some(value))
    }
}
