//! Typed column builders and scalar coercion for the row -> column direction.

use std::sync::Arc;

use arrow_array::builder::{
    BooleanBuilder, Float32Builder, Float64Builder, Int32Builder, Int64Builder,
    LargeStringBuilder, StringBuilder,
};
use arrow_array::ArrayRef;

use colevo_core::record::Scalar;
use colevo_core::schema::DataType;

/// Why a single cell could not be appended.
#[derive(Debug)]
pub(crate) enum CellError {
    /// Scalar kind (or out-of-range value) that the declared type cannot hold.
    Mismatch(String),
    Json(serde_json::Error),
}

/// Coerce a record value to the canonical scalar for `dt`.
///
/// Integer and float widening is allowed; integers into float columns,
/// `i64 -> i32` and `f64 -> f32` only when the value fits. JSON columns
/// accept any non-null scalar.
pub(crate) fn coerce(dt: DataType, value: &Scalar) -> Result<Scalar, CellError> {
    let mismatch = || CellError::Mismatch(value.kind().to_string());
    let coerced = match (dt, value) {
        (DataType::Int32, Scalar::I32(v)) => Scalar::I32(*v),
        (DataType::Int32, Scalar::I64(v)) => Scalar::I32(
            i32::try_from(*v).map_err(|_| CellError::Mismatch(format!("i64 {v} out of int32 range")))?,
        ),
        (DataType::Int64, Scalar::I32(v)) => Scalar::I64(i64::from(*v)),
        (DataType::Int64, Scalar::I64(v)) => Scalar::I64(*v),
        (DataType::Float32, Scalar::F32(v)) => Scalar::F32(*v),
        (DataType::Float32, Scalar::F64(v)) => {
            let narrowed = *v as f32;
            if v.is_finite() && !narrowed.is_finite() {
                return Err(CellError::Mismatch(format!("f64 {v} out of float32 range")));
            }
            Scalar::F32(narrowed)
        }
        (DataType::Float32, Scalar::I32(v)) => Scalar::F32(exact_f32(i64::from(*v))?),
        (DataType::Float32, Scalar::I64(v)) => Scalar::F32(exact_f32(*v)?),
        (DataType::Float64, Scalar::F32(v)) => Scalar::F64(f64::from(*v)),
        (DataType::Float64, Scalar::F64(v)) => Scalar::F64(*v),
        (DataType::Float64, Scalar::I32(v)) => Scalar::F64(f64::from(*v)),
        (DataType::Float64, Scalar::I64(v)) => Scalar::F64(exact_f64(*v)?),
        (DataType::Boolean, Scalar::Bool(v)) => Scalar::Bool(*v),
        (DataType::String | DataType::LargeString, Scalar::Str(s)) => Scalar::Str(s.clone()),
        (DataType::SerializedJson, Scalar::Null) => return Err(mismatch()),
        (DataType::SerializedJson, other) => Scalar::Json(other.to_json()),
        _ => return Err(mismatch()),
    };
    Ok(coerced)
}

// Integers go into float columns only when the float holds them exactly.
fn exact_f32(v: i64) -> Result<f32, CellError> {
    let f = v as f32;
    if f as i128 == i128::from(v) {
        Ok(f)
    } else {
        Err(CellError::Mismatch(format!("integer {v} not exact as float32")))
    }
}

fn exact_f64(v: i64) -> Result<f64, CellError> {
    let f = v as f64;
    if f as i128 == i128::from(v) {
        Ok(f)
    } else {
        Err(CellError::Mismatch(format!("integer {v} not exact as float64")))
    }
}

/// One builder per field; the variant is fixed by the field's `DataType`.
pub(crate) enum ColumnBuilder {
    Int32(Int32Builder),
    Int64(Int64Builder),
    Float32(Float32Builder),
    Float64(Float64Builder),
    Boolean(BooleanBuilder),
    Utf8(StringBuilder),
    LargeUtf8(LargeStringBuilder),
    Json(StringBuilder),
}

impl ColumnBuilder {
    pub(crate) fn new(dt: DataType, rows: usize) -> Self {
        match dt {
            DataType::Int32 => ColumnBuilder::Int32(Int32Builder::with_capacity(rows)),
            DataType::Int64 => ColumnBuilder::Int64(Int64Builder::with_capacity(rows)),
            DataType::Float32 => ColumnBuilder::Float32(Float32Builder::with_capacity(rows)),
            DataType::Float64 => ColumnBuilder::Float64(Float64Builder::with_capacity(rows)),
            DataType::Boolean => ColumnBuilder::Boolean(BooleanBuilder::with_capacity(rows)),
            // Estimate avg string length
            DataType::String => ColumnBuilder::Utf8(StringBuilder::with_capacity(rows, rows * 16)),
            DataType::LargeString => {
                ColumnBuilder::LargeUtf8(LargeStringBuilder::with_capacity(rows, rows * 16))
            }
            DataType::SerializedJson => {
                ColumnBuilder::Json(StringBuilder::with_capacity(rows, rows * 64))
            }
        }
    }

    pub(crate) fn append_null(&mut self) {
        match self {
            ColumnBuilder::Int32(b) => b.append_null(),
            ColumnBuilder::Int64(b) => b.append_null(),
            ColumnBuilder::Float32(b) => b.append_null(),
            ColumnBuilder::Float64(b) => b.append_null(),
            ColumnBuilder::Boolean(b) => b.append_null(),
            ColumnBuilder::Utf8(b) => b.append_null(),
            ColumnBuilder::LargeUtf8(b) => b.append_null(),
            ColumnBuilder::Json(b) => b.append_null(),
        }
    }

    /// Append a value already passed through [`coerce`] for this column's type.
    pub(crate) fn append(&mut self, value: &Scalar) -> Result<(), CellError> {
        match (self, value) {
            (ColumnBuilder::Int32(b), Scalar::I32(v)) => b.append_value(*v),
            (ColumnBuilder::Int64(b), Scalar::I64(v)) => b.append_value(*v),
            (ColumnBuilder::Float32(b), Scalar::F32(v)) => b.append_value(*v),
            (ColumnBuilder::Float64(b), Scalar::F64(v)) => b.append_value(*v),
            (ColumnBuilder::Boolean(b), Scalar::Bool(v)) => b.append_value(*v),
            (ColumnBuilder::Utf8(b), Scalar::Str(s)) => b.append_value(s),
            (ColumnBuilder::LargeUtf8(b), Scalar::Str(s)) => b.append_value(s),
            (ColumnBuilder::Json(b), Scalar::Json(v)) => {
                let text = serde_json::to_string(v).map_err(CellError::Json)?;
                b.append_value(text);
            }
            (_, other) => return Err(CellError::Mismatch(other.kind().to_string())),
        }
        Ok(())
    }

    pub(crate) fn finish(self) -> ArrayRef {
        match self {
            ColumnBuilder::Int32(mut b) => Arc::new(b.finish()),
            ColumnBuilder::Int64(mut b) => Arc::new(b.finish()),
            ColumnBuilder::Float32(mut b) => Arc::new(b.finish()),
            ColumnBuilder::Float64(mut b) => Arc::new(b.finish()),
            ColumnBuilder::Boolean(mut b) => Arc::new(b.finish()),
            ColumnBuilder::Utf8(mut b) => Arc::new(b.finish()),
            ColumnBuilder::LargeUtf8(mut b) => Arc::new(b.finish()),
            ColumnBuilder::Json(mut b) => Arc::new(b.finish()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_array::Array;
    use serde_json::json;

    #[test]
    fn widening_coercions() {
        assert_eq!(coerce(DataType::Int64, &Scalar::I32(7)).unwrap(), Scalar::I64(7));
        assert_eq!(coerce(DataType::Float64, &Scalar::F32(1.5)).unwrap(), Scalar::F64(1.5));
        assert_eq!(coerce(DataType::Float64, &Scalar::I64(3)).unwrap(), Scalar::F64(3.0));
    }

    #[test]
    fn checked_narrowing() {
        assert_eq!(coerce(DataType::Int32, &Scalar::I64(88)).unwrap(), Scalar::I32(88));
        assert!(matches!(
            coerce(DataType::Int32, &Scalar::I64(i64::MAX)),
            Err(CellError::Mismatch(msg)) if msg.contains("out of int32 range")
        ));
        assert!(coerce(DataType::Float32, &Scalar::F64(f64::MAX)).is_err());
    }

    #[test]
    fn integers_enter_float_columns_only_when_exact() {
        assert_eq!(coerce(DataType::Float32, &Scalar::I32(1 << 24)).unwrap(), Scalar::F32(16_777_216.0));
        assert_eq!(coerce(DataType::Float64, &Scalar::I64(1 << 53)).unwrap(), Scalar::F64(9_007_199_254_740_992.0));
        assert_eq!(coerce(DataType::Float64, &Scalar::I64(-90)).unwrap(), Scalar::F64(-90.0));
        assert!(matches!(
            coerce(DataType::Float32, &Scalar::I32((1 << 24) + 1)),
            Err(CellError::Mismatch(_))
        ));
        assert!(matches!(
            coerce(DataType::Float32, &Scalar::I64(i64::MAX)),
            Err(CellError::Mismatch(_))
        ));
        assert!(matches!(
            coerce(DataType::Float64, &Scalar::I64((1 << 53) + 1)),
            Err(CellError::Mismatch(_))
        ));
        assert!(matches!(
            coerce(DataType::Float64, &Scalar::I64(i64::MAX)),
            Err(CellError::Mismatch(_))
        ));
    }

    #[test]
    fn cross_kind_values_rejected() {
        assert!(coerce(DataType::Int32, &Scalar::Str("12".into())).is_err());
        assert!(coerce(DataType::String, &Scalar::I32(12)).is_err());
        assert!(coerce(DataType::Boolean, &Scalar::I32(1)).is_err());
    }

    #[test]
    fn json_columns_accept_any_value() {
        assert_eq!(
            coerce(DataType::SerializedJson, &Scalar::Str("x".into())).unwrap(),
            Scalar::Json(json!("x"))
        );
        let mut b = ColumnBuilder::new(DataType::SerializedJson, 1);
        b.append(&Scalar::Json(json!({"b": 1, "a": [1, 2]}))).unwrap();
        assert_eq!(b.finish().len(), 1);
    }

    #[test]
    fn builder_rejects_uncoerced_values() {
        let mut b = ColumnBuilder::new(DataType::Int64, 1);
        assert!(matches!(b.append(&Scalar::I32(1)), Err(CellError::Mismatch(_))));
    }
}
