//! Columnar table: an Arrow `RecordBatch` paired with its logical schema.

use std::sync::Arc;

use arrow_array::{Array, ArrayRef, RecordBatch};

use colevo_core::error::{Error, Result};
use colevo_core::record::Scalar;
use colevo_core::schema::Schema;

use crate::arrow_types::{arrow_err, schema_from_arrow, schema_to_arrow};
use crate::reader::ColumnReader;

/// Invariants (checked on construction):
/// - one column per schema field, in field order, with matching names;
/// - every column has `num_rows` values (guaranteed by `RecordBatch`);
/// - columns of non-nullable fields hold no nulls.
///
/// Column *types* are checked when values are extracted, so a foreign batch
/// with a mismatched column surfaces as `UnsupportedColumnType` there.
#[derive(Debug, Clone)]
pub struct Table {
    schema: Schema,
    batch: RecordBatch,
}

impl Table {
    /// Build from finished column arrays laid out in schema order.
    pub fn try_new(schema: Schema, columns: Vec<ArrayRef>) -> Result<Self> {
        if schema.is_empty() {
            return Err(Error::InvalidArgument("table schema has no fields".into()));
        }
        let arrow_schema = Arc::new(schema_to_arrow(&schema));
        let batch = RecordBatch::try_new(arrow_schema, columns).map_err(arrow_err)?;
        Self::from_record_batch(schema, batch)
    }

    /// Schema-shaped table with zero rows.
    pub fn empty(schema: Schema) -> Result<Self> {
        if schema.is_empty() {
            return Err(Error::InvalidArgument("table schema has no fields".into()));
        }
        let batch = RecordBatch::new_empty(Arc::new(schema_to_arrow(&schema)));
        Ok(Self { schema, batch })
    }

    /// Pair an existing batch (e.g. read back from storage) with a logical schema.
    pub fn from_record_batch(schema: Schema, batch: RecordBatch) -> Result<Self> {
        if batch.num_columns() == 0 {
            return Err(Error::InvalidArgument("record batch has no columns".into()));
        }
        if schema.len() != batch.num_columns() {
            return Err(Error::InvalidArgument(format!(
                "schema has {} fields but batch has {} columns",
                schema.len(),
                batch.num_columns()
            )));
        }

        let arrow_schema = batch.schema();
        for (idx, field) in schema.fields().iter().enumerate() {
            let column_name = arrow_schema.field(idx).name();
            if column_name != &field.name {
                return Err(Error::InvalidArgument(format!(
                    "column name mismatch at index {idx}: schema expects '{}' but batch has '{column_name}'",
                    field.name
                )));
            }
            let nulls = batch.column(idx).null_count();
            if !field.nullable && nulls > 0 {
                return Err(Error::InvalidArgument(format!(
                    "non-nullable column '{}' holds {nulls} nulls",
                    field.name
                )));
            }
        }

        Ok(Self { schema, batch })
    }

    /// Adopt a batch, deriving the logical schema from its Arrow schema.
    pub fn from_arrow(batch: RecordBatch) -> Result<Self> {
        let schema = schema_from_arrow(&batch.schema())?;
        Self::from_record_batch(schema, batch)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    pub fn column(&self, idx: usize) -> Option<&ArrayRef> {
        (idx < self.batch.num_columns()).then(|| self.batch.column(idx))
    }

    pub fn column_by_name(&self, name: &str) -> Option<&ArrayRef> {
        self.schema.index_of(name).map(|idx| self.batch.column(idx))
    }

    pub fn null_count(&self, idx: usize) -> Option<usize> {
        self.column(idx).map(|c| c.null_count())
    }

    /// Cell values of column `idx` in row order, nulls as `None`.
    ///
    /// Unlike row extraction, nulls are not replaced by zero values.
    pub fn column_values(
        &self,
        idx: usize,
    ) -> Result<impl Iterator<Item = Result<Option<Scalar>>> + '_> {
        let field = self.schema.field(idx).ok_or_else(|| {
            Error::InvalidArgument(format!("column index {idx} out of range"))
        })?;
        let reader = ColumnReader::new(field, self.batch.column(idx))?;
        Ok((0..self.num_rows()).map(move |row| {
            reader.read(row).map_err(|e| Error::SerializationFailed {
                key: format!("row {row}"),
                field: field.name.clone(),
                reason: e.to_string(),
            })
        }))
    }

    pub fn record_batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn into_record_batch(self) -> RecordBatch {
        self.batch
    }
}
