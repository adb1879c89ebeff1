//! Row <-> columnar conversion.
//!
//! `to_table` projects schema-independent records onto a schema's column
//! layout; `from_table` / `rows` read them back. Any failing record or row
//! aborts the whole batch: builders are dropped and no partial table or
//! partial record list escapes.
//!
//! Nullable fields follow the domain's "empty means not applicable"
//! convention: `""`, numeric zero, and `false` are stored as nulls, and a
//! null reads back as the field's zero value. The round trip therefore does
//! not distinguish "explicitly empty" from "never set".

use colevo_core::config::EngineConfig;
use colevo_core::error::{Error, Result};
use colevo_core::player;
use colevo_core::record::{Record, Scalar};
use colevo_core::schema::{DataType, Field, Schema};

use crate::builder::{coerce, CellError, ColumnBuilder};
use crate::reader::ColumnReader;
use crate::table::Table;

#[derive(Debug, Clone)]
pub struct ConversionEngine {
    key_field: String,
    empty_as_null: bool,
}

impl Default for ConversionEngine {
    fn default() -> Self {
        Self {
            key_field: player::KEY_FIELD.to_string(),
            empty_as_null: true,
        }
    }
}

impl ConversionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(cfg: &EngineConfig) -> Self {
        Self {
            key_field: cfg.key_field.clone(),
            empty_as_null: cfg.empty_as_null,
        }
    }

    pub fn with_key_field(mut self, key_field: impl Into<String>) -> Self {
        self.key_field = key_field.into();
        self
    }

    pub fn with_empty_as_null(mut self, enabled: bool) -> Self {
        self.empty_as_null = enabled;
        self
    }

    pub fn key_field(&self) -> &str {
        &self.key_field
    }

    /// Materialize `records` as a table conforming to `schema`.
    pub fn to_table(&self, records: &[Record], schema: &Schema) -> Result<Table> {
        if schema.is_empty() {
            return Err(Error::InvalidArgument("schema has no fields".into()));
        }
        if records.is_empty() {
            return Table::empty(schema.clone());
        }

        let mut builders: Vec<ColumnBuilder> = schema
            .fields()
            .iter()
            .map(|f| ColumnBuilder::new(f.data_type, records.len()))
            .collect();

        for (idx, record) in records.iter().enumerate() {
            for (field, builder) in schema.fields().iter().zip(builders.iter_mut()) {
                self.append_cell(builder, field, record, idx)?;
            }
        }

        let columns = builders.into_iter().map(ColumnBuilder::finish).collect();
        let table = Table::try_new(schema.clone(), columns)?;
        tracing::debug!(
            rows = table.num_rows(),
            columns = table.num_columns(),
            schema = %schema.digest().short(),
            "records converted to table"
        );
        Ok(table)
    }

    /// Schema-shaped zero-row table.
    pub fn empty_table(&self, schema: &Schema) -> Result<Table> {
        Table::empty(schema.clone())
    }

    /// Read every row back into a record.
    pub fn from_table(&self, table: &Table) -> Result<Vec<Record>> {
        let records = self.rows(table)?.collect::<Result<Vec<_>>>()?;
        tracing::debug!(rows = records.len(), "table converted to records");
        Ok(records)
    }

    /// Stream rows one at a time. Column types are checked before the first row.
    pub fn rows<'a>(&self, table: &'a Table) -> Result<RowIter<'a>> {
        if table.num_columns() == 0 {
            return Err(Error::InvalidArgument("table has no columns".into()));
        }
        let readers = table
            .schema()
            .fields()
            .iter()
            .enumerate()
            .map(|(idx, field)| {
                let array = table.column(idx).ok_or_else(|| {
                    Error::InvalidArgument(format!("table is missing column {idx}"))
                })?;
                Ok((field, ColumnReader::new(field, array)?))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(RowIter {
            readers,
            row: 0,
            num_rows: table.num_rows(),
            done: false,
        })
    }

    fn append_cell(
        &self,
        builder: &mut ColumnBuilder,
        field: &Field,
        record: &Record,
        idx: usize,
    ) -> Result<()> {
        let raw = match record.get(&field.name) {
            Some(v) if !v.is_null() => v,
            _ if field.nullable => {
                builder.append_null();
                return Ok(());
            }
            _ => {
                return Err(Error::NullViolation {
                    key: self.record_key(record, idx),
                    field: field.name.clone(),
                })
            }
        };

        let value = coerce(field.data_type, raw).map_err(|e| self.cell_error(e, field, record, idx))?;

        if field.nullable && self.stores_as_null(field.data_type, &value) {
            builder.append_null();
            return Ok(());
        }
        builder
            .append(&value)
            .map_err(|e| self.cell_error(e, field, record, idx))
    }

    /// Empty-means-null applies to scalar columns only; structured values are
    /// null only when absent.
    fn stores_as_null(&self, dt: DataType, value: &Scalar) -> bool {
        self.empty_as_null && dt != DataType::SerializedJson && value.is_empty_sentinel()
            || matches!(value, Scalar::Json(serde_json::Value::Null))
    }

    fn record_key(&self, record: &Record, idx: usize) -> String {
        record
            .key(&self.key_field)
            .map(|k| format!("{}={k}", self.key_field))
            .unwrap_or_else(|| format!("#{idx}"))
    }

    fn cell_error(&self, err: CellError, field: &Field, record: &Record, idx: usize) -> Error {
        let key = self.record_key(record, idx);
        match err {
            CellError::Mismatch(found) => Error::TypeMismatch {
                key,
                field: field.name.clone(),
                expected: field.data_type,
                found,
            },
            CellError::Json(e) => Error::SerializationFailed {
                key,
                field: field.name.clone(),
                reason: e.to_string(),
            },
        }
    }
}

/// Row-by-row reader over a table. Stops after the first error.
pub struct RowIter<'a> {
    readers: Vec<(&'a Field, ColumnReader<'a>)>,
    row: usize,
    num_rows: usize,
    done: bool,
}

impl RowIter<'_> {
    fn read_row(&self, row: usize) -> Result<Record> {
        let mut record = Record::new();
        for (field, reader) in &self.readers {
            let value = reader
                .read(row)
                .map_err(|e| Error::SerializationFailed {
                    key: format!("row {row}"),
                    field: field.name.clone(),
                    reason: e.to_string(),
                })?
                .unwrap_or_else(|| Scalar::zero_for(field.data_type));
            record.insert(field.name.clone(), value);
        }
        Ok(record)
    }
}

impl Iterator for RowIter<'_> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.row >= self.num_rows {
            return None;
        }
        let row = self.row;
        self.row += 1;
        let result = self.read_row(row);
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = if self.done { 0 } else { self.num_rows - self.row };
        (0, Some(left))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn schema() -> Schema {
        Schema::try_new(vec![
            Field::new("uid", DataType::Int64, false),
            Field::new("name", DataType::String, false),
            Field::new("gk", DataType::Int32, true),
            Field::new("personality", DataType::String, true),
            Field::new("attribute_masked", DataType::Boolean, true),
            Field::new("positions", DataType::SerializedJson, false),
        ])
        .unwrap()
    }

    fn keeper() -> Record {
        Record::new()
            .with("uid", 1_i64)
            .with("name", "Alisson")
            .with("gk", 88)
            .with("personality", "Resolute")
            .with("attribute_masked", true)
            .with("positions", json!(["GK"]))
    }

    fn striker() -> Record {
        Record::new()
            .with("uid", 2_i64)
            .with("name", "Haaland")
            .with("gk", 0)
            .with("personality", "")
            .with("attribute_masked", false)
            .with("positions", json!(["ST", "AM"]))
    }

    #[test]
    fn sentinels_become_nulls_and_read_back_as_zero() {
        let engine = ConversionEngine::new();
        let table = engine.to_table(&[keeper(), striker()], &schema()).unwrap();
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.null_count(2), Some(1));
        assert_eq!(table.null_count(3), Some(1));
        assert_eq!(table.null_count(4), Some(1));

        let back = engine.from_table(&table).unwrap();
        assert_eq!(back, vec![keeper(), striker()]);
    }

    #[test]
    fn sentinel_convention_can_be_disabled() {
        let engine = ConversionEngine::new().with_empty_as_null(false);
        let table = engine.to_table(&[striker()], &schema()).unwrap();
        assert_eq!(table.null_count(2), Some(0));
        assert_eq!(engine.from_table(&table).unwrap(), vec![striker()]);
    }

    #[test]
    fn missing_nullable_value_reads_back_as_zero() {
        let engine = ConversionEngine::new();
        let rec = Record::new()
            .with("uid", 3_i64)
            .with("name", "Rodri")
            .with("positions", json!(["DM"]));
        let table = engine.to_table(&[rec], &schema()).unwrap();
        let back = engine.from_table(&table).unwrap();
        assert_eq!(back[0].get("gk"), Some(&Scalar::I32(0)));
        assert_eq!(back[0].get("personality"), Some(&Scalar::Str(String::new())));
        assert_eq!(back[0].get("attribute_masked"), Some(&Scalar::Bool(false)));
    }

    #[test]
    fn missing_required_value_names_record() {
        let engine = ConversionEngine::new();
        let rec = Record::new().with("uid", 9_i64).with("positions", json!([]));
        let err = engine.to_table(&[keeper(), rec], &schema()).unwrap_err();
        match err {
            Error::NullViolation { key, field } => {
                assert_eq!(key, "uid=9");
                assert_eq!(field, "name");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn type_mismatch_aborts_batch() {
        let engine = ConversionEngine::new();
        let bad = keeper().with("gk", "eighty");
        let err = engine.to_table(&[striker(), bad], &schema()).unwrap_err();
        assert!(matches!(
            err,
            Error::TypeMismatch { ref key, ref field, expected: DataType::Int32, .. }
                if key == "uid=1" && field == "gk"
        ));
    }

    #[test]
    fn record_without_key_is_named_by_position() {
        let engine = ConversionEngine::new();
        let rec = Record::new().with("name", "Nobody").with("positions", json!([]));
        let err = engine.to_table(&[rec], &schema()).unwrap_err();
        assert!(matches!(err, Error::NullViolation { ref key, .. } if key == "#0"));
    }

    #[test]
    fn malformed_json_is_a_row_error() {
        use arrow_array::builder::{Int64Builder, StringBuilder};

        let schema = Schema::try_new(vec![
            Field::new("uid", DataType::Int64, false),
            Field::new("attributes", DataType::SerializedJson, false),
        ])
        .unwrap();
        let mut uids = Int64Builder::new();
        uids.append_value(1);
        uids.append_value(2);
        let mut attrs = StringBuilder::new();
        attrs.append_value(r#"{"Pace":"15"}"#);
        attrs.append_value("{not json");
        let table = Table::try_new(
            schema,
            vec![Arc::new(uids.finish()), Arc::new(attrs.finish())],
        )
        .unwrap();

        let engine = ConversionEngine::new();
        let mut rows = engine.rows(&table).unwrap();
        assert!(rows.next().unwrap().is_ok());
        assert!(matches!(
            rows.next().unwrap(),
            Err(Error::SerializationFailed { ref key, ref field, .. })
                if key == "row 1" && field == "attributes"
        ));
        assert!(rows.next().is_none());
        assert!(engine.from_table(&table).is_err());
    }

    #[test]
    fn empty_schema_rejected() {
        let engine = ConversionEngine::new();
        assert!(matches!(
            engine.to_table(&[keeper()], &Schema::empty()),
            Err(Error::InvalidArgument(_))
        ));
    }
}
