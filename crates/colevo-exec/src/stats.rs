//! Column statistics for converted tables.
//!
//! Tracks min, max, null_count and total_count per column. JSON columns only
//! contribute counts: their values have no meaningful order.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use colevo_convert::Table;
use colevo_core::error::Result;
use colevo_core::record::Scalar;

/// Statistics for a single column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    /// Minimum value observed (None if no ordered non-null values)
    pub min: Option<Scalar>,
    pub max: Option<Scalar>,
    pub null_count: u64,
    /// Total number of values (including nulls)
    pub total_count: u64,
}

impl ColumnStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update statistics with one cell; `None` is a null.
    pub fn update(&mut self, value: Option<&Scalar>) {
        self.total_count += 1;
        let Some(val) = value else {
            self.null_count += 1;
            return;
        };
        if matches!(val, Scalar::Null) {
            self.null_count += 1;
            return;
        }
        if matches!(val, Scalar::Json(_)) {
            return;
        }

        match &mut self.min {
            Some(min) if scalar_cmp(val, min).is_lt() => *min = val.clone(),
            Some(_) => {}
            None => self.min = Some(val.clone()),
        }
        match &mut self.max {
            Some(max) if scalar_cmp(val, max).is_gt() => *max = val.clone(),
            Some(_) => {}
            None => self.max = Some(val.clone()),
        }
    }

    /// Combine statistics from two partitions of the same column.
    pub fn merge(&self, other: &ColumnStats) -> ColumnStats {
        ColumnStats {
            min: pick(&self.min, &other.min, Ordering::is_le),
            max: pick(&self.max, &other.max, Ordering::is_ge),
            null_count: self.null_count + other.null_count,
            total_count: self.total_count + other.total_count,
        }
    }

    pub fn non_null_count(&self) -> u64 {
        self.total_count - self.null_count
    }
}

fn pick(a: &Option<Scalar>, b: &Option<Scalar>, keep_a: fn(Ordering) -> bool) -> Option<Scalar> {
    match (a, b) {
        (Some(x), Some(y)) => Some(if keep_a(scalar_cmp(x, y)) { x.clone() } else { y.clone() }),
        (Some(x), None) => Some(x.clone()),
        (None, Some(y)) => Some(y.clone()),
        (None, None) => None,
    }
}

/// Order within one column's value kind. Mixed kinds and NaN compare equal.
fn scalar_cmp(a: &Scalar, b: &Scalar) -> Ordering {
    match (a, b) {
        (Scalar::Bool(x), Scalar::Bool(y)) => x.cmp(y),
        (Scalar::I32(x), Scalar::I32(y)) => x.cmp(y),
        (Scalar::I64(x), Scalar::I64(y)) => x.cmp(y),
        (Scalar::F32(x), Scalar::F32(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (Scalar::F64(x), Scalar::F64(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (Scalar::Str(x), Scalar::Str(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

/// Statistics for every column of a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableStats {
    pub num_rows: u64,
    /// Map from column name to its statistics
    pub column_stats: BTreeMap<String, ColumnStats>,
}

impl TableStats {
    pub fn compute(table: &Table) -> Result<Self> {
        let mut column_stats = BTreeMap::new();
        for (idx, field) in table.schema().fields().iter().enumerate() {
            let mut stats = ColumnStats::new();
            for value in table.column_values(idx)? {
                stats.update(value?.as_ref());
            }
            column_stats.insert(field.name.clone(), stats);
        }
        Ok(Self {
            num_rows: table.num_rows() as u64,
            column_stats,
        })
    }

    pub fn get(&self, column: &str) -> Option<&ColumnStats> {
        self.column_stats.get(column)
    }
}
