//! Table transformation extension points.
//!
//! Filtering, aggregation, sorting and projection over converted tables are
//! declared here so callers can program against one surface. The conversion
//! engine does not execute them yet; every method reports `Unimplemented`.

use serde::{Deserialize, Serialize};

use colevo_core::error::{Error, Result};

use crate::engine::ConversionEngine;
use crate::table::Table;

/// Comparison operators supported in filter predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// `column <op> literal`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterExpr {
    pub column: String,
    pub op: CompareOp,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateFn {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateExpr {
    pub func: AggregateFn,
    pub column: String,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortColumn {
    pub column: String,
    pub ascending: bool,
}

pub trait TableTransform {
    fn filter(&self, _table: &Table, _predicate: &FilterExpr) -> Result<Table> {
        Err(Error::Unimplemented("filter"))
    }

    fn aggregate(
        &self,
        _table: &Table,
        _group_by: &[String],
        _aggregates: &[AggregateExpr],
    ) -> Result<Table> {
        Err(Error::Unimplemented("aggregate"))
    }

    fn sort(&self, _table: &Table, _keys: &[SortColumn]) -> Result<Table> {
        Err(Error::Unimplemented("sort"))
    }

    fn project(&self, _table: &Table, _columns: &[String]) -> Result<Table> {
        Err(Error::Unimplemented("project"))
    }
}

impl TableTransform for ConversionEngine {}
