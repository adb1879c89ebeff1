//! colevo: columnar conversion and schema evolution for player records.
//!
//! This crate re-exports the workspace members under one roof:
//! - [`core`]: schema model, records, errors, configuration;
//! - [`convert`]: row <-> Arrow table conversion;
//! - [`schema`]: validation, registry, evolution and migration planning;
//! - [`exec`]: background worker pool and column statistics.

pub use colevo_convert as convert;
pub use colevo_core as core;
pub use colevo_exec as exec;
pub use colevo_schema as schema;

pub use colevo_convert::{ConversionEngine, Table};
pub use colevo_core::error::{Error, Result};
pub use colevo_core::record::{Record, Scalar};
pub use colevo_core::schema::{DataType, Field, Schema};
pub use colevo_schema::{EvolutionAnalyzer, MigrationPlan, Registry, SchemaValidator};
