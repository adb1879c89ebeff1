#![forbid(unsafe_code)]
//! colevo-core: shared kernel for the colevo engine.
//!
//! This crate contains only *pure* types and small helpers: the closed
//! `DataType` set, `Field`/`Schema`, schema-independent `Record`s, the error
//! taxonomy, and engine configuration. There is **no Arrow** and **no I/O**
//! here.
//!
//! Crates that use this:
//! - colevo-convert: projects records onto Arrow columns and back.
//! - colevo-schema: validation, versioned registry, evolution analysis.
//! - colevo-exec: background post-processing of converted tables.

pub mod config;
pub mod error;
pub mod hash;
pub mod player;
pub mod prelude;
pub mod record;
pub mod schema;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
