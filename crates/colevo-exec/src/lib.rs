//! Background post-processing for colevo.
//!
//! Conversion itself is synchronous; work that can trail it (statistics,
//! exports) runs on a [`WorkerPool`] and reports back through a per-task
//! [`TaskHandle`].

#![forbid(unsafe_code)]

pub mod error;
pub mod pool;
pub mod stats;

pub use error::{ExecError, Result};
pub use pool::{TaskHandle, WorkerPool};
pub use stats::{ColumnStats, TableStats};
