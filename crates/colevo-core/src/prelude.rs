//! Convenience re-exports for downstream crates.

pub use crate::config::EngineConfig;
pub use crate::error::{Error, Result};
pub use crate::hash::Hash256;
pub use crate::record::{Record, Scalar};
pub use crate::schema::{DataType, Field, Schema};
