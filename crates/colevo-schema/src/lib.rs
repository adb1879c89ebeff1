//! Schema lifecycle for colevo: validation, the versioned registry,
//! evolution analysis and migration planning.
//!
//! ```no_run
//! use std::sync::Arc;
//! use colevo_core::player::{player_schema, PLAYER_SCHEMA_VERSION};
//! use colevo_schema::{EvolutionAnalyzer, Registry};
//!
//! # fn main() -> colevo_core::error::Result<()> {
//! let registry = Arc::new(Registry::open("./schemas")?);
//! registry.bootstrap(PLAYER_SCHEMA_VERSION, &player_schema())?;
//! let analyzer = EvolutionAnalyzer::new(Arc::clone(&registry));
//! let plan = analyzer.plan_migration(1, 1)?;
//! assert!(plan.is_empty());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod evolution;
pub mod migration;
pub mod registry;
pub mod store;
pub mod validator;

pub use evolution::{EvolutionAnalyzer, FieldModification, SchemaEvolution};
pub use migration::{MigrationPlan, MigrationStep, MigrationStepKind};
pub use registry::{Registry, SchemaVersion};
pub use store::{DocumentStore, FsDocumentStore, MemoryDocumentStore};
pub use validator::{compare_schemas, ChangeKind, SchemaChange, SchemaComparison, SchemaValidator};
