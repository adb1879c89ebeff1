//! Versioned schema registry.
//!
//! One document per version (`v{N}.json`) in a [`DocumentStore`]. Registered
//! versions are immutable. All state lives behind one mutex so the
//! check-validate-write-publish sequence of a registration is atomic with
//! respect to readers and other writers.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use colevo_core::config::EngineConfig;
use colevo_core::error::{Error, Result};
use colevo_core::schema::Schema;

use crate::store::{DocumentStore, FsDocumentStore, MemoryDocumentStore};
use crate::validator::SchemaValidator;

/// Persisted form of one registered version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaVersion {
    pub version: u32,
    pub schema: Schema,
    pub created_at: DateTime<Utc>,
    pub description: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

struct Entry {
    doc: SchemaVersion,
    schema: Arc<Schema>,
}

pub struct Registry {
    store: Box<dyn DocumentStore>,
    validator: SchemaValidator,
    versions: Mutex<BTreeMap<u32, Entry>>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("versions", &self.state().keys().collect::<Vec<_>>())
            .finish()
    }
}

fn document_name(version: u32) -> String {
    format!("v{version}.json")
}

/// Only the canonical `v{N}.json` spelling names a version.
fn parse_document_name(name: &str) -> Option<u32> {
    let version: u32 = name.strip_prefix('v')?.strip_suffix(".json")?.parse().ok()?;
    (document_name(version) == name).then_some(version)
}

impl Registry {
    /// Open a file-backed registry at `dir` with the player validator.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        Self::with_store(FsDocumentStore::open(dir)?, SchemaValidator::player())
    }

    pub fn from_config(cfg: &EngineConfig) -> Result<Self> {
        Self::with_store(
            FsDocumentStore::open(&cfg.schema_dir)?,
            SchemaValidator::from_config(cfg),
        )
    }

    /// Non-persistent registry.
    pub fn in_memory(validator: SchemaValidator) -> Self {
        Self {
            store: Box::new(MemoryDocumentStore::new()),
            validator,
            versions: Mutex::new(BTreeMap::new()),
        }
    }

    /// Load every readable version document from `store`.
    ///
    /// Documents that fail to read or parse are skipped with a warning.
    pub fn with_store(store: impl DocumentStore + 'static, validator: SchemaValidator) -> Result<Self> {
        let mut versions = BTreeMap::new();
        for name in store.list()? {
            let Some(version) = parse_document_name(&name) else {
                continue;
            };
            match load_document(&store, &name, version) {
                Ok(doc) => {
                    let schema = Arc::new(doc.schema.clone());
                    versions.insert(version, Entry { doc, schema });
                }
                Err(e) => tracing::warn!(document = %name, error = %e, "skipping unreadable schema document"),
            }
        }
        tracing::debug!(versions = versions.len(), "schema registry loaded");

        Ok(Self {
            store: Box::new(store),
            validator,
            versions: Mutex::new(versions),
        })
    }

    fn state(&self) -> MutexGuard<'_, BTreeMap<u32, Entry>> {
        // The map is only updated after a successful write, so it stays
        // consistent even if a holder panicked.
        self.versions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn validator(&self) -> &SchemaValidator {
        &self.validator
    }

    /// Schema of the highest registered version.
    pub fn current(&self) -> Result<Arc<Schema>> {
        self.state()
            .values()
            .next_back()
            .map(|e| Arc::clone(&e.schema))
            .ok_or(Error::EmptyRegistry)
    }

    pub fn current_version(&self) -> Option<u32> {
        self.state().keys().next_back().copied()
    }

    pub fn by_version(&self, version: u32) -> Result<Arc<Schema>> {
        self.state()
            .get(&version)
            .map(|e| Arc::clone(&e.schema))
            .ok_or(Error::NotFound { version })
    }

    pub fn register(&self, version: u32, schema: &Schema) -> Result<()> {
        self.register_with_description(version, schema, format!("Schema version {version}"))
    }

    /// Validate and persist `schema` as `version`.
    ///
    /// Re-registering an identical schema under the same version is a no-op;
    /// a different schema is `AlreadyExists`.
    pub fn register_with_description(
        &self,
        version: u32,
        schema: &Schema,
        description: impl Into<String>,
    ) -> Result<()> {
        if version == 0 {
            return Err(Error::InvalidArgument("schema versions start at 1".into()));
        }

        let mut state = self.state();
        if let Some(existing) = state.get(&version) {
            if existing.schema.same_shape(schema) {
                tracing::debug!(version, "schema version already registered");
                return Ok(());
            }
            return Err(Error::AlreadyExists { version });
        }
        self.insert_locked(&mut state, version, schema, description.into())
    }

    /// Validate, persist, then publish. Caller holds the registry lock.
    fn insert_locked(
        &self,
        state: &mut BTreeMap<u32, Entry>,
        version: u32,
        schema: &Schema,
        description: String,
    ) -> Result<()> {
        self.validator.validate(schema)?;

        let doc = SchemaVersion {
            version,
            schema: schema.clone(),
            created_at: Utc::now(),
            description,
            metadata: BTreeMap::new(),
        };
        let bytes = serde_json::to_vec_pretty(&doc)?;
        self.store.put(&document_name(version), &bytes)?;

        tracing::info!(
            version,
            fields = schema.len(),
            digest = %schema.digest().short(),
            "schema version registered"
        );
        state.insert(
            version,
            Entry {
                doc,
                schema: Arc::new(schema.clone()),
            },
        );
        Ok(())
    }

    /// Register `schema` as `version` unless that version already exists.
    ///
    /// Returns whether a registration happened.
    pub fn bootstrap(&self, version: u32, schema: &Schema) -> Result<bool> {
        if version == 0 {
            return Err(Error::InvalidArgument("schema versions start at 1".into()));
        }
        let mut state = self.state();
        if state.contains_key(&version) {
            return Ok(false);
        }
        self.insert_locked(&mut state, version, schema, "Bootstrap schema".into())?;
        Ok(true)
    }

    /// Every registered version, ascending.
    pub fn history(&self) -> Vec<SchemaVersion> {
        self.state().values().map(|e| e.doc.clone()).collect()
    }

    /// Lowest registered version whose fields equal `schema`'s.
    pub fn version_of(&self, schema: &Schema) -> Option<u32> {
        let fingerprint = schema.fingerprint();
        self.state()
            .iter()
            .find(|(_, e)| e.schema.fingerprint() == fingerprint)
            .map(|(v, _)| *v)
    }

    pub fn len(&self) -> usize {
        self.state().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().is_empty()
    }
}

fn load_document(store: &dyn DocumentStore, name: &str, version: u32) -> Result<SchemaVersion> {
    let bytes = store
        .get(name)?
        .ok_or_else(|| Error::InvalidArgument(format!("document {name} vanished")))?;
    let doc: SchemaVersion = serde_json::from_slice(&bytes)?;
    if doc.version != version {
        return Err(Error::InvalidArgument(format!(
            "document {name} declares version {}",
            doc.version
        )));
    }
    if doc.schema.is_empty() {
        return Err(Error::InvalidArgument(format!("document {name} has no fields")));
    }
    Ok(doc)
}
