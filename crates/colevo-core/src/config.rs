//! Engine configuration with environment overrides.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::player;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding one `v{N}.json` document per schema version.
    pub schema_dir: PathBuf,
    /// Field whose value identifies a record in error messages.
    pub key_field: String,
    /// Store empty/zero/false values of nullable fields as nulls.
    pub empty_as_null: bool,
    /// Fields every registered schema must carry.
    pub required_fields: Vec<String>,
    /// Threads in the post-processing worker pool.
    pub worker_threads: usize,
    /// Cost-model unit per migration step, in seconds.
    pub migration_step_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            schema_dir: PathBuf::from("./schemas"),
            key_field: player::KEY_FIELD.to_string(),
            empty_as_null: true,
            required_fields: player::REQUIRED_FIELDS.iter().map(|s| s.to_string()).collect(),
            worker_threads: 4,
            migration_step_secs: 60,
        }
    }
}

impl EngineConfig {
    /// Defaults overlaid with `COLEVO_*` environment variables.
    ///
    /// Unparseable values are ignored and keep the default.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.apply_env();
        cfg
    }

    pub fn apply_env(&mut self) {
        if let Ok(dir) = std::env::var("COLEVO_SCHEMA_DIR") {
            if !dir.is_empty() {
                self.schema_dir = PathBuf::from(dir);
            }
        }
        if let Ok(key) = std::env::var("COLEVO_KEY_FIELD") {
            if !key.is_empty() {
                self.key_field = key;
            }
        }
        if let Some(v) = env_parse::<bool>("COLEVO_EMPTY_AS_NULL") {
            self.empty_as_null = v;
        }
        if let Some(v) = env_parse::<usize>("COLEVO_WORKER_THREADS") {
            self.worker_threads = v;
        }
        if let Some(v) = env_parse::<u64>("COLEVO_MIGRATION_STEP_SECS") {
            self.migration_step_secs = v;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.key_field.is_empty() {
            return Err(Error::Config("key_field cannot be empty".into()));
        }
        if self.worker_threads == 0 {
            return Err(Error::Config("worker_threads must be at least 1".into()));
        }
        if self.schema_dir.as_os_str().is_empty() {
            return Err(Error::Config("schema_dir cannot be empty".into()));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
