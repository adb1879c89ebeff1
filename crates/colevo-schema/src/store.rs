//! Persistence for schema-version documents.
//!
//! A store holds whole named documents. Writes replace a document entirely;
//! readers never observe a partially written one.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use colevo_core::error::{Error, Result};

pub trait DocumentStore: Send + Sync {
    /// Create or replace `name`.
    fn put(&self, name: &str, contents: &[u8]) -> Result<()>;

    fn get(&self, name: &str) -> Result<Option<Vec<u8>>>;

    /// Names of every stored document, sorted.
    fn list(&self) -> Result<Vec<String>>;
}

/// One file per document under a root directory.
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    /// Open `root`, creating it if missing.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .map_err(|e| Error::storage("creating schema directory", &root, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl DocumentStore for FsDocumentStore {
    fn put(&self, name: &str, contents: &[u8]) -> Result<()> {
        let path = self.path_of(name);
        let tmp = self.root.join(format!(".{name}.tmp"));
        {
            let mut file = fs::File::create(&tmp)
                .map_err(|e| Error::storage("creating temporary document", &tmp, e))?;
            file.write_all(contents)
                .map_err(|e| Error::storage("writing temporary document", &tmp, e))?;
            file.sync_all()
                .map_err(|e| Error::storage("syncing temporary document", &tmp, e))?;
        }
        fs::rename(&tmp, &path).map_err(|e| Error::storage("replacing document", &path, e))
    }

    fn get(&self, name: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_of(name);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::storage("reading document", &path, e)),
        }
    }

    fn list(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.root)
            .map_err(|e| Error::storage("listing schema directory", &self.root, e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::storage("listing schema directory", &self.root, e))?;
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            // Leftover temporaries from an interrupted write are not documents.
            if let Some(name) = entry.file_name().to_str() {
                if !name.starts_with('.') {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

/// In-process store, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    docs: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn docs(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        // A poisoned map still holds whole documents.
        self.docs.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn put(&self, name: &str, contents: &[u8]) -> Result<()> {
        self.docs().insert(name.to_string(), contents.to_vec());
        Ok(())
    }

    fn get(&self, name: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.docs().get(name).cloned())
    }

    fn list(&self) -> Result<Vec<String>> {
        Ok(self.docs().keys().cloned().collect())
    }
}
