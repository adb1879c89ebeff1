use std::path::PathBuf;

use thiserror::Error;

use crate::schema::DataType;

/// Canonical result for colevo.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A required input was absent (empty schema, column-less table, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("schema validation failed: missing required fields {missing:?}")]
    ValidationFailed { missing: Vec<String> },

    #[error("incompatible schema change on field '{field}': {reason}")]
    IncompatibleSchema { field: String, reason: String },

    #[error("column '{field}' declared {declared} but stored as {actual}")]
    UnsupportedColumnType {
        field: String,
        declared: DataType,
        actual: String,
    },

    #[error("record {key}: field '{field}' could not be (de)serialized: {reason}")]
    SerializationFailed {
        key: String,
        field: String,
        reason: String,
    },

    #[error("record {key}: field '{field}' expects {expected}, got {found}")]
    TypeMismatch {
        key: String,
        field: String,
        expected: DataType,
        found: String,
    },

    #[error("record {key}: non-nullable field '{field}' has no value")]
    NullViolation { key: String, field: String },

    #[error("schema version {version} not found")]
    NotFound { version: u32 },

    #[error("schema version {version} already registered with a different shape")]
    AlreadyExists { version: u32 },

    #[error("no schema versions registered")]
    EmptyRegistry,

    #[error("duplicate field name '{0}'")]
    DuplicateField(String),

    #[error("unknown data type '{0}'")]
    UnknownType(String),

    #[error("storage error ({context}) at {}: {source}", .path.display())]
    Storage {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    // Core has no Arrow dependency; the convert crate maps ArrowError here.
    #[error("arrow error: {0}")]
    Arrow(String),

    #[error("not implemented: {0}")]
    Unimplemented(&'static str),

    /// Error with context chain for better debugging
    #[error("Error in {context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Add context to an error, creating an error chain.
    ///
    /// # Example
    /// ```rust
    /// use colevo_core::error::Error;
    /// let err = Error::NotFound { version: 7 };
    /// let err = err.with_context("while planning migration 6 -> 7");
    /// assert!(err.to_string().contains("planning migration"));
    /// ```
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Error::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Innermost error once all context layers are peeled off.
    pub fn root(&self) -> &Error {
        match self {
            Error::Context { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn storage(context: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Storage {
            context,
            path: path.into(),
            source,
        }
    }

    /// True for failures caused by the caller's schema rather than the environment.
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self.root(),
            Error::ValidationFailed { .. }
                | Error::IncompatibleSchema { .. }
                | Error::DuplicateField(_)
                | Error::UnknownType(_)
                | Error::AlreadyExists { .. }
        )
    }

    /// Get suggestions for common errors.
    pub fn suggestions(&self) -> Vec<String> {
        match self.root() {
            Error::ValidationFailed { missing } => vec![
                format!("Add the missing fields: {}", missing.join(", ")),
                "Check required_fields in the engine configuration".into(),
            ],
            Error::IncompatibleSchema { field, .. } => vec![
                format!("Keep '{field}' readable: only widen types or relax nullability"),
                "Plan an explicit data migration for narrowing changes".into(),
            ],
            Error::NotFound { .. } | Error::EmptyRegistry => vec![
                "List registered versions with `colevo history`".into(),
            ],
            Error::AlreadyExists { .. } => vec![
                "Registered versions are immutable; register the change under a new version".into(),
            ],
            Error::Storage { .. } => vec![
                "Check the schema directory path and permissions".into(),
                "Verify disk space is available".into(),
            ],
            Error::TypeMismatch { .. } | Error::NullViolation { .. } => vec![
                "Verify the records were produced for the current schema version".into(),
            ],
            _ => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_chain_keeps_root() {
        let err = Error::NotFound { version: 3 }
            .with_context("resolving source schema")
            .with_context("planning migration");
        assert!(matches!(err.root(), Error::NotFound { version: 3 }));
        assert!(!err.suggestions().is_empty());
    }

    #[test]
    fn schema_errors_are_distinguished_from_storage() {
        let schema = Error::ValidationFailed {
            missing: vec!["uid".into()],
        };
        let storage = Error::storage(
            "writing schema document",
            "/tmp/v1.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(schema.is_schema_error());
        assert!(!storage.is_schema_error());
        assert!(schema.suggestions()[0].contains("uid"));
    }
}
