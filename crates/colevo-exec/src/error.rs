use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("task '{task}' failed: {source}")]
    Task {
        task: String,
        #[source]
        source: colevo_core::error::Error,
    },

    #[error("task '{task}' panicked: {message}")]
    Panicked { task: String, message: String },

    /// The worker dropped the task without reporting an outcome.
    #[error("task '{task}' was abandoned before completing")]
    Abandoned { task: String },

    #[error("worker pool is shut down")]
    ShutDown,

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("invalid pool configuration: {0}")]
    Config(String),
}

impl ExecError {
    /// The task's own error, if the failure came from the task body.
    pub fn task_error(&self) -> Option<&colevo_core::error::Error> {
        match self {
            ExecError::Task { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn suggestions(&self) -> Vec<String> {
        match self {
            ExecError::Task { source, .. } => source.suggestions(),
            ExecError::Panicked { .. } => {
                vec!["A post-processing task panicked; check the worker logs".into()]
            }
            ExecError::Config(_) => vec!["Set worker_threads to at least 1".into()],
            _ => vec![],
        }
    }
}

pub type Result<T> = std::result::Result<T, ExecError>;
