use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerifyError {
    /// Text was empty or whitespace-only; rejected before the pipeline runs.
    #[error("please provide news text")]
    EmptyText,

    #[error("model bundle not found at {0}; train and export a bundle first")]
    ModelNotFound(PathBuf),

    #[error("model bundle at {path} is not valid JSON: {source}")]
    ModelFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("model bundle is inconsistent: {0}")]
    ModelShape(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = VerifyError> = std::result::Result<T, E>;
