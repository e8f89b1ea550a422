use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to replace {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),

    #[error("State schema_version must be an integer, got {0}")]
    InvalidSchema(String),

    #[error("Unsupported state schema_version={0}; this build supports up to {max}", max = crate::envelope::STATE_SCHEMA_VERSION)]
    UnsupportedSchema(u64),

    #[error("State envelope is missing '{0}'")]
    MissingField(&'static str),
}

