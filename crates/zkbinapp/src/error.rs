use thiserror::Error;

#[derive(Error, Debug)]
pub enum ZkbinError {
    #[error("Invalid paste id: {0}")]
    InvalidId(String),

    #[error("Unknown value namespace: {0}")]
    UnknownNamespace(String),

    #[error("Corrupt record at {0}")]
    CorruptRecord(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Persist error: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, ZkbinError>;
