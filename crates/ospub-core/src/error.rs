use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("duplicate entry in {side}: {kind} '{id}'")]
    DuplicateEntry {
        side: &'static str,
        kind: String,
        id: String,
    },

    #[error("type conflict for '{id}': source is {source_kind}, destination is {dest_kind}")]
    TypeConflict {
        id: String,
        source_kind: String,
        dest_kind: String,
    },

    #[error("entry '{0}' has neither a source nor a destination record")]
    EmptyEntry(String),

    #[error("invalid kind: {0}")]
    InvalidKind(String),

    #[error("invalid usage: {0}")]
    Usage(String),

    #[error("input file {path}: {reason}")]
    InputFile { path: String, reason: String },

    #[error("registry: {0}")]
    Registry(#[from] crate::registry::RegistryError),

    #[error("stopped by operator")]
    Stopped,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Pattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, PublishError>;
