use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the fake clients, the tracker and the listers
///
/// `NotFound` and `AlreadyExists` render like API server status messages,
/// e.g. `image.build.pivotal.io "petclinic" not found`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{kind} \"{name}\" not found")]
    NotFound {
        kind: String,
        name: String,
        namespace: String,
    },

    #[error("{kind} \"{name}\" already exists")]
    AlreadyExists {
        kind: String,
        name: String,
        namespace: String,
    },

    #[error("Operation cannot be fulfilled: {0}")]
    Conflict(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid label selector: {0}")]
    InvalidSelector(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("JSON patch error: {0}")]
    PatchError(#[from] json_patch::PatchError),

    #[error("Failed to load fixture {path:?}: {reason}")]
    Fixture { path: PathBuf, reason: String },

    #[error("Invalid object metadata: {0}")]
    MetadataError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Error::AlreadyExists { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }
}
