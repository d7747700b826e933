use chatlog_shared::ValidationError;
use chatlog_store::StoreError;
use thiserror::Error;

/// Errors surfaced by the chat log services.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// A referenced chat (or other entity) does not exist.
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    /// The request was rejected before touching storage.
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// The storage backend failed or could not be reached.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] StoreError),

    /// A concurrent update could not be reconciled.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Stored data or bundled fixtures are not in the expected shape.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn chat_not_found(id: &str) -> Self {
        Self::NotFound {
            entity: "chat",
            id: id.to_string(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ServiceError>;
