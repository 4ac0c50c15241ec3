//! Database Layer Error Types

use thiserror::Error;

/// Errors surfaced by node store implementations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// No record under the given key
    #[error("Record not found: {key}")]
    NotFound { key: String },

    /// A record already occupies the path
    #[error("Duplicate path: {path}")]
    DuplicatePath { path: String },

    /// A record with the same id already exists at another path
    #[error("Duplicate node id: {id}")]
    DuplicateId { id: String },

    /// Backend-specific storage failure
    #[error("Storage failure: {0}")]
    Storage(String),
}

impl DatabaseError {
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    pub fn duplicate_path(path: impl Into<String>) -> Self {
        Self::DuplicatePath { path: path.into() }
    }

    pub fn duplicate_id(id: impl Into<String>) -> Self {
        Self::DuplicateId { id: id.into() }
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}
