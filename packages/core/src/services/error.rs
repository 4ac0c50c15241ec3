//! Service Layer Error Types
//!
//! Error taxonomy for tree operations. The three outcomes a relocation
//! caller must distinguish — permission denial, bad target, storage abort —
//! map onto `Unauthorized`, `InvalidTarget` and `StoreFailure`; the first
//! two guarantee that no mutation took place.

use crate::models::{PathError, ValidationError};
use thiserror::Error;

/// Tree service operation errors
#[derive(Error, Debug)]
pub enum TreeServiceError {
    /// Node not found by ID
    #[error("Node not found: {id}")]
    NodeNotFound { id: String },

    /// Actor lacks permission for the requested move; nothing was mutated
    #[error("Not authorized: {context}")]
    Unauthorized { context: String },

    /// Target missing, target alongside the root, or the move would make
    /// the node an ancestor of itself; nothing was mutated
    #[error("Invalid move target: {context}")]
    InvalidTarget { context: String },

    /// Tree-shape constraint violation (second root, sibling slots
    /// exhausted)
    #[error("Hierarchy constraint violated: {0}")]
    HierarchyViolation(String),

    /// Validation failed for a node record
    #[error("Node validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    /// Malformed or unrewritable materialized path
    #[error("Path error: {0}")]
    Path(#[from] PathError),

    /// The underlying store failed; the transaction rolled back in full
    #[error("Store operation failed: {0}")]
    StoreFailure(#[from] anyhow::Error),
}

impl TreeServiceError {
    /// Create a node not found error
    pub fn node_not_found(id: impl Into<String>) -> Self {
        Self::NodeNotFound { id: id.into() }
    }

    /// Create an unauthorized error
    pub fn unauthorized(context: impl Into<String>) -> Self {
        Self::Unauthorized {
            context: context.into(),
        }
    }

    /// Create an invalid target error
    pub fn invalid_target(context: impl Into<String>) -> Self {
        Self::InvalidTarget {
            context: context.into(),
        }
    }

    /// Create a hierarchy violation error
    pub fn hierarchy_violation(msg: impl Into<String>) -> Self {
        Self::HierarchyViolation(msg.into())
    }
}
