//! Node Data Structures
//!
//! This module defines the `Node` struct, the single record type for every
//! entry in the page tree.
//!
//! # Architecture
//!
//! - **Universal Node**: one struct represents all page types; type-specific
//!   data lives in the JSON `properties` field
//! - **Derived parent**: the parent is never stored — it is obtained by
//!   stripping the last path segment and looking the result up
//! - **Two addresses**: `path` is the machine-facing materialized path (see
//!   [`TreePath`]); `url_path` is the editorial-facing slug chain
//!   (`/welcome/about/`) maintained in lockstep by the tree service
//!
//! # Examples
//!
//! ```rust
//! use sitetree_core::models::{Node, TreePath};
//! use serde_json::json;
//!
//! let root = Node::new(
//!     "Welcome".to_string(),
//!     "welcome".to_string(),
//!     TreePath::root(),
//!     "/".to_string(),
//!     json!({}),
//! );
//! assert_eq!(root.depth, 1);
//! assert!(root.is_root());
//! ```

use crate::models::path::TreePath;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// Validation errors for Node records
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid slug: {0:?}")]
    InvalidSlug(String),

    #[error("Depth {depth} does not match path {path} ({segments} segments)")]
    DepthMismatch {
        depth: u32,
        path: String,
        segments: u32,
    },

    #[error("Invalid url_path: {0:?}")]
    InvalidUrlPath(String),
}

/// A single entry in the page tree.
///
/// # Fields
///
/// - `id`: unique identifier (UUID), immutable for the node's lifetime —
///   relocation never changes it
/// - `title`: display title
/// - `slug`: url segment, unique meaning within one sibling group
/// - `path`: materialized path; lexicographic order equals tree order
/// - `depth`: number of path segments (root depth is 1)
/// - `url_path`: slug chain with leading and trailing `/`; the root is `/`
/// - `properties`: entity-specific JSON payload
/// - `created_at` / `modified_at`: timestamps, `modified_at` bumped on moves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub path: TreePath,
    pub depth: u32,
    pub url_path: String,
    pub properties: Value,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Node {
    /// Create a new node with a generated UUID at the given tree position
    pub fn new(
        title: String,
        slug: String,
        path: TreePath,
        url_path: String,
        properties: Value,
    ) -> Self {
        Self::new_with_id(
            Uuid::new_v4().to_string(),
            title,
            slug,
            path,
            url_path,
            properties,
        )
    }

    /// Create a node with an explicit ID (fixtures, imports)
    pub fn new_with_id(
        id: String,
        title: String,
        slug: String,
        path: TreePath,
        url_path: String,
        properties: Value,
    ) -> Self {
        let now = Utc::now();
        let depth = path.depth();
        Self {
            id,
            title,
            slug,
            path,
            depth,
            url_path,
            properties,
            created_at: now,
            modified_at: now,
        }
    }

    /// Whether this node sits at root depth
    pub fn is_root(&self) -> bool {
        self.depth == 1
    }

    /// Path of the parent node, `None` for the root
    pub fn parent_path(&self) -> Option<TreePath> {
        self.path.parent()
    }

    /// Check the record's internal consistency.
    ///
    /// Verifies the stored depth against the path's segment count, the slug
    /// shape, and the url_path shape. Tree-wide invariants (parent prefix,
    /// url_path chaining) are the store's and service's responsibility.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.is_empty() {
            return Err(ValidationError::MissingField("title".to_string()));
        }
        if self.slug.is_empty() || self.slug.contains('/') || self.slug.contains(' ') {
            return Err(ValidationError::InvalidSlug(self.slug.clone()));
        }
        let segments = self.path.depth();
        if self.depth != segments {
            return Err(ValidationError::DepthMismatch {
                depth: self.depth,
                path: self.path.as_str().to_string(),
                segments,
            });
        }
        if !self.url_path.starts_with('/') || !self.url_path.ends_with('/') {
            return Err(ValidationError::InvalidUrlPath(self.url_path.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Node {
        Node::new(
            "About".to_string(),
            "about".to_string(),
            TreePath::parse("0001.0001").unwrap(),
            "/about/".to_string(),
            json!({"template": "standard"}),
        )
    }

    #[test]
    fn test_new_derives_depth_from_path() {
        let node = sample();
        assert_eq!(node.depth, 2);
        assert!(!node.is_root());
        assert_eq!(node.parent_path().unwrap().as_str(), "0001");
        assert!(node.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_depth_mismatch() {
        let mut node = sample();
        node.depth = 5;
        assert!(matches!(
            node.validate(),
            Err(ValidationError::DepthMismatch { depth: 5, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_slug_and_url_path() {
        let mut node = sample();
        node.slug = "has space".to_string();
        assert!(matches!(
            node.validate(),
            Err(ValidationError::InvalidSlug(_))
        ));

        let mut node = sample();
        node.url_path = "/missing-trailing".to_string();
        assert!(matches!(
            node.validate(),
            Err(ValidationError::InvalidUrlPath(_))
        ));
    }

    #[test]
    fn test_serde_round_trip() {
        let node = sample();
        let json = serde_json::to_string(&node).unwrap();
        let back: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(back, node);
    }
}
