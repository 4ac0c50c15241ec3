//! Permission Oracle
//!
//! Authorization gate for structural tree changes. Policy internals live
//! outside this crate; the tree service only asks the boolean question
//! "may this actor move this node under that parent" and refuses the whole
//! operation on a `false`.
//!
//! Moves requested without an actor are trusted (system-initiated) and skip
//! the gate entirely.

use crate::models::Node;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Identity on whose behalf a structural change is requested
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub display_name: String,
}

impl Actor {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// Capability check consulted before any relocation mutates the tree
#[async_trait]
pub trait PermissionOracle: Send + Sync {
    /// May `actor` relocate `node` to become a child of `parent_after`?
    async fn can_move(&self, actor: &Actor, node: &Node, parent_after: &Node) -> bool;
}

/// Oracle that grants every request; the default for embedded single-user
/// deployments
pub struct AllowAll;

#[async_trait]
impl PermissionOracle for AllowAll {
    async fn can_move(&self, _actor: &Actor, _node: &Node, _parent_after: &Node) -> bool {
        true
    }
}
