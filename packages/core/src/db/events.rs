//! Domain Events for the Page Tree
//!
//! This module defines the events emitted by `TreeService` around structural
//! changes. They follow the observer pattern: interested parties (cache
//! invalidation, search indexing, editorial notifications) subscribe without
//! coupling to the tree internals.
//!
//! # Architecture
//!
//! Events are emitted through tokio's broadcast channel. Delivery is
//! fire-and-forget: a slow, failing, or absent subscriber never affects the
//! operation that produced the event, and in particular never rolls back a
//! committed relocation.
//!
//! # Event Flow
//!
//! 1. `TreeService` validates and begins a relocation
//! 2. `PreMove` is published immediately before the structural rewrite
//! 3. The store transaction commits (or aborts — then no `PostMove`)
//! 4. `PostMove` is published with the updated node

use crate::models::{MovePosition, Node};

/// Capacity of the broadcast channel (subscribers lagging beyond this drop
/// the oldest events, they do not block publishers)
pub const TREE_EVENT_CHANNEL_CAPACITY: usize = 128;

/// Events emitted around structural tree changes
#[derive(Debug, Clone)]
pub enum TreeEvent {
    /// Published immediately before a relocation's structural rewrite.
    /// `node` carries the pre-move state.
    PreMove {
        node: Node,
        target_id: String,
        position: MovePosition,
    },

    /// Published after a relocation committed. `node` carries the post-move
    /// state.
    PostMove {
        node: Node,
        target_id: String,
        position: MovePosition,
    },

    /// A node was added to the tree
    NodeCreated(Node),

    /// A subtree was removed; `removed` counts the deleted records
    SubtreeDeleted { root_id: String, removed: usize },
}

impl TreeEvent {
    /// Stable string tag for logging and routing
    pub fn event_type(&self) -> &str {
        match self {
            TreeEvent::PreMove { .. } => "tree:pre-move",
            TreeEvent::PostMove { .. } => "tree:post-move",
            TreeEvent::NodeCreated(_) => "tree:node-created",
            TreeEvent::SubtreeDeleted { .. } => "tree:subtree-deleted",
        }
    }
}
