//! NodeStore Trait - Persistence Abstraction Layer
//!
//! This module defines the `NodeStore` trait that abstracts persistence for
//! tree nodes. The store is an ordered index keyed by materialized path, so
//! subtree queries are contiguous range scans rather than full-table filters.
//!
//! # Architecture
//!
//! - **Abstraction Point**: between `TreeService` (business logic) and the
//!   storage backend
//! - **Ordered by path**: lexicographic key order equals pre-order tree
//!   order; prefix scans return whole subtrees
//! - **Explicit transactions**: all structural mutation happens inside a
//!   [`TreeTransaction`], which commits atomically or leaves no trace
//!
//! # Design Decisions
//!
//! 1. **Async-First**: all methods are async so embedded and networked
//!    backends share one trait
//! 2. **`anyhow::Result`**: backends attach their own context; the service
//!    layer maps failures into its taxonomy
//! 3. **Serialized writers**: a live transaction holds the store's write
//!    lock, so no relocation can observe another's partially-rewritten
//!    subtree

use crate::models::{Node, TreePath};
use anyhow::Result;
use async_trait::async_trait;

/// Abstraction layer for node persistence.
///
/// Read methods outside a transaction see the latest committed state. All
/// mutation goes through [`NodeStore::begin`].
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; services hold them behind `Arc`.
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Get a node by id
    async fn get(&self, id: &str) -> Result<Option<Node>>;

    /// Get a node by its materialized path
    async fn get_by_path(&self, path: &TreePath) -> Result<Option<Node>>;

    /// Scan every record whose path starts with `prefix` (the prefix record
    /// included) and whose depth is at least `min_depth`, in path order.
    ///
    /// Prefix matching is segment-boundary aware.
    async fn scan_prefix(&self, prefix: &TreePath, min_depth: u32) -> Result<Vec<Node>>;

    /// Direct children of the node at `path`, in path (sibling) order
    async fn children_of(&self, path: &TreePath) -> Result<Vec<Node>>;

    /// The root node, if the tree has one
    async fn root(&self) -> Result<Option<Node>>;

    /// Open a transaction.
    ///
    /// The transaction serializes against all other writers for its whole
    /// lifetime. Dropping it without committing rolls back.
    async fn begin(&self) -> Result<Box<dyn TreeTransaction>>;
}

/// A single atomic unit of structural change.
///
/// Reads observe the transaction's own staged writes on top of the snapshot
/// taken at `begin`. Nothing becomes visible to other readers until
/// `commit`; `rollback` (or drop) discards everything.
#[async_trait]
pub trait TreeTransaction: Send {
    /// Get a node by id (staged state)
    async fn get(&self, id: &str) -> Result<Option<Node>>;

    /// Get a node by path (staged state)
    async fn get_by_path(&self, path: &TreePath) -> Result<Option<Node>>;

    /// Prefix-range scan over the staged state; same contract as
    /// [`NodeStore::scan_prefix`]
    async fn scan_prefix(&self, prefix: &TreePath, min_depth: u32) -> Result<Vec<Node>>;

    /// Direct children of the node at `path`, staged state
    async fn children_of(&self, path: &TreePath) -> Result<Vec<Node>>;

    /// Insert a record at its path. Fails on an occupied path or a
    /// duplicate id.
    async fn insert(&mut self, node: Node) -> Result<()>;

    /// Remove and return the record at `path`, `None` if absent
    async fn remove(&mut self, path: &TreePath) -> Result<Option<Node>>;

    /// Make every staged write durable, atomically
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Discard every staged write
    async fn rollback(self: Box<Self>) -> Result<()>;
}
