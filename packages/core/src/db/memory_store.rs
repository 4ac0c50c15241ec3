//! In-Memory Ordered Store
//!
//! `MemoryStore` keeps the whole tree in a `BTreeMap` keyed by the
//! materialized-path string, with a secondary id index. Because path order is
//! pre-order tree order, a subtree scan is a contiguous range query over the
//! map — the property the relocation rewrite depends on.
//!
//! # Transactions
//!
//! `begin` acquires the table's mutex for the transaction's whole lifetime
//! and stages all writes on a working copy. Commit swaps the working copy in
//! under the held guard (atomic: readers see either none or all of the
//! writes); rollback — explicit or by drop — discards it. Holding the guard
//! serializes concurrent relocations, which is exactly the isolation the
//! tree rewrite requires.

use crate::db::error::DatabaseError;
use crate::db::node_store::{NodeStore, TreeTransaction};
use crate::models::{Node, TreePath};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Path separator successor, used as the exclusive upper bound of prefix
/// range scans (`'/'` is the ASCII character after `'.'`, and no path
/// character sorts between them)
const PREFIX_SCAN_END: char = '/';

#[derive(Default, Clone)]
struct TreeTable {
    by_path: BTreeMap<String, Node>,
    by_id: HashMap<String, String>,
}

impl TreeTable {
    fn get_by_id(&self, id: &str) -> Option<Node> {
        self.by_id
            .get(id)
            .and_then(|path| self.by_path.get(path))
            .cloned()
    }

    fn get_by_path(&self, path: &TreePath) -> Option<Node> {
        self.by_path.get(path.as_str()).cloned()
    }

    fn scan_prefix(&self, prefix: &TreePath, min_depth: u32) -> Vec<Node> {
        let mut out = Vec::new();
        if let Some(node) = self.by_path.get(prefix.as_str()) {
            if node.depth >= min_depth {
                out.push(node.clone());
            }
        }
        let start = format!("{}.", prefix.as_str());
        let end = format!("{}{}", prefix.as_str(), PREFIX_SCAN_END);
        for node in self.by_path.range(start..end).map(|(_, n)| n) {
            if node.depth >= min_depth {
                out.push(node.clone());
            }
        }
        out
    }

    fn children_of(&self, path: &TreePath) -> Vec<Node> {
        let child_depth = path.depth() + 1;
        self.scan_prefix(path, child_depth)
            .into_iter()
            .filter(|n| n.depth == child_depth)
            .collect()
    }

    fn root(&self) -> Option<Node> {
        self.by_path.values().find(|n| n.depth == 1).cloned()
    }

    fn insert(&mut self, node: Node) -> Result<(), DatabaseError> {
        if self.by_path.contains_key(node.path.as_str()) {
            return Err(DatabaseError::duplicate_path(node.path.as_str()));
        }
        if self.by_id.contains_key(&node.id) {
            return Err(DatabaseError::duplicate_id(&node.id));
        }
        self.by_id
            .insert(node.id.clone(), node.path.as_str().to_string());
        self.by_path.insert(node.path.as_str().to_string(), node);
        Ok(())
    }

    fn remove(&mut self, path: &TreePath) -> Option<Node> {
        let node = self.by_path.remove(path.as_str())?;
        self.by_id.remove(&node.id);
        Some(node)
    }
}

/// Ordered in-memory store backing tests and embedded deployments
#[derive(Default)]
pub struct MemoryStore {
    table: Arc<Mutex<TreeTable>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NodeStore for MemoryStore {
    async fn get(&self, id: &str) -> Result<Option<Node>> {
        Ok(self.table.lock().await.get_by_id(id))
    }

    async fn get_by_path(&self, path: &TreePath) -> Result<Option<Node>> {
        Ok(self.table.lock().await.get_by_path(path))
    }

    async fn scan_prefix(&self, prefix: &TreePath, min_depth: u32) -> Result<Vec<Node>> {
        Ok(self.table.lock().await.scan_prefix(prefix, min_depth))
    }

    async fn children_of(&self, path: &TreePath) -> Result<Vec<Node>> {
        Ok(self.table.lock().await.children_of(path))
    }

    async fn root(&self) -> Result<Option<Node>> {
        Ok(self.table.lock().await.root())
    }

    async fn begin(&self) -> Result<Box<dyn TreeTransaction>> {
        let guard = self.table.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, working }))
    }
}

/// Guard-holding transaction over a staged copy of the table.
///
/// The owned mutex guard keeps every other reader and writer out until the
/// transaction resolves; dropping without commit leaves the shared table
/// untouched.
struct MemoryTransaction {
    guard: OwnedMutexGuard<TreeTable>,
    working: TreeTable,
}

#[async_trait]
impl TreeTransaction for MemoryTransaction {
    async fn get(&self, id: &str) -> Result<Option<Node>> {
        Ok(self.working.get_by_id(id))
    }

    async fn get_by_path(&self, path: &TreePath) -> Result<Option<Node>> {
        Ok(self.working.get_by_path(path))
    }

    async fn scan_prefix(&self, prefix: &TreePath, min_depth: u32) -> Result<Vec<Node>> {
        Ok(self.working.scan_prefix(prefix, min_depth))
    }

    async fn children_of(&self, path: &TreePath) -> Result<Vec<Node>> {
        Ok(self.working.children_of(path))
    }

    async fn insert(&mut self, node: Node) -> Result<()> {
        self.working.insert(node).map_err(anyhow::Error::from)
    }

    async fn remove(&mut self, path: &TreePath) -> Result<Option<Node>> {
        Ok(self.working.remove(path))
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryTransaction { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        drop(self);
        Ok(())
    }
}
