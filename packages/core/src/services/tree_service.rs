//! Tree Service
//!
//! `TreeService` owns every structural change to the page tree: relocation
//! (the core), creation, cascade deletion, and the hierarchy reads the rest
//! of the system builds on. It coordinates the store, the permission oracle,
//! the event channel and the audit log; it holds no tree state of its own.
//!
//! # Relocation
//!
//! A relocation rewrites the materialized path, depth and url_path of the
//! moved node and all of its descendants in one store transaction. The path
//! suffix of every descendant — its position inside the moved subtree — is
//! preserved; only the prefix changes. When the requested slot among the new
//! siblings is occupied, the contiguous run of siblings after it slides up
//! one segment, each with its own subtree, using the same prefix rewrite.
//!
//! Authorization is checked before anything is touched; pre/post move events
//! bracket the rewrite and are best-effort; the audit record is written after
//! commit.

use crate::db::{NodeStore, TreeEvent, TreeTransaction, TREE_EVENT_CHANNEL_CAPACITY};
use crate::models::{MovePosition, Node, TreePath};
use crate::services::audit::{AuditEntry, AuditLog, MemoryAuditLog};
use crate::services::error::TreeServiceError;
use crate::services::permissions::{Actor, AllowAll, PermissionOracle};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Audit action name for relocations
pub const ACTION_MOVE: &str = "tree.node.move";
/// Audit action name for subtree deletions
pub const ACTION_DELETE: &str = "tree.node.delete";

/// Business service for the page tree
#[derive(Clone)]
pub struct TreeService {
    /// Store for all persistence operations
    store: Arc<dyn NodeStore>,

    /// Capability check consulted before relocations with an actor
    oracle: Arc<dyn PermissionOracle>,

    /// Sink for completed-change records
    audit: Arc<dyn AuditLog>,

    /// Broadcast channel for tree events
    event_tx: broadcast::Sender<TreeEvent>,
}

impl TreeService {
    /// Create a new TreeService over a store, with an allow-all permission
    /// oracle and an in-memory audit log
    pub fn new(store: Arc<dyn NodeStore>) -> Self {
        let (event_tx, _) = broadcast::channel(TREE_EVENT_CHANNEL_CAPACITY);
        Self {
            store,
            oracle: Arc::new(AllowAll),
            audit: Arc::new(MemoryAuditLog::new()),
            event_tx,
        }
    }

    /// Replace the permission oracle
    pub fn with_oracle(mut self, oracle: Arc<dyn PermissionOracle>) -> Self {
        self.oracle = oracle;
        self
    }

    /// Replace the audit sink
    pub fn with_audit(mut self, audit: Arc<dyn AuditLog>) -> Self {
        self.audit = audit;
        self
    }

    /// Get access to the underlying store
    pub fn store(&self) -> &Arc<dyn NodeStore> {
        &self.store
    }

    /// Subscribe to tree events.
    ///
    /// Returns a broadcast receiver that sees every event emitted after the
    /// subscription. Delivery is fire-and-forget; a lagging subscriber drops
    /// old events rather than blocking tree operations.
    pub fn subscribe_to_events(&self) -> broadcast::Receiver<TreeEvent> {
        self.event_tx.subscribe()
    }

    /// Emit a tree event to all subscribers; absent subscribers are fine
    fn emit_event(&self, event: TreeEvent) {
        let event_type = event.event_type().to_string();
        if self.event_tx.send(event).is_err() {
            debug!(%event_type, "tree event had no subscribers");
        }
    }

    //
    // RELOCATION
    //

    /// Relocate `node_id` relative to `target_id`.
    ///
    /// `position` decides how the target is interpreted: the `*-child`
    /// positions make the target the new parent; the sibling positions put
    /// the node next to the target under the target's parent.
    ///
    /// The node's subtree keeps its internal shape — every descendant's path
    /// suffix and relative order survive; only the common prefix, the depths
    /// and the url_paths change. The whole rewrite is one store transaction.
    ///
    /// Moving a node to the position it already occupies is not
    /// special-cased: the rewrite, both events and the audit record still
    /// happen, so the audit trail reflects every attempted move.
    ///
    /// # Arguments
    ///
    /// * `node_id` - root of the subtree to move
    /// * `target_id` - parent or sibling the move is positioned against
    /// * `position` - placement relative to the target
    /// * `actor` - requesting identity; `None` for trusted system moves,
    ///   which skip the permission gate
    ///
    /// # Errors
    ///
    /// - [`TreeServiceError::NodeNotFound`] - `node_id` does not exist
    /// - [`TreeServiceError::Unauthorized`] - the oracle denied the move;
    ///   nothing was mutated
    /// - [`TreeServiceError::InvalidTarget`] - missing target, target
    ///   alongside the root, or the node would become its own ancestor;
    ///   nothing was mutated
    /// - [`TreeServiceError::StoreFailure`] - the transaction aborted; all
    ///   partial writes rolled back
    pub async fn relocate(
        &self,
        node_id: &str,
        target_id: &str,
        position: MovePosition,
        actor: Option<&Actor>,
    ) -> Result<Node, TreeServiceError> {
        let node = self.require_node(node_id).await?;
        let target = self
            .store
            .get(target_id)
            .await?
            .ok_or_else(|| TreeServiceError::invalid_target(format!("no such target: {target_id}")))?;
        if !position.is_child_of_target() && target.id == node.id {
            return Err(TreeServiceError::invalid_target(
                "cannot position a node relative to itself",
            ));
        }

        let parent_after = self.resolve_parent_after(&target, position).await?;
        Self::ensure_no_cycle(&node, &parent_after)?;

        if let Some(actor) = actor {
            if !self.oracle.can_move(actor, &node, &parent_after).await {
                return Err(TreeServiceError::unauthorized(format!(
                    "actor {} may not move node {} under {}",
                    actor.id, node.id, parent_after.id
                )));
            }
        }

        let mut tx = self.store.begin().await?;

        // Authoritative re-reads: everything fetched before the transaction
        // may be stale by now.
        let node = tx
            .get(node_id)
            .await?
            .ok_or_else(|| TreeServiceError::node_not_found(node_id))?;
        let parent_after = tx.get(&parent_after.id).await?.ok_or_else(|| {
            TreeServiceError::invalid_target("resolved parent vanished before the move")
        })?;
        Self::ensure_no_cycle(&node, &parent_after)?;

        let old_path = node.path.clone();
        let old_depth = node.depth;
        let old_url_path = node.url_path.clone();
        let old_parent_id = match old_path.parent() {
            Some(parent_path) => tx.get_by_path(&parent_path).await?.map(|n| n.id),
            None => None,
        };

        // Future siblings, without the node itself (same-parent moves)
        let mut siblings = tx.children_of(&parent_after.path).await?;
        siblings.retain(|s| s.id != node.id);
        let insert_at = Self::insertion_index(&siblings, &node, &target, position)?;
        let (new_segment, shifts) = Self::allocate_segment(&siblings, insert_at)?;

        let new_path = parent_after.path.child(new_segment)?;
        let new_depth = parent_after.depth + 1;
        let new_url_path = format!("{}{}/", parent_after.url_path, node.slug);
        let depth_delta = i64::from(new_depth) - i64::from(old_depth);

        debug!(
            node_id,
            old_path = %old_path,
            new_path = %new_path,
            shifted_siblings = shifts.len(),
            "relocating subtree"
        );

        self.emit_event(TreeEvent::PreMove {
            node: node.clone(),
            target_id: target.id.clone(),
            position,
        });

        // Detach the moved subtree first so sibling shifts can slide through
        // its vacated slot.
        let moved = Self::take_subtree(tx.as_mut(), &old_path, old_depth).await?;

        // Make room: displaced siblings slide up one segment, rightmost
        // first so no rewrite lands on a still-occupied path.
        for (from, to) in shifts.iter().rev() {
            let subtree = Self::take_subtree(tx.as_mut(), from, from.depth()).await?;
            for record in Self::rewrite_records(subtree, from, to, 0, "", "")? {
                tx.insert(record).await?;
            }
        }

        let mut relocated = None;
        for mut record in Self::rewrite_records(
            moved,
            &old_path,
            &new_path,
            depth_delta,
            &old_url_path,
            &new_url_path,
        )? {
            if record.id == node.id {
                record.modified_at = Utc::now();
                relocated = Some(record.clone());
            }
            tx.insert(record).await?;
        }
        let relocated = relocated.ok_or_else(|| {
            TreeServiceError::hierarchy_violation(format!(
                "node {node_id} missing from its own subtree scan"
            ))
        })?;

        tx.commit().await?;

        self.emit_event(TreeEvent::PostMove {
            node: relocated.clone(),
            target_id: target.id.clone(),
            position,
        });

        self.record_audit(AuditEntry::new(
            ACTION_MOVE,
            &relocated.id,
            old_parent_id,
            Some(parent_after.id.clone()),
            actor.map(|a| a.id.clone()),
        ))
        .await;

        Ok(relocated)
    }

    //
    // CREATION
    //

    /// Create the tree's root node.
    ///
    /// The root's url_path is `/`; its slug only names it and never appears
    /// in descendant url_paths. A tree can hold exactly one root.
    pub async fn add_root(
        &self,
        title: impl Into<String>,
        slug: impl Into<String>,
        properties: Value,
    ) -> Result<Node, TreeServiceError> {
        let mut tx = self.store.begin().await?;
        if tx.get_by_path(&TreePath::root()).await?.is_some() {
            return Err(TreeServiceError::hierarchy_violation(
                "tree already has a root",
            ));
        }
        let node = Node::new(
            title.into(),
            slug.into(),
            TreePath::root(),
            "/".to_string(),
            properties,
        );
        node.validate()?;
        tx.insert(node.clone()).await?;
        tx.commit().await?;

        self.emit_event(TreeEvent::NodeCreated(node.clone()));
        Ok(node)
    }

    /// Create a node as the last child of `parent_id`
    pub async fn add_child(
        &self,
        parent_id: &str,
        title: impl Into<String>,
        slug: impl Into<String>,
        properties: Value,
    ) -> Result<Node, TreeServiceError> {
        let slug = slug.into();
        let mut tx = self.store.begin().await?;
        let parent = tx
            .get(parent_id)
            .await?
            .ok_or_else(|| TreeServiceError::node_not_found(parent_id))?;

        let children = tx.children_of(&parent.path).await?;
        let segment = match children.last() {
            Some(last) => last.path.last_index()? + 1,
            None => 1,
        };
        let node = Node::new(
            title.into(),
            slug.clone(),
            parent.path.child(segment)?,
            format!("{}{}/", parent.url_path, slug),
            properties,
        );
        node.validate()?;
        tx.insert(node.clone()).await?;
        tx.commit().await?;

        self.emit_event(TreeEvent::NodeCreated(node.clone()));
        Ok(node)
    }

    //
    // DELETION
    //

    /// Delete a node and every descendant in one transaction.
    ///
    /// Returns the number of removed records.
    pub async fn delete_subtree(
        &self,
        node_id: &str,
        actor: Option<&Actor>,
    ) -> Result<usize, TreeServiceError> {
        let mut tx = self.store.begin().await?;
        let node = tx
            .get(node_id)
            .await?
            .ok_or_else(|| TreeServiceError::node_not_found(node_id))?;
        let old_parent_id = match node.parent_path() {
            Some(parent_path) => tx.get_by_path(&parent_path).await?.map(|n| n.id),
            None => None,
        };

        let removed = Self::take_subtree(tx.as_mut(), &node.path, node.depth).await?;
        let count = removed.len();
        tx.commit().await?;

        self.emit_event(TreeEvent::SubtreeDeleted {
            root_id: node.id.clone(),
            removed: count,
        });
        self.record_audit(AuditEntry::new(
            ACTION_DELETE,
            &node.id,
            old_parent_id,
            None,
            actor.map(|a| a.id.clone()),
        ))
        .await;

        Ok(count)
    }

    //
    // HIERARCHY READS
    //

    /// Get a node by ID
    pub async fn get_node(&self, id: &str) -> Result<Option<Node>, TreeServiceError> {
        Ok(self.store.get(id).await?)
    }

    /// Get a node's parent; `None` for the root
    pub async fn get_parent(&self, node_id: &str) -> Result<Option<Node>, TreeServiceError> {
        let node = self.require_node(node_id).await?;
        match node.parent_path() {
            Some(parent_path) => Ok(self.store.get_by_path(&parent_path).await?),
            None => Ok(None),
        }
    }

    /// Direct children in sibling order
    pub async fn get_children(&self, node_id: &str) -> Result<Vec<Node>, TreeServiceError> {
        let node = self.require_node(node_id).await?;
        Ok(self.store.children_of(&node.path).await?)
    }

    /// Every strict descendant, in pre-order
    pub async fn get_descendants(&self, node_id: &str) -> Result<Vec<Node>, TreeServiceError> {
        let node = self.require_node(node_id).await?;
        Ok(self.store.scan_prefix(&node.path, node.depth + 1).await?)
    }

    /// Whether `descendant_id` lies strictly inside `ancestor_id`'s subtree
    pub async fn is_descendant(
        &self,
        ancestor_id: &str,
        descendant_id: &str,
    ) -> Result<bool, TreeServiceError> {
        let ancestor = self.require_node(ancestor_id).await?;
        let descendant = self.require_node(descendant_id).await?;
        Ok(ancestor.id != descendant.id && ancestor.path.contains(&descendant.path))
    }

    //
    // INTERNALS
    //

    async fn require_node(&self, id: &str) -> Result<Node, TreeServiceError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| TreeServiceError::node_not_found(id))
    }

    /// Resolve the node's parent once the move completes
    async fn resolve_parent_after(
        &self,
        target: &Node,
        position: MovePosition,
    ) -> Result<Node, TreeServiceError> {
        if position.is_child_of_target() {
            return Ok(target.clone());
        }
        match target.parent_path() {
            Some(parent_path) => self
                .store
                .get_by_path(&parent_path)
                .await?
                .ok_or_else(|| {
                    TreeServiceError::invalid_target(format!(
                        "target {} has no stored parent",
                        target.id
                    ))
                }),
            None => Err(TreeServiceError::invalid_target(
                "cannot position a node alongside the root",
            )),
        }
    }

    /// Reject moves that would make the node an ancestor of itself
    fn ensure_no_cycle(node: &Node, parent_after: &Node) -> Result<(), TreeServiceError> {
        if node.path.contains(&parent_after.path) {
            return Err(TreeServiceError::invalid_target(format!(
                "moving node {} under {} would make it an ancestor of itself",
                node.id, parent_after.id
            )));
        }
        Ok(())
    }

    /// Index at which the node lands in the future sibling list (which
    /// excludes the node itself)
    fn insertion_index(
        siblings: &[Node],
        node: &Node,
        target: &Node,
        position: MovePosition,
    ) -> Result<usize, TreeServiceError> {
        match position {
            MovePosition::FirstChild => Ok(0),
            MovePosition::LastChild => Ok(siblings.len()),
            MovePosition::SortedChild | MovePosition::SortedPosition => Ok(siblings
                .iter()
                .position(|s| s.slug.as_str() > node.slug.as_str())
                .unwrap_or(siblings.len())),
            MovePosition::BeforeSibling => siblings
                .iter()
                .position(|s| s.id == target.id)
                .ok_or_else(|| {
                    TreeServiceError::invalid_target(format!(
                        "target {} is not a child of the resolved parent",
                        target.id
                    ))
                }),
            MovePosition::AfterSibling => siblings
                .iter()
                .position(|s| s.id == target.id)
                .map(|idx| idx + 1)
                .ok_or_else(|| {
                    TreeServiceError::invalid_target(format!(
                        "target {} is not a child of the resolved parent",
                        target.id
                    ))
                }),
        }
    }

    /// Pick the segment for the inserted node and the sibling shifts needed
    /// to free it.
    ///
    /// Appending past the last sibling, or landing in a gap left by earlier
    /// moves, needs no shifts. Landing on an occupied segment displaces the
    /// contiguous run of siblings starting there by one slot each; the run
    /// ends at the first gap. Returned shifts are `(from, to)` sibling
    /// paths in left-to-right order.
    #[allow(clippy::type_complexity)]
    fn allocate_segment(
        siblings: &[Node],
        insert_at: usize,
    ) -> Result<(u32, Vec<(TreePath, TreePath)>), TreeServiceError> {
        let previous = if insert_at == 0 {
            0
        } else {
            siblings[insert_at - 1].path.last_index()?
        };

        if insert_at == siblings.len() {
            return Ok((Self::next_segment(previous)?, Vec::new()));
        }

        let occupant = siblings[insert_at].path.last_index()?;
        if occupant > previous + 1 {
            // free slot right after the left neighbour
            return Ok((previous + 1, Vec::new()));
        }

        let mut shifts = Vec::new();
        let mut expected = occupant;
        for sibling in &siblings[insert_at..] {
            let segment = sibling.path.last_index()?;
            if segment != expected {
                break;
            }
            let to = sibling.path.sibling(Self::next_segment(segment)?)?;
            shifts.push((sibling.path.clone(), to));
            expected = segment + 1;
        }
        Ok((occupant, shifts))
    }

    fn next_segment(segment: u32) -> Result<u32, TreeServiceError> {
        if segment >= crate::models::MAX_SEGMENT {
            return Err(TreeServiceError::hierarchy_violation(
                "sibling slots exhausted at this level",
            ));
        }
        Ok(segment + 1)
    }

    /// Scan a subtree and remove every record from the staged state,
    /// returning them in pre-order
    async fn take_subtree(
        tx: &mut dyn TreeTransaction,
        prefix: &TreePath,
        min_depth: u32,
    ) -> Result<Vec<Node>, TreeServiceError> {
        let records = tx.scan_prefix(prefix, min_depth).await?;
        for record in &records {
            tx.remove(&record.path).await?;
        }
        Ok(records)
    }

    /// Rewrite a batch of subtree records under a new prefix.
    ///
    /// Swaps `old_prefix` for `new_prefix` in every path (suffixes intact),
    /// shifts depths by `depth_delta`, and — when `old_url_prefix` is
    /// non-empty — swaps the url_path prefix the same way.
    fn rewrite_records(
        records: Vec<Node>,
        old_prefix: &TreePath,
        new_prefix: &TreePath,
        depth_delta: i64,
        old_url_prefix: &str,
        new_url_prefix: &str,
    ) -> Result<Vec<Node>, TreeServiceError> {
        records
            .into_iter()
            .map(|mut record| {
                record.path = record.path.replace_prefix(old_prefix, new_prefix)?;
                record.depth = (i64::from(record.depth) + depth_delta) as u32;
                if !old_url_prefix.is_empty() {
                    if let Some(rest) = record.url_path.strip_prefix(old_url_prefix) {
                        record.url_path = format!("{new_url_prefix}{rest}");
                    }
                }
                Ok(record)
            })
            .collect()
    }

    /// Best-effort audit write; a failing sink is logged, never surfaced
    async fn record_audit(&self, entry: AuditEntry) {
        let node_id = entry.node_id.clone();
        let action = entry.action.clone();
        if let Err(err) = self.audit.record(entry).await {
            warn!(%err, %node_id, %action, "audit record failed");
        }
    }
}

// Relocation scenario tests in separate module
#[cfg(test)]
#[path = "tree_service_move_test.rs"]
mod tree_service_move_test;
