//! Audit Log
//!
//! Records completed structural changes: which node, which parent it left,
//! which parent it joined, and on whose behalf. Recording happens after the
//! store transaction commits and is best-effort — a failing audit sink is
//! logged and never un-does a committed move. The `AuditLog` seam exists so
//! a deployment can swap in a sink that shares the store's transaction if it
//! needs gap-free auditing.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

/// One completed structural change
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    /// Action name, e.g. `tree.node.move`
    pub action: String,
    pub node_id: String,
    /// Parent before the change, `None` when the node was the root
    pub old_parent_id: Option<String>,
    /// Parent after the change, `None` for deletions
    pub new_parent_id: Option<String>,
    /// Requesting actor, `None` for system-initiated changes
    pub actor_id: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        action: impl Into<String>,
        node_id: impl Into<String>,
        old_parent_id: Option<String>,
        new_parent_id: Option<String>,
        actor_id: Option<String>,
    ) -> Self {
        Self {
            action: action.into(),
            node_id: node_id.into(),
            old_parent_id,
            new_parent_id,
            actor_id,
            recorded_at: Utc::now(),
        }
    }
}

/// Sink for completed-change records
#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn record(&self, entry: AuditEntry) -> Result<()>;
}

/// In-memory audit sink; the default, and what the test-suite asserts
/// against
#[derive(Default)]
pub struct MemoryAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far
    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().await.clone()
    }
}

#[async_trait]
impl AuditLog for MemoryAuditLog {
    async fn record(&self, entry: AuditEntry) -> Result<()> {
        self.entries.lock().await.push(entry);
        Ok(())
    }
}
