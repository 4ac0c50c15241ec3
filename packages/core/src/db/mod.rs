//! Database Layer
//!
//! Persistence for the page tree:
//!
//! - [`NodeStore`] / [`TreeTransaction`] - the storage abstraction: point
//!   reads, ordered prefix-range scans, explicit atomic transactions
//! - [`MemoryStore`] - ordered in-memory backend (`BTreeMap` keyed by path)
//! - [`TreeEvent`] - domain events published around structural changes
//!
//! # Architecture
//!
//! The store is an ordered index keyed by materialized path. Keeping the key
//! order equal to pre-order tree order turns every subtree operation — the
//! relocation rewrite above all — into a contiguous range scan instead of a
//! full-table filter.

mod error;
pub mod events;
mod memory_store;
mod node_store;

pub use error::DatabaseError;
pub use events::{TreeEvent, TREE_EVENT_CHANNEL_CAPACITY};
pub use memory_store::MemoryStore;
pub use node_store::{NodeStore, TreeTransaction};
