//! Sitetree Core Business Logic Layer
//!
//! This crate provides the page-tree data model, persistence abstraction and
//! structural operations for the Sitetree content-management system.
//!
//! # Architecture
//!
//! - **Materialized paths**: every node carries a fixed-width base-36 path;
//!   lexicographic order equals tree order, so subtree queries are ordered
//!   range scans
//! - **Transactional rewrites**: relocation rewrites path, depth and
//!   url_path for a whole subtree inside one store transaction
//! - **Opaque collaborators**: permission policy, event consumers and the
//!   audit sink sit behind traits; the tree core never couples to them
//!
//! # Modules
//!
//! - [`models`] - Data structures (Node, TreePath, MovePosition)
//! - [`db`] - Store abstraction, ordered in-memory backend, domain events
//! - [`services`] - Business services (TreeService, permissions, audit)

pub mod db;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use models::*;
pub use services::*;
