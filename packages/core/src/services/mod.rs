//! Business Services
//!
//! This module contains the core business logic services:
//!
//! - `TreeService` - structural tree operations (relocate, create, delete)
//!   and hierarchy reads
//! - `PermissionOracle` - capability gate consulted before relocations
//! - `AuditLog` - sink for completed-change records
//!
//! Services coordinate between the database layer and application logic,
//! implementing business rules and orchestrating complex operations.

pub mod audit;
pub mod error;
pub mod permissions;
pub mod tree_service;

pub use audit::{AuditEntry, AuditLog, MemoryAuditLog};
pub use error::TreeServiceError;
pub use permissions::{Actor, AllowAll, PermissionOracle};
pub use tree_service::{TreeService, ACTION_DELETE, ACTION_MOVE};
