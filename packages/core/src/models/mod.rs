//! Data Model
//!
//! Core data structures for the page tree:
//!
//! - [`Node`] - the universal tree entry (id, slugs, path, depth, properties)
//! - [`TreePath`] - materialized-path encoding with fixed-width base-36
//!   segments
//! - [`MovePosition`] - relative-placement specifier for relocations

pub mod node;
pub mod path;
pub mod position;

pub use node::{Node, ValidationError};
pub use path::{PathError, TreePath, MAX_SEGMENT, STEP_LEN};
pub use position::MovePosition;
