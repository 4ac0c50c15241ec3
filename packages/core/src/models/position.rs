//! Position Specifiers
//!
//! Relative-placement instructions for relocations and inserts. Values ending
//! in `-child` treat the move target as the new parent; all other values
//! place the node among the target's siblings.

use serde::{Deserialize, Serialize};

/// Where a relocated node lands relative to the move target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MovePosition {
    /// First among the target's children
    FirstChild,
    /// Last among the target's children
    LastChild,
    /// Among the target's children, ordered by slug
    SortedChild,
    /// Directly before the target, under the target's parent
    BeforeSibling,
    /// Directly after the target, under the target's parent
    AfterSibling,
    /// Under the target's parent, ordered by slug
    SortedPosition,
}

impl MovePosition {
    /// Whether the target itself becomes the new parent
    pub fn is_child_of_target(&self) -> bool {
        matches!(
            self,
            MovePosition::FirstChild | MovePosition::LastChild | MovePosition::SortedChild
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kebab_case_wire_format() {
        assert_eq!(
            serde_json::to_string(&MovePosition::FirstChild).unwrap(),
            "\"first-child\""
        );
        assert_eq!(
            serde_json::to_string(&MovePosition::SortedPosition).unwrap(),
            "\"sorted-position\""
        );
        let pos: MovePosition = serde_json::from_str("\"before-sibling\"").unwrap();
        assert_eq!(pos, MovePosition::BeforeSibling);
    }

    #[test]
    fn test_child_positions() {
        assert!(MovePosition::FirstChild.is_child_of_target());
        assert!(MovePosition::LastChild.is_child_of_target());
        assert!(MovePosition::SortedChild.is_child_of_target());
        assert!(!MovePosition::BeforeSibling.is_child_of_target());
        assert!(!MovePosition::AfterSibling.is_child_of_target());
        assert!(!MovePosition::SortedPosition.is_child_of_target());
    }
}
