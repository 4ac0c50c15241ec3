//! Materialized Tree Paths
//!
//! This module defines `TreePath`, the materialized-path encoding used for the
//! whole page hierarchy. A path is a sequence of fixed-width base-36 segments
//! joined by `.`, one segment per ancestor level plus the node itself:
//!
//! ```text
//! 0001            root          (depth 1)
//! 0001.0001       first child   (depth 2)
//! 0001.0001.0002  grandchild    (depth 3)
//! ```
//!
//! Two properties make this encoding the backbone of the store:
//!
//! - Lexicographic order of the path string equals pre-order tree traversal,
//!   so an ordered map keyed by path serves subtree queries as contiguous
//!   range scans.
//! - A node's descendants are exactly the records whose path extends the
//!   node's path by at least one segment.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Width of one path segment in characters
pub const STEP_LEN: usize = 4;

/// Largest index a single segment can encode (`ZZZZ` in base-36)
pub const MAX_SEGMENT: u32 = 36u32.pow(STEP_LEN as u32) - 1;

const SEPARATOR: char = '.';

/// Errors for path construction and rewriting
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Empty path")]
    Empty,

    #[error("Invalid path segment: {0:?}")]
    InvalidSegment(String),

    #[error("Segment index out of range: {0}")]
    SegmentOutOfRange(u32),

    #[error("Path {path:?} does not extend prefix {prefix:?}")]
    PrefixMismatch { path: String, prefix: String },
}

/// A validated materialized path.
///
/// Construction always goes through validation (`parse`, `child`, `sibling`,
/// `replace_prefix`), so every `TreePath` in the system holds well-formed
/// segments. `Ord` is derived from the underlying string, which is exactly
/// pre-order tree order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TreePath(String);

impl TreePath {
    /// The designated root path (segment index 1 at depth 1)
    pub fn root() -> Self {
        // encode_segment(1) cannot fail: 1 is always in range
        TreePath(Self::encode_segment(1).unwrap_or_else(|_| "0001".to_string()))
    }

    /// Parse and validate a dotted path string
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        if raw.is_empty() {
            return Err(PathError::Empty);
        }
        for segment in raw.split(SEPARATOR) {
            if Self::decode_segment(segment).is_none() {
                return Err(PathError::InvalidSegment(segment.to_string()));
            }
        }
        Ok(TreePath(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of segments; equals the owning node's depth
    pub fn depth(&self) -> u32 {
        self.0.split(SEPARATOR).count() as u32
    }

    /// Path of the parent node, or `None` at root depth
    pub fn parent(&self) -> Option<TreePath> {
        self.0
            .rfind(SEPARATOR)
            .map(|idx| TreePath(self.0[..idx].to_string()))
    }

    /// The final segment (the node's slot among its siblings)
    pub fn last_segment(&self) -> &str {
        match self.0.rfind(SEPARATOR) {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    /// Numeric index of the final segment
    pub fn last_index(&self) -> Result<u32, PathError> {
        Self::decode_segment(self.last_segment())
            .ok_or_else(|| PathError::InvalidSegment(self.last_segment().to_string()))
    }

    /// Path of a direct child at the given segment index
    pub fn child(&self, index: u32) -> Result<TreePath, PathError> {
        let segment = Self::encode_segment(index)?;
        Ok(TreePath(format!("{}{}{}", self.0, SEPARATOR, segment)))
    }

    /// Path at the same depth with the final segment replaced
    pub fn sibling(&self, index: u32) -> Result<TreePath, PathError> {
        let segment = Self::encode_segment(index)?;
        match self.parent() {
            Some(parent) => Ok(TreePath(format!("{}{}{}", parent.0, SEPARATOR, segment))),
            None => Ok(TreePath(segment)),
        }
    }

    /// Whether `other` lies inside this path's subtree (self included).
    ///
    /// Segment-boundary aware: a path contains another only when the other
    /// extends it by whole segments.
    pub fn contains(&self, other: &TreePath) -> bool {
        other.0 == self.0
            || (other.0.len() > self.0.len()
                && other.0.starts_with(&self.0)
                && other.0.as_bytes()[self.0.len()] == SEPARATOR as u8)
    }

    /// Rewrite this path by swapping `old_prefix` for `new_prefix`, keeping
    /// the suffix (the position inside the moved subtree) intact.
    pub fn replace_prefix(
        &self,
        old_prefix: &TreePath,
        new_prefix: &TreePath,
    ) -> Result<TreePath, PathError> {
        if self.0 == old_prefix.0 {
            return Ok(new_prefix.clone());
        }
        if !old_prefix.contains(self) {
            return Err(PathError::PrefixMismatch {
                path: self.0.clone(),
                prefix: old_prefix.0.clone(),
            });
        }
        let suffix = &self.0[old_prefix.0.len()..]; // starts with the separator
        Ok(TreePath(format!("{}{}", new_prefix.0, suffix)))
    }

    /// Encode a segment index as fixed-width uppercase base-36.
    ///
    /// Index 0 is reserved (segments count from 1, matching the root at
    /// `0001`), so both 0 and anything past `MAX_SEGMENT` are rejected.
    fn encode_segment(index: u32) -> Result<String, PathError> {
        if index == 0 || index > MAX_SEGMENT {
            return Err(PathError::SegmentOutOfRange(index));
        }
        let mut remainder = index;
        let mut out = ['0'; STEP_LEN];
        for slot in out.iter_mut().rev() {
            let digit = remainder % 36;
            remainder /= 36;
            *slot = char::from_digit(digit, 36)
                .map(|c| c.to_ascii_uppercase())
                .unwrap_or('0');
        }
        Ok(out.iter().collect())
    }

    /// Decode a fixed-width uppercase base-36 segment, `None` if malformed
    fn decode_segment(segment: &str) -> Option<u32> {
        if segment.len() != STEP_LEN {
            return None;
        }
        let mut value: u32 = 0;
        for c in segment.chars() {
            if !(c.is_ascii_digit() || c.is_ascii_uppercase()) {
                return None;
            }
            value = value * 36 + c.to_digit(36)?;
        }
        if value == 0 {
            return None;
        }
        Some(value)
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TreePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TreePath::parse(s)
    }
}

impl TryFrom<String> for TreePath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TreePath::parse(&value)
    }
}

impl From<TreePath> for String {
    fn from(path: TreePath) -> Self {
        path.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_depth() {
        let path = TreePath::parse("0001.0001.0002").unwrap();
        assert_eq!(path.depth(), 3);
        assert_eq!(path.last_segment(), "0002");
        assert_eq!(path.parent().unwrap().as_str(), "0001.0001");
        assert_eq!(TreePath::root().as_str(), "0001");
        assert_eq!(TreePath::root().parent(), None);
    }

    #[test]
    fn test_parse_rejects_malformed_segments() {
        assert!(matches!(TreePath::parse(""), Err(PathError::Empty)));
        assert!(TreePath::parse("001").is_err()); // wrong width
        assert!(TreePath::parse("0001.00a2").is_err()); // lowercase
        assert!(TreePath::parse("0001..0002").is_err());
        assert!(TreePath::parse("0000").is_err()); // reserved index 0
    }

    #[test]
    fn test_base36_round_trip() {
        for index in [1, 9, 10, 35, 36, 1295, 1296, MAX_SEGMENT] {
            let seg = TreePath::encode_segment(index).unwrap();
            assert_eq!(seg.len(), STEP_LEN);
            assert_eq!(TreePath::decode_segment(&seg), Some(index));
        }
        assert_eq!(TreePath::encode_segment(10).unwrap(), "000A");
        assert_eq!(TreePath::encode_segment(36).unwrap(), "0010");
    }

    #[test]
    fn test_encode_out_of_range() {
        assert!(matches!(
            TreePath::encode_segment(0),
            Err(PathError::SegmentOutOfRange(0))
        ));
        assert!(TreePath::encode_segment(MAX_SEGMENT + 1).is_err());
    }

    #[test]
    fn test_child_and_sibling() {
        let root = TreePath::root();
        let child = root.child(2).unwrap();
        assert_eq!(child.as_str(), "0001.0002");
        assert_eq!(child.sibling(10).unwrap().as_str(), "0001.000A");
        assert_eq!(root.sibling(3).unwrap().as_str(), "0003");
    }

    #[test]
    fn test_contains_is_segment_boundary_aware() {
        let a = TreePath::parse("0001.0002").unwrap();
        let inside = TreePath::parse("0001.0002.0001").unwrap();
        assert!(a.contains(&a));
        assert!(a.contains(&inside));
        assert!(!inside.contains(&a));
        let b = TreePath::parse("0001.0003").unwrap();
        assert!(!a.contains(&b));
        // sibling at the same depth whose segment shares leading characters
        let c = TreePath::parse("0001.0002.0010").unwrap();
        let d = TreePath::parse("0001.0002.0011").unwrap();
        assert!(!c.contains(&d));
    }

    #[test]
    fn test_replace_prefix_preserves_suffix() {
        let old = TreePath::parse("0001.0001").unwrap();
        let new = TreePath::parse("0001.0002.0001").unwrap();
        let descendant = TreePath::parse("0001.0001.0003.0002").unwrap();

        let rewritten = descendant.replace_prefix(&old, &new).unwrap();
        assert_eq!(rewritten.as_str(), "0001.0002.0001.0003.0002");
        // the whole prefix is swapped when the path IS the prefix
        assert_eq!(old.replace_prefix(&old, &new).unwrap(), new);

        let unrelated = TreePath::parse("0001.0005").unwrap();
        assert!(matches!(
            unrelated.replace_prefix(&old, &new),
            Err(PathError::PrefixMismatch { .. })
        ));
    }

    #[test]
    fn test_lexicographic_order_is_preorder() {
        let mut paths = vec![
            TreePath::parse("0001.0002").unwrap(),
            TreePath::parse("0001").unwrap(),
            TreePath::parse("0001.0001.0001").unwrap(),
            TreePath::parse("0001.0001").unwrap(),
        ];
        paths.sort();
        let order: Vec<&str> = paths.iter().map(|p| p.as_str()).collect();
        assert_eq!(order, ["0001", "0001.0001", "0001.0001.0001", "0001.0002"]);
    }

    #[test]
    fn test_serde_round_trip_and_validation() {
        let path = TreePath::parse("0001.000A").unwrap();
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"0001.000A\"");
        let back: TreePath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
        assert!(serde_json::from_str::<TreePath>("\"bogus\"").is_err());
    }
}
