//! Repository-relative path value types
//!
//! This module provides two distinct path types using the newtype pattern:
//!
//! - [`ChangedPath`]: a file path reported by version control, taken as-is
//! - [`HookDirectory`]: a normalized directory path that may be written into
//!   the build hook file
//!
//! Both types always use `/` as the separator, independent of the host
//! platform, because they name locations inside a repository rather than on
//! the local filesystem.
//!
//! # Examples
//!
//! ```
//! use deopt_core::path::HookDirectory;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let base: HookDirectory = "dom/base/".parse()?;
//! assert_eq!(base.as_str(), "dom/base");
//!
//! let dom: HookDirectory = "./dom".parse()?;
//! assert!(dom.covers(&base));
//! assert!(!base.covers(&dom));
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// A repository-relative file path produced by a diff
///
/// No normalization is applied: the value is exactly what the version
/// control backend reported. Ordering is plain byte-wise string ordering,
/// which gives callers a deterministic traversal order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ChangedPath(String);

impl ChangedPath {
    /// Create a new `ChangedPath`
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Get the path as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Directory portion of the path, without the final segment
    ///
    /// Returns `None` for top-level files.
    ///
    /// ```
    /// use deopt_core::path::ChangedPath;
    ///
    /// assert_eq!(ChangedPath::new("dom/base/nsFoo.cpp").parent(), Some("dom/base"));
    /// assert_eq!(ChangedPath::new("README.md").parent(), None);
    /// ```
    pub fn parent(&self) -> Option<&str> {
        self.0
            .rsplit_once('/')
            .map(|(dir, _)| dir)
            .filter(|dir| !dir.is_empty())
    }
}

impl From<&str> for ChangedPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for ChangedPath {
    fn from(path: String) -> Self {
        Self(path)
    }
}

impl fmt::Display for ChangedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A normalized repository-relative directory
///
/// Invariants upheld by every constructor:
/// - never the repository root (at least one segment)
/// - no leading, trailing or doubled `/`
/// - no `.` or `..` segments
/// - no characters that cannot appear inside a quoted hook file entry
///
/// Two values are equal iff their normalized strings are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct HookDirectory(String);

impl HookDirectory {
    /// Normalize `raw` into a `HookDirectory`
    ///
    /// Empty segments and `.` segments are dropped, so `./dom//base/`
    /// normalizes to `dom/base`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHookDirectory`] if the path names the
    /// repository root, contains a `..` segment, or contains a quote,
    /// backslash or line break.
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |reason| Error::InvalidHookDirectory {
            path: raw.to_string(),
            reason,
        };

        if raw.contains(['"', '\\', '\n', '\r']) {
            return Err(invalid("contains a quote, backslash or line break"));
        }

        let mut normalized = String::with_capacity(raw.len());
        for segment in raw.split('/') {
            match segment {
                "" | "." => {}
                ".." => return Err(invalid("contains a '..' segment")),
                _ => {
                    if !normalized.is_empty() {
                        normalized.push('/');
                    }
                    normalized.push_str(segment);
                }
            }
        }

        if normalized.is_empty() {
            return Err(invalid("names the repository root"));
        }

        Ok(Self(normalized))
    }

    /// Get the normalized path
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of path segments
    pub fn depth(&self) -> usize {
        self.0.split('/').count()
    }

    /// Whether `other` is this directory or one of its descendants
    ///
    /// Matching is segment-wise: `dom/base` covers `dom/base/test` but not
    /// `dom/base2`.
    pub fn covers(&self, other: &HookDirectory) -> bool {
        other.0 == self.0 || self.is_ancestor_of(other)
    }

    /// Whether `other` is a proper descendant of this directory
    pub fn is_ancestor_of(&self, other: &HookDirectory) -> bool {
        other
            .0
            .strip_prefix(&self.0)
            .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Parent directory, or `None` for a top-level directory
    pub fn parent(&self) -> Option<Self> {
        self.0
            .rsplit_once('/')
            .map(|(parent, _)| Self(parent.to_string()))
    }
}

impl FromStr for HookDirectory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl AsRef<str> for HookDirectory {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HookDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;

    fn dir(s: &str) -> HookDirectory {
        HookDirectory::parse(s).unwrap()
    }

    #[test]
    fn test_parse_plain() {
        assert_eq!(dir("dom/base").as_str(), "dom/base");
    }

    #[test]
    fn test_parse_strips_separators_and_dots() {
        assert_eq!(dir("dom/base/").as_str(), "dom/base");
        assert_eq!(dir("/dom/base").as_str(), "dom/base");
        assert_eq!(dir("./dom//base").as_str(), "dom/base");
        assert_eq!(dir("dom/./base").as_str(), "dom/base");
    }

    #[test]
    fn test_parse_rejects_root() {
        for raw in ["", "/", ".", "./", "//"] {
            let err = HookDirectory::parse(raw).unwrap_err();
            assert!(
                err.to_string().contains("repository root"),
                "unexpected error for {raw:?}: {err}"
            );
        }
    }

    #[test]
    fn test_parse_rejects_parent_segments() {
        assert!(HookDirectory::parse("dom/../base").is_err());
        assert!(HookDirectory::parse("..").is_err());
    }

    #[test]
    fn test_parse_rejects_unwritable_characters() {
        assert!(HookDirectory::parse("dom/\"base").is_err());
        assert!(HookDirectory::parse("dom\\base").is_err());
        assert!(HookDirectory::parse("dom/base\n").is_err());
    }

    #[test]
    fn test_equality_is_on_normalized_form() {
        assert_eq!(dir("dom/base/"), dir("./dom/base"));
    }

    #[test]
    fn test_covers_is_segment_wise() {
        let base = dir("dom/base");
        assert!(base.covers(&dir("dom/base")));
        assert!(base.covers(&dir("dom/base/test")));
        assert!(!base.covers(&dir("dom/base2")));
        assert!(!base.covers(&dir("dom")));
    }

    #[test]
    fn test_is_ancestor_of_excludes_self() {
        let dom = dir("dom");
        assert!(dom.is_ancestor_of(&dir("dom/base")));
        assert!(!dom.is_ancestor_of(&dir("dom")));
        assert!(!dom.is_ancestor_of(&dir("domain")));
    }

    #[test]
    fn test_depth_and_parent() {
        let d = dir("a/b/c");
        assert_eq!(d.depth(), 3);
        assert_eq!(d.parent(), Some(dir("a/b")));
        assert_eq!(dir("a").parent(), None);
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let mut dirs = vec![dir("b"), dir("a/z"), dir("a")];
        dirs.sort();
        let names: Vec<_> = dirs.iter().map(HookDirectory::as_str).collect();
        assert_eq!(names, ["a", "a/z", "b"]);
    }

    #[test]
    fn test_changed_path_parent() {
        assert_eq!(ChangedPath::new("a/b/c.rs").parent(), Some("a/b"));
        assert_eq!(ChangedPath::new("top.txt").parent(), None);
        assert_eq!(ChangedPath::new("/abs.txt").parent(), None);
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let json = serde_json::to_string(&dir("dom/base")).unwrap();
        assert_eq!(json, "\"dom/base\"");
    }
}
