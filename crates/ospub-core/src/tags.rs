//! The slice of the OSS tag taxonomy the publisher consumes.
//!
//! The full taxonomy lives with the registry; the engine only ever asks
//! membership questions about the four markers below.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ---------------------------------------------------------------------------
// Marker
// ---------------------------------------------------------------------------

/// Tags with publishing semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// The record must be removed from the destination.
    Delete,
    /// The record must never be written to production.
    Lock,
    /// The record exists for staging only.
    StagingOnly,
    /// The record is test data.
    Test,
}

impl Marker {
    pub fn as_str(self) -> &'static str {
        match self {
            Marker::Delete => "oss/delete",
            Marker::Lock => "oss/lock",
            Marker::StagingOnly => "oss/staging-only",
            Marker::Test => "oss/test",
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TagSet
// ---------------------------------------------------------------------------

/// An ordered set of tag names. Serialized as a plain string list so the
/// registry wire format stays flat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet(BTreeSet<String>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, marker: Marker) -> bool {
        self.0.contains(marker.as_str())
    }

    pub fn insert(&mut self, tag: impl Into<String>) {
        self.0.insert(tag.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_membership() {
        let tags: TagSet = ["oss/lock", "team/payments"].into_iter().collect();
        assert!(tags.has(Marker::Lock));
        assert!(!tags.has(Marker::Delete));
        assert!(!tags.has(Marker::StagingOnly));
    }

    #[test]
    fn serializes_as_string_list() {
        let tags: TagSet = ["oss/test"].into_iter().collect();
        let json = serde_json::to_string(&tags).unwrap();
        assert_eq!(json, r#"["oss/test"]"#);
        let back: TagSet = serde_json::from_str(&json).unwrap();
        assert!(back.has(Marker::Test));
    }

    #[test]
    fn non_marker_tags_are_kept() {
        let tags: TagSet = ["custom"].into_iter().collect();
        assert_eq!(tags.iter().collect::<Vec<_>>(), vec!["custom"]);
    }
}
