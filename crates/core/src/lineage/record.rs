#![forbid(unsafe_code)]

use super::key::{self, KeyError};

/// Reserved sentinel whose single DESCENDANT record points at the actual tree root.
pub const ROOT: &str = "ROOT";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LineageKind {
    /// `other` is an ancestor of `node_id`.
    Ancestor,
    /// `other` is a descendant of `node_id`.
    Descendant,
}

impl LineageKind {
    pub fn code(self) -> &'static str {
        match self {
            LineageKind::Ancestor => "A",
            LineageKind::Descendant => "D",
        }
    }

    pub fn from_code(value: &str) -> Option<Self> {
        match value {
            "A" => Some(LineageKind::Ancestor),
            "D" => Some(LineageKind::Descendant),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LineageKind::Ancestor => "ancestor",
            LineageKind::Descendant => "descendant",
        }
    }
}

/// One half of a tree edge: `node_id` sees `other` at `distance` hops in direction `kind`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineageRecord {
    pub node_id: String,
    pub kind: LineageKind,
    pub distance: u32,
    pub other: String,
    pub timestamp_ms: i64,
    /// Store-managed optimistic concurrency counter. `None` until first written.
    pub version: Option<i64>,
}

impl LineageRecord {
    pub fn hash_key(&self) -> Result<String, KeyError> {
        key::encode_hash(&self.node_id, self.kind)
    }

    pub fn range_key(&self) -> Result<String, KeyError> {
        key::encode_range(self.distance, &self.other)
    }

    pub fn keys(&self) -> Result<(String, String), KeyError> {
        Ok((self.hash_key()?, self.range_key()?))
    }

    /// Same logical content, ignoring the store-managed version.
    pub fn same_write(&self, other: &LineageRecord) -> bool {
        self.node_id == other.node_id
            && self.kind == other.kind
            && self.distance == other.distance
            && self.other == other.other
            && self.timestamp_ms == other.timestamp_ms
    }
}

impl std::fmt::Display for LineageRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}({} {} at {}, ts={}, version={:?})",
            self.node_id,
            self.kind.as_str(),
            self.other,
            self.distance,
            self.timestamp_ms,
            self.version
        )
    }
}
