#![forbid(unsafe_code)]

use super::key::MAX_DISTANCE;
use super::order::WriteOrderKey;
use super::record::{LineageKind, LineageRecord, ROOT};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EdgeError {
    EmptyId,
    SelfLineage,
    ZeroDistance,
    DistanceOutOfRange,
    TimestampInFuture { timestamp_ms: i64, now_ms: i64 },
    NotAnAncestorRecord,
}

impl std::fmt::Display for EdgeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "edge ids must not be empty"),
            Self::SelfLineage => write!(f, "a node cannot be its own ancestor"),
            Self::ZeroDistance => write!(f, "edge distance must be at least 1"),
            Self::DistanceOutOfRange => write!(f, "edge distance exceeds the maximum depth"),
            Self::TimestampInFuture {
                timestamp_ms,
                now_ms,
            } => write!(
                f,
                "edge timestamp is in the future (timestamp_ms={timestamp_ms}, now_ms={now_ms})"
            ),
            Self::NotAnAncestorRecord => write!(f, "edge must be rebuilt from an ancestor record"),
        }
    }
}

impl std::error::Error for EdgeError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeRequest {
    pub ancestor_id: String,
    pub descendant_id: String,
    /// Depth of the ancestor counted from the actual root (root = 0).
    pub depth: u32,
    pub distance: u32,
    pub timestamp_ms: i64,
    pub version: Option<i64>,
    /// Latest timestamp the caller accepts as "not in the future".
    pub now_ms: i64,
}

/// The two complementary records that together represent one ancestor/descendant relation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgePair {
    ancestor_depth: u32,
    a2d: LineageRecord,
    d2a: LineageRecord,
}

impl EdgePair {
    pub fn build(request: EdgeRequest) -> Result<Self, EdgeError> {
        if request.ancestor_id.is_empty() || request.descendant_id.is_empty() {
            return Err(EdgeError::EmptyId);
        }
        if request.ancestor_id == request.descendant_id && request.ancestor_id != ROOT {
            return Err(EdgeError::SelfLineage);
        }
        if request.distance == 0 {
            return Err(EdgeError::ZeroDistance);
        }
        if request.distance > MAX_DISTANCE {
            return Err(EdgeError::DistanceOutOfRange);
        }
        if request.timestamp_ms > request.now_ms {
            return Err(EdgeError::TimestampInFuture {
                timestamp_ms: request.timestamp_ms,
                now_ms: request.now_ms,
            });
        }

        let a2d = LineageRecord {
            node_id: request.ancestor_id.clone(),
            kind: LineageKind::Descendant,
            distance: request.distance,
            other: request.descendant_id.clone(),
            timestamp_ms: request.timestamp_ms,
            version: request.version,
        };
        let d2a = LineageRecord {
            node_id: request.descendant_id,
            kind: LineageKind::Ancestor,
            distance: request.distance,
            other: request.ancestor_id,
            timestamp_ms: request.timestamp_ms,
            version: request.version,
        };
        Ok(Self {
            ancestor_depth: request.depth,
            a2d,
            d2a,
        })
    }

    /// Rebuilds the pair for an already stored upward record, typically to delete it.
    ///
    /// The downward half carries no version: only the upward record was read, and the two
    /// halves' versions need not match. Whoever deletes it reads the downward version first.
    pub fn from_ancestor_record(record: &LineageRecord, depth: u32) -> Result<Self, EdgeError> {
        if record.kind != LineageKind::Ancestor {
            return Err(EdgeError::NotAnAncestorRecord);
        }
        if record.distance == 0 {
            return Err(EdgeError::ZeroDistance);
        }
        let a2d = LineageRecord {
            node_id: record.other.clone(),
            kind: LineageKind::Descendant,
            distance: record.distance,
            other: record.node_id.clone(),
            timestamp_ms: record.timestamp_ms,
            version: None,
        };
        Ok(Self {
            ancestor_depth: depth,
            a2d,
            d2a: record.clone(),
        })
    }

    pub fn ancestor_depth(&self) -> u32 {
        self.ancestor_depth
    }

    pub fn ancestor_id(&self) -> &str {
        &self.a2d.node_id
    }

    pub fn descendant_id(&self) -> &str {
        &self.d2a.node_id
    }

    pub fn distance(&self) -> u32 {
        self.a2d.distance
    }

    pub fn timestamp_ms(&self) -> i64 {
        self.a2d.timestamp_ms
    }

    /// Ancestor → descendant (downward) record.
    pub fn a2d(&self) -> &LineageRecord {
        &self.a2d
    }

    /// Descendant → ancestor (upward) record.
    pub fn d2a(&self) -> &LineageRecord {
        &self.d2a
    }

    pub fn order_key(&self) -> WriteOrderKey {
        WriteOrderKey {
            ancestor_depth: self.ancestor_depth,
            ancestor_id: self.a2d.node_id.clone(),
            distance: self.a2d.distance,
            descendant_id: self.d2a.node_id.clone(),
        }
    }
}

impl std::fmt::Display for EdgePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{} -> {}, depth={}, distance={}, ts={}]",
            self.ancestor_id(),
            self.descendant_id(),
            self.ancestor_depth,
            self.distance(),
            self.timestamp_ms()
        )
    }
}
