#![forbid(unsafe_code)]

use super::edge::EdgeError;
use super::ids::NodeIdError;
use super::key::KeyError;
use super::record::LineageRecord;

#[derive(Debug)]
pub enum TreeError {
    InvalidInput(&'static str),
    InvalidEdge(EdgeError),
    /// The node has no ancestor records at all (unknown node).
    NoAncestor {
        node: String,
    },
    IncompletePath {
        node: String,
        reason: String,
    },
    MultipleInheritance {
        node: String,
        distance: u32,
        conflicting: Vec<LineageRecord>,
    },
    MultipleParents {
        node: String,
        parents: Vec<String>,
    },
    MultipleRoot {
        roots: Vec<String>,
    },
    ObsoleteChange {
        node: String,
        requested_ms: i64,
        recorded_ms: i64,
    },
    FanOutExceeded {
        node: String,
        limit: usize,
    },
    Cancelled,
    Store(String),
}

impl TreeError {
    /// True for every "path to the root cannot be resolved" failure, including [`TreeError::NoAncestor`].
    pub fn is_incomplete_path(&self) -> bool {
        matches!(self, Self::NoAncestor { .. } | Self::IncompletePath { .. })
    }

    /// True for every "more than one ancestor at one generation" failure, including parents.
    pub fn is_multiple_inheritance(&self) -> bool {
        matches!(
            self,
            Self::MultipleInheritance { .. } | Self::MultipleParents { .. }
        )
    }

    /// Structural errors mean the stored data is inconsistent; retrying the call will not help.
    pub fn is_structural(&self) -> bool {
        self.is_incomplete_path()
            || self.is_multiple_inheritance()
            || matches!(self, Self::MultipleRoot { .. })
    }
}

impl std::fmt::Display for TreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::InvalidEdge(err) => write!(f, "invalid edge: {err}"),
            Self::NoAncestor { node } => write!(f, "no ancestor records for node {node}"),
            Self::IncompletePath { node, reason } => {
                write!(f, "incomplete path for node {node}: {reason}")
            }
            Self::MultipleInheritance {
                node,
                distance,
                conflicting,
            } => {
                let others = conflicting
                    .iter()
                    .map(|record| record.other.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(
                    f,
                    "node {node} has more than one ancestor at distance {distance} ({others})"
                )
            }
            Self::MultipleParents { node, parents } => write!(
                f,
                "node {node} has more than one parent ({})",
                parents.join(", ")
            ),
            Self::MultipleRoot { roots } => {
                write!(f, "more than one root found ({})", roots.join(", "))
            }
            Self::ObsoleteChange {
                node,
                requested_ms,
                recorded_ms,
            } => write!(
                f,
                "obsolete change for node {node} (requested_ms={requested_ms}, recorded_ms={recorded_ms})"
            ),
            Self::FanOutExceeded { node, limit } => {
                write!(f, "node {node} has more than {limit} descendants")
            }
            Self::Cancelled => write!(f, "cancelled before the write batch started"),
            Self::Store(message) => write!(f, "store: {message}"),
        }
    }
}

impl std::error::Error for TreeError {}

impl From<KeyError> for TreeError {
    fn from(value: KeyError) -> Self {
        Self::InvalidInput(value.message())
    }
}

impl From<NodeIdError> for TreeError {
    fn from(value: NodeIdError) -> Self {
        Self::InvalidInput(value.message())
    }
}

impl From<EdgeError> for TreeError {
    fn from(value: EdgeError) -> Self {
        Self::InvalidEdge(value)
    }
}
