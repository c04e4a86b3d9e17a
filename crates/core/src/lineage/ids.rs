#![forbid(unsafe_code)]

use super::key::KEY_SEPARATOR;
use super::record::ROOT;

const MAX_NODE_ID_LEN: usize = 256;

/// A caller-supplied node id that is safe to embed in a lineage key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(String);

impl NodeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn try_new(value: impl Into<String>) -> Result<Self, NodeIdError> {
        let value = value.into();
        validate_node_id(&value)?;
        Ok(Self(value))
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeIdError {
    Empty,
    TooLong,
    ContainsSeparator,
    ContainsControl,
    Reserved,
}

impl NodeIdError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "node id must not be empty",
            Self::TooLong => "node id is too long",
            Self::ContainsSeparator => "node id must not contain '#'",
            Self::ContainsControl => "node id contains control characters",
            Self::Reserved => "node id is reserved for the root sentinel",
        }
    }
}

impl std::fmt::Display for NodeIdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for NodeIdError {}

fn validate_node_id(value: &str) -> Result<(), NodeIdError> {
    if value.trim().is_empty() {
        return Err(NodeIdError::Empty);
    }
    if value.len() > MAX_NODE_ID_LEN {
        return Err(NodeIdError::TooLong);
    }
    if value.contains(KEY_SEPARATOR) {
        return Err(NodeIdError::ContainsSeparator);
    }
    if value.chars().any(|c| c.is_control()) {
        return Err(NodeIdError::ContainsControl);
    }
    if value == ROOT {
        return Err(NodeIdError::Reserved);
    }
    Ok(())
}
