#![forbid(unsafe_code)]

//! Composite key layout for lineage records.
//!
//! hash  = `<node_id>#<kind>`
//! range = `<distance, zero padded to DISTANCE_WIDTH>#<other>`
//!
//! The padding keeps lexicographic range order equal to numeric distance order, so a hash-key
//! query returns records sorted by distance and then by the related id. Changing the separator
//! or the width is a breaking migration of every stored key.

use super::record::LineageKind;

pub const KEY_SEPARATOR: char = '#';
pub const DISTANCE_WIDTH: usize = 4;
pub const MAX_DISTANCE: u32 = 9_999;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyError {
    EmptyId,
    IdContainsSeparator,
    DistanceOutOfRange,
    MalformedHashKey,
    MalformedRangeKey,
    UnknownKind,
}

impl KeyError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::EmptyId => "key component must not be empty",
            Self::IdContainsSeparator => "key component must not contain '#'",
            Self::DistanceOutOfRange => "distance is outside the encodable range",
            Self::MalformedHashKey => "malformed hash key",
            Self::MalformedRangeKey => "malformed range key",
            Self::UnknownKind => "unknown lineage kind",
        }
    }
}

impl std::fmt::Display for KeyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for KeyError {}

pub fn encode_hash(node_id: &str, kind: LineageKind) -> Result<String, KeyError> {
    check_component(node_id)?;
    Ok(format!("{node_id}{KEY_SEPARATOR}{}", kind.code()))
}

pub fn decode_hash(hash: &str) -> Result<(String, LineageKind), KeyError> {
    let Some((node_id, code)) = hash.rsplit_once(KEY_SEPARATOR) else {
        return Err(KeyError::MalformedHashKey);
    };
    if node_id.is_empty() || node_id.contains(KEY_SEPARATOR) {
        return Err(KeyError::MalformedHashKey);
    }
    let kind = LineageKind::from_code(code).ok_or(KeyError::UnknownKind)?;
    Ok((node_id.to_string(), kind))
}

pub fn encode_range(distance: u32, other: &str) -> Result<String, KeyError> {
    check_component(other)?;
    Ok(format!("{}{other}", encode_range_prefix(distance)?))
}

/// Range-key prefix selecting exactly one distance (generation).
pub fn encode_range_prefix(distance: u32) -> Result<String, KeyError> {
    if distance > MAX_DISTANCE {
        return Err(KeyError::DistanceOutOfRange);
    }
    Ok(format!(
        "{distance:0width$}{KEY_SEPARATOR}",
        width = DISTANCE_WIDTH
    ))
}

pub fn decode_range(range: &str) -> Result<(u32, String), KeyError> {
    let Some((digits, other)) = range.split_once(KEY_SEPARATOR) else {
        return Err(KeyError::MalformedRangeKey);
    };
    if digits.len() != DISTANCE_WIDTH || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(KeyError::MalformedRangeKey);
    }
    if other.is_empty() || other.contains(KEY_SEPARATOR) {
        return Err(KeyError::MalformedRangeKey);
    }
    let distance = digits
        .parse::<u32>()
        .map_err(|_| KeyError::MalformedRangeKey)?;
    Ok((distance, other.to_string()))
}

fn check_component(value: &str) -> Result<(), KeyError> {
    if value.is_empty() {
        return Err(KeyError::EmptyId);
    }
    if value.contains(KEY_SEPARATOR) {
        return Err(KeyError::IdContainsSeparator);
    }
    Ok(())
}
