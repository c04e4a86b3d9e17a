#![forbid(unsafe_code)]

use super::error::TreeError;
use super::record::{LineageRecord, ROOT};

/// Checks a node's ancestor records and returns its path ordered from the root downwards.
///
/// `ancestors` must be in store order (ascending distance). `root` is the node the sentinel
/// currently points at, if any. The sentinel itself is never part of the returned path, so the
/// actual root yields an empty path.
pub fn validate_complete_path(
    node_id: &str,
    ancestors: Vec<LineageRecord>,
    root: Option<&str>,
) -> Result<Vec<LineageRecord>, TreeError> {
    if ancestors.is_empty() {
        return Err(TreeError::NoAncestor {
            node: node_id.to_string(),
        });
    }
    let Some(root) = root else {
        return Err(TreeError::IncompletePath {
            node: node_id.to_string(),
            reason: "the root does not exist yet".to_string(),
        });
    };

    let far_end = ancestors[ancestors.len() - 1].other.as_str();
    if far_end != ROOT && far_end != root {
        return Err(TreeError::IncompletePath {
            node: node_id.to_string(),
            reason: "the ancestor list is missing the root".to_string(),
        });
    }
    let points_at_sentinel = far_end == ROOT;
    if points_at_sentinel && root != node_id {
        return Err(TreeError::IncompletePath {
            node: node_id.to_string(),
            reason: "node points at the root sentinel but is not the root".to_string(),
        });
    }

    // Store order is ascending distance, so a repeated generation shows up as an adjacent pair.
    if let Some(pair) = ancestors
        .windows(2)
        .find(|pair| pair[0].distance == pair[1].distance)
    {
        let distance = pair[0].distance;
        let conflicting = ancestors
            .iter()
            .filter(|candidate| candidate.distance == distance)
            .cloned()
            .collect();
        return Err(TreeError::MultipleInheritance {
            node: node_id.to_string(),
            distance,
            conflicting,
        });
    }

    for (index, record) in ancestors.iter().enumerate() {
        let expected = index as u32 + 1;
        if record.distance > expected {
            return Err(TreeError::IncompletePath {
                node: node_id.to_string(),
                reason: format!("missing ancestor at distance {expected}"),
            });
        }
        if record.distance < expected {
            return Err(TreeError::IncompletePath {
                node: node_id.to_string(),
                reason: format!("ancestor at distance {} is out of order", record.distance),
            });
        }
    }

    if points_at_sentinel {
        return Ok(Vec::new());
    }
    let mut path = ancestors;
    path.reverse();
    Ok(path)
}

/// Number of leading positions where both root-first paths name the same ancestor.
pub fn common_prefix_len(current: &[LineageRecord], target: &[LineageRecord]) -> usize {
    current
        .iter()
        .zip(target)
        .take_while(|(a, b)| a.other == b.other)
        .count()
}

/// Distance from the owner of a root-first `path` up to `ancestor_id`, if it lies on the path.
pub fn distance_to_ancestor(path: &[LineageRecord], ancestor_id: &str) -> Option<u32> {
    path.iter()
        .position(|record| record.other == ancestor_id)
        .map(|index| (path.len() - index) as u32)
}
