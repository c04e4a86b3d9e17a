#![forbid(unsafe_code)]

use super::*;
use crate::store::ReadConsistency;
use tl_core::lineage::common_prefix_len;

impl<S: LineageStore> TreeIndex<S> {
    /// Moves `child` (and its whole subtree) under `parent`.
    ///
    /// Only the part of the path that changes is rewritten. When `/A/B/D/E/G` becomes
    /// `/A/B/D/F/G`, the pointers through `E` are deleted and pointers through `F` are written,
    /// for `G` and for every descendant of `G`, while those to `A/B/D` are kept. All deletes run
    /// as one batch before all puts, so a crash in between leaves the subtree detached from the
    /// changed suffix instead of half rewired.
    pub fn update(&self, child: &str, parent: &str, timestamp_ms: i64) -> Result<bool, TreeError> {
        let child = node_id(child)?;
        let parent = node_id(parent)?;

        if child == parent {
            return self.claim_root(child.as_str(), timestamp_ms, "update");
        }

        let resolver = self.resolver();
        let Some(current) = resolver.get_parent(child.as_str(), ReadConsistency::Strong)? else {
            return self.create(child.as_str(), parent.as_str(), timestamp_ms);
        };
        if current.other == parent.as_str() {
            return Ok(true);
        }
        if timestamp_ms <= current.timestamp_ms {
            return Err(TreeError::ObsoleteChange {
                node: child.into_string(),
                requested_ms: timestamp_ms,
                recorded_ms: current.timestamp_ms,
            });
        }

        let current_path =
            resolver.get_complete_path_from_root(child.as_str(), ReadConsistency::Strong)?;
        let target_path =
            resolver.get_complete_path_from_root(parent.as_str(), ReadConsistency::Strong)?;
        if target_path
            .iter()
            .any(|record| record.other == child.as_str())
        {
            return Err(TreeError::InvalidInput(
                "cannot move a node under one of its own descendants",
            ));
        }
        // Distances to shared ancestors stay valid only when the node keeps its depth; otherwise
        // every ancestor pointer is re-keyed.
        let start = if current_path.len() == target_path.len() + 1 {
            common_prefix_len(&current_path, &target_path)
        } else {
            0
        };

        let mut affected = vec![child.as_str().to_string()];
        affected.extend(
            resolver
                .all_descendants(child.as_str(), ReadConsistency::Strong)?
                .into_iter()
                .map(|record| record.other),
        );

        let mut delete_ops = Vec::new();
        let mut put_ops = Vec::new();
        for node in &affected {
            let path = resolver.get_complete_path_from_root(node, ReadConsistency::Strong)?;
            // Levels between `node` and `child` (inclusive) stay as they are.
            let below = path.len().checked_sub(current_path.len()).ok_or_else(|| {
                TreeError::IncompletePath {
                    node: node.clone(),
                    reason: format!("path is shorter than the path of {child}"),
                }
            })?;

            for (depth, record) in path.iter().enumerate().take(current_path.len()).skip(start) {
                let edge = EdgePair::from_ancestor_record(record, to_u32(depth)?)?;
                delete_ops.push(WriteOp::Delete(edge));
            }
            for (depth, ancestor) in target_path.iter().enumerate().skip(start) {
                let distance = below + target_path.len() + 1 - depth;
                let edge = self.edge(&ancestor.other, node, depth, distance, timestamp_ms)?;
                put_ops.push(WriteOp::Put(edge));
            }
            let edge = self.edge(
                parent.as_str(),
                node,
                target_path.len(),
                below + 1,
                timestamp_ms,
            )?;
            put_ops.push(WriteOp::Put(edge));
        }

        let delete_id = execution_id(
            child.as_str(),
            Some(parent.as_str()),
            timestamp_ms,
            "update-delete",
        );
        if !self.run(delete_id, delete_ops)? {
            return Ok(false);
        }

        let put_id = execution_id(
            child.as_str(),
            Some(parent.as_str()),
            timestamp_ms,
            "update-put",
        );
        self.run(put_id, put_ops)
    }
}
