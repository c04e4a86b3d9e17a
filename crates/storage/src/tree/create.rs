#![forbid(unsafe_code)]

use super::*;
use crate::store::ReadConsistency;
use tl_core::lineage::ROOT;
use tracing::{info, warn};

impl<S: LineageStore> TreeIndex<S> {
    /// Attaches `child` under `parent`. `child == parent` claims the root.
    ///
    /// Re-creating an existing `(child, parent)` pair is a no-op success; an existing child under
    /// a different parent is reparented through [`TreeIndex::update`].
    pub fn create(&self, child: &str, parent: &str, timestamp_ms: i64) -> Result<bool, TreeError> {
        let child = node_id(child)?;
        let parent = node_id(parent)?;

        if child == parent {
            return self.claim_root(child.as_str(), timestamp_ms, "create");
        }

        // The parent edge is the last op of a create, and its downward half the last record,
        // so both halves being present means the child was attached completely.
        let resolver = self.resolver();
        if let Some(current) = resolver.get_parent(child.as_str(), ReadConsistency::Strong)? {
            if current.other != parent.as_str() {
                return self.update(child.as_str(), parent.as_str(), timestamp_ms);
            }
            if resolver
                .get_descendant(parent.as_str(), child.as_str(), 1, ReadConsistency::Strong)?
                .is_some()
            {
                return Ok(true);
            }
            warn!(
                child = child.as_str(),
                parent = parent.as_str(),
                "parent edge is missing its downward record; rewriting the child"
            );
        }

        // Fails with NoAncestor/IncompletePath when the parent is not attached yet.
        let root_to_parent =
            resolver.get_complete_path_from_root(parent.as_str(), ReadConsistency::Strong)?;

        // Clear leftovers of an earlier attempt that never reached the parent pointer.
        if !self.delete(child.as_str(), timestamp_ms)? {
            return Ok(false);
        }

        let mut ops = Vec::with_capacity(root_to_parent.len() + 1);
        let mut distance = root_to_parent.len() + 1;
        for (depth, ancestor) in root_to_parent.iter().enumerate() {
            let edge = self.edge(&ancestor.other, child.as_str(), depth, distance, timestamp_ms)?;
            ops.push(WriteOp::Put(edge));
            distance -= 1;
        }
        let edge = self.edge(
            parent.as_str(),
            child.as_str(),
            root_to_parent.len(),
            1,
            timestamp_ms,
        )?;
        ops.push(WriteOp::Put(edge));

        let id = execution_id(child.as_str(), Some(parent.as_str()), timestamp_ms, "create");
        self.run(id, ops)
    }

    /// Points the sentinel at `node`. An existing root on a different node is deleted first
    /// (last writer wins).
    pub(super) fn claim_root(
        &self,
        node: &str,
        timestamp_ms: i64,
        op: &str,
    ) -> Result<bool, TreeError> {
        let resolver = self.resolver();
        if let Some(anchor) = resolver.get_root_anchor(ReadConsistency::Strong)? {
            if anchor.other == node {
                return Ok(true);
            }
            warn!(
                current_root = %anchor.other,
                new_root = node,
                "root already exists on a different node; removing the current root"
            );
            if !self.delete(&anchor.other, timestamp_ms)? {
                return Ok(false);
            }
        }

        info!(root = node, "creating root");
        let edge = self.edge(ROOT, node, 0, 1, timestamp_ms)?;
        let id = execution_id(node, Some(node), timestamp_ms, op);
        self.run(id, vec![WriteOp::Put(edge)])
    }
}
