#![forbid(unsafe_code)]

use super::*;
use crate::store::ReadConsistency;
use std::collections::HashSet;
use tl_core::lineage::{LineageKind, LineageRecord};

impl<S: LineageStore> TreeIndex<S> {
    /// Detaches `node` and its whole subtree by deleting every ancestor pointer of each of them.
    ///
    /// Paths are not validated here so that partially written nodes can be cleaned up too.
    /// Fails with [`TreeError::ObsoleteChange`] if any of those records is newer than
    /// `timestamp_ms`, including when a newer change rewrote one while the batch ran.
    pub fn delete(&self, node: &str, timestamp_ms: i64) -> Result<bool, TreeError> {
        let node = node_id(node)?;
        let resolver = self.resolver();

        let descendants = resolver.all_descendants(node.as_str(), ReadConsistency::Strong)?;
        let mut seen = HashSet::with_capacity(descendants.len() + 1);
        let targets = std::iter::once(node.as_str().to_string())
            .chain(descendants.into_iter().map(|record| record.other))
            .filter(|target| seen.insert(target.clone()))
            .collect::<Vec<_>>();

        let mut ops = Vec::new();
        for target in &targets {
            let ancestors = self.ancestors_not_newer(target, timestamp_ms)?;
            let len = ancestors.len();
            for (index, record) in ancestors.iter().enumerate() {
                // Records come nearest-first; depth counts from the root.
                let depth = to_u32(len - 1 - index)?;
                ops.push(WriteOp::Delete(EdgePair::from_ancestor_record(
                    record, depth,
                )?));
            }
        }

        let id = execution_id(node.as_str(), None, timestamp_ms, "delete");
        if self.run(id, ops)? {
            return Ok(true);
        }
        // Conditional deletes only match the records read above. When one was rewritten in the
        // meantime by a newer change, the delete is stale rather than merely unlucky.
        for target in &targets {
            self.ancestors_not_newer(target, timestamp_ms)?;
        }
        Ok(false)
    }

    fn ancestors_not_newer(
        &self,
        node: &str,
        timestamp_ms: i64,
    ) -> Result<Vec<LineageRecord>, TreeError> {
        let ancestors = self.resolver().query_all(
            node,
            LineageKind::Ancestor,
            None,
            ReadConsistency::Strong,
        )?;
        if let Some(newer) = ancestors
            .iter()
            .find(|record| record.timestamp_ms > timestamp_ms)
        {
            return Err(TreeError::ObsoleteChange {
                node: node.to_string(),
                requested_ms: timestamp_ms,
                recorded_ms: newer.timestamp_ms,
            });
        }
        Ok(ancestors)
    }
}
