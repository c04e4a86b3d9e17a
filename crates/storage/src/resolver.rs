#![forbid(unsafe_code)]

use crate::config::TreeConfig;
use crate::store::{LineageQuery, LineageStore, ReadConsistency};
use tl_core::lineage::{
    LineageKind, LineageRecord, ROOT, TreeError, distance_to_ancestor, encode_hash, encode_range,
    encode_range_prefix, validate_complete_path,
};
use tracing::error;

/// One page of descendant ids plus the cursor for the next page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DescendantPage {
    pub descendants: Vec<String>,
    /// Id of the last descendant returned; pass it back to continue. `None` when exhausted.
    pub next_cursor: Option<String>,
}

/// Read-side lineage lookups over a [`LineageStore`].
pub struct PathResolver<'a, S: ?Sized> {
    store: &'a S,
    config: &'a TreeConfig,
}

impl<'a, S: LineageStore + ?Sized> PathResolver<'a, S> {
    pub fn new(store: &'a S, config: &'a TreeConfig) -> Self {
        Self { store, config }
    }

    /// All records under `(node_id, kind)`, optionally limited to one distance, in store order.
    pub fn query_all(
        &self,
        node_id: &str,
        kind: LineageKind,
        distance: Option<u32>,
        consistency: ReadConsistency,
    ) -> Result<Vec<LineageRecord>, TreeError> {
        self.collect(node_id, kind, distance, consistency, None)
    }

    /// The distance-1 ancestor record. The actual root reports the sentinel as its parent.
    pub fn get_parent(
        &self,
        node_id: &str,
        consistency: ReadConsistency,
    ) -> Result<Option<LineageRecord>, TreeError> {
        let mut parents = self.query_all(node_id, LineageKind::Ancestor, Some(1), consistency)?;
        if parents.len() > 1 {
            return Err(TreeError::MultipleParents {
                node: node_id.to_string(),
                parents: parents.into_iter().map(|record| record.other).collect(),
            });
        }
        Ok(parents.pop())
    }

    /// The sentinel's record pointing at the actual root, if a root exists.
    pub fn get_root_anchor(
        &self,
        consistency: ReadConsistency,
    ) -> Result<Option<LineageRecord>, TreeError> {
        let mut anchors = self.query_all(ROOT, LineageKind::Descendant, Some(1), consistency)?;
        if anchors.len() > 1 {
            return Err(TreeError::MultipleRoot {
                roots: anchors.into_iter().map(|record| record.other).collect(),
            });
        }
        Ok(anchors.pop())
    }

    /// The downward record from `node_id` to `descendant_id` at exactly `distance`.
    pub fn get_descendant(
        &self,
        node_id: &str,
        descendant_id: &str,
        distance: u32,
        consistency: ReadConsistency,
    ) -> Result<Option<LineageRecord>, TreeError> {
        let hash_key = encode_hash(node_id, LineageKind::Descendant)?;
        let range_key = encode_range(distance, descendant_id)?;
        Ok(self.store.get(&hash_key, &range_key, consistency)?)
    }

    /// Ancestor records from the root (first) down to the parent (last). Empty for the root.
    pub fn get_complete_path_from_root(
        &self,
        node_id: &str,
        consistency: ReadConsistency,
    ) -> Result<Vec<LineageRecord>, TreeError> {
        let ancestors = self.query_all(node_id, LineageKind::Ancestor, None, consistency)?;
        if ancestors.is_empty() {
            return Err(TreeError::NoAncestor {
                node: node_id.to_string(),
            });
        }
        let root = self.get_root_anchor(consistency)?;
        validate_complete_path(node_id, ancestors, root.as_ref().map(|r| r.other.as_str()))
    }

    pub fn get_descendants(
        &self,
        node_id: &str,
        generation: Option<u32>,
        page_size: usize,
        cursor: Option<&str>,
        consistency: ReadConsistency,
    ) -> Result<DescendantPage, TreeError> {
        if page_size == 0 {
            return Err(TreeError::InvalidInput("page size must be greater than 0"));
        }
        if generation == Some(0) {
            return Err(TreeError::InvalidInput("generation must be at least 1"));
        }

        let exclusive_start = match cursor {
            Some(cursor) => Some(self.paging_key(node_id, cursor, consistency)?),
            None => None,
        };
        let page = self.store.query(&LineageQuery {
            hash_key: encode_hash(node_id, LineageKind::Descendant)?,
            range_prefix: generation.map(encode_range_prefix).transpose()?,
            page_size: page_size.min(self.config.max_page_size),
            exclusive_start,
            consistency,
        })?;

        let next_cursor = match (&page.last_evaluated, page.records.last()) {
            (Some(_), Some(last)) => Some(last.other.clone()),
            _ => None,
        };
        Ok(DescendantPage {
            descendants: page.records.into_iter().map(|record| record.other).collect(),
            next_cursor,
        })
    }

    /// Every descendant record of `node_id`, failing once the subtree exceeds the fan-out cap.
    pub fn all_descendants(
        &self,
        node_id: &str,
        consistency: ReadConsistency,
    ) -> Result<Vec<LineageRecord>, TreeError> {
        let limit = self.config.max_fan_out;
        let records = self.collect(
            node_id,
            LineageKind::Descendant,
            None,
            consistency,
            Some(limit),
        )?;
        if records.len() > limit {
            error!(node = node_id, limit, "descendant fan-out cap exceeded");
            return Err(TreeError::FanOutExceeded {
                node: node_id.to_string(),
                limit,
            });
        }
        Ok(records)
    }

    /// The store's pagination key is opaque to callers, so it is rebuilt from the cursor
    /// descendant's own path: its distance below `node_id` plus its id.
    fn paging_key(
        &self,
        node_id: &str,
        cursor: &str,
        consistency: ReadConsistency,
    ) -> Result<String, TreeError> {
        let path = self.get_complete_path_from_root(cursor, consistency)?;
        let Some(distance) = distance_to_ancestor(&path, node_id) else {
            return Err(TreeError::IncompletePath {
                node: cursor.to_string(),
                reason: format!("{node_id} is not on its ancestor path"),
            });
        };
        Ok(encode_range(distance, cursor)?)
    }

    // `limit` stops paging once more than `limit` records are known.
    fn collect(
        &self,
        node_id: &str,
        kind: LineageKind,
        distance: Option<u32>,
        consistency: ReadConsistency,
        limit: Option<usize>,
    ) -> Result<Vec<LineageRecord>, TreeError> {
        let hash_key = encode_hash(node_id, kind)?;
        let range_prefix = distance.map(encode_range_prefix).transpose()?;
        let mut records = Vec::new();
        let mut exclusive_start = None;

        loop {
            let page = self.store.query(&LineageQuery {
                hash_key: hash_key.clone(),
                range_prefix: range_prefix.clone(),
                page_size: self.config.max_page_size,
                exclusive_start,
                consistency,
            })?;
            records.extend(page.records);
            if limit.is_some_and(|limit| records.len() > limit) {
                break;
            }
            match page.last_evaluated {
                Some(next) => exclusive_start = Some(next),
                None => break,
            }
        }
        Ok(records)
    }
}
