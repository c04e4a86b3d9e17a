#![forbid(unsafe_code)]

use super::*;
use crate::store::ReadConsistency;
use tl_core::lineage::ROOT;

impl<S: LineageStore> TreeIndex<S> {
    pub fn get_root(&self) -> Result<Option<String>, TreeError> {
        Ok(self
            .resolver()
            .get_root_anchor(ReadConsistency::Eventual)?
            .map(|anchor| anchor.other))
    }

    /// Ancestor ids from the root down to the parent. Empty for the root and for unknown nodes.
    pub fn get_ancestors(&self, node: &str) -> Result<Vec<String>, TreeError> {
        let node = node_id(node)?;
        match self
            .resolver()
            .get_complete_path_from_root(node.as_str(), ReadConsistency::Eventual)
        {
            Ok(path) => Ok(path.into_iter().map(|record| record.other).collect()),
            Err(TreeError::NoAncestor { .. }) => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }

    /// The parent id; the root sentinel id for the actual root; `None` for unknown nodes.
    pub fn get_parent(&self, node: &str) -> Result<Option<String>, TreeError> {
        let node = node_id(node)?;
        Ok(self
            .resolver()
            .get_parent(node.as_str(), ReadConsistency::Eventual)?
            .map(|record| record.other))
    }

    pub fn is_root(&self, node: &str) -> Result<bool, TreeError> {
        Ok(self.get_parent(node)?.as_deref() == Some(ROOT))
    }

    /// One page of all descendants, ordered by generation and then by id.
    pub fn get_descendants(
        &self,
        node: &str,
        page_size: usize,
        cursor: Option<&str>,
    ) -> Result<DescendantPage, TreeError> {
        let node = node_id(node)?;
        let cursor = cursor.map(node_id).transpose()?;
        self.resolver().get_descendants(
            node.as_str(),
            None,
            page_size,
            cursor.as_ref().map(NodeId::as_str),
            ReadConsistency::Eventual,
        )
    }

    /// One page of the descendants exactly `generation` levels below `node` (children = 1).
    pub fn get_descendants_in_generation(
        &self,
        node: &str,
        generation: u32,
        page_size: usize,
        cursor: Option<&str>,
    ) -> Result<DescendantPage, TreeError> {
        let node = node_id(node)?;
        let cursor = cursor.map(node_id).transpose()?;
        self.resolver().get_descendants(
            node.as_str(),
            Some(generation),
            page_size,
            cursor.as_ref().map(NodeId::as_str),
            ReadConsistency::Eventual,
        )
    }
}
