#![forbid(unsafe_code)]

mod error;
mod memory;
mod sqlite;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::sync::Arc;
use tl_core::lineage::LineageRecord;

/// Result of a single-item conditional write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    Applied,
    /// The stored version did not match the one the write was conditioned on.
    ConditionalFailed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadConsistency {
    /// Must observe every write acknowledged before the read started. Used inside mutations.
    Strong,
    /// May lag behind recent writes. Used for public queries.
    Eventual,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineageQuery {
    pub hash_key: String,
    pub range_prefix: Option<String>,
    pub page_size: usize,
    /// Range key of the last item of the previous page.
    pub exclusive_start: Option<String>,
    pub consistency: ReadConsistency,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LineagePage {
    /// Ordered by range key (distance, then related id).
    pub records: Vec<LineageRecord>,
    /// Range key to resume from; `None` once the query is exhausted.
    pub last_evaluated: Option<String>,
}

/// Single-item key-value primitives the tree index is built on.
///
/// `put` with `version == None` must only succeed when the item is absent and stores version 1;
/// with `Some(v)` it must only succeed when the stored version is `v` and stores `v + 1`.
/// `delete` with `Some(v)` must only succeed when the stored version is `v` and the stored
/// `timestamp_ms` equals the record's; with `None` it is unconditional. Versions restart at 1
/// when a deleted item is written again, so the timestamp is what tells a re-created item apart.
/// Anything else is [`WriteOutcome::ConditionalFailed`].
pub trait LineageStore: Send + Sync {
    fn get(
        &self,
        hash_key: &str,
        range_key: &str,
        consistency: ReadConsistency,
    ) -> Result<Option<LineageRecord>, StoreError>;

    fn query(&self, query: &LineageQuery) -> Result<LineagePage, StoreError>;

    fn put(&self, record: &LineageRecord) -> Result<WriteOutcome, StoreError>;

    fn delete(&self, record: &LineageRecord) -> Result<WriteOutcome, StoreError>;
}

impl<T: LineageStore + ?Sized> LineageStore for &T {
    fn get(
        &self,
        hash_key: &str,
        range_key: &str,
        consistency: ReadConsistency,
    ) -> Result<Option<LineageRecord>, StoreError> {
        (**self).get(hash_key, range_key, consistency)
    }

    fn query(&self, query: &LineageQuery) -> Result<LineagePage, StoreError> {
        (**self).query(query)
    }

    fn put(&self, record: &LineageRecord) -> Result<WriteOutcome, StoreError> {
        (**self).put(record)
    }

    fn delete(&self, record: &LineageRecord) -> Result<WriteOutcome, StoreError> {
        (**self).delete(record)
    }
}

impl<T: LineageStore + ?Sized> LineageStore for Arc<T> {
    fn get(
        &self,
        hash_key: &str,
        range_key: &str,
        consistency: ReadConsistency,
    ) -> Result<Option<LineageRecord>, StoreError> {
        (**self).get(hash_key, range_key, consistency)
    }

    fn query(&self, query: &LineageQuery) -> Result<LineagePage, StoreError> {
        (**self).query(query)
    }

    fn put(&self, record: &LineageRecord) -> Result<WriteOutcome, StoreError> {
        (**self).put(record)
    }

    fn delete(&self, record: &LineageRecord) -> Result<WriteOutcome, StoreError> {
        (**self).delete(record)
    }
}

fn check_page_size(page_size: usize) -> Result<(), StoreError> {
    if page_size == 0 {
        return Err(StoreError::InvalidInput("page size must be greater than 0"));
    }
    Ok(())
}
