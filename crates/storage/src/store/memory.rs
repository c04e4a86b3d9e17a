#![forbid(unsafe_code)]

use super::{
    LineagePage, LineageQuery, LineageStore, ReadConsistency, StoreError, WriteOutcome,
    check_page_size,
};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{Mutex, MutexGuard};
use tl_core::lineage::LineageRecord;

type Key = (String, String);

/// Process-local store with the same conditional-write semantics as the persistent one.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<BTreeMap<Key, LineageRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.lock()?.is_empty())
    }

    /// Every stored record, in key order.
    pub fn snapshot(&self) -> Result<Vec<LineageRecord>, StoreError> {
        Ok(self.lock()?.values().cloned().collect())
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<Key, LineageRecord>>, StoreError> {
        self.items.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

fn record_key(record: &LineageRecord) -> Result<Key, StoreError> {
    record
        .keys()
        .map_err(|err| StoreError::InvalidInput(err.message()))
}

impl LineageStore for MemoryStore {
    fn get(
        &self,
        hash_key: &str,
        range_key: &str,
        _consistency: ReadConsistency,
    ) -> Result<Option<LineageRecord>, StoreError> {
        let items = self.lock()?;
        Ok(items
            .get(&(hash_key.to_string(), range_key.to_string()))
            .cloned())
    }

    fn query(&self, query: &LineageQuery) -> Result<LineagePage, StoreError> {
        check_page_size(query.page_size)?;
        let prefix = query.range_prefix.as_deref().unwrap_or("");
        let lower = match query.exclusive_start.as_deref() {
            Some(start) if start >= prefix => {
                Bound::Excluded((query.hash_key.clone(), start.to_string()))
            }
            _ => Bound::Included((query.hash_key.clone(), prefix.to_string())),
        };

        let items = self.lock()?;
        let mut matching = items
            .range((lower, Bound::Unbounded))
            .take_while(|((hash, range), _)| hash == &query.hash_key && range.starts_with(prefix))
            .map(|(_, record)| record.clone());

        let records: Vec<LineageRecord> = matching.by_ref().take(query.page_size).collect();
        let last_evaluated = match (matching.next(), records.last()) {
            (Some(_), Some(last)) => Some(last.range_key().map_err(|err| {
                StoreError::CorruptRow(format!("{last}: {}", err.message()))
            })?),
            _ => None,
        };

        Ok(LineagePage {
            records,
            last_evaluated,
        })
    }

    fn put(&self, record: &LineageRecord) -> Result<WriteOutcome, StoreError> {
        let key = record_key(record)?;
        let mut items = self.lock()?;
        let next_version = match (record.version, items.get(&key)) {
            (None, None) => 1,
            (Some(expected), Some(current)) if current.version == Some(expected) => expected + 1,
            _ => return Ok(WriteOutcome::ConditionalFailed),
        };
        let mut stored = record.clone();
        stored.version = Some(next_version);
        items.insert(key, stored);
        Ok(WriteOutcome::Applied)
    }

    fn delete(&self, record: &LineageRecord) -> Result<WriteOutcome, StoreError> {
        let key = record_key(record)?;
        let mut items = self.lock()?;
        match (record.version, items.get(&key)) {
            (None, _) => {}
            (Some(expected), Some(current))
                if current.version == Some(expected)
                    && current.timestamp_ms == record.timestamp_ms => {}
            _ => return Ok(WriteOutcome::ConditionalFailed),
        }
        items.remove(&key);
        Ok(WriteOutcome::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tl_core::lineage::{LineageKind, encode_hash, encode_range_prefix};

    fn record(node: &str, kind: LineageKind, distance: u32, other: &str) -> LineageRecord {
        LineageRecord {
            node_id: node.to_string(),
            kind,
            distance,
            other: other.to_string(),
            timestamp_ms: 7,
            version: None,
        }
    }

    fn query(hash: &str, prefix: Option<u32>, page_size: usize, start: Option<String>) -> LineageQuery {
        LineageQuery {
            hash_key: hash.to_string(),
            range_prefix: prefix.map(|d| encode_range_prefix(d).unwrap()),
            page_size,
            exclusive_start: start,
            consistency: ReadConsistency::Strong,
        }
    }

    #[test]
    fn put_is_conditional_on_version() {
        let store = MemoryStore::new();
        let fresh = record("b", LineageKind::Ancestor, 1, "a");
        assert_eq!(store.put(&fresh).unwrap(), WriteOutcome::Applied);
        assert_eq!(store.put(&fresh).unwrap(), WriteOutcome::ConditionalFailed);

        let (hash, range) = fresh.keys().unwrap();
        let stored = store
            .get(&hash, &range, ReadConsistency::Strong)
            .unwrap()
            .unwrap();
        assert_eq!(stored.version, Some(1));

        let mut stale = stored.clone();
        stale.version = Some(5);
        assert_eq!(store.put(&stale).unwrap(), WriteOutcome::ConditionalFailed);

        let mut newer = stored.clone();
        newer.timestamp_ms = 8;
        assert_eq!(store.put(&newer).unwrap(), WriteOutcome::Applied);
        let stored = store
            .get(&hash, &range, ReadConsistency::Strong)
            .unwrap()
            .unwrap();
        assert_eq!(stored.version, Some(2));
        assert_eq!(stored.timestamp_ms, 8);
    }

    #[test]
    fn delete_is_conditional_on_version_and_timestamp() {
        let store = MemoryStore::new();
        let fresh = record("b", LineageKind::Ancestor, 1, "a");
        store.put(&fresh).unwrap();

        let mut wrong = fresh.clone();
        wrong.version = Some(3);
        assert_eq!(store.delete(&wrong).unwrap(), WriteOutcome::ConditionalFailed);

        let mut other_write = fresh.clone();
        other_write.version = Some(1);
        other_write.timestamp_ms = 6;
        assert_eq!(
            store.delete(&other_write).unwrap(),
            WriteOutcome::ConditionalFailed
        );

        let mut right = fresh.clone();
        right.version = Some(1);
        assert_eq!(store.delete(&right).unwrap(), WriteOutcome::Applied);
        assert_eq!(store.delete(&right).unwrap(), WriteOutcome::ConditionalFailed);
        assert_eq!(store.delete(&fresh).unwrap(), WriteOutcome::Applied);
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn query_pages_in_range_order_with_prefix() {
        let store = MemoryStore::new();
        for (distance, other) in [(2, "x"), (1, "c"), (1, "b"), (3, "y"), (2, "w")] {
            store
                .put(&record("a", LineageKind::Descendant, distance, other))
                .unwrap();
        }
        store
            .put(&record("z", LineageKind::Descendant, 1, "q"))
            .unwrap();
        let hash = encode_hash("a", LineageKind::Descendant).unwrap();

        let first = store.query(&query(&hash, None, 2, None)).unwrap();
        let ids = first.records.iter().map(|r| r.other.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["b", "c"]);
        assert_eq!(first.last_evaluated.as_deref(), Some("0001#c"));

        let second = store
            .query(&query(&hash, None, 10, first.last_evaluated))
            .unwrap();
        let ids = second.records.iter().map(|r| r.other.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["w", "x", "y"]);
        assert_eq!(second.last_evaluated, None);

        let generation = store.query(&query(&hash, Some(2), 10, None)).unwrap();
        let ids = generation
            .records
            .iter()
            .map(|r| r.other.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["w", "x"]);

        let err = store.query(&query(&hash, None, 0, None)).unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));
    }
}
