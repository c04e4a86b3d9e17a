#![forbid(unsafe_code)]

use crate::store::{LineageStore, ReadConsistency, StoreError, WriteOutcome};
use tl_core::lineage::{EdgePair, LineageRecord, WriteOrderKey};
use tracing::{debug, warn};

/// One edge-level write. Both variants keep the upward (descendant → ancestor) pointer in place
/// whenever the downward pointer exists, including after a partial failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteOp {
    /// Writes the upward record, then the downward one.
    Put(EdgePair),
    /// Deletes the downward record, then the upward one.
    Delete(EdgePair),
}

impl WriteOp {
    pub fn edge(&self) -> &EdgePair {
        match self {
            WriteOp::Put(edge) | WriteOp::Delete(edge) => edge,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            WriteOp::Put(_) => "put",
            WriteOp::Delete(_) => "delete",
        }
    }

    pub fn order_key(&self) -> WriteOrderKey {
        self.edge().order_key()
    }

    /// Returns `Ok(false)` when a conditional write lost a race; the caller decides what to
    /// do with the rest of the batch.
    pub fn execute<S: LineageStore + ?Sized>(&self, store: &S) -> Result<bool, StoreError> {
        match self {
            WriteOp::Put(edge) => {
                Ok(put_record(store, edge.d2a())? && put_record(store, edge.a2d())?)
            }
            WriteOp::Delete(edge) => {
                Ok(delete_downward(store, edge.a2d())? && delete_record(store, edge.d2a())?)
            }
        }
    }

    /// Extension point for undoing an executed op. It only logs.
    ///
    /// Batches are always generated root-downwards and each op already preserves the upward
    /// pointer, so the partial states a failed batch leaves behind are valid. A generic restore
    /// could write stale data over a newer concurrent change.
    pub fn compensate<S: LineageStore + ?Sized>(&self, _store: &S) -> Result<(), StoreError> {
        debug!(op = self.kind(), edge = %self.edge(), "compensation skipped");
        Ok(())
    }
}

/// Inserts can lose against a concurrent identical insert that a cleanup then deletes again,
/// so an absent record after a conflict is retried a bounded number of times.
const PUT_ATTEMPTS: usize = 3;

fn put_record<S: LineageStore + ?Sized>(
    store: &S,
    record: &LineageRecord,
) -> Result<bool, StoreError> {
    for _ in 0..PUT_ATTEMPTS {
        if store.put(record)? == WriteOutcome::Applied {
            return Ok(true);
        }
        match current_record(store, record)? {
            // A concurrent caller already wrote exactly this record.
            Some(stored) if stored.same_write(record) => {
                debug!(record = %record, "put already applied");
                return Ok(true);
            }
            Some(stored) => {
                warn!(record = %record, stored = %stored, "conditional put failed");
                return Ok(false);
            }
            None if record.version.is_none() => {
                debug!(record = %record, "conflicting record vanished; retrying put");
            }
            None => {
                warn!(record = %record, "conditional put failed on an absent record");
                return Ok(false);
            }
        }
    }
    warn!(record = %record, attempts = PUT_ATTEMPTS, "conditional put kept conflicting");
    Ok(false)
}

fn delete_record<S: LineageStore + ?Sized>(
    store: &S,
    record: &LineageRecord,
) -> Result<bool, StoreError> {
    match store.delete(record)? {
        WriteOutcome::Applied => Ok(true),
        WriteOutcome::ConditionalFailed => {
            let current = current_record(store, record)?;
            if current.is_none() {
                debug!(record = %record, "delete already applied");
                return Ok(true);
            }
            warn!(
                record = %record,
                stored = ?current,
                "conditional delete failed"
            );
            Ok(false)
        }
    }
}

/// The pair is rebuilt from the upward record, so the downward half's own version is read
/// here. The delete stays conditioned on the timestamp taken from the upward record.
fn delete_downward<S: LineageStore + ?Sized>(
    store: &S,
    record: &LineageRecord,
) -> Result<bool, StoreError> {
    let Some(current) = current_record(store, record)? else {
        debug!(record = %record, "delete already applied");
        return Ok(true);
    };
    if current.timestamp_ms != record.timestamp_ms {
        warn!(
            record = %record,
            stored = %current,
            "downward record was rewritten since it was read"
        );
        return Ok(false);
    }
    let conditioned = LineageRecord {
        version: current.version,
        ..record.clone()
    };
    delete_record(store, &conditioned)
}

fn current_record<S: LineageStore + ?Sized>(
    store: &S,
    record: &LineageRecord,
) -> Result<Option<LineageRecord>, StoreError> {
    let (hash_key, range_key) = record
        .keys()
        .map_err(|err| StoreError::InvalidInput(err.message()))?;
    store.get(&hash_key, &range_key, ReadConsistency::Strong)
}
