#![forbid(unsafe_code)]

use super::{
    LineagePage, LineageQuery, LineageStore, ReadConsistency, StoreError, WriteOutcome,
    check_page_size,
};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tl_core::lineage::{LineageKind, LineageRecord};

const DB_FILE_NAME: &str = "node_lineage.db";

const SELECT_COLUMNS: &str =
    "node_id, kind, distance, other, timestamp_ms, version FROM node_lineage";

/// Lineage table persisted in a local SQLite database.
///
/// Every write is a single-row conditional statement; no multi-row transactions are used.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
    storage_dir: Option<PathBuf>,
}

impl SqliteStore {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;

        let conn = Connection::open(storage_dir.join(DB_FILE_NAME))?;
        conn.busy_timeout(Duration::from_secs(5))?;
        install_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            storage_dir: Some(storage_dir),
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        install_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            storage_dir: None,
        })
    }

    pub fn storage_dir(&self) -> Option<&Path> {
        self.storage_dir.as_deref()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

impl LineageStore for SqliteStore {
    fn get(
        &self,
        hash_key: &str,
        range_key: &str,
        _consistency: ReadConsistency,
    ) -> Result<Option<LineageRecord>, StoreError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} WHERE hash_key=?1 AND range_key=?2"),
                params![hash_key, range_key],
                read_row,
            )
            .optional()?;
        row.map(decode_row).transpose()
    }

    fn query(&self, query: &LineageQuery) -> Result<LineagePage, StoreError> {
        check_page_size(query.page_size)?;
        let limit = to_sqlite_i64(query.page_size.saturating_add(1))?;
        let lower = query.range_prefix.as_deref().unwrap_or("");

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} \
             WHERE hash_key=?1 \
               AND range_key >= ?2 \
               AND (?3 IS NULL OR range_key > ?3) \
               AND (?4 IS NULL OR substr(range_key, 1, length(?4)) = ?4) \
             ORDER BY range_key ASC \
             LIMIT ?5"
        ))?;
        let mut rows = stmt.query(params![
            query.hash_key,
            lower,
            query.exclusive_start,
            query.range_prefix,
            limit,
        ])?;

        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(decode_row(read_row(row)?)?);
        }

        let last_evaluated = if records.len() > query.page_size {
            records.truncate(query.page_size);
            match records.last() {
                Some(last) => Some(
                    last.range_key()
                        .map_err(|err| StoreError::CorruptRow(err.message().to_string()))?,
                ),
                None => None,
            }
        } else {
            None
        };

        Ok(LineagePage {
            records,
            last_evaluated,
        })
    }

    fn put(&self, record: &LineageRecord) -> Result<WriteOutcome, StoreError> {
        let (hash_key, range_key) = record
            .keys()
            .map_err(|err| StoreError::InvalidInput(err.message()))?;
        let conn = self.lock()?;
        let changed = match record.version {
            None => conn.execute(
                "INSERT OR IGNORE INTO node_lineage\
                 (hash_key, range_key, node_id, kind, distance, other, timestamp_ms, version) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1)",
                params![
                    hash_key,
                    range_key,
                    record.node_id,
                    record.kind.code(),
                    record.distance,
                    record.other,
                    record.timestamp_ms,
                ],
            )?,
            Some(expected) => conn.execute(
                "UPDATE node_lineage SET timestamp_ms=?3, version=version + 1 \
                 WHERE hash_key=?1 AND range_key=?2 AND version=?4",
                params![hash_key, range_key, record.timestamp_ms, expected],
            )?,
        };
        Ok(outcome(changed))
    }

    fn delete(&self, record: &LineageRecord) -> Result<WriteOutcome, StoreError> {
        let (hash_key, range_key) = record
            .keys()
            .map_err(|err| StoreError::InvalidInput(err.message()))?;
        let conn = self.lock()?;
        match record.version {
            None => {
                conn.execute(
                    "DELETE FROM node_lineage WHERE hash_key=?1 AND range_key=?2",
                    params![hash_key, range_key],
                )?;
                Ok(WriteOutcome::Applied)
            }
            Some(expected) => {
                let changed = conn.execute(
                    "DELETE FROM node_lineage \
                     WHERE hash_key=?1 AND range_key=?2 AND version=?3 AND timestamp_ms=?4",
                    params![hash_key, range_key, expected, record.timestamp_ms],
                )?;
                Ok(outcome(changed))
            }
        }
    }
}

struct RawRow {
    node_id: String,
    kind: String,
    distance: i64,
    other: String,
    timestamp_ms: i64,
    version: i64,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        node_id: row.get(0)?,
        kind: row.get(1)?,
        distance: row.get(2)?,
        other: row.get(3)?,
        timestamp_ms: row.get(4)?,
        version: row.get(5)?,
    })
}

fn decode_row(raw: RawRow) -> Result<LineageRecord, StoreError> {
    let kind = LineageKind::from_code(&raw.kind)
        .ok_or_else(|| StoreError::CorruptRow(format!("unknown kind {}", raw.kind)))?;
    let distance = u32::try_from(raw.distance)
        .map_err(|_| StoreError::CorruptRow(format!("bad distance {}", raw.distance)))?;
    Ok(LineageRecord {
        node_id: raw.node_id,
        kind,
        distance,
        other: raw.other,
        timestamp_ms: raw.timestamp_ms,
        version: Some(raw.version),
    })
}

fn outcome(changed: usize) -> WriteOutcome {
    if changed == 0 {
        WriteOutcome::ConditionalFailed
    } else {
        WriteOutcome::Applied
    }
}

fn install_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS node_lineage (
          hash_key TEXT NOT NULL,
          range_key TEXT NOT NULL,
          node_id TEXT NOT NULL,
          kind TEXT NOT NULL CHECK(kind IN ('A', 'D')),
          distance INTEGER NOT NULL CHECK(distance >= 1),
          other TEXT NOT NULL,
          timestamp_ms INTEGER NOT NULL,
          version INTEGER NOT NULL,
          PRIMARY KEY(hash_key, range_key)
        ) WITHOUT ROWID;
        "#,
    )?;
    Ok(())
}

fn to_sqlite_i64(value: usize) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::InvalidInput("numeric overflow"))
}
