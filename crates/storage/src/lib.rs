#![forbid(unsafe_code)]

//! Tree lineage index over a key-value store that only offers single-item conditional writes
//! and range queries.
//!
//! Every tree edge at every distance is stored twice: an upward record under the descendant and
//! a downward record under the ancestor. Multi-record changes run as ordered batches of
//! conditional writes (see [`write`]) instead of transactions.

pub mod cancel;
pub mod config;
pub mod resolver;
pub mod store;
pub mod tree;
pub mod write;

pub use cancel::CancelToken;
pub use config::TreeConfig;
pub use resolver::{DescendantPage, PathResolver};
pub use store::{
    LineagePage, LineageQuery, LineageStore, MemoryStore, ReadConsistency, SqliteStore,
    StoreError, WriteOutcome,
};
pub use tree::TreeIndex;
pub use write::{WriteExecution, WriteExecutor, WriteOp};

pub use tl_core::lineage::{LineageKind, LineageRecord, ROOT, TreeError};
