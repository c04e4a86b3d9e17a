#![forbid(unsafe_code)]

//! Tree index facade: create, reparent, delete and query nodes of the single lineage tree.
//!
//! Mutations return `Ok(false)` when a batch did not apply (a conditional write lost a race or
//! the store failed mid-batch); callers may retry the whole call. `Err` is reserved for invalid
//! input, structural inconsistencies, stale timestamps and cancellation.

mod create;
mod delete;
mod query;
mod update;

use crate::cancel::CancelToken;
use crate::config::TreeConfig;
use crate::resolver::PathResolver;
use crate::store::LineageStore;
use crate::write::{WriteExecution, WriteExecutor, WriteOp};
use tl_core::lineage::{EdgePair, EdgeRequest, NodeId, TreeError};

pub use crate::resolver::DescendantPage;

pub struct TreeIndex<S> {
    store: S,
    config: TreeConfig,
    executor: WriteExecutor,
    cancel: Option<CancelToken>,
}

impl<S: LineageStore> TreeIndex<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            config: TreeConfig::default(),
            executor: WriteExecutor,
            cancel: None,
        }
    }

    pub fn with_config(store: S, config: TreeConfig) -> Result<Self, TreeError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new(store)
        })
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    fn resolver(&self) -> PathResolver<'_, S> {
        PathResolver::new(&self.store, &self.config)
    }

    fn edge(
        &self,
        ancestor_id: &str,
        descendant_id: &str,
        depth: usize,
        distance: usize,
        timestamp_ms: i64,
    ) -> Result<EdgePair, TreeError> {
        Ok(EdgePair::build(EdgeRequest {
            ancestor_id: ancestor_id.to_string(),
            descendant_id: descendant_id.to_string(),
            depth: to_u32(depth)?,
            distance: to_u32(distance)?,
            timestamp_ms,
            version: None,
            now_ms: now_ms().saturating_add(self.config.clock_skew_ms),
        })?)
    }

    /// Runs one batch in root-first order. Cancellation is honoured only before it starts.
    fn run(&self, id: String, ops: Vec<WriteOp>) -> Result<bool, TreeError> {
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Err(TreeError::Cancelled);
        }
        let execution = WriteExecution::sorted(id, ops);
        Ok(self.executor.execute(&self.store, &execution))
    }
}

fn node_id(value: &str) -> Result<NodeId, TreeError> {
    Ok(NodeId::try_new(value)?)
}

fn execution_id(child: &str, parent: Option<&str>, timestamp_ms: i64, op: &str) -> String {
    format!(
        "Execution [child={child}, parent={}, timestamp={timestamp_ms}, operation={op}]",
        parent.unwrap_or("none")
    )
}

fn to_u32(value: usize) -> Result<u32, TreeError> {
    u32::try_from(value).map_err(|_| TreeError::InvalidInput("tree depth overflow"))
}

fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => duration,
        Err(_) => return 0,
    };

    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}
