#![forbid(unsafe_code)]

use super::WriteOp;
use crate::store::LineageStore;
use tracing::{debug, error, warn};

/// A named, ordered batch of edge writes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteExecution {
    id: String,
    ops: Vec<WriteOp>,
}

impl WriteExecution {
    /// Keeps `ops` in the given order.
    pub fn new(id: impl Into<String>, ops: Vec<WriteOp>) -> Self {
        Self {
            id: id.into(),
            ops,
        }
    }

    /// Orders `ops` root-first by [`WriteOp::order_key`].
    pub fn sorted(id: impl Into<String>, mut ops: Vec<WriteOp>) -> Self {
        ops.sort_by_key(WriteOp::order_key);
        Self::new(id, ops)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Runs a batch op by op and compensates on the first failure.
#[derive(Clone, Copy, Debug, Default)]
pub struct WriteExecutor;

impl WriteExecutor {
    /// `true` only when every op applied.
    pub fn execute<S: LineageStore + ?Sized>(&self, store: &S, execution: &WriteExecution) -> bool {
        debug!(execution = execution.id(), ops = execution.len(), "batch started");

        for (index, op) in execution.ops().iter().enumerate() {
            let failure = match op.execute(store) {
                Ok(true) => continue,
                Ok(false) => None,
                Err(err) => Some(err),
            };
            warn!(
                execution = execution.id(),
                op = op.kind(),
                edge = %op.edge(),
                error = ?failure,
                applied = index,
                "batch aborted"
            );
            self.compensate(store, execution, index);
            return false;
        }

        debug!(execution = execution.id(), "batch finished");
        true
    }

    // Forward order, same as execution: a future restoring compensation must still write
    // upward pointers before downward ones.
    fn compensate<S: LineageStore + ?Sized>(
        &self,
        store: &S,
        execution: &WriteExecution,
        applied: usize,
    ) {
        for op in &execution.ops()[..applied] {
            if let Err(err) = op.compensate(store) {
                error!(
                    execution = execution.id(),
                    op = op.kind(),
                    edge = %op.edge(),
                    error = %err,
                    "compensation failed"
                );
            }
        }
    }
}
