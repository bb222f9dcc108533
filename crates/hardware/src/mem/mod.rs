//! Memory-controller adapter: stage queues in front of a DRAM timing model.
//!
//! This module connects the pipeline stages to a pluggable
//! [`MemoryController`]. It provides:
//! 1. **Stage queues:** one for the fetch side (frontend) and one for the
//!    load/store side (backend). A stalled stage polls its queue until every
//!    transaction it issued has completed.
//! 2. **Burst splitting:** a request is split into burst-aligned
//!    transactions, admitted all-or-nothing.
//! 3. **Completion polling:** each core tick first advances the controller
//!    and matches completed transaction addresses back to queue entries.
//!
//! The adapter is owned by the core; every core owns its own controller.

use std::fmt;

/// DRAM timing model implementations.
pub mod controller;

pub use controller::{DramRowBufferController, FixedLatencyController, MemoryController};

use crate::config::{MemoryModelKind, MemoryParams};

/// Which stage queue a request belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueSide {
    /// Fetch-side requests.
    Frontend,
    /// Load/store-side requests.
    Backend,
}

/// One outstanding transaction issued by a stage.
#[derive(Clone, Copy, Debug)]
struct PendingAccess {
    addr: u64,
    done: bool,
}

/// Outstanding transactions for one stage.
#[derive(Clone, Debug, Default)]
pub struct StageQueue {
    entries: Vec<PendingAccess>,
}

impl StageQueue {
    /// Number of transactions issued and not yet completed.
    pub fn outstanding(&self) -> usize {
        self.entries.iter().filter(|e| !e.done).count()
    }

    /// True if nothing is queued at all, completed or not.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn add(&mut self, addr: u64) {
        self.entries.push(PendingAccess { addr, done: false });
    }

    /// Marks the oldest matching transaction complete. Returns false when no
    /// entry matches, so the caller can try the other queue.
    fn complete(&mut self, addr: u64) -> bool {
        for entry in &mut self.entries {
            if !entry.done && entry.addr == addr {
                entry.done = true;
                return true;
            }
        }
        false
    }

    /// Drops all entries. Completions for dropped transactions are ignored
    /// when they arrive.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// The memory system owned by one core: a DRAM timing model plus the two
/// stage queues the pipeline polls.
pub struct MemorySystem {
    ctrl: Box<dyn MemoryController>,
    /// Fetch-side request queue.
    pub frontend: StageQueue,
    /// Load/store-side request queue.
    pub backend: StageQueue,
    burst: u64,
}

impl fmt::Debug for MemorySystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySystem")
            .field("frontend", &self.frontend)
            .field("backend", &self.backend)
            .field("burst", &self.burst)
            .finish_non_exhaustive()
    }
}

impl MemorySystem {
    /// Wraps a DRAM timing model with empty stage queues.
    pub fn new(ctrl: Box<dyn MemoryController>) -> Self {
        let burst = ctrl.burst_size().max(1);
        Self {
            ctrl,
            frontend: StageQueue::default(),
            backend: StageQueue::default(),
            burst,
        }
    }

    /// Builds the configured DRAM timing model.
    pub fn from_params(params: &MemoryParams) -> Self {
        let ctrl: Box<dyn MemoryController> = match params.model {
            MemoryModelKind::FixedLatency => Box::new(FixedLatencyController::new(
                params.fixed_latency,
                params.burst_size,
                params.queue_depth,
            )),
            MemoryModelKind::DramRowBuffer => Box::new(DramRowBufferController::new(
                params.t_cas,
                params.t_ras,
                params.t_pre,
                params.burst_size,
                params.queue_depth,
            )),
        };
        Self::new(ctrl)
    }

    /// Advances the DRAM model one cycle and matches completions against the
    /// stage queues. Completions with no live entry (flushed wrong-path
    /// requests) are dropped.
    pub fn tick(&mut self) {
        self.ctrl.tick();
        while let Some(addr) = self.ctrl.pop_completed() {
            if !self.frontend.complete(addr) {
                let _ = self.backend.complete(addr);
            }
        }
    }

    /// Issues a request as burst-aligned transactions on the given queue.
    ///
    /// Admission is all-or-nothing: returns false without side effects when
    /// the controller cannot accept every transaction this cycle.
    pub fn request(&mut self, side: QueueSide, addr: u64, len: u64, is_write: bool) -> bool {
        let start = addr - (addr % self.burst);
        let end = addr + len.max(1);
        let count = (end - start).div_ceil(self.burst);

        let mut probe = start;
        for _ in 0..count {
            if !self.ctrl.can_accept(probe) {
                return false;
            }
            probe += self.burst;
        }

        let mut txn = start;
        for _ in 0..count {
            assert!(
                self.ctrl.enqueue(txn, is_write),
                "memory controller accepted a probe but rejected the transaction"
            );
            match side {
                QueueSide::Frontend => self.frontend.add(txn),
                QueueSide::Backend => self.backend.add(txn),
            }
            txn += self.burst;
        }
        true
    }

    /// Transactions still outstanding on one queue.
    pub fn outstanding(&self, side: QueueSide) -> usize {
        match side {
            QueueSide::Frontend => self.frontend.outstanding(),
            QueueSide::Backend => self.backend.outstanding(),
        }
    }

    /// Acknowledges all completed transactions on one queue, removing them.
    pub fn ack_completed(&mut self, side: QueueSide) {
        let queue = match side {
            QueueSide::Frontend => &mut self.frontend,
            QueueSide::Backend => &mut self.backend,
        };
        queue.entries.retain(|e| !e.done);
    }

    /// Drops every queued entry on both sides. Used on flush; in-flight DRAM
    /// transactions finish in the controller but match nothing.
    pub fn flush_queues(&mut self) {
        self.frontend.clear();
        self.backend.clear();
    }

    /// Prints controller statistics.
    pub fn print_stats(&self) {
        self.ctrl.print_stats();
    }
}
