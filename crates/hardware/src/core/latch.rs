//! Stage latches and functional-unit shift pipelines.
//!
//! Every pipeline position is one [`StageLatch`]: a `(has_data, imap,
//! stalled)` triple. A latch is written only by its upstream stage and
//! cleared only by its downstream stage; the driver's reverse traversal
//! order makes the single latch behave like an edge-triggered register.
//!
//! A [`FuPipeline`] is an ordered sequence of such latches. An instruction
//! enters at index 0 on dispatch, shifts one slot per cycle when the next
//! slot is vacant, and exits from the tail into the dispatch queue once its
//! exit timer (loaded at entry, non-zero only for divides) has elapsed.

use crate::isa::FuKind;

use super::imap::NO_SLOT;

/// One pipeline latch position.
#[derive(Clone, Copy, Debug)]
pub struct StageLatch {
    /// True when this latch holds an instruction (or, for the fetch input
    /// latch, a pending fetch address).
    pub has_data: bool,
    /// IMAP index of the held instruction; [`NO_SLOT`] before allocation.
    pub imap: usize,
    /// True while the owning stage waits on an external completion.
    pub stalled: bool,
}

impl Default for StageLatch {
    fn default() -> Self {
        Self {
            has_data: false,
            imap: NO_SLOT,
            stalled: false,
        }
    }
}

impl StageLatch {
    /// Empties the latch. Idempotent.
    pub fn flush(&mut self) {
        *self = Self::default();
    }

    /// Fills the latch with an instruction.
    pub fn set(&mut self, imap: usize) {
        self.has_data = true;
        self.imap = imap;
        self.stalled = false;
    }
}

/// One slot of a functional-unit pipeline.
#[derive(Clone, Copy, Debug, Default)]
pub struct FuSlot {
    /// The latch at this depth.
    pub latch: StageLatch,
    /// Remaining extra cycles before the instruction may leave the tail.
    pub exit_timer: u64,
}

/// A functional-unit pipeline of fixed depth.
#[derive(Clone, Debug)]
pub struct FuPipeline {
    kind: FuKind,
    slots: Vec<FuSlot>,
}

impl FuPipeline {
    /// Creates an empty pipeline of the given depth.
    ///
    /// # Panics
    ///
    /// Panics if `depth` is zero.
    pub fn new(kind: FuKind, depth: usize) -> Self {
        assert!(depth > 0, "functional unit pipeline depth must be non-zero");
        Self {
            kind,
            slots: vec![FuSlot::default(); depth],
        }
    }

    /// The unit kind this pipeline belongs to.
    #[inline]
    pub fn kind(&self) -> FuKind {
        self.kind
    }

    /// Pipeline depth.
    #[inline]
    pub fn depth(&self) -> usize {
        self.slots.len()
    }

    /// True when the entry slot can take a new instruction.
    #[inline]
    pub fn can_accept(&self) -> bool {
        !self.slots[0].latch.has_data
    }

    /// True when no slot holds an instruction.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| !s.latch.has_data)
    }

    /// Inserts an instruction at index 0 with an exit timer.
    ///
    /// # Panics
    ///
    /// Panics if the entry slot is occupied.
    pub fn insert(&mut self, imap: usize, exit_timer: u64) {
        assert!(
            self.can_accept(),
            "functional unit entry slot occupied on dispatch"
        );
        self.slots[0].latch.set(imap);
        self.slots[0].exit_timer = exit_timer;
    }

    /// The tail slot.
    #[inline]
    pub fn tail(&self) -> &FuSlot {
        &self.slots[self.slots.len() - 1]
    }

    /// The tail slot, mutably.
    #[inline]
    pub fn tail_mut(&mut self) -> &mut FuSlot {
        let last = self.slots.len() - 1;
        &mut self.slots[last]
    }

    /// Empties the tail slot after its instruction exited.
    pub fn clear_tail(&mut self) {
        let last = self.slots.len() - 1;
        self.slots[last] = FuSlot::default();
    }

    /// Shifts instructions one slot toward the tail where the next slot is
    /// vacant. Called once per cycle after the tail exit attempt.
    pub fn shift(&mut self) {
        for i in (0..self.slots.len().saturating_sub(1)).rev() {
            if self.slots[i].latch.has_data && !self.slots[i + 1].latch.has_data {
                self.slots[i + 1] = self.slots[i];
                self.slots[i] = FuSlot::default();
            }
        }
    }

    /// Empties every slot.
    pub fn flush(&mut self) {
        for slot in &mut self.slots {
            *slot = FuSlot::default();
        }
    }
}
