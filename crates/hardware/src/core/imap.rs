//! In-flight instruction table (IMAP).
//!
//! A pre-allocated pool of per-instruction descriptors. A slot is allocated
//! at fetch, carries everything the stages learn about the instruction, and
//! is freed at commit (or when a flush squashes the wrong path). Nothing on
//! the simulation path allocates; the pool is sized once at construction.

use crate::isa::{DecodedInst, ExecOutcome, Operands};

/// Sentinel for "no IMAP slot attached" in a stage latch.
pub const NO_SLOT: usize = usize::MAX;

/// Cycle stamps recorded as an instruction moves through the machine.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimeMarks {
    /// Cycle the fetch completed.
    pub fetched: u64,
    /// Cycle the raw bytes were decoded.
    pub decoded: u64,
    /// Cycle the instruction was issued to its functional unit.
    pub issued: u64,
    /// Cycle the functional unit produced the result.
    pub completed: u64,
    /// Cycle the memory stage finished.
    pub mem_done: u64,
}

/// Per-instruction descriptor.
#[derive(Clone, Debug, Default)]
pub struct InstSlot {
    /// Dispatch sequence number, assigned at issue.
    pub seq: u64,
    /// Program counter.
    pub pc: u64,
    /// Raw instruction bytes.
    pub raw: u32,
    /// Decoded form, populated once by the emulator at decode.
    pub decoded: Option<DecodedInst>,
    /// Operand values snapshotted at issue.
    pub operands: Operands,
    /// Which of rs1/rs2/rs3 have been captured.
    pub ops_ready: [bool; 3],
    /// Predicted next program counter (fall-through when not predicted
    /// taken).
    pub pred_target: u64,
    /// Whether fetch predicted this instruction taken.
    pub pred_taken: bool,
    /// Functional result, produced when the instruction reaches the tail of
    /// its unit.
    pub outcome: Option<ExecOutcome>,
    /// Completion flag of the memory stage access.
    pub mem_done: bool,
    /// Cycle stamps.
    pub marks: TimeMarks,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
enum SlotStatus {
    #[default]
    Free,
    Allocated,
}

#[derive(Clone, Debug, Default)]
struct Entry {
    status: SlotStatus,
    inst: InstSlot,
}

/// Fixed-capacity pool of in-flight instruction descriptors.
#[derive(Clone, Debug)]
pub struct InstPool {
    entries: Vec<Entry>,
    allocated: usize,
    hint: usize,
}

impl InstPool {
    /// Creates a pool with the given capacity, all slots free.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "IMAP capacity must be non-zero");
        let mut entries = Vec::with_capacity(capacity);
        entries.resize_with(capacity, Entry::default);
        Self {
            entries,
            allocated: 0,
            hint: 0,
        }
    }

    /// Pool capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Number of allocated slots.
    #[inline]
    pub fn allocated(&self) -> usize {
        self.allocated
    }

    /// Number of free slots.
    #[inline]
    pub fn free_slots(&self) -> usize {
        self.entries.len() - self.allocated
    }

    /// True when no slot is free.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.allocated == self.entries.len()
    }

    /// Allocates a slot, reset to defaults. Returns `None` when the pool is
    /// full (the fetch stage stalls).
    pub fn allocate(&mut self) -> Option<usize> {
        if self.is_full() {
            return None;
        }
        let cap = self.entries.len();
        for probe in 0..cap {
            let idx = (self.hint + probe) % cap;
            if self.entries[idx].status == SlotStatus::Free {
                self.entries[idx].status = SlotStatus::Allocated;
                self.entries[idx].inst = InstSlot::default();
                self.allocated += 1;
                self.hint = (idx + 1) % cap;
                return Some(idx);
            }
        }
        unreachable!("IMAP accounting out of sync: free count with no free slot");
    }

    /// Frees an allocated slot.
    ///
    /// # Panics
    ///
    /// Panics if the slot is already free.
    pub fn free(&mut self, idx: usize) {
        assert!(
            self.entries[idx].status == SlotStatus::Allocated,
            "IMAP conservation violated: freeing slot {idx} twice"
        );
        self.entries[idx].status = SlotStatus::Free;
        self.allocated -= 1;
    }

    /// Reads an allocated slot.
    ///
    /// # Panics
    ///
    /// Panics if the slot is free: a stage consumed an empty descriptor.
    pub fn get(&self, idx: usize) -> &InstSlot {
        assert!(
            idx < self.entries.len() && self.entries[idx].status == SlotStatus::Allocated,
            "empty IMAP slot {idx} consumed by a stage"
        );
        &self.entries[idx].inst
    }

    /// Mutates an allocated slot.
    ///
    /// # Panics
    ///
    /// Panics if the slot is free.
    pub fn get_mut(&mut self, idx: usize) -> &mut InstSlot {
        assert!(
            idx < self.entries.len() && self.entries[idx].status == SlotStatus::Allocated,
            "empty IMAP slot {idx} consumed by a stage"
        );
        &mut self.entries[idx].inst
    }

    /// Frees every allocated slot. Used by flush paths; the caller is
    /// responsible for clearing every latch that referenced them.
    pub fn release_all(&mut self) {
        for entry in &mut self.entries {
            entry.status = SlotStatus::Free;
        }
        self.allocated = 0;
        self.hint = 0;
    }
}
