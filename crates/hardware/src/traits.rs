//! Collaborator interfaces consumed by the timing core.
//!
//! The core models time; everything architectural lives behind these traits:
//! 1. **[`IsaEmulator`]** — the functional oracle. It owns guest memory and
//!    the architectural register files, decodes raw bytes, computes each
//!    instruction's result from an operand snapshot, and applies
//!    architectural effects only when the core retires the instruction.
//! 2. **[`Mmu`]** — translates-and-times an access: either a hit with a
//!    latency, or a miss that has been turned into stage-queue transactions
//!    the caller polls for completion.
//! 3. **[`BranchPredictor`]** — consulted at fetch, trained at commit.
//!    Opaque to the core.

use crate::common::mode::PrivilegeLevel;
use crate::isa::{DecodedInst, ExecOutcome, Operands, RegClass};
use crate::mem::MemorySystem;

/// The functional ISA emulator the core uses as a per-instruction oracle.
pub trait IsaEmulator {
    /// Returns the raw instruction bytes at `pc`.
    fn fetch_raw(&mut self, pc: u64) -> u32;

    /// Decodes raw bytes into the core's routing form.
    fn decode(&mut self, raw: u32, pc: u64) -> DecodedInst;

    /// Functionally executes one instruction from the operand snapshot.
    ///
    /// Must not modify architectural state; the result is applied via
    /// [`IsaEmulator::retire`] once the instruction commits.
    fn compute(&mut self, inst: &DecodedInst, pc: u64, ops: &Operands) -> ExecOutcome;

    /// Performs the architectural memory access for a load, store, or
    /// atomic when the timing model completes it. Stores write guest
    /// memory from `outcome.value`; loads and atomics return the loaded
    /// value. The core calls this in program order and never on the wrong
    /// path.
    fn access_memory(&mut self, inst: &DecodedInst, outcome: &ExecOutcome) -> u64;

    /// Applies the architectural effects of a committed instruction:
    /// destination register write and the program counter. Memory effects
    /// were already applied by [`IsaEmulator::access_memory`].
    fn retire(&mut self, inst: &DecodedInst, outcome: &ExecOutcome);

    /// Reads an architectural register.
    fn read_reg(&self, cls: RegClass, idx: u8) -> u64;

    /// Current architectural program counter.
    fn pc(&self) -> u64;

    /// Current privilege level, used to bucket statistics.
    fn privilege(&self) -> PrivilegeLevel;
}

/// What kind of access the MMU is being asked to time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessKind {
    /// Instruction fetch (frontend queue on miss).
    Fetch,
    /// Data load (backend queue on miss).
    Load,
    /// Data store (backend queue on miss).
    Store,
    /// Atomic read-modify-write (backend queue on miss).
    Atomic,
}

impl AccessKind {
    /// True for accesses that write memory.
    #[inline]
    pub fn is_write(self) -> bool {
        matches!(self, Self::Store | Self::Atomic)
    }
}

/// One access for the MMU to translate and time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemAccess {
    /// Virtual address.
    pub vaddr: u64,
    /// Width in bytes.
    pub len: u8,
    /// Access kind.
    pub kind: AccessKind,
}

/// MMU response for one access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessResponse {
    /// The access completes locally after `latency` cycles.
    Hit {
        /// Cycles the requesting stage occupies itself with this access.
        latency: u64,
    },
    /// The access went to memory. Transactions were enqueued on the
    /// requesting stage's queue; the stage stalls until they complete.
    Miss,
    /// The memory controller could not accept the transactions this cycle.
    /// The stage retries the access next cycle.
    Retry,
}

/// Address translation and cache timing, owned outside the core.
pub trait Mmu {
    /// Translates and times one access. On a miss the implementation
    /// enqueues transactions through `mem` on the queue matching
    /// `access.kind` and returns [`AccessResponse::Miss`].
    fn access(&mut self, access: &MemAccess, mem: &mut MemorySystem) -> AccessResponse;
}

/// Branch prediction, owned outside the core.
pub trait BranchPredictor {
    /// Predicts the next fetch address for `pc`. `Some(target)` means
    /// predicted taken to `target`; `None` means predicted fall-through.
    fn predict(&mut self, pc: u64) -> Option<u64>;

    /// Trains the predictor with a resolved branch.
    fn update(&mut self, pc: u64, taken: bool, target: u64);
}
