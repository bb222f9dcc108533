//! Memory stage.
//!
//! Consumes the head of the dispatch queue. Instructions without a memory
//! access pass straight through to commit. Loads, stores, and atomics go to
//! the MMU: a hit busies the stage for the hit latency, a miss enqueues
//! backend transactions and stalls the stage until the completion flags are
//! set. When the timing model completes the access, the architectural
//! access is performed through the emulator oracle (in program order) and
//! loaded values are broadcast on the memory forwarding bus.
//!
//! While an exception is draining the pipeline, wrong-path memory
//! operations pass through without issuing traffic or touching guest
//! memory.

use crate::core::forward::MEM_FWD_BUS;
use crate::core::{AccessState, CoreCtx, InOrderCore};
use crate::isa::OpClass;
use crate::mem::QueueSide;
use crate::traits::{AccessKind, AccessResponse, MemAccess};

pub(crate) fn run(core: &mut InOrderCore, ctx: &mut CoreCtx<'_>) {
    if core.memory.has_data {
        progress(core, ctx);
    }

    if !core.memory.has_data
        && let Some(idx) = core.dispatch.pop()
    {
        core.memory.set(idx);
        core.mem_state = AccessState::Idle;
        start(core, ctx);
    }

    try_advance(core);
}

/// Moves an in-flight access forward by one cycle.
fn progress(core: &mut InOrderCore, ctx: &mut CoreCtx<'_>) {
    match core.mem_state {
        // A refused enqueue left the access unissued; retry.
        AccessState::Idle => start(core, ctx),
        AccessState::HitWait(left) => {
            if left <= 1 {
                finish(core, ctx);
            } else {
                core.mem_state = AccessState::HitWait(left - 1);
            }
        }
        AccessState::MissWait => {
            if core.mem.outstanding(QueueSide::Backend) == 0 {
                core.mem.ack_completed(QueueSide::Backend);
                core.memory.stalled = false;
                finish(core, ctx);
            } else {
                core.stats.stalls_mem += 1;
            }
        }
        AccessState::Done => {}
    }
}

/// First cycle an instruction spends in the stage.
fn start(core: &mut InOrderCore, ctx: &mut CoreCtx<'_>) {
    let idx = core.memory.imap;
    let (request, class) = {
        let slot = core.imap.get(idx);
        let Some(outcome) = slot.outcome else {
            panic!("instruction in IMAP slot {idx} reached memory without a result");
        };
        let Some(inst) = slot.decoded else {
            panic!("instruction in IMAP slot {idx} reached memory without a decoded form");
        };
        (outcome.mem, inst.class)
    };

    let Some(request) = request else {
        finish(core, ctx);
        return;
    };
    if core.pending_exception.is_some() {
        // Wrong path: no traffic.
        finish(core, ctx);
        return;
    }

    let kind = match class {
        OpClass::Atomic => AccessKind::Atomic,
        _ if request.is_store => AccessKind::Store,
        _ => AccessKind::Load,
    };
    let access = MemAccess {
        vaddr: request.vaddr,
        len: request.len,
        kind,
    };
    match ctx.mmu.access(&access, &mut core.mem) {
        AccessResponse::Hit { latency } => {
            if latency <= 1 {
                finish(core, ctx);
            } else {
                core.mem_state = AccessState::HitWait(latency - 1);
            }
        }
        AccessResponse::Miss => {
            core.mem_state = AccessState::MissWait;
            core.memory.stalled = true;
            core.stats.stalls_mem += 1;
            tracing::trace!(vaddr = request.vaddr, "memory stage miss");
        }
        AccessResponse::Retry => {
            core.mem_state = AccessState::Idle;
        }
    }
}

/// Completes the stage's work: perform the architectural access, publish
/// the loaded value, and mark the instruction ready for commit.
fn finish(core: &mut InOrderCore, ctx: &mut CoreCtx<'_>) {
    let idx = core.memory.imap;
    let clock = core.clock;

    let (inst, outcome) = {
        let slot = core.imap.get(idx);
        let Some(inst) = slot.decoded else {
            unreachable!("decoded form vanished from IMAP slot {idx}");
        };
        let Some(outcome) = slot.outcome else {
            unreachable!("result vanished from IMAP slot {idx}");
        };
        (inst, outcome)
    };

    // The architectural access happens here, once, in program order.
    // Wrong-path operations draining behind an exception skip it.
    let mut value = outcome.value;
    if outcome.mem.is_some() && core.pending_exception.is_none() {
        let data = ctx.emu.access_memory(&inst, &outcome);
        if inst.class.loads_dest() {
            value = data;
        }
    }

    {
        let slot = core.imap.get_mut(idx);
        slot.mem_done = true;
        slot.marks.mem_done = clock;
        if let Some(out) = slot.outcome.as_mut() {
            out.value = value;
        }
    }

    if let Some(rd) = inst.rd
        && inst.class.loads_dest()
    {
        core.fwd.broadcast(MEM_FWD_BUS, rd, value);
    }
    core.mem_state = AccessState::Done;
}

/// Hands a finished instruction to commit when that latch is vacant.
fn try_advance(core: &mut InOrderCore) {
    if core.memory.has_data && core.mem_state == AccessState::Done && !core.commit.has_data {
        core.commit.set(core.memory.imap);
        core.memory.flush();
        core.mem_state = AccessState::Idle;
    }
}
