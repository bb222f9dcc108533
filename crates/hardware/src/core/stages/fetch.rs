//! Fetch stage.
//!
//! Times the instruction fetch through the MMU. On a hit the stage busies
//! itself for the hit latency; on a miss it stalls until every frontend
//! queue transaction completes. Once the bytes are available the stage
//! allocates nothing further: the IMAP slot was claimed up front (fetch is
//! the allocation point), the branch predictor is consulted, and the
//! instruction moves to decode when that latch is vacant.

use crate::core::{AccessState, CoreCtx, InOrderCore};
use crate::core::imap::NO_SLOT;
use crate::mem::QueueSide;
use crate::traits::{AccessKind, AccessResponse, MemAccess};

pub(crate) fn run(core: &mut InOrderCore, ctx: &mut CoreCtx<'_>) {
    if !core.fetch.has_data {
        return;
    }

    match core.fetch_state {
        AccessState::Idle => {
            if core.fetch.imap == NO_SLOT {
                let Some(idx) = core.imap.allocate() else {
                    // In-flight table full; retry after commit frees a slot.
                    core.stats.stalls_structural += 1;
                    return;
                };
                core.fetch.imap = idx;
                core.imap.get_mut(idx).pc = core.fetch_stage_pc;
            }
            let access = MemAccess {
                vaddr: core.fetch_stage_pc,
                len: 4,
                kind: AccessKind::Fetch,
            };
            match ctx.mmu.access(&access, &mut core.mem) {
                AccessResponse::Hit { latency } => {
                    if latency <= 1 {
                        finish(core, ctx);
                    } else {
                        core.fetch_state = AccessState::HitWait(latency - 1);
                    }
                }
                AccessResponse::Miss => {
                    core.fetch_state = AccessState::MissWait;
                    core.fetch.stalled = true;
                    core.stats.stalls_mem += 1;
                    tracing::trace!(pc = core.fetch_stage_pc, "fetch miss");
                }
                AccessResponse::Retry => {}
            }
        }
        AccessState::HitWait(left) => {
            if left <= 1 {
                finish(core, ctx);
            } else {
                core.fetch_state = AccessState::HitWait(left - 1);
            }
        }
        AccessState::MissWait => {
            if core.mem.outstanding(QueueSide::Frontend) == 0 {
                core.mem.ack_completed(QueueSide::Frontend);
                core.fetch.stalled = false;
                finish(core, ctx);
            } else {
                core.stats.stalls_mem += 1;
            }
        }
        AccessState::Done => {}
    }

    if core.fetch_state == AccessState::Done && !core.decode.has_data {
        core.decode.set(core.fetch.imap);
        core.fetch.flush();
        core.fetch_state = AccessState::Idle;
    }
}

/// Completes the fetch: read the raw bytes, consult the predictor, and
/// publish the next fetch address for pcgen.
fn finish(core: &mut InOrderCore, ctx: &mut CoreCtx<'_>) {
    let idx = core.fetch.imap;
    let pc = core.fetch_stage_pc;
    let raw = ctx.emu.fetch_raw(pc);

    let prediction = if core.params.frontend.enable_bpu {
        ctx.bpu.predict(pc)
    } else {
        None
    };
    let (pred_taken, next_pc) = match prediction {
        Some(target) => (true, target),
        None => (false, pc.wrapping_add(4)),
    };

    let clock = core.clock;
    let slot = core.imap.get_mut(idx);
    slot.raw = raw;
    slot.pred_taken = pred_taken;
    slot.pred_target = next_pc;
    slot.marks.fetched = clock;

    core.fetch_pc = next_pc;
    core.fetch_state = AccessState::Done;
}
