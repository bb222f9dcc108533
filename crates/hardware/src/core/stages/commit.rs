//! Commit stage: retires one instruction per tick.
//!
//! Architectural effects are applied through the emulator oracle only here,
//! in program order. Commit also:
//! 1. Releases the destination's scoreboard ready bit and the IMAP slot.
//! 2. Trains the branch predictor and, on a mispredict, flushes everything
//!    upstream and redirects pcgen to the actual target.
//! 3. Raises the pending-exception flag and stops the frontend; the driver
//!    then drains the pipeline and returns the cause.
//! 4. Reports a timeout when the per-run commit budget expires.

use crate::common::error::SimException;
use crate::core::{CoreCtx, InOrderCore};

/// Returns true when the simulation budget has expired (timeout).
pub(crate) fn run(core: &mut InOrderCore, ctx: &mut CoreCtx<'_>) -> bool {
    if !core.commit.has_data {
        return false;
    }
    if core.budget_enabled && core.budget_left == 0 {
        tracing::debug!("commit budget expired");
        return true;
    }

    let idx = core.commit.imap;
    core.commit.flush();

    // While an exception drains, younger instructions retire with no
    // architectural effect. Their ready bits are still released so stalled
    // consumers upstream can drain too.
    if core.pending_exception.is_some() {
        if let Some(inst) = core.imap.get(idx).decoded
            && let Some(rd) = inst.rd
        {
            core.scoreboard.mark_ready(rd);
        }
        core.imap.free(idx);
        return false;
    }

    let slot = core.imap.get(idx).clone();
    let Some(inst) = slot.decoded else {
        panic!("instruction in IMAP slot {idx} reached commit without a decoded form");
    };
    let Some(outcome) = slot.outcome else {
        panic!("instruction in IMAP slot {idx} reached commit without a result");
    };
    assert_eq!(
        slot.seq, core.retire_seq,
        "in-order commit violated: retiring sequence {} while {} is outstanding",
        slot.seq, core.retire_seq
    );

    if let Some(cause) = outcome.exception {
        // The faulting instruction does not retire; the emulator takes over
        // at this pc once the pipeline is empty.
        core.pending_exception = Some(SimException {
            cause,
            epc: slot.pc,
        });
        core.stats.exceptions += 1;
        core.imap.free(idx);
        core.flush_frontend();
        tracing::debug!(cause = %cause, epc = slot.pc, "simulated exception, draining pipeline");
        return false;
    }

    core.retire_seq += 1;
    let priv_idx = ctx.emu.privilege().as_index();
    ctx.emu.retire(&inst, &outcome);
    if let Some(rd) = inst.rd {
        core.scoreboard.mark_ready(rd);
    }
    core.stats.per_priv[priv_idx].mix.record(inst.class);
    if core.budget_enabled {
        core.budget_left -= 1;
    }
    tracing::trace!(pc = slot.pc, seq = slot.seq, "retired");

    let mispredicted = outcome.next_pc != slot.pred_target;
    if inst.branch.is_some() {
        core.stats.branches_resolved += 1;
        if mispredicted {
            core.stats.branch_mispredictions += 1;
        }
        if core.params.frontend.enable_bpu {
            ctx.bpu.update(slot.pc, outcome.taken, outcome.next_pc);
        }
    }

    core.imap.free(idx);

    if mispredicted {
        // Everything in flight is younger than this instruction; squash it
        // all and restart fetch at the actual target.
        core.flush_wrong_path();
        core.fetch_pc = outcome.next_pc;
        core.seed_pcgen();
        tracing::debug!(
            pc = slot.pc,
            target = outcome.next_pc,
            "redirect, flushed wrong path"
        );
    }

    false
}
