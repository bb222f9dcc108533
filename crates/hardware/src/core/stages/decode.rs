//! Decode and issue stage.
//!
//! Asks the emulator to decode the raw bytes once, then resolves operands
//! against the scoreboard and the forwarding buses. Decode gets exactly one
//! snoop opportunity per tick; the driver clears the buses right after this
//! stage runs. When every source is captured and the destination has no
//! in-flight producer, the instruction is issued: it receives its dispatch
//! sequence number, clears its destination's ready bit, and enters its
//! functional unit at index 0.

use crate::core::{CoreCtx, InOrderCore};
use crate::isa::FuKind;

pub(crate) fn run(core: &mut InOrderCore, ctx: &mut CoreCtx<'_>) {
    if !core.decode.has_data {
        return;
    }
    let idx = core.decode.imap;

    // Wrong-path instruction while an exception drains: squash it here so
    // nothing new is issued.
    if core.pending_exception.is_some() {
        core.imap.free(idx);
        core.decode.flush();
        return;
    }

    if core.imap.get(idx).decoded.is_none() {
        let (raw, pc) = {
            let slot = core.imap.get(idx);
            (slot.raw, slot.pc)
        };
        let inst = ctx.emu.decode(raw, pc);
        let clock = core.clock;
        let slot = core.imap.get_mut(idx);
        slot.decoded = Some(inst);
        slot.marks.decoded = clock;
        // Absent sources need no capture.
        slot.ops_ready = [inst.rs1.is_none(), inst.rs2.is_none(), inst.rs3.is_none()];
    }

    let Some(inst) = core.imap.get(idx).decoded else {
        unreachable!("decoded form vanished from IMAP slot {idx}");
    };

    // A busy destination means an in-flight producer still owns the ready
    // bit; issuing now would leave two writers on one register.
    if let Some(rd) = inst.rd
        && !core.scoreboard.is_ready(rd)
    {
        core.decode.stalled = true;
        core.stats.stalls_data += 1;
        return;
    }

    // Capture sources: architectural file when ready, else snoop the buses.
    let sources = [inst.rs1, inst.rs2, inst.rs3];
    for (i, source) in sources.iter().enumerate() {
        let Some(reg) = source else { continue };
        if core.imap.get(idx).ops_ready[i] {
            continue;
        }
        let value = if core.scoreboard.is_ready(*reg) {
            Some(ctx.emu.read_reg(reg.cls, reg.idx))
        } else {
            core.fwd.snoop(*reg)
        };
        if let Some(v) = value {
            let slot = core.imap.get_mut(idx);
            slot.ops_ready[i] = true;
            match i {
                0 => slot.operands.rs1 = v,
                1 => slot.operands.rs2 = v,
                _ => slot.operands.rs3 = v,
            }
        }
    }

    if core.imap.get(idx).ops_ready.iter().any(|&ready| !ready) {
        core.decode.stalled = true;
        core.stats.stalls_data += 1;
        return;
    }

    // Structural: the unit's entry slot must be vacant.
    let Some(pipe) = core.pick_fu(inst.fu) else {
        core.decode.stalled = true;
        core.stats.stalls_structural += 1;
        return;
    };
    core.decode.stalled = false;

    let seq = core.dispatch.issue_seq();
    let exit_timer = if matches!(inst.fu, FuKind::Div | FuKind::Div32) {
        core.params.pipeline.div_exit_cycles
    } else {
        0
    };
    let clock = core.clock;
    {
        let slot = core.imap.get_mut(idx);
        slot.seq = seq;
        slot.marks.issued = clock;
    }
    if let Some(rd) = inst.rd {
        core.scoreboard.mark_busy(rd);
    }
    tracing::trace!(pc = core.imap.get(idx).pc, seq, unit = ?inst.fu, "issued");
    core.fus[pipe].insert(idx, exit_timer);
    core.decode.flush();
}
