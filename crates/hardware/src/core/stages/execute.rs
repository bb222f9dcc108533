//! Execute stage: advances every functional-unit pipeline one step.
//!
//! Units are visited in a fixed order (ALU, MUL, MUL32, DIV, DIV32, the
//! three FPU-ALU lanes, FPU-FMA). For each unit the tail first attempts to
//! exit into the dispatch queue, then the remaining slots shift toward the
//! tail. The queue admits only the next dispatch sequence number, so program
//! order is restored regardless of unit latency or visit order.
//!
//! The functional result is produced by the emulator oracle the first time
//! the instruction stands at the tail; a result that does not come from
//! memory is broadcast on the unit's forwarding bus as the instruction
//! exits.

use crate::core::{CoreCtx, InOrderCore};

pub(crate) fn run_all(core: &mut InOrderCore, ctx: &mut CoreCtx<'_>) {
    for pipe in 0..core.fus.len() {
        try_exit(core, ctx, pipe);
        core.fus[pipe].shift();
    }
}

fn try_exit(core: &mut InOrderCore, ctx: &mut CoreCtx<'_>, pipe: usize) {
    if !core.fus[pipe].tail().latch.has_data {
        return;
    }

    // Variable-latency units (divides) spin at the tail until the timer
    // loaded at entry has elapsed.
    if core.fus[pipe].tail().exit_timer > 0 {
        core.fus[pipe].tail_mut().exit_timer -= 1;
        return;
    }

    let idx = core.fus[pipe].tail().latch.imap;

    if core.imap.get(idx).outcome.is_none() {
        let (inst, pc, ops) = {
            let slot = core.imap.get(idx);
            let Some(inst) = slot.decoded else {
                panic!("instruction in IMAP slot {idx} reached execute without a decoded form");
            };
            (inst, slot.pc, slot.operands)
        };
        let outcome = ctx.emu.compute(&inst, pc, &ops);
        let clock = core.clock;
        let slot = core.imap.get_mut(idx);
        slot.outcome = Some(outcome);
        slot.marks.completed = clock;
    }

    let seq = core.imap.get(idx).seq;
    if !core.dispatch.try_push(idx, seq) {
        // Not the oldest unfinished instruction yet, or the queue is full;
        // hold the tail and retry next cycle.
        return;
    }

    let (rd, is_mem, value) = {
        let slot = core.imap.get(idx);
        let Some(inst) = slot.decoded else {
            unreachable!("decoded form vanished from IMAP slot {idx}");
        };
        let Some(outcome) = slot.outcome else {
            unreachable!("result vanished from IMAP slot {idx}");
        };
        (inst.rd, inst.class.is_mem(), outcome.value)
    };

    // Results that come from memory are broadcast by the memory stage once
    // the access actually completes.
    if let Some(rd) = rd
        && !is_mem
    {
        let bus = core.fus[pipe].kind().bus_index();
        core.fwd.broadcast(bus, rd, value);
    }

    core.fus[pipe].clear_tail();
}
