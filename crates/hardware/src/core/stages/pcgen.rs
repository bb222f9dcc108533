//! PC-generation stage.
//!
//! Hands the next fetch address to the fetch stage. The latch is seeded with
//! `has_data = true` at reset and stays that way until an exception stops
//! the frontend; the address itself comes from `fetch_pc`, which fetch
//! updates (sequential or predicted-taken) and commit overwrites on a
//! redirect.

use crate::core::InOrderCore;
use crate::core::imap::NO_SLOT;

pub(crate) fn run(core: &mut InOrderCore) {
    if !core.pcgen.has_data {
        return;
    }
    // Fetch still busy with the previous address.
    if core.fetch.has_data {
        core.pcgen.stalled = true;
        return;
    }
    core.pcgen.stalled = false;
    core.fetch_stage_pc = core.fetch_pc;
    core.fetch.set(NO_SLOT);
}
