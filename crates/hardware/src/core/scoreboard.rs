//! Register scoreboard: per-register ready bits guarding data hazards.
//!
//! Two fixed arrays of ready bits, one per register file. A bit is cleared
//! at issue when the register becomes the destination of an in-flight
//! instruction and set again when that instruction commits. Decode treats a
//! clear bit as "wait, or snoop the forwarding buses".
//!
//! x0 is hardwired zero and never goes busy.

use crate::isa::{RegClass, RegRef};

/// Per-register ready bits for both register files.
#[derive(Clone, Debug)]
pub struct Scoreboard {
    int_ready: [bool; 32],
    fp_ready: [bool; 32],
}

impl Default for Scoreboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Scoreboard {
    /// Creates a scoreboard with every register ready.
    pub fn new() -> Self {
        Self {
            int_ready: [true; 32],
            fp_ready: [true; 32],
        }
    }

    /// True when the register's architectural value is current.
    #[inline]
    pub fn is_ready(&self, reg: RegRef) -> bool {
        match reg.cls {
            RegClass::Int => self.int_ready[reg.idx as usize],
            RegClass::Fp => self.fp_ready[reg.idx as usize],
        }
    }

    /// Clears the ready bit for a new in-flight producer. No-op for x0.
    pub fn mark_busy(&mut self, reg: RegRef) {
        match reg.cls {
            RegClass::Int => {
                if reg.idx != 0 {
                    self.int_ready[reg.idx as usize] = false;
                }
            }
            RegClass::Fp => self.fp_ready[reg.idx as usize] = false,
        }
    }

    /// Sets the ready bit when the producer commits (or is squashed).
    pub fn mark_ready(&mut self, reg: RegRef) {
        match reg.cls {
            RegClass::Int => self.int_ready[reg.idx as usize] = true,
            RegClass::Fp => self.fp_ready[reg.idx as usize] = true,
        }
    }

    /// Marks every register ready. Used at reset and after a flush, when no
    /// in-flight producer survives and every value is architectural.
    pub fn reset(&mut self) {
        self.int_ready = [true; 32];
        self.fp_ready = [true; 32];
    }
}
