//! One-cycle data forwarding network.
//!
//! A fixed array of broadcast buses: one per functional-unit kind plus one
//! for the memory stage. A bus is written when a result leaves its producer
//! and read exactly once, by decode, later in the same driver tick; the
//! driver then clears the whole array. Nothing survives to the next tick
//! without a new producer.

use crate::isa::{NUM_FU_KINDS, RegClass, RegRef};

/// Total forwarding buses: one per functional unit kind plus the memory
/// stage bus.
pub const NUM_FWD_BUS: usize = NUM_FU_KINDS + 1;

/// Bus index used by the memory stage for load data.
pub const MEM_FWD_BUS: usize = NUM_FU_KINDS;

/// One broadcast bus.
#[derive(Clone, Copy, Debug, Default)]
pub struct FwdBus {
    /// True while the bus carries a value this tick.
    pub valid: bool,
    /// Destination register number the value belongs to.
    pub tag: u8,
    /// Destination register class.
    pub cls: RegClass,
    /// The forwarded value.
    pub value: u64,
}

/// The fixed set of forwarding buses.
#[derive(Clone, Debug, Default)]
pub struct ForwardingNetwork {
    buses: [FwdBus; NUM_FWD_BUS],
}

impl ForwardingNetwork {
    /// Creates a network with every bus idle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drives a result onto a bus. Broadcasts targeting x0 are dropped.
    ///
    /// # Panics
    ///
    /// Panics if `bus` is out of range.
    pub fn broadcast(&mut self, bus: usize, rd: RegRef, value: u64) {
        assert!(bus < NUM_FWD_BUS, "forwarding bus index {bus} out of range");
        if rd.cls == RegClass::Int && rd.idx == 0 {
            return;
        }
        self.buses[bus] = FwdBus {
            valid: true,
            tag: rd.idx,
            cls: rd.cls,
            value,
        };
    }

    /// Searches the buses for a register's value. x0 never matches.
    pub fn snoop(&self, reg: RegRef) -> Option<u64> {
        if reg.cls == RegClass::Int && reg.idx == 0 {
            return None;
        }
        self.buses
            .iter()
            .find(|b| b.valid && b.tag == reg.idx && b.cls == reg.cls)
            .map(|b| b.value)
    }

    /// Clears every bus. Called by the driver right after decode's snoop.
    pub fn clear_all(&mut self) {
        self.buses = [FwdBus::default(); NUM_FWD_BUS];
    }
}
