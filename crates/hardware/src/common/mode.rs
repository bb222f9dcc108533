//! RISC-V privilege modes.
//!
//! The timing core never interprets privilege semantics; it only uses the
//! current mode (reported by the ISA emulator) to bucket cycle and
//! instruction counters.

/// Number of architectural privilege levels tracked by the statistics.
pub const NUM_PRIV_LEVELS: usize = 4;

/// RISC-V privilege modes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum PrivilegeLevel {
    /// User mode (U).
    User,
    /// Supervisor mode (S).
    Supervisor,
    /// Hypervisor mode (H, reserved).
    Hypervisor,
    /// Machine mode (M). The reset mode.
    #[default]
    Machine,
}

impl PrivilegeLevel {
    /// Returns the statistics bucket index for this mode.
    #[inline]
    pub fn as_index(self) -> usize {
        match self {
            Self::User => 0,
            Self::Supervisor => 1,
            Self::Hypervisor => 2,
            Self::Machine => 3,
        }
    }

    /// Returns the RISC-V encoding of this mode (U=0, S=1, H=2, M=3).
    #[inline]
    pub fn to_u8(self) -> u8 {
        self.as_index() as u8
    }
}
