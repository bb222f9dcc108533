//! Simulated exceptions and error definitions.
//!
//! This module defines everything that can cross the core boundary as a
//! failure. It provides:
//! 1. **Exception Causes:** synchronous causes the functional emulator can
//!    raise for an instruction the timing core is retiring.
//! 2. **Run Exits:** the reasons `run` returns control to the caller.
//! 3. **Configuration Errors:** parameter validation failures at construction.
//!
//! Only simulated-exception causes propagate out of the core; every other
//! condition is absorbed locally by stalling or flushing.

use std::fmt;

use thiserror::Error;

use super::mode::PrivilegeLevel;

/// Synchronous exception causes raised by the functional emulator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExceptionCause {
    /// Invalid or unimplemented encoding. Carries the instruction bits.
    IllegalInstruction(u32),

    /// Breakpoint instruction. Carries the program counter.
    Breakpoint(u64),

    /// Environment call, qualified by the privilege mode it was made from.
    EnvironmentCall(PrivilegeLevel),

    /// Instruction fetch page fault. Carries the faulting virtual address.
    InstructionPageFault(u64),

    /// Load page fault. Carries the faulting virtual address.
    LoadPageFault(u64),

    /// Store/AMO page fault. Carries the faulting virtual address.
    StorePageFault(u64),
}

impl ExceptionCause {
    /// Returns the RISC-V `mcause` exception code for this cause.
    pub fn code(self) -> u64 {
        match self {
            Self::IllegalInstruction(_) => 2,
            Self::Breakpoint(_) => 3,
            Self::EnvironmentCall(PrivilegeLevel::User) => 8,
            Self::EnvironmentCall(PrivilegeLevel::Supervisor) => 9,
            Self::EnvironmentCall(_) => 11,
            Self::InstructionPageFault(_) => 12,
            Self::LoadPageFault(_) => 13,
            Self::StorePageFault(_) => 15,
        }
    }
}

impl fmt::Display for ExceptionCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IllegalInstruction(inst) => write!(f, "IllegalInstruction({inst:#x})"),
            Self::Breakpoint(pc) => write!(f, "Breakpoint({pc:#x})"),
            Self::EnvironmentCall(mode) => write!(f, "EnvironmentCall({mode:?})"),
            Self::InstructionPageFault(addr) => write!(f, "InstructionPageFault({addr:#x})"),
            Self::LoadPageFault(addr) => write!(f, "LoadPageFault({addr:#x})"),
            Self::StorePageFault(addr) => write!(f, "StorePageFault({addr:#x})"),
        }
    }
}

/// A pending simulated exception: the cause plus the program counter of the
/// instruction that raised it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimException {
    /// Why the exception was raised.
    pub cause: ExceptionCause,
    /// Program counter of the faulting instruction.
    pub epc: u64,
}

impl fmt::Display for SimException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at pc {:#x}", self.cause, self.epc)
    }
}

/// Why `run` returned to the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunExit {
    /// The per-run commit budget expired before any exception occurred.
    Timeout,
    /// A simulated exception was raised and the pipeline has drained; the
    /// functional emulator should take over at `epc`.
    Exception(SimException),
}

/// Parameter validation failures reported at core construction.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The pipeline variant selector was neither 5 nor 6.
    #[error("pipeline must have 5 or 6 stages, got {0}")]
    BadStageCount(usize),

    /// A functional-unit pipeline was configured with zero stages.
    #[error("functional unit `{unit}` must have at least one stage")]
    EmptyFuPipeline {
        /// Name of the offending unit.
        unit: &'static str,
    },

    /// The dispatch queue was configured with zero entries.
    #[error("dispatch queue must have at least one entry")]
    EmptyDispatchQueue,

    /// The in-flight instruction table cannot cover the worst case.
    #[error("IMAP must hold at least twice the dispatch queue ({imap} < 2 * {dispatch})")]
    ImapTooSmall {
        /// Configured IMAP capacity.
        imap: usize,
        /// Configured dispatch queue capacity.
        dispatch: usize,
    },

    /// The configuration JSON could not be deserialized.
    #[error("malformed configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
}
