//! Cycle-accurate in-order RISC-V pipeline timing simulator.
//!
//! This crate implements the timing core of a RISC-V simulator with the following:
//! 1. **Pipeline:** 5- or 6-stage in-order pipeline (PC generation, Fetch, Decode,
//!    Execute, Memory, Commit) with single-entry stage latches.
//! 2. **Functional units:** multi-stage shift pipelines for ALU, MUL, MUL32, DIV,
//!    DIV32, FPU-ALU (three lanes), and FPU-FMA, with out-of-order completion
//!    funneled back into program order through a dispatch queue.
//! 3. **Hazards:** a per-register scoreboard and a one-cycle forwarding network.
//! 4. **Memory:** frontend/backend stage request queues in front of a pluggable
//!    DRAM timing model, with fixed-latency and row-buffer controllers in-tree.
//! 5. **Collaborators:** trait seams for the functional ISA emulator, the MMU,
//!    and the branch predictor; the core consumes them and owns no guest state.

/// Trivial always-not-taken branch predictor.
pub mod bpu;
/// Common primitives (circular queue, privilege levels, exception types).
pub mod common;
/// Simulator configuration (defaults, validation, JSON deserialization).
pub mod config;
/// The in-order core: latches, functional units, hazard state, and stages.
pub mod core;
/// Decoded instruction forms exchanged with the ISA emulator.
pub mod isa;
/// Memory-controller adapter and DRAM timing models.
pub mod mem;
/// Simulation statistics collection and reporting.
pub mod stats;
/// Collaborator interfaces consumed by the core.
pub mod traits;

/// Root configuration type; use `SimParams::default()` or deserialize from JSON.
pub use crate::config::SimParams;
/// The in-order timing core; construct with [`InOrderCore::new`].
pub use crate::core::{CoreCtx, InOrderCore};
/// Reasons `InOrderCore::run` returns to the caller.
pub use crate::common::error::RunExit;
