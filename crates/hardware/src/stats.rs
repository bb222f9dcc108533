//! Simulation statistics collection and reporting.
//!
//! This module tracks performance metrics for the timing core. It provides:
//! 1. **Per-privilege counters:** cycles and retired-instruction mix, indexed
//!    by the privilege mode the emulator reported at the time.
//! 2. **Hazards:** data, structural, and memory stall counts.
//! 3. **Branches:** resolved branch count and mispredictions.
//! 4. **Reporting:** a plain-text summary on stdout.

use crate::common::mode::NUM_PRIV_LEVELS;
use crate::isa::OpClass;

/// Retired-instruction counts by classification.
#[derive(Clone, Copy, Debug, Default)]
pub struct InstructionMix {
    /// Integer loads.
    pub load: u64,
    /// Integer stores.
    pub store: u64,
    /// Atomic memory operations.
    pub atomic: u64,
    /// System instructions.
    pub system: u64,
    /// Integer ALU operations.
    pub arithmetic: u64,
    /// Conditional branches.
    pub cond_branch: u64,
    /// Direct jumps.
    pub jal: u64,
    /// Indirect jumps.
    pub jalr: u64,
    /// Integer multiplies.
    pub int_mul: u64,
    /// Integer divides.
    pub int_div: u64,
    /// Floating-point loads.
    pub fp_load: u64,
    /// Floating-point stores.
    pub fp_store: u64,
    /// Floating-point add/subtract.
    pub fp_add: u64,
    /// Floating-point multiplies.
    pub fp_mul: u64,
    /// Floating-point fused multiply-adds.
    pub fp_fma: u64,
    /// Floating-point divide/sqrt.
    pub fp_div_sqrt: u64,
    /// Other floating-point operations.
    pub fp_misc: u64,
}

impl InstructionMix {
    /// Bumps the counter matching the instruction classification.
    pub fn record(&mut self, class: OpClass) {
        let counter = match class {
            OpClass::Load => &mut self.load,
            OpClass::Store => &mut self.store,
            OpClass::Atomic => &mut self.atomic,
            OpClass::System => &mut self.system,
            OpClass::Arith => &mut self.arithmetic,
            OpClass::CondBranch => &mut self.cond_branch,
            OpClass::Jal => &mut self.jal,
            OpClass::Jalr => &mut self.jalr,
            OpClass::IntMul => &mut self.int_mul,
            OpClass::IntDiv => &mut self.int_div,
            OpClass::FpLoad => &mut self.fp_load,
            OpClass::FpStore => &mut self.fp_store,
            OpClass::FpAdd => &mut self.fp_add,
            OpClass::FpMul => &mut self.fp_mul,
            OpClass::FpFma => &mut self.fp_fma,
            OpClass::FpDivSqrt => &mut self.fp_div_sqrt,
            OpClass::FpMisc => &mut self.fp_misc,
        };
        *counter += 1;
    }

    /// Total retired instructions in this mix.
    pub fn total(&self) -> u64 {
        self.load
            + self.store
            + self.atomic
            + self.system
            + self.arithmetic
            + self.cond_branch
            + self.jal
            + self.jalr
            + self.int_mul
            + self.int_div
            + self.fp_load
            + self.fp_store
            + self.fp_add
            + self.fp_mul
            + self.fp_fma
            + self.fp_div_sqrt
            + self.fp_misc
    }
}

/// Counters for one privilege level.
#[derive(Clone, Copy, Debug, Default)]
pub struct PrivStats {
    /// Cycles spent while the emulator reported this privilege level.
    pub cycles: u64,
    /// Instructions retired at this privilege level.
    pub mix: InstructionMix,
}

/// Simulation statistics for one core.
#[derive(Clone, Debug, Default)]
pub struct SimStats {
    /// Per-privilege cycle and instruction-mix counters (U, S, H, M).
    pub per_priv: [PrivStats; NUM_PRIV_LEVELS],
    /// Branches resolved at commit.
    pub branches_resolved: u64,
    /// Branches whose actual target disagreed with the prediction.
    pub branch_mispredictions: u64,
    /// Decode cycles lost waiting for a source or destination register.
    pub stalls_data: u64,
    /// Cycles lost to structural hazards (IMAP full, no vacant unit entry).
    pub stalls_structural: u64,
    /// Cycles lost waiting on the memory controller.
    pub stalls_mem: u64,
    /// Simulated exceptions observed at commit.
    pub exceptions: u64,
}

impl SimStats {
    /// Total cycles across all privilege levels.
    pub fn cycles(&self) -> u64 {
        self.per_priv.iter().map(|p| p.cycles).sum()
    }

    /// Total retired instructions across all privilege levels.
    pub fn commits(&self) -> u64 {
        self.per_priv.iter().map(|p| p.mix.total()).sum()
    }

    /// Instructions per cycle over the whole run.
    pub fn ipc(&self) -> f64 {
        let cycles = self.cycles().max(1);
        self.commits() as f64 / cycles as f64
    }

    /// Prints a plain-text report to stdout.
    pub fn print(&self) {
        let names = ["user", "supervisor", "hypervisor", "machine"];

        println!("=== core summary ===");
        println!("cycles:              {}", self.cycles());
        println!("instructions:        {}", self.commits());
        println!("ipc:                 {:.4}", self.ipc());
        println!("branches resolved:   {}", self.branches_resolved);
        println!("mispredictions:      {}", self.branch_mispredictions);
        println!("data stalls:         {}", self.stalls_data);
        println!("structural stalls:   {}", self.stalls_structural);
        println!("memory stalls:       {}", self.stalls_mem);
        println!("exceptions:          {}", self.exceptions);

        println!("=== per-privilege ===");
        for (name, priv_stats) in names.iter().zip(self.per_priv.iter()) {
            if priv_stats.cycles == 0 && priv_stats.mix.total() == 0 {
                continue;
            }
            println!(
                "{name}: cycles={} instructions={}",
                priv_stats.cycles,
                priv_stats.mix.total()
            );
            let m = &priv_stats.mix;
            println!(
                "  load={} store={} atomic={} system={} arith={}",
                m.load, m.store, m.atomic, m.system, m.arithmetic
            );
            println!(
                "  cond_branch={} jal={} jalr={} mul={} div={}",
                m.cond_branch, m.jal, m.jalr, m.int_mul, m.int_div
            );
            println!(
                "  fp: load={} store={} add={} mul={} fma={} div_sqrt={} misc={}",
                m.fp_load, m.fp_store, m.fp_add, m.fp_mul, m.fp_fma, m.fp_div_sqrt, m.fp_misc
            );
        }
    }
}
