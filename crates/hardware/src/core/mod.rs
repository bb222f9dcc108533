//! The in-order timing core.
//!
//! This module owns every piece of micro-architectural state and the tick
//! driver. It provides:
//! 1. **State:** stage latches, functional-unit pipelines, the IMAP pool,
//!    the scoreboard, the forwarding network, the dispatch queue, and the
//!    memory system.
//! 2. **Driver:** the per-tick traversal in reverse pipeline order, in the
//!    5-stage and 6-stage variants, plus the drain predicate used on
//!    exception exits.
//! 3. **Lifecycle:** construction from validated parameters, `reset`, and
//!    `run` until timeout or a drained exception.
//!
//! The core holds no guest state: the emulator, MMU, and branch predictor
//! are borrowed for the duration of each `run` call through [`CoreCtx`].

use std::fmt;

use crate::common::error::{ConfigError, RunExit, SimException};
use crate::config::SimParams;
use crate::isa::FuKind;
use crate::mem::{MemoryController, MemorySystem};
use crate::stats::SimStats;
use crate::traits::{BranchPredictor, IsaEmulator, Mmu};

/// Program-order dispatch queue.
pub mod dispatch;
/// One-cycle forwarding network.
pub mod forward;
/// In-flight instruction table.
pub mod imap;
/// Stage latches and functional-unit pipelines.
pub mod latch;
/// Register scoreboard.
pub mod scoreboard;
/// Per-stage logic.
pub(crate) mod stages;

use dispatch::DispatchQueue;
use forward::ForwardingNetwork;
use imap::{InstPool, NO_SLOT};
use latch::{FuPipeline, StageLatch};
use scoreboard::Scoreboard;

/// Collaborators borrowed for one `run` invocation.
pub struct CoreCtx<'a> {
    /// Functional ISA emulator (the per-instruction oracle).
    pub emu: &'a mut dyn IsaEmulator,
    /// Address translation and cache timing.
    pub mmu: &'a mut dyn Mmu,
    /// Branch predictor.
    pub bpu: &'a mut dyn BranchPredictor,
}

impl fmt::Debug for CoreCtx<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreCtx").finish_non_exhaustive()
    }
}

/// Tick traversal variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PipelineVariant {
    /// pcgen runs before fetch inside a tick; fetch consumes the address
    /// produced that same cycle.
    FiveStage,
    /// fetch runs before pcgen; the address is consumed one cycle later.
    SixStage,
}

/// Progress of a stage's external access.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub(crate) enum AccessState {
    /// No access issued.
    #[default]
    Idle,
    /// Cache hit; counting down the remaining busy cycles.
    HitWait(u64),
    /// Waiting for stage-queue transactions to complete.
    MissWait,
    /// Access complete; waiting for the downstream latch.
    Done,
}

/// Number of functional-unit pipelines (the FPU-ALU contributes three
/// lanes).
const NUM_FU_PIPES: usize = 9;

/// Cycle-accurate in-order pipeline core.
pub struct InOrderCore {
    pub(crate) params: SimParams,
    variant: PipelineVariant,
    pub(crate) clock: u64,

    // Stage latches, upstream to downstream.
    pub(crate) pcgen: StageLatch,
    pub(crate) fetch: StageLatch,
    pub(crate) decode: StageLatch,
    pub(crate) memory: StageLatch,
    pub(crate) commit: StageLatch,

    /// Functional units in the fixed visit order: ALU, MUL, MUL32, DIV,
    /// DIV32, FPU-ALU lanes 1..3, FPU-FMA.
    pub(crate) fus: Vec<FuPipeline>,
    pub(crate) fwd: ForwardingNetwork,
    pub(crate) imap: InstPool,
    pub(crate) scoreboard: Scoreboard,
    pub(crate) dispatch: DispatchQueue,
    pub(crate) mem: MemorySystem,

    /// Next address pcgen will emit.
    pub(crate) fetch_pc: u64,
    /// Address held by the fetch latch.
    pub(crate) fetch_stage_pc: u64,
    pub(crate) fetch_state: AccessState,
    pub(crate) mem_state: AccessState,

    pub(crate) pending_exception: Option<SimException>,
    /// Sequence number the commit stage expects next.
    pub(crate) retire_seq: u64,
    pub(crate) budget_enabled: bool,
    pub(crate) budget_left: u64,
    /// False after `reset` until the first `run` re-reads the emulator PC.
    start_synced: bool,

    /// Accumulated statistics.
    pub stats: SimStats,
}

impl fmt::Debug for InOrderCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InOrderCore")
            .field("clock", &self.clock)
            .field("variant", &self.variant)
            .field("in_flight", &self.imap.allocated())
            .field("pending_exception", &self.pending_exception)
            .finish_non_exhaustive()
    }
}

impl InOrderCore {
    /// Builds a core with the memory controller selected by the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the parameters fail validation.
    pub fn new(params: SimParams) -> Result<Self, ConfigError> {
        let mem = MemorySystem::from_params(&params.memory);
        Self::with_memory(params, mem)
    }

    /// Builds a core around an externally constructed DRAM timing model.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the parameters fail validation.
    pub fn with_controller(
        params: SimParams,
        ctrl: Box<dyn MemoryController>,
    ) -> Result<Self, ConfigError> {
        Self::with_memory(params, MemorySystem::new(ctrl))
    }

    fn with_memory(params: SimParams, mem: MemorySystem) -> Result<Self, ConfigError> {
        params.validate()?;
        let p = &params.pipeline;
        let variant = if p.num_cpu_stages == 6 {
            PipelineVariant::SixStage
        } else {
            PipelineVariant::FiveStage
        };
        let fus = vec![
            FuPipeline::new(FuKind::Alu, p.num_alu_stages),
            FuPipeline::new(FuKind::Mul, p.num_mul_stages),
            FuPipeline::new(FuKind::Mul32, p.num_mul32_stages),
            FuPipeline::new(FuKind::Div, p.num_div_stages),
            FuPipeline::new(FuKind::Div32, p.num_div32_stages),
            FuPipeline::new(FuKind::FpuAlu, p.num_fpu_alu_stages),
            FuPipeline::new(FuKind::FpuAlu, p.num_fpu_alu2_stages),
            FuPipeline::new(FuKind::FpuAlu, p.num_fpu_alu3_stages),
            FuPipeline::new(FuKind::FpuFma, p.num_fpu_fma_stages),
        ];
        debug_assert_eq!(fus.len(), NUM_FU_PIPES);

        let imap = InstPool::new(p.num_imap_entries);
        let dispatch = DispatchQueue::new(p.dispatch_queue_size);
        let reset_vector = params.frontend.reset_vector;

        let mut core = Self {
            params,
            variant,
            clock: 0,
            pcgen: StageLatch::default(),
            fetch: StageLatch::default(),
            decode: StageLatch::default(),
            memory: StageLatch::default(),
            commit: StageLatch::default(),
            fus,
            fwd: ForwardingNetwork::new(),
            imap,
            scoreboard: Scoreboard::new(),
            dispatch,
            mem,
            fetch_pc: reset_vector,
            fetch_stage_pc: reset_vector,
            fetch_state: AccessState::Idle,
            mem_state: AccessState::Idle,
            pending_exception: None,
            retire_seq: 0,
            budget_enabled: false,
            budget_left: 0,
            start_synced: false,
            stats: SimStats::default(),
        };
        core.reset();
        Ok(core)
    }

    /// Flushes every latch, unit, queue, and hazard structure, and seeds
    /// pcgen so fetching starts on the next `run`. Statistics and the clock
    /// accumulate across resets.
    pub fn reset(&mut self) {
        self.pcgen.flush();
        self.fetch.flush();
        self.decode.flush();
        self.memory.flush();
        self.commit.flush();
        // To start fetching.
        self.pcgen.has_data = true;

        for fu in &mut self.fus {
            fu.flush();
        }
        self.scoreboard.reset();
        self.dispatch.reset();
        self.fwd.clear_all();
        self.imap.release_all();
        self.mem.flush_queues();

        self.fetch_pc = self.params.frontend.reset_vector;
        self.fetch_stage_pc = self.params.frontend.reset_vector;
        self.fetch_state = AccessState::Idle;
        self.mem_state = AccessState::Idle;
        self.pending_exception = None;
        self.retire_seq = 0;
        self.start_synced = false;
    }

    /// Runs ticks until the commit budget expires or a simulated exception
    /// has drained the pipeline.
    pub fn run(&mut self, ctx: &mut CoreCtx<'_>) -> RunExit {
        if !self.start_synced {
            // First tick after reset: fetch from wherever the emulator
            // actually is (equals the reset vector on a cold start).
            self.fetch_pc = ctx.emu.pc();
            self.start_synced = true;
        }
        self.budget_enabled = self.params.sim.commit_budget > 0;
        self.budget_left = self.params.sim.commit_budget;

        loop {
            // Advance the DRAM clock.
            self.mem.tick();

            let timeout = match self.variant {
                PipelineVariant::FiveStage => self.cycle_five(ctx),
                PipelineVariant::SixStage => self.cycle_six(ctx),
            };
            if timeout {
                return RunExit::Timeout;
            }

            // An exception exits only once the pipeline is fully drained.
            if let Some(exc) = self.pending_exception
                && self.is_drained()
            {
                debug_assert!(
                    self.dispatch.is_empty(),
                    "drained pipeline left entries in the dispatch queue"
                );
                return RunExit::Exception(exc);
            }

            self.clock += 1;
            self.stats.per_priv[ctx.emu.privilege().as_index()].cycles += 1;
        }
    }

    /// One tick of the 6-stage variant: fetch consumes the address pcgen
    /// produced on the previous cycle.
    fn cycle_six(&mut self, ctx: &mut CoreCtx<'_>) -> bool {
        if stages::commit::run(self, ctx) {
            return true;
        }
        stages::memory::run(self, ctx);
        stages::execute::run_all(self, ctx);
        stages::decode::run(self, ctx);
        // Decode has had its one snoop; forwarded values die here, keeping
        // every bus valid for exactly one cycle.
        self.fwd.clear_all();
        stages::fetch::run(self, ctx);
        stages::pcgen::run(self);
        false
    }

    /// One tick of the 5-stage variant: pcgen runs before fetch, so fetch
    /// consumes the address produced this same cycle.
    fn cycle_five(&mut self, ctx: &mut CoreCtx<'_>) -> bool {
        if stages::commit::run(self, ctx) {
            return true;
        }
        stages::memory::run(self, ctx);
        stages::execute::run_all(self, ctx);
        stages::decode::run(self, ctx);
        self.fwd.clear_all();
        stages::pcgen::run(self);
        stages::fetch::run(self, ctx);
        false
    }

    /// True when every stage latch and every functional-unit slot is empty.
    pub fn is_drained(&self) -> bool {
        let latches_empty = !self.pcgen.has_data
            && !self.fetch.has_data
            && !self.decode.has_data
            && !self.memory.has_data
            && !self.commit.has_data;
        latches_empty && self.fus.iter().all(FuPipeline::is_empty)
    }

    /// Picks the lowest-numbered pipeline of the right kind with a vacant
    /// entry slot.
    pub(crate) fn pick_fu(&self, kind: FuKind) -> Option<usize> {
        let range = match kind {
            FuKind::Alu => 0..1,
            FuKind::Mul => 1..2,
            FuKind::Mul32 => 2..3,
            FuKind::Div => 3..4,
            FuKind::Div32 => 4..5,
            FuKind::FpuAlu => 5..8,
            FuKind::FpuFma => 8..9,
        };
        range.into_iter().find(|&i| self.fus[i].can_accept())
    }

    /// Squashes everything upstream of commit after a mispredict: all stage
    /// latches, all units, the dispatch queue, the hazard state, and every
    /// outstanding stage-queue transaction.
    pub(crate) fn flush_wrong_path(&mut self) {
        self.fetch.flush();
        self.decode.flush();
        self.memory.flush();
        self.commit.flush();
        for fu in &mut self.fus {
            fu.flush();
        }
        self.dispatch.reset();
        self.retire_seq = 0;
        // No in-flight producer survives; every value is architectural.
        self.scoreboard.reset();
        self.imap.release_all();
        self.mem.flush_queues();
        self.fwd.clear_all();
        self.fetch_state = AccessState::Idle;
        self.mem_state = AccessState::Idle;
    }

    /// Stops the frontend when an exception is recorded: no new instruction
    /// may enter the pipeline while it drains.
    pub(crate) fn flush_frontend(&mut self) {
        self.pcgen.flush();
        if self.fetch.has_data && self.fetch.imap != NO_SLOT {
            self.imap.free(self.fetch.imap);
        }
        self.fetch.flush();
        self.fetch_state = AccessState::Idle;
        self.mem.frontend.clear();
    }

    /// Restarts pcgen after a redirect.
    pub(crate) fn seed_pcgen(&mut self) {
        self.pcgen.flush();
        self.pcgen.has_data = true;
    }

    /// Cycles elapsed since construction.
    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Number of instructions currently holding an IMAP slot.
    pub fn in_flight(&self) -> usize {
        self.imap.allocated()
    }

    /// The address the frontend will fetch next.
    pub fn next_fetch_pc(&self) -> u64 {
        self.fetch_pc
    }

    /// The configuration this core was built with.
    pub fn params(&self) -> &SimParams {
        &self.params
    }

    /// Prints core and memory-controller statistics to stdout.
    pub fn print_stats(&self) {
        self.stats.print();
        self.mem.print_stats();
    }
}
