//! Bench harness: a core wired to the oracle emulator and mocks.

use rvpipe_core::config::SimParams;
use rvpipe_core::common::error::RunExit;
use rvpipe_core::core::{CoreCtx, InOrderCore};

use super::emulator::{OracleEmulator, TestInst};
use super::mocks::{DirectMmu, ScriptedPredictor};

/// Program base address used throughout the tests (the default reset
/// vector).
pub const BASE: u64 = 0x8000_0000;

/// Parameters for predictable timing: unit-depth functional units,
/// single-cycle hits, a 20-cycle fixed-latency DRAM, and no divide tail
/// cycles.
pub fn quick_params() -> SimParams {
    let mut params = SimParams::default();
    params.pipeline.num_alu_stages = 1;
    params.pipeline.num_mul_stages = 1;
    params.pipeline.num_mul32_stages = 1;
    params.pipeline.num_div_stages = 1;
    params.pipeline.num_div32_stages = 1;
    params.pipeline.num_fpu_alu_stages = 1;
    params.pipeline.num_fpu_alu2_stages = 1;
    params.pipeline.num_fpu_alu3_stages = 1;
    params.pipeline.num_fpu_fma_stages = 1;
    params.pipeline.div_exit_cycles = 0;
    params.memory.fixed_latency = 20;
    params
}

/// A core plus its collaborators, ready to run scripted programs.
pub struct TestBench {
    pub core: InOrderCore,
    pub emu: OracleEmulator,
    pub mmu: DirectMmu,
    pub bpu: ScriptedPredictor,
}

impl TestBench {
    pub fn new(params: &SimParams) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
        let start_pc = params.frontend.reset_vector;
        Self {
            core: InOrderCore::new(params.clone()).unwrap(),
            emu: OracleEmulator::new(start_pc),
            mmu: DirectMmu::default(),
            bpu: ScriptedPredictor::default(),
        }
    }

    /// Builds a bench with a program loaded at [`BASE`].
    pub fn with_program(params: &SimParams, insts: &[TestInst]) -> Self {
        let mut bench = Self::new(params);
        bench.emu.load_program(BASE, insts);
        bench
    }

    /// Runs the core until timeout or a drained exception.
    pub fn run(&mut self) -> RunExit {
        let mut ctx = CoreCtx {
            emu: &mut self.emu,
            mmu: &mut self.mmu,
            bpu: &mut self.bpu,
        };
        self.core.run(&mut ctx)
    }

    /// Runs with an arbitrary predictor instead of the scripted one.
    pub fn run_with_bpu(&mut self, bpu: &mut dyn rvpipe_core::traits::BranchPredictor) -> RunExit {
        let mut ctx = CoreCtx {
            emu: &mut self.emu,
            mmu: &mut self.mmu,
            bpu,
        };
        self.core.run(&mut ctx)
    }
}
