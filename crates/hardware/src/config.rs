//! Configuration system for the timing core.
//!
//! This module defines all configuration structures used to parameterize the
//! simulator. It provides:
//! 1. **Defaults:** baseline hardware constants (pipeline depths, IMAP and
//!    dispatch queue sizes, memory timings).
//! 2. **Structures:** hierarchical config for the pipeline, the frontend, the
//!    memory system, and simulation control.
//! 3. **Validation:** structural checks applied before a core is built.
//!
//! Configuration is supplied as JSON via [`SimParams::from_json`] or use
//! `SimParams::default()`.

use serde::Deserialize;

use crate::common::error::ConfigError;

/// Default configuration constants for the timing core.
mod defaults {
    /// Pipeline variant: 5 stages (PC generation folded into the fetch
    /// cycle) or 6 stages (separate PC-generation stage).
    pub const CPU_STAGES: usize = 5;

    /// Integer ALU depth.
    pub const ALU_STAGES: usize = 1;

    /// 64-bit multiplier depth.
    pub const MUL_STAGES: usize = 3;

    /// 32-bit multiplier depth.
    pub const MUL32_STAGES: usize = 2;

    /// 64-bit divider depth.
    pub const DIV_STAGES: usize = 1;

    /// 32-bit divider depth.
    pub const DIV32_STAGES: usize = 1;

    /// Extra cycles a divide spends at the tail of its unit. Loaded into the
    /// exit timer when the operation enters the divider.
    pub const DIV_EXIT_CYCLES: u64 = 8;

    /// Depth of each of the three FPU-ALU lanes.
    pub const FPU_ALU_STAGES: usize = 2;

    /// FPU fused multiply-add depth.
    pub const FPU_FMA_STAGES: usize = 4;

    /// In-flight instruction table capacity.
    ///
    /// Must be at least twice the dispatch queue so fetch can keep
    /// allocating while a full dispatch queue drains.
    pub const IMAP_ENTRIES: usize = 128;

    /// Dispatch queue capacity between the functional units and the memory
    /// stage.
    pub const DISPATCH_QUEUE_ENTRIES: usize = 16;

    /// Reset vector: the first fetch address after reset.
    pub const RESET_VECTOR: u64 = 0x8000_0000;

    /// Instruction-side hit latency in cycles.
    pub const ICACHE_HIT_LATENCY: u64 = 1;

    /// Data-side hit latency in cycles.
    pub const DCACHE_HIT_LATENCY: u64 = 1;

    /// Fixed-latency memory model: cycles per transaction.
    pub const MEM_FIXED_LATENCY: u64 = 40;

    /// CAS latency in DRAM cycles for the row-buffer model.
    pub const T_CAS: u64 = 14;

    /// RAS latency in DRAM cycles for the row-buffer model.
    pub const T_RAS: u64 = 14;

    /// Precharge latency in DRAM cycles for the row-buffer model.
    pub const T_PRE: u64 = 14;

    /// DRAM burst size in bytes; requests are split on burst boundaries.
    pub const BURST_SIZE: u64 = 64;

    /// Maximum transactions the memory controller holds at once.
    pub const MEM_QUEUE_DEPTH: usize = 32;
}

/// Memory timing model selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum MemoryModelKind {
    /// Every transaction takes the same number of cycles.
    #[default]
    FixedLatency,
    /// Row-buffer-aware DRAM timing (CAS, RAS, precharge).
    DramRowBuffer,
}

/// Pipeline structure parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineParams {
    /// Pipeline variant selector: 5 or 6.
    pub num_cpu_stages: usize,
    /// Integer ALU depth.
    pub num_alu_stages: usize,
    /// 64-bit multiplier depth.
    pub num_mul_stages: usize,
    /// 32-bit multiplier depth.
    pub num_mul32_stages: usize,
    /// 64-bit divider depth.
    pub num_div_stages: usize,
    /// 32-bit divider depth.
    pub num_div32_stages: usize,
    /// First FPU-ALU lane depth.
    pub num_fpu_alu_stages: usize,
    /// Second FPU-ALU lane depth.
    pub num_fpu_alu2_stages: usize,
    /// Third FPU-ALU lane depth.
    pub num_fpu_alu3_stages: usize,
    /// FPU fused multiply-add depth.
    pub num_fpu_fma_stages: usize,
    /// Extra tail-exit cycles for both dividers; 0 makes the depth alone
    /// determine divide latency.
    pub div_exit_cycles: u64,
    /// In-flight instruction table capacity.
    pub num_imap_entries: usize,
    /// Dispatch queue capacity.
    pub dispatch_queue_size: usize,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            num_cpu_stages: defaults::CPU_STAGES,
            num_alu_stages: defaults::ALU_STAGES,
            num_mul_stages: defaults::MUL_STAGES,
            num_mul32_stages: defaults::MUL32_STAGES,
            num_div_stages: defaults::DIV_STAGES,
            num_div32_stages: defaults::DIV32_STAGES,
            num_fpu_alu_stages: defaults::FPU_ALU_STAGES,
            num_fpu_alu2_stages: defaults::FPU_ALU_STAGES,
            num_fpu_alu3_stages: defaults::FPU_ALU_STAGES,
            num_fpu_fma_stages: defaults::FPU_FMA_STAGES,
            div_exit_cycles: defaults::DIV_EXIT_CYCLES,
            num_imap_entries: defaults::IMAP_ENTRIES,
            dispatch_queue_size: defaults::DISPATCH_QUEUE_ENTRIES,
        }
    }
}

/// Frontend parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FrontendParams {
    /// First fetch address after reset.
    pub reset_vector: u64,
    /// Instruction-side hit latency in cycles.
    pub icache_hit_latency: u64,
    /// Whether fetch consults the branch predictor.
    pub enable_bpu: bool,
}

impl Default for FrontendParams {
    fn default() -> Self {
        Self {
            reset_vector: defaults::RESET_VECTOR,
            icache_hit_latency: defaults::ICACHE_HIT_LATENCY,
            enable_bpu: true,
        }
    }
}

/// Memory system parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemoryParams {
    /// Which DRAM timing model backs the adapter.
    pub model: MemoryModelKind,
    /// Data-side hit latency in cycles.
    pub dcache_hit_latency: u64,
    /// Cycles per transaction for the fixed-latency model.
    pub fixed_latency: u64,
    /// CAS latency for the row-buffer model.
    pub t_cas: u64,
    /// RAS latency for the row-buffer model.
    pub t_ras: u64,
    /// Precharge latency for the row-buffer model.
    pub t_pre: u64,
    /// Burst size in bytes.
    pub burst_size: u64,
    /// Controller transaction queue depth.
    pub queue_depth: usize,
}

impl Default for MemoryParams {
    fn default() -> Self {
        Self {
            model: MemoryModelKind::FixedLatency,
            dcache_hit_latency: defaults::DCACHE_HIT_LATENCY,
            fixed_latency: defaults::MEM_FIXED_LATENCY,
            t_cas: defaults::T_CAS,
            t_ras: defaults::T_RAS,
            t_pre: defaults::T_PRE,
            burst_size: defaults::BURST_SIZE,
            queue_depth: defaults::MEM_QUEUE_DEPTH,
        }
    }
}

/// Simulation control parameters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SimControl {
    /// Commits allowed per `run` invocation; 0 disables the budget.
    pub commit_budget: u64,
}

/// Root configuration for the timing core.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SimParams {
    /// Pipeline structure.
    pub pipeline: PipelineParams,
    /// Frontend behavior.
    pub frontend: FrontendParams,
    /// Memory system timing.
    pub memory: MemoryParams,
    /// Simulation control.
    pub sim: SimControl,
}

impl SimParams {
    /// Deserializes and validates a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the JSON is malformed or the parameters
    /// fail structural validation.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let params: Self = serde_json::from_str(text)?;
        params.validate()?;
        Ok(params)
    }

    /// Checks structural constraints the core relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.pipeline;
        if p.num_cpu_stages != 5 && p.num_cpu_stages != 6 {
            return Err(ConfigError::BadStageCount(p.num_cpu_stages));
        }
        for (depth, unit) in [
            (p.num_alu_stages, "alu"),
            (p.num_mul_stages, "mul"),
            (p.num_mul32_stages, "mul32"),
            (p.num_div_stages, "div"),
            (p.num_div32_stages, "div32"),
            (p.num_fpu_alu_stages, "fpu_alu"),
            (p.num_fpu_alu2_stages, "fpu_alu2"),
            (p.num_fpu_alu3_stages, "fpu_alu3"),
            (p.num_fpu_fma_stages, "fpu_fma"),
        ] {
            if depth == 0 {
                return Err(ConfigError::EmptyFuPipeline { unit });
            }
        }
        if p.dispatch_queue_size == 0 {
            return Err(ConfigError::EmptyDispatchQueue);
        }
        if p.num_imap_entries < 2 * p.dispatch_queue_size {
            return Err(ConfigError::ImapTooSmall {
                imap: p.num_imap_entries,
                dispatch: p.dispatch_queue_size,
            });
        }
        Ok(())
    }
}
