//! Collaborator mocks: a direct-mapped MMU stand-in and scripted/mocked
//! branch predictors.

use std::collections::{HashMap, HashSet};

use rvpipe_core::mem::{MemorySystem, QueueSide};
use rvpipe_core::traits::{AccessKind, AccessResponse, BranchPredictor, MemAccess, Mmu};

/// Identity-translation MMU with configurable hit latencies and scripted
/// misses.
#[derive(Clone, Debug)]
pub struct DirectMmu {
    /// Hit latency for instruction fetches.
    pub fetch_latency: u64,
    /// Hit latency for data accesses.
    pub data_latency: u64,
    /// When true, every data access misses to memory.
    pub data_miss: bool,
    /// Specific data addresses that miss.
    pub miss_addrs: HashSet<u64>,
    /// Specific fetch addresses that miss.
    pub fetch_miss_addrs: HashSet<u64>,
}

impl Default for DirectMmu {
    fn default() -> Self {
        Self {
            fetch_latency: 1,
            data_latency: 1,
            data_miss: false,
            miss_addrs: HashSet::new(),
            fetch_miss_addrs: HashSet::new(),
        }
    }
}

impl Mmu for DirectMmu {
    fn access(&mut self, access: &MemAccess, mem: &mut MemorySystem) -> AccessResponse {
        let (side, misses, latency) = match access.kind {
            AccessKind::Fetch => (
                QueueSide::Frontend,
                self.fetch_miss_addrs.contains(&access.vaddr),
                self.fetch_latency,
            ),
            _ => (
                QueueSide::Backend,
                self.data_miss || self.miss_addrs.contains(&access.vaddr),
                self.data_latency,
            ),
        };
        if !misses {
            return AccessResponse::Hit { latency };
        }
        // A miss fetches the line once; later accesses hit.
        let _ = self.miss_addrs.remove(&access.vaddr);
        let _ = self.fetch_miss_addrs.remove(&access.vaddr);
        if mem.request(
            side,
            access.vaddr,
            u64::from(access.len),
            access.kind.is_write(),
        ) {
            AccessResponse::Miss
        } else {
            AccessResponse::Retry
        }
    }
}

/// Predictor scripted with a fixed pc -> target map; records every update.
#[derive(Clone, Debug, Default)]
pub struct ScriptedPredictor {
    /// Predicted-taken targets by branch pc.
    pub predictions: HashMap<u64, u64>,
    /// Updates received from commit: (pc, taken, target).
    pub updates: Vec<(u64, bool, u64)>,
}

impl BranchPredictor for ScriptedPredictor {
    fn predict(&mut self, pc: u64) -> Option<u64> {
        self.predictions.get(&pc).copied()
    }

    fn update(&mut self, pc: u64, taken: bool, target: u64) {
        self.updates.push((pc, taken, target));
    }
}

mockall::mock! {
    /// Mockall-backed predictor for expectation-style tests.
    pub Predictor {}

    impl BranchPredictor for Predictor {
        fn predict(&mut self, pc: u64) -> Option<u64>;
        fn update(&mut self, pc: u64, taken: bool, target: u64);
    }
}
