//! Steady-state throughput of the pipeline variants.
//!
//! Independent single-cycle instructions must stream at one commit per
//! cycle once the pipeline is full; the commit budget is used to stop the
//! core the moment one extra instruction reaches commit, which pins down
//! the exact cycle count.

use pretty_assertions::assert_eq;
use rstest::rstest;
use rvpipe_core::common::error::RunExit;

use crate::common::{BASE, TestBench, op, quick_params};

/// Three back-to-back independent ALU instructions fill and drain the
/// pipeline at IPC 1: the third retires at pipeline-depth + 2 cycles.
#[rstest]
#[case::five_stage(5, 7)]
#[case::six_stage(6, 8)]
fn back_to_back_alu_retires_at_ipc_one(#[case] stages: usize, #[case] expected_cycles: u64) {
    let mut params = quick_params();
    params.pipeline.num_cpu_stages = stages;
    params.sim.commit_budget = 3;

    let mut bench = TestBench::with_program(
        &params,
        &[op::addi(1, 0, 1), op::addi(2, 0, 2), op::addi(3, 0, 3)],
    );
    let exit = bench.run();

    assert_eq!(exit, RunExit::Timeout);
    assert_eq!(bench.core.clock(), expected_cycles);
    assert_eq!(bench.core.stats.commits(), 3);
    assert_eq!(bench.emu.int_reg(1), 1);
    assert_eq!(bench.emu.int_reg(2), 2);
    assert_eq!(bench.emu.int_reg(3), 3);
    assert_eq!(bench.emu.retired, vec![BASE, BASE + 4, BASE + 8]);
}

/// The same stream on both variants produces the same commit trace; only
/// the cycle counts differ.
#[test]
fn variants_agree_on_architectural_results() {
    let mut results = Vec::new();
    for stages in [5usize, 6] {
        let mut params = quick_params();
        params.pipeline.num_cpu_stages = stages;
        params.sim.commit_budget = 4;
        let mut bench = TestBench::with_program(
            &params,
            &[
                op::addi(1, 0, 7),
                op::add(2, 1, 1),
                op::addi(3, 2, -4),
                op::add(4, 3, 1),
            ],
        );
        let _ = bench.run();
        results.push((bench.emu.retired.clone(), bench.emu.int_reg(4)));
    }
    assert_eq!(results[0], results[1]);
    assert_eq!(results[0].1, 17);
}

/// A commit-budget timeout leaves the pipeline intact; a second `run`
/// continues where the first stopped.
#[test]
fn timeout_then_resume_completes_the_program() {
    let mut params = quick_params();
    params.sim.commit_budget = 2;
    let mut bench = TestBench::with_program(
        &params,
        &[
            op::addi(1, 0, 1),
            op::addi(2, 0, 2),
            op::addi(3, 0, 3),
            op::ecall(),
        ],
    );

    assert_eq!(bench.run(), RunExit::Timeout);
    assert_eq!(bench.core.stats.commits(), 2);

    let second = bench.run();
    assert!(matches!(second, RunExit::Exception(_)));
    assert_eq!(bench.core.stats.commits(), 3);
    assert_eq!(bench.emu.int_reg(3), 3);
    assert_eq!(bench.emu.retired, vec![BASE, BASE + 4, BASE + 8]);
}
