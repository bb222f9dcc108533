//! Exception drain, structural backpressure, and reset behavior.

use pretty_assertions::assert_eq;
use rvpipe_core::common::error::{ExceptionCause, RunExit};
use rvpipe_core::common::mode::PrivilegeLevel;

use crate::common::{BASE, TestBench, op, quick_params};

/// An environment call on a busy pipeline: commit raises the pending flag,
/// fetch stops, everything younger drains without architectural effect,
/// and `run` returns the cause once the machine is empty.
#[test]
fn ecall_drains_and_returns_the_cause() {
    let params = quick_params();
    let mut bench = TestBench::with_program(
        &params,
        &[
            op::addi(1, 0, 1),
            op::addi(2, 0, 2),
            op::addi(3, 0, 3),
            op::ecall(),
        ],
    );

    let exit = bench.run();
    let RunExit::Exception(exc) = exit else {
        panic!("expected an exception exit, got {exit:?}");
    };
    assert_eq!(
        exc.cause,
        ExceptionCause::EnvironmentCall(PrivilegeLevel::Machine)
    );
    assert_eq!(exc.cause.code(), 11);
    assert_eq!(exc.epc, BASE + 12);

    assert!(bench.core.is_drained());
    assert_eq!(bench.core.in_flight(), 0);
    assert_eq!(bench.core.stats.commits(), 3);
    assert_eq!(bench.core.stats.exceptions, 1);
    assert_eq!(bench.emu.retired, vec![BASE, BASE + 4, BASE + 8]);
    assert_eq!(bench.emu.int_reg(1), 1);
    assert_eq!(bench.emu.int_reg(2), 2);
    assert_eq!(bench.emu.int_reg(3), 3);
    // The faulting instruction did not advance the architectural pc.
    assert_eq!(bench.core.stats.per_priv[3].mix.system, 0);
}

/// Wrong-path loads behind an excepting instruction drain without issuing
/// DRAM traffic or touching guest memory.
#[test]
fn wrong_path_memory_ops_drain_without_traffic() {
    let params = quick_params();
    const DATA: u64 = 0x8000_4000;
    let mut bench = TestBench::with_program(
        &params,
        &[
            op::ecall(),
            op::sw(1, 2, 0), // wrong path: must not write memory
        ],
    );
    bench.emu.set_int_reg(1, 0xAA);
    bench.emu.set_int_reg(2, DATA);
    bench.mmu.data_miss = true;

    let exit = bench.run();
    assert!(matches!(exit, RunExit::Exception(_)));
    assert_eq!(bench.emu.read_mem_u32(DATA), 0);
    assert!(bench.core.is_drained());
    assert_eq!(bench.core.stats.stalls_mem, 0);
}

/// With a minimal IMAP, fetch stalls on allocation and resumes within a
/// cycle of commit freeing a slot; results are unaffected.
#[test]
fn imap_full_backpressures_fetch()  {
    let mut params = quick_params();
    params.pipeline.dispatch_queue_size = 1;
    params.pipeline.num_imap_entries = 2;
    let mut bench = TestBench::with_program(
        &params,
        &[
            op::addi(1, 0, 1),
            op::addi(2, 1, 1),
            op::addi(3, 2, 1),
            op::ecall(),
        ],
    );

    let exit = bench.run();
    assert!(matches!(exit, RunExit::Exception(_)));
    assert!(bench.core.stats.stalls_structural > 0);
    assert_eq!(bench.core.stats.commits(), 3);
    assert_eq!(bench.emu.int_reg(3), 3);
    assert_eq!(bench.core.in_flight(), 0);
}

/// Two identical benches produce identical commit traces and cycle counts.
#[test]
fn runs_are_deterministic() {
    let program = [
        op::addi(1, 0, 5),
        op::add(2, 1, 1),
        op::mul(3, 2, 1),
        op::ecall(),
    ];
    let params = quick_params();

    let mut first = TestBench::with_program(&params, &program);
    let mut second = TestBench::with_program(&params, &program);
    let exit_a = first.run();
    let exit_b = second.run();

    assert_eq!(exit_a, exit_b);
    assert_eq!(first.core.clock(), second.core.clock());
    assert_eq!(first.emu.retired, second.emu.retired);
    assert_eq!(first.emu.int_reg(3), second.emu.int_reg(3));
}

/// `reset` restores the post-construction state: rerunning the same
/// program from a fresh emulator yields the same commit trace.
#[test]
fn reset_allows_an_identical_rerun() {
    let program = [op::addi(1, 0, 9), op::add(2, 1, 1), op::ecall()];
    let params = quick_params();
    let mut bench = TestBench::with_program(&params, &program);

    let first_exit = bench.run();
    let first_trace = bench.emu.retired.clone();
    let first_commits = bench.core.stats.commits();

    bench.core.reset();
    bench.emu = crate::common::OracleEmulator::new(BASE);
    bench.emu.load_program(BASE, &program);

    let second_exit = bench.run();
    assert_eq!(first_exit, second_exit);
    assert_eq!(bench.emu.retired, first_trace);
    assert_eq!(bench.core.stats.commits(), first_commits * 2);
    assert_eq!(bench.emu.int_reg(2), 10);
    assert!(bench.core.is_drained());
}
