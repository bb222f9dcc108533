//! Control flow: branch resolution at commit, wrong-path squashing, and
//! predictor training.

use pretty_assertions::assert_eq;
use rvpipe_core::common::error::{ExceptionCause, RunExit};
use rvpipe_core::common::mode::PrivilegeLevel;

use crate::common::mocks::MockPredictor;
use crate::common::{BASE, TestBench, op, quick_params};

/// Predicted-taken, actually not-taken: commit flushes the wrong path,
/// redirects fetch to the fall-through, and the wrong-path instruction
/// never touches architectural state.
#[test]
fn mispredict_flushes_and_redirects() {
    let params = quick_params();
    let mut bench = TestBench::with_program(
        &params,
        &[
            op::beq(1, 2, 8),    // BASE: not taken (x1 != x2)
            op::ecall(),         // BASE+4: actual path
            op::addi(6, 0, 66),  // BASE+8: predicted path, must never retire
        ],
    );
    bench.emu.set_int_reg(1, 1);
    bench.emu.set_int_reg(2, 2);
    let _ = bench.bpu.predictions.insert(BASE, BASE + 8);

    let exit = bench.run();

    let RunExit::Exception(exc) = exit else {
        panic!("expected an exception exit, got {exit:?}");
    };
    assert_eq!(
        exc.cause,
        ExceptionCause::EnvironmentCall(PrivilegeLevel::Machine)
    );
    assert_eq!(exc.epc, BASE + 4);

    // Only the branch retired; the wrong-path write never happened.
    assert_eq!(bench.emu.retired, vec![BASE]);
    assert_eq!(bench.emu.int_reg(6), 0);
    assert_eq!(bench.core.stats.branches_resolved, 1);
    assert_eq!(bench.core.stats.branch_mispredictions, 1);
    assert!(bench.core.is_drained());
    assert_eq!(bench.core.in_flight(), 0);

    // The predictor was trained with the actual resolution.
    assert_eq!(bench.bpu.updates, vec![(BASE, false, BASE + 4)]);
}

/// A correctly predicted taken branch costs no flush.
#[test]
fn correct_prediction_avoids_the_flush() {
    let params = quick_params();
    let mut bench = TestBench::with_program(
        &params,
        &[
            op::beq(1, 1, 8),    // BASE: taken, predicted taken
            op::addi(6, 0, 66),  // BASE+4: skipped
            op::ecall(),         // BASE+8: target
        ],
    );
    let _ = bench.bpu.predictions.insert(BASE, BASE + 8);

    let exit = bench.run();
    assert!(matches!(exit, RunExit::Exception(_)));
    assert_eq!(bench.emu.retired, vec![BASE]);
    assert_eq!(bench.emu.int_reg(6), 0);
    assert_eq!(bench.core.stats.branches_resolved, 1);
    assert_eq!(bench.core.stats.branch_mispredictions, 0);
}

/// An unpredicted taken jump resolves at commit like a mispredict and lands
/// on the target with the link register written.
#[test]
fn taken_jump_without_prediction_redirects_at_commit() {
    let params = quick_params();
    let mut bench = TestBench::with_program(
        &params,
        &[
            op::jal(1, 12),      // BASE: jump to BASE+12, link in x1
            op::addi(6, 0, 66),  // BASE+4: skipped
            op::nop(),           // BASE+8
            op::ecall(),         // BASE+12: target
        ],
    );

    let exit = bench.run();
    assert!(matches!(exit, RunExit::Exception(_)));
    assert_eq!(bench.emu.int_reg(1), BASE + 4);
    assert_eq!(bench.emu.int_reg(6), 0);
    assert_eq!(bench.emu.retired, vec![BASE]);
    assert_eq!(bench.core.stats.branch_mispredictions, 1);
}

/// Expectation-style check that commit drives the predictor exactly once
/// with the resolved branch.
#[test]
fn commit_trains_the_predictor_once() {
    let params = quick_params();
    let mut bench = TestBench::with_program(
        &params,
        &[op::beq(1, 2, 8), op::ecall(), op::addi(6, 0, 66)],
    );
    bench.emu.set_int_reg(1, 1);
    bench.emu.set_int_reg(2, 2);

    let mut mock = MockPredictor::new();
    let _ = mock
        .expect_predict()
        .returning(|pc| if pc == BASE { Some(BASE + 8) } else { None });
    let _ = mock
        .expect_update()
        .withf(|&pc, &taken, &target| pc == BASE && !taken && target == BASE + 4)
        .times(1)
        .return_const(());

    let exit = bench.run_with_bpu(&mut mock);
    assert!(matches!(exit, RunExit::Exception(_)));
    mock.checkpoint();
}

/// Disabling the predictor makes every taken branch a commit-time redirect
/// and never consults the collaborator.
#[test]
fn bpu_disable_skips_prediction() {
    let mut params = quick_params();
    params.frontend.enable_bpu = false;
    let mut bench = TestBench::with_program(
        &params,
        &[op::beq(1, 1, 8), op::nop(), op::ecall()],
    );
    let _ = bench.bpu.predictions.insert(BASE, BASE + 8);

    let exit = bench.run();
    assert!(matches!(exit, RunExit::Exception(_)));
    // Taken branch with prediction disabled: flushed at commit.
    assert_eq!(bench.core.stats.branch_mispredictions, 1);
    // The scripted predictor was never consulted or trained.
    assert!(bench.bpu.updates.is_empty());
}
