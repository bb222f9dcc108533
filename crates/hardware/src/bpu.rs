//! Static not-taken branch predictor.
//!
//! The simplest predictor: every branch is predicted fall-through. Useful as
//! the default collaborator when no real predictor is attached; every taken
//! branch costs a full pipeline flush at commit.

use crate::traits::BranchPredictor;

/// Always predicts fall-through and learns nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct StaticNotTaken;

impl BranchPredictor for StaticNotTaken {
    fn predict(&mut self, _pc: u64) -> Option<u64> {
        None
    }

    fn update(&mut self, _pc: u64, _taken: bool, _target: u64) {}
}
