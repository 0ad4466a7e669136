//! Branch predictor interfaces and implementations.

pub mod gshare;
pub mod whisper;

pub use gshare::*;
pub use whisper::*;

use crate::branch::*;

/// Interface to a branch direction predictor, as driven by the CPU model.
///
/// The simulator serializes all calls for a given predictor instance; no
/// operation suspends or blocks. `History` is per-branch speculative state:
/// a predictor that needs to recover on squash attaches a value during
/// [BranchPredictor::lookup] and the simulator threads it back through the
/// later calls for that branch. `None` means no state is attached.
pub trait BranchPredictor {
    /// Per-branch speculative state owned by this predictor.
    type History;

    /// Predict the direction of the branch at `pc`. Queried at fetch to
    /// steer speculation.
    fn lookup(
        &mut self,
        tid: ThreadId,
        pc: usize,
        hist: &mut Option<Self::History>,
    ) -> Outcome;

    /// Record a branch direction once it is known well enough to update
    /// speculative history.
    fn update_histories(
        &mut self,
        tid: ThreadId,
        pc: usize,
        uncond: bool,
        outcome: Outcome,
        target: usize,
        hist: &mut Option<Self::History>,
    );

    /// Final resolution for a branch, at commit or after a squash.
    fn update(
        &mut self,
        tid: ThreadId,
        pc: usize,
        outcome: Outcome,
        hist: &mut Option<Self::History>,
        squashed: bool,
        kind: BranchKind,
        target: usize,
    );

    /// Discard the speculative state attached to an in-flight branch.
    fn squash(&mut self, tid: ThreadId, hist: &mut Option<Self::History>);
}
