//! A branch predictor steered by program-injected hints.
//!
//! The guest program describes individual branches with 32-bit hint words
//! (see [crate::hint]). Hinted branches are predicted from the hint alone:
//! either a hard bias, or a boolean formula evaluated over the thread's
//! recent branch history. Branches without a hint fall through to a
//! conventional fallback predictor, which keeps sole ownership of its own
//! state; hints are externally supplied and never trained.

use std::collections::BTreeMap;

use crate::branch::*;
use crate::buffer::HintBuffer;
use crate::formula::{BooleanFormula, FORMULA_INPUT_BITS};
use crate::hint::Hint;
use crate::history::{GlobalHistoryRegister, GLOBAL_HISTORY_BITS};
use crate::predictor::BranchPredictor;

/// The hint-driven predictor.
///
/// The fallback predictor is borrowed, not owned: it must outlive the
/// facade, and the facade only mutates it through the forwarded
/// [BranchPredictor] calls.
pub struct WhisperPredictor<'f, F: BranchPredictor> {
    /// Storage for injected hints, LRU at the front, MRU at the back
    buffer: HintBuffer,

    /// Per-thread global history registers, materialized on first use
    ghr: BTreeMap<ThreadId, GlobalHistoryRegister>,

    /// The conventional predictor consulted when no hint applies
    fallback: &'f mut F,
}

impl<'f, F: BranchPredictor> WhisperPredictor<'f, F> {
    pub fn new(hint_buffer_size: usize, fallback: &'f mut F) -> Self {
        Self {
            buffer: HintBuffer::new(hint_buffer_size),
            ghr: BTreeMap::new(),
            fallback,
        }
    }

    /// Decode a retired hint instruction and record it in the hint buffer.
    ///
    /// `pc` is the program counter of the hint instruction itself; the
    /// decoded `pc_offset` redirects the entry to the branch it describes.
    pub fn insert(&mut self, pc: usize, hint: u32) {
        let decoded = Hint::from_word(hint);
        let branch_pc = pc + decoded.pc_offset as usize;
        self.buffer.insert(branch_pc, hint);
        log::debug!(
            "inserted entry {{pc: {:#010x}, hint: {:#010x} {}}}",
            branch_pc,
            hint,
            decoded
        );
    }

    fn global_history(&mut self, tid: ThreadId) -> &mut GlobalHistoryRegister {
        self.ghr
            .entry(tid)
            .or_insert_with(|| GlobalHistoryRegister::new(GLOBAL_HISTORY_BITS))
    }
}

impl<'f, F: BranchPredictor> BranchPredictor for WhisperPredictor<'f, F> {
    type History = F::History;

    fn lookup(
        &mut self,
        tid: ThreadId,
        pc: usize,
        hist: &mut Option<F::History>,
    ) -> Outcome {
        if let Some(entry) = self.buffer.touch(pc) {
            let hint = Hint::from_word(entry.hint);

            if let Some(outcome) = hint.bias_override() {
                log::debug!("pc: {:#010x} -> bias: {:02b}", pc, hint.bias);
                return outcome;
            }

            let length = hint.hist_length();
            if length == FORMULA_INPUT_BITS {
                let ghr = self.global_history(tid);
                let bits = ghr.read(0..=FORMULA_INPUT_BITS - 1);
                let outcome = BooleanFormula(hint.bool_formula).evaluate(bits);
                log::debug!(
                    "pc: {:#010x} -> formula: {:#06x} over {:b} = {:?}",
                    pc,
                    hint.bool_formula,
                    bits,
                    outcome
                );
                return outcome;
            }

            // Formulas over longer history selections are not evaluated;
            // those branches defer to the fallback.
            log::debug!(
                "pc: {:#010x} -> history length {} not implemented",
                pc,
                length
            );
        }

        self.fallback.lookup(tid, pc, hist)
    }

    fn update_histories(
        &mut self,
        tid: ThreadId,
        pc: usize,
        uncond: bool,
        outcome: Outcome,
        target: usize,
        hist: &mut Option<F::History>,
    ) {
        self.global_history(tid).shift_in(outcome);

        if !self.buffer.contains(pc) {
            self.fallback
                .update_histories(tid, pc, uncond, outcome, target, hist);
        }
    }

    fn update(
        &mut self,
        tid: ThreadId,
        pc: usize,
        outcome: Outcome,
        hist: &mut Option<F::History>,
        squashed: bool,
        kind: BranchKind,
        target: usize,
    ) {
        // Hinted branches train nothing: the hint is the prediction.
        if !self.buffer.contains(pc) {
            self.fallback
                .update(tid, pc, outcome, hist, squashed, kind, target);
        }
    }

    fn squash(&mut self, tid: ThreadId, hist: &mut Option<F::History>) {
        // The global history register is not rolled back; only state the
        // fallback attached to this branch is recovered.
        if hist.is_some() {
            self.fallback.squash(tid, hist);
        }
    }
}
