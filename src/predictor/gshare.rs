//! A global-history indexed fallback predictor.
//!
//! Counters are selected by hashing the program counter with the thread's
//! speculative branch history. Each lookup attaches a snapshot of that
//! history to the branch so it can be restored if the branch is squashed.

use std::collections::BTreeMap;

use crate::branch::*;
use crate::predictor::BranchPredictor;

/// An n-bit saturating counter used to follow the behavior of a branch.
#[derive(Clone, Copy, Debug)]
pub struct SaturatingCounter {
    state: Outcome,
    strength: u8,
    max_strength: u8,
}

impl SaturatingCounter {
    pub fn new(max_strength: u8, default: Outcome) -> Self {
        Self {
            state: default,
            strength: 0,
            max_strength,
        }
    }

    /// Return the current predicted direction.
    pub fn predict(&self) -> Outcome {
        self.state
    }

    /// Update the state of the counter.
    pub fn update(&mut self, outcome: Outcome) {
        if outcome == self.state {
            self.strength = (self.strength + 1).min(self.max_strength);
        } else if self.strength > 0 {
            self.strength -= 1;
        } else {
            self.state = !self.state;
        }
    }
}

/// Configuration for a [GsharePredictor].
#[derive(Clone, Copy, Debug)]
pub struct GshareConfig {
    /// Number of entries in the counter table
    pub size: usize,

    /// Number of history bits mixed into the index
    pub history_bits: usize,

    /// Maximum strength of each counter
    pub max_strength: u8,
}

impl GshareConfig {
    /// Use this configuration to create a new [GsharePredictor].
    pub fn build(self) -> GsharePredictor {
        assert!(self.size.is_power_of_two());
        assert!(self.history_bits <= u64::BITS as usize);
        GsharePredictor {
            data: vec![SaturatingCounter::new(self.max_strength, Outcome::N); self.size],
            ghr: BTreeMap::new(),
            cfg: self,
        }
    }
}

/// Speculative state attached to each in-flight branch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GshareHistory {
    /// Global history value at prediction time
    ghr: u64,
}

pub struct GsharePredictor {
    cfg: GshareConfig,

    /// Table of counters
    data: Vec<SaturatingCounter>,

    /// Per-thread speculative global history
    ghr: BTreeMap<ThreadId, u64>,
}

impl GsharePredictor {
    fn speculative_ghr(&self, tid: ThreadId) -> u64 {
        self.ghr.get(&tid).copied().unwrap_or(0)
    }

    fn history_mask(&self) -> u64 {
        if self.cfg.history_bits == u64::BITS as usize {
            u64::MAX
        } else {
            (1u64 << self.cfg.history_bits) - 1
        }
    }

    fn index(&self, pc: usize, ghr: u64) -> usize {
        let pc_bits = (pc >> 2) as u64;
        ((pc_bits ^ (ghr & self.history_mask())) as usize) & (self.cfg.size - 1)
    }
}

impl BranchPredictor for GsharePredictor {
    type History = GshareHistory;

    fn lookup(
        &mut self,
        tid: ThreadId,
        pc: usize,
        hist: &mut Option<GshareHistory>,
    ) -> Outcome {
        let ghr = self.speculative_ghr(tid);
        *hist = Some(GshareHistory { ghr });
        self.data[self.index(pc, ghr)].predict()
    }

    fn update_histories(
        &mut self,
        tid: ThreadId,
        _pc: usize,
        _uncond: bool,
        outcome: Outcome,
        _target: usize,
        _hist: &mut Option<GshareHistory>,
    ) {
        let taken: bool = outcome.into();
        let g = self.ghr.entry(tid).or_insert(0);
        *g = (*g << 1) | taken as u64;
    }

    fn update(
        &mut self,
        tid: ThreadId,
        pc: usize,
        outcome: Outcome,
        hist: &mut Option<GshareHistory>,
        squashed: bool,
        _kind: BranchKind,
        _target: usize,
    ) {
        if squashed {
            // Wrong-path resolution: re-steer the speculative history from
            // the snapshot and leave training for the commit-time call.
            if let Some(h) = hist {
                let taken: bool = outcome.into();
                self.ghr.insert(tid, (h.ghr << 1) | taken as u64);
            }
            return;
        }

        // Train the counter that produced the prediction.
        let ghr = match hist.take() {
            Some(h) => h.ghr,
            None => self.speculative_ghr(tid),
        };
        let idx = self.index(pc, ghr);
        self.data[idx].update(outcome);
    }

    fn squash(&mut self, tid: ThreadId, hist: &mut Option<GshareHistory>) {
        if let Some(h) = hist.take() {
            self.ghr.insert(tid, h.ghr);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn predictor() -> GsharePredictor {
        GshareConfig {
            size: 1 << 10,
            history_bits: 10,
            max_strength: 1,
        }
        .build()
    }

    #[test]
    fn counter_saturates_both_ways() {
        let mut ctr = SaturatingCounter::new(1, Outcome::N);
        assert_eq!(ctr.predict(), Outcome::N);

        ctr.update(Outcome::T);
        assert_eq!(ctr.predict(), Outcome::T);
        ctr.update(Outcome::T);
        ctr.update(Outcome::T);

        // Strength 1 absorbs a single opposing outcome.
        ctr.update(Outcome::N);
        assert_eq!(ctr.predict(), Outcome::T);
        ctr.update(Outcome::N);
        assert_eq!(ctr.predict(), Outcome::N);
    }

    #[test]
    fn learns_a_stable_branch() {
        let mut p = predictor();

        // Pin the history phase so every iteration trains the same entry.
        for _ in 0..2 {
            let mut hist = None;
            p.ghr.insert(0, 0);
            p.lookup(0, 0x1000, &mut hist);
            p.update_histories(0, 0x1000, false, Outcome::T, 0x2000, &mut None);
            p.update(
                0,
                0x1000,
                Outcome::T,
                &mut hist,
                false,
                BranchKind::DirectBranch,
                0x2000,
            );
        }

        let mut hist = None;
        p.ghr.insert(0, 0);
        assert_eq!(p.lookup(0, 0x1000, &mut hist), Outcome::T);
    }

    #[test]
    fn lookup_attaches_a_history_snapshot() {
        let mut p = predictor();
        p.ghr.insert(0, 0b1011);

        let mut hist = None;
        p.lookup(0, 0x1000, &mut hist);
        assert_eq!(hist, Some(GshareHistory { ghr: 0b1011 }));
    }

    #[test]
    fn squash_restores_the_snapshot() {
        let mut p = predictor();
        let mut hist = None;

        p.ghr.insert(0, 0b101);
        p.lookup(0, 0x1000, &mut hist);

        // Speculate down the wrong path for a few branches.
        p.update_histories(0, 0x1000, false, Outcome::T, 0, &mut None);
        p.update_histories(0, 0x1004, false, Outcome::T, 0, &mut None);
        assert_eq!(p.speculative_ghr(0), 0b10111);

        p.squash(0, &mut hist);
        assert_eq!(p.speculative_ghr(0), 0b101);
        assert!(hist.is_none());
    }

    #[test]
    fn squashed_resolution_resteers_history() {
        let mut p = predictor();
        let mut hist = None;

        p.ghr.insert(0, 0b11);
        p.lookup(0, 0x1000, &mut hist);
        p.update_histories(0, 0x1000, false, Outcome::T, 0, &mut None);

        // The branch resolves not-taken after a squash: history follows the
        // corrected outcome.
        p.update(
            0,
            0x1000,
            Outcome::N,
            &mut hist,
            true,
            BranchKind::DirectBranch,
            0,
        );
        assert_eq!(p.speculative_ghr(0), 0b110);
    }
}
