//! Helpers for collecting statistics.

use bitvec::prelude::*;
use itertools::*;
use std::collections::BTreeMap;

use crate::branch::Outcome;

/// Container for recording simple statistics while evaluating a predictor.
pub struct BranchStats {
    /// Per-branch statistics (indexed by program counter value).
    pub data: BTreeMap<usize, BranchData>,

    /// Number of correct predictions
    global_hits: usize,

    /// Number of times any branch instruction was executed
    global_brns: usize,
}

impl BranchStats {
    pub fn new() -> Self {
        Self {
            data: BTreeMap::new(),
            global_hits: 0,
            global_brns: 0,
        }
    }

    /// Record one executed branch.
    pub fn record(&mut self, pc: usize, prediction: Outcome, outcome: Outcome) {
        let hit = prediction == outcome;
        self.global_brns += 1;
        if hit {
            self.global_hits += 1;
        }

        let data = self.data.entry(pc).or_insert_with(BranchData::new);
        data.occ += 1;
        data.pat.push(outcome.into());
        if hit {
            data.hits += 1;
        }
    }

    /// Return the global hit rate.
    pub fn hit_rate(&self) -> f64 {
        self.global_hits as f64 / self.global_brns as f64
    }

    pub fn global_hits(&self) -> usize {
        self.global_hits
    }

    pub fn global_miss(&self) -> usize {
        self.global_brns - self.global_hits
    }

    pub fn global_brns(&self) -> usize {
        self.global_brns
    }

    /// Returns the number of unique observed branch instructions.
    pub fn num_unique_branches(&self) -> usize {
        self.data.len()
    }

    /// Return the 'n' most frequently executed branches.
    pub fn get_common_branches(&self, n: usize) -> Vec<(usize, &BranchData)> {
        self.data
            .iter()
            .sorted_by(|x, y| x.1.occ.cmp(&y.1.occ))
            .rev()
            .take(n)
            .map(|(pc, s)| (*pc, s))
            .collect()
    }

    /// Return up to 'n' frequently executed branches with a poor hit rate.
    pub fn get_low_rate_branches(&self, n: usize) -> Vec<(usize, &BranchData)> {
        self.data
            .iter()
            .filter(|(_, s)| s.occ > 100 && s.hit_rate() <= 0.55)
            .sorted_by(|x, y| x.1.occ.cmp(&y.1.occ))
            .rev()
            .take(n)
            .map(|(pc, s)| (*pc, s))
            .collect()
    }
}

/// Container for per-branch statistics.
pub struct BranchData {
    /// Number of times this branch was encountered.
    pub occ: usize,

    /// Number of correct predictions for this branch.
    pub hits: usize,

    /// Record of all observed outcomes for this branch.
    pub pat: BitVec,
}

impl BranchData {
    pub fn new() -> Self {
        Self {
            occ: 0,
            hits: 0,
            pat: BitVec::new(),
        }
    }

    /// Return the hit rate for this branch.
    pub fn hit_rate(&self) -> f64 {
        self.hits as f64 / self.occ as f64
    }

    pub fn times_taken(&self) -> usize {
        self.pat.count_ones()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn global_and_per_branch_counts() {
        let mut stats = BranchStats::new();
        stats.record(0x1000, Outcome::T, Outcome::T);
        stats.record(0x1000, Outcome::T, Outcome::N);
        stats.record(0x2000, Outcome::N, Outcome::N);

        assert_eq!(stats.global_brns(), 3);
        assert_eq!(stats.global_hits(), 2);
        assert_eq!(stats.global_miss(), 1);
        assert_eq!(stats.num_unique_branches(), 2);

        let data = stats.data.get(&0x1000).unwrap();
        assert_eq!(data.occ, 2);
        assert_eq!(data.hits, 1);
        assert_eq!(data.times_taken(), 1);
    }

    #[test]
    fn common_branches_are_ranked_by_occurrence() {
        let mut stats = BranchStats::new();
        for _ in 0..3 {
            stats.record(0x1000, Outcome::T, Outcome::T);
        }
        stats.record(0x2000, Outcome::T, Outcome::T);

        let common = stats.get_common_branches(2);
        assert_eq!(common[0].0, 0x1000);
        assert_eq!(common[1].0, 0x2000);
    }
}
