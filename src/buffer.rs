//! Bounded LRU storage for injected hints.

use std::collections::VecDeque;

/// An entry in the [HintBuffer].
///
/// Entries are keyed by the program counter of the branch the hint
/// describes, not the hint instruction that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HintEntry {
    /// Program counter of the described branch
    pub pc: usize,

    /// The raw hint word
    pub hint: u32,
}

/// A bounded buffer of hints, ordered from LRU (front) to MRU (back).
///
/// Lookup is a linear scan; the buffer is small by construction. Inserting
/// never dedupes, so two entries for the same branch may coexist until
/// eviction catches up with the older one.
pub struct HintBuffer {
    /// Maximum number of entries
    size: usize,

    /// Entry storage
    data: VecDeque<HintEntry>,
}

impl HintBuffer {
    pub fn new(size: usize) -> Self {
        assert!(size > 0);
        Self {
            size,
            data: VecDeque::with_capacity(size),
        }
    }

    /// Return the number of entries currently held.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Return the maximum number of entries.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Insert an entry at the MRU end, evicting from the LRU end while the
    /// buffer is full.
    pub fn insert(&mut self, pc: usize, hint: u32) {
        while self.data.len() >= self.size {
            self.data.pop_front();
        }
        self.data.push_back(HintEntry { pc, hint });
    }

    /// Scan from the LRU end for an entry matching the given PC.
    pub fn find(&self, pc: usize) -> Option<usize> {
        self.data.iter().position(|entry| entry.pc == pc)
    }

    /// Returns 'true' if any entry matches the given PC.
    pub fn contains(&self, pc: usize) -> bool {
        self.find(pc).is_some()
    }

    /// Find the entry for the given PC and mark it as most-recently-used.
    pub fn touch(&mut self, pc: usize) -> Option<HintEntry> {
        let idx = self.find(pc)?;
        let entry = self.data.remove(idx)?;
        self.data.push_back(entry);
        Some(entry)
    }

    /// Iterate over entries from LRU to MRU.
    pub fn iter(&self) -> impl Iterator<Item = &HintEntry> {
        self.data.iter()
    }
}
