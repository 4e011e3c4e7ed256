//! wear tracking and multi level cell transition counting

use hashbrown::HashMap;

use super::request::{MemAddr, WriteData};

/// per bit transition counts of one write, indexed old bit -> new bit
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransitionCounts {
    pub zero_to_zero: u64,
    pub zero_to_one: u64,
    pub one_to_zero: u64,
    pub one_to_one: u64,
}

impl TransitionCounts {
    /// bits that actually flip and therefore cost a cell write
    pub fn flips(&self) -> u64 {
        self.zero_to_one + self.one_to_zero
    }
}

/// classify every cell of a write by its 0/1 transition.
///
/// `old` and `new` are compared word by word, trailing words of the longer
/// slice are ignored.
pub fn count_transitions(data: &WriteData) -> TransitionCounts {
    let mut counts = TransitionCounts::default();
    for (old, new) in data.old.iter().zip(data.new.iter()) {
        for bit in 0..32 {
            let o = (old >> bit) & 1;
            let n = (new >> bit) & 1;
            match (o, n) {
                (0, 0) => counts.zero_to_zero += 1,
                (0, 1) => counts.zero_to_one += 1,
                (1, 0) => counts.one_to_zero += 1,
                _ => counts.one_to_one += 1,
            }
        }
    }
    counts
}

/// the endurance model consulted on every cell write
pub trait EnduranceModel {
    /// account one write, returns the wear of the most worn cell touched
    fn update(&mut self, addr: &MemAddr, data: &WriteData) -> u64;
    fn worst_case(&self) -> u64;
}

/// counts whole row writes, the simplest wear proxy
#[derive(Debug, Default)]
pub struct RowWear {
    writes: HashMap<(usize, u64), u64>,
    worst: u64,
}

impl EnduranceModel for RowWear {
    fn update(&mut self, addr: &MemAddr, _data: &WriteData) -> u64 {
        let entry = self.writes.entry((addr.subarray, addr.row)).or_insert(0);
        *entry += 1;
        self.worst = self.worst.max(*entry);
        *entry
    }

    fn worst_case(&self) -> u64 {
        self.worst
    }
}
