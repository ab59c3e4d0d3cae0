#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::board::HexPoint;

/// A solved state: outcome for the player to move, distance to the
/// connection, the best move found, and the work that went into it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DfsData {
    pub win: bool,
    pub nu_moves: u16,
    pub best_move: HexPoint,
    pub num_states: u64,
}

struct Entry {
    hash: u64,
    data: DfsData,
}

/// Direct-mapped transposition table keyed by the position hash.
/// Collisions replace, keeping the entry with more work as a tiebreak.
pub struct TransTable {
    entries: Vec<Option<Entry>>,
    mask: usize,
}

impl TransTable {
    /// Creates a table with `1 << bits` slots.
    pub fn new(bits: u32) -> TransTable {
        let size = 1usize << bits;
        let mut entries = Vec::with_capacity(size);
        entries.resize_with(size, || None);
        TransTable {
            entries,
            mask: size - 1,
        }
    }

    pub fn get(&self, hash: u64) -> Option<DfsData> {
        let entry = self.entries[hash as usize & self.mask].as_ref()?;
        if entry.hash == hash {
            Some(entry.data)
        } else {
            None
        }
    }

    pub fn put(&mut self, hash: u64, data: DfsData) {
        let slot = &mut self.entries[hash as usize & self.mask];
        match slot {
            Some(existing) if existing.hash != hash && existing.data.num_states > data.num_states => {}
            _ => *slot = Some(Entry { hash, data }),
        }
    }

    pub fn used_entries(&self) -> usize {
        self.entries.iter().flatten().count()
    }

    pub fn clear(&mut self) {
        for entry in self.entries.iter_mut() {
            *entry = None;
        }
    }
}
