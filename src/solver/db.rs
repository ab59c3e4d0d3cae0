//! Persistent store of solved positions, plus the wrapper that layers it
//! under the in-memory transposition table.
//!
//! The file is a sequence of packed little-endian records, append-only;
//! `compact` rewrites the latest record per key. Keys are canonicalized
//! under the 180-degree board rotation, the one symmetry valid on every
//! rectangle.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use board_game_traits::Color;
use log::warn;

use crate::board::{Bitset, HexPoint, StoneBoard};
use crate::solver::tt::{DfsData, TransTable};

/// Marker for "no best move known" (terminal and leaf entries).
pub const NO_MOVE: HexPoint = HexPoint::from_index(u8::MAX);

const RECORD_HEAD: usize = 8 + 1 + 2 + 1 + 8 + 1;

fn encode_record(hash: u64, data: &DfsData, proof: Option<Bitset>) -> Vec<u8> {
    let mut buf = Vec::with_capacity(RECORD_HEAD + 16);
    buf.extend_from_slice(&hash.to_le_bytes());
    buf.push(data.win as u8);
    buf.extend_from_slice(&data.nu_moves.to_le_bytes());
    buf.push(data.best_move.index());
    buf.extend_from_slice(&data.num_states.to_le_bytes());
    match proof {
        Some(proof) => {
            buf.push(1);
            buf.extend_from_slice(&proof.bits.to_le_bytes());
        }
        None => buf.push(0),
    }
    buf
}

/// On-disk database of solved positions. Assumes a single writer.
pub struct PositionDb {
    path: PathBuf,
    file: File,
    map: HashMap<u64, (DfsData, Option<Bitset>)>,
}

impl PositionDb {
    pub fn open(path: &Path) -> io::Result<PositionDb> {
        let mut map = HashMap::new();
        if path.exists() {
            let mut bytes = Vec::new();
            File::open(path)?.read_to_end(&mut bytes)?;
            let mut at = 0;
            while at + RECORD_HEAD <= bytes.len() {
                let head = &bytes[at..at + RECORD_HEAD];
                let hash = u64::from_le_bytes(head[0..8].try_into().unwrap());
                let data = DfsData {
                    win: head[8] != 0,
                    nu_moves: u16::from_le_bytes(head[9..11].try_into().unwrap()),
                    best_move: HexPoint::from_index(head[11]),
                    num_states: u64::from_le_bytes(head[12..20].try_into().unwrap()),
                };
                at += RECORD_HEAD;
                let proof = if head[20] != 0 {
                    if at + 16 > bytes.len() {
                        return Err(io::Error::new(
                            io::ErrorKind::InvalidData,
                            "truncated proof record",
                        ));
                    }
                    let bits = u128::from_le_bytes(bytes[at..at + 16].try_into().unwrap());
                    at += 16;
                    Some(Bitset::from_u128(bits))
                } else {
                    None
                };
                map.insert(hash, (data, proof));
            }
            if at != bytes.len() {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "truncated record header",
                ));
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(PositionDb {
            path: path.to_path_buf(),
            file,
            map,
        })
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn get(&self, hash: u64) -> Option<(DfsData, Option<Bitset>)> {
        self.map.get(&hash).copied()
    }

    pub fn put(
        &mut self,
        hash: u64,
        data: DfsData,
        proof: Option<Bitset>,
    ) -> io::Result<()> {
        self.file.write_all(&encode_record(hash, &data, proof))?;
        self.map.insert(hash, (data, proof));
        Ok(())
    }

    /// Rewrites the file with one record per key.
    pub fn compact(&mut self) -> io::Result<()> {
        let tmp_path = self.path.with_extension("tmp");
        {
            let mut tmp = File::create(&tmp_path)?;
            for (hash, (data, proof)) in &self.map {
                tmp.write_all(&encode_record(*hash, data, *proof))?;
            }
            tmp.sync_all()?;
        }
        std::fs::rename(&tmp_path, &self.path)?;
        self.file = OpenOptions::new().append(true).open(&self.path)?;
        Ok(())
    }
}

/// Transposition table plus optional database: probes the table first,
/// stores to both. Database I/O failures are logged once and the solver
/// continues memory-only.
pub struct SolverDb {
    tt: TransTable,
    db: Option<PositionDb>,
    db_failed: bool,
}

impl SolverDb {
    pub fn new(tt_bits: u32, db_path: Option<&Path>) -> SolverDb {
        let db = db_path.and_then(|path| match PositionDb::open(path) {
            Ok(db) => Some(db),
            Err(err) => {
                warn!("solver db {} unavailable: {}", path.display(), err);
                None
            }
        });
        SolverDb {
            tt: TransTable::new(tt_bits),
            db,
            db_failed: false,
        }
    }

    pub fn tt(&self) -> &TransTable {
        &self.tt
    }

    pub fn has_db(&self) -> bool {
        self.db.is_some()
    }

    pub fn compact(&mut self) -> io::Result<()> {
        match self.db.as_mut() {
            Some(db) => db.compact(),
            None => Ok(()),
        }
    }

    fn canonical(stones: &StoneBoard, to_play: Color) -> (u64, bool) {
        let hash = stones.hash_for(to_play);
        let rotated = stones.rotated_hash_for(to_play);
        if rotated < hash {
            (rotated, true)
        } else {
            (hash, false)
        }
    }

    fn rotate_data(stones: &StoneBoard, data: &mut DfsData, proof: &mut Option<Bitset>) {
        let cb = stones.const_board();
        if data.best_move != NO_MOVE && data.best_move.is_interior() {
            data.best_move = cb.rotate180(data.best_move);
        }
        if let Some(p) = proof {
            *p = cb.rotate180_set(*p & cb.cells());
        }
    }

    pub fn get(
        &self,
        stones: &StoneBoard,
        to_play: Color,
    ) -> Option<(DfsData, Option<Bitset>)> {
        let hash = stones.hash_for(to_play);
        if let Some(data) = self.tt.get(hash) {
            return Some((data, None));
        }
        let db = self.db.as_ref()?;
        let (key, was_rotated) = Self::canonical(stones, to_play);
        let (mut data, mut proof) = db.get(key)?;
        if was_rotated {
            Self::rotate_data(stones, &mut data, &mut proof);
        }
        Some((data, proof))
    }

    pub fn put(
        &mut self,
        stones: &StoneBoard,
        to_play: Color,
        data: DfsData,
        proof: Option<Bitset>,
    ) {
        self.tt.put(stones.hash_for(to_play), data);
        if let Some(db) = self.db.as_mut() {
            let (key, rotate) = Self::canonical(stones, to_play);
            let (mut data, mut proof) = (data, proof);
            if rotate {
                // Stored under the rotated orientation; rotate the
                // payload to match.
                Self::rotate_data(stones, &mut data, &mut proof);
            }
            if let Err(err) = db.put(key, data, proof) {
                if !self.db_failed {
                    warn!("solver db write failed, continuing without: {}", err);
                    self.db_failed = true;
                }
                self.db = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tempfile(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("solhex-db-{}-{}", std::process::id(), name));
        let _ = std::fs::remove_file(&path);
        path
    }

    fn data(win: bool) -> DfsData {
        DfsData {
            win,
            nu_moves: 5,
            best_move: HexPoint::from_index(9),
            num_states: 42,
        }
    }

    #[test]
    fn roundtrip_through_file_test() {
        let path = tempfile("roundtrip");
        {
            let mut db = PositionDb::open(&path).unwrap();
            db.put(1, data(true), Some(Bitset::from_u128(0b1010))).unwrap();
            db.put(2, data(false), None).unwrap();
        }
        let db = PositionDb::open(&path).unwrap();
        assert_eq!(db.len(), 2);
        let (d, proof) = db.get(1).unwrap();
        assert!(d.win);
        assert_eq!(proof, Some(Bitset::from_u128(0b1010)));
        assert_eq!(db.get(2).unwrap().1, None);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn append_only_keeps_latest_and_compacts_test() {
        let path = tempfile("compact");
        {
            let mut db = PositionDb::open(&path).unwrap();
            db.put(7, data(false), None).unwrap();
            db.put(7, data(true), None).unwrap();
        }
        let size_before = std::fs::metadata(&path).unwrap().len();
        let mut db = PositionDb::open(&path).unwrap();
        assert!(db.get(7).unwrap().0.win, "latest record wins");
        db.compact().unwrap();
        let size_after = std::fs::metadata(&path).unwrap().len();
        assert!(size_after < size_before);
        assert!(PositionDb::open(&path).unwrap().get(7).unwrap().0.win);
        let _ = std::fs::remove_file(&path);
    }
}
