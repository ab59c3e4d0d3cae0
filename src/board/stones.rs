use std::fmt;
use std::sync::Arc;

use board_game_traits::Color;
use lazy_static::lazy_static;
use rand::{Rng, SeedableRng};

use crate::board::bitset::Bitset;
use crate::board::cell::{HexPoint, EAST, NORTH, SOUTH, WEST};
use crate::board::constants::ConstBoard;

lazy_static! {
    static ref ZOBRIST_KEYS: Box<ZobristKeys> = ZobristKeys::new();
}

struct ZobristKeys {
    cells: [[u64; HexPoint::MAX_POINTS]; 2],
    to_move: [u64; 2],
}

impl ZobristKeys {
    fn new() -> Box<Self> {
        let mut rng = rand::rngs::StdRng::from_seed([0; 32]);
        let mut keys = Box::new(ZobristKeys {
            cells: [[0; HexPoint::MAX_POINTS]; 2],
            to_move: [0; 2],
        });
        for color_keys in keys.cells.iter_mut() {
            for key in color_keys.iter_mut() {
                *key = rng.gen();
            }
        }
        for key in keys.to_move.iter_mut() {
            *key = rng.gen();
        }
        keys
    }
}

/// What occupies a cell. `Dead` is fill-in: occupied by nobody, usable by
/// neither player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellState {
    Empty,
    Dead,
    Stone(Color),
}

/// Fill-in added outside normal move play.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fill {
    Dead,
    Stone(Color),
}

/// Attempt to play on a non-empty cell or outside the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidMove(pub String);

impl fmt::Display for InvalidMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid move: {}", self.0)
    }
}

impl std::error::Error for InvalidMove {}

/// Stone layout: per-color bitsets, fill-in, and a Zobrist hash over the
/// *played* interior stones (fill-in never touches the hash).
#[derive(Clone)]
pub struct StoneBoard {
    cb: Arc<ConstBoard>,
    black: Bitset,
    white: Bitset,
    dead: Bitset,
    played: Bitset,
    hash: u64,
}

impl StoneBoard {
    pub fn new(cb: Arc<ConstBoard>) -> StoneBoard {
        let edges_black = Bitset::single(NORTH).set(SOUTH);
        let edges_white = Bitset::single(EAST).set(WEST);
        StoneBoard {
            cb,
            black: edges_black,
            white: edges_white,
            dead: Bitset::empty(),
            played: edges_black | edges_white,
            hash: 0,
        }
    }

    #[inline]
    pub fn const_board(&self) -> &ConstBoard {
        &self.cb
    }

    pub fn const_board_arc(&self) -> Arc<ConstBoard> {
        Arc::clone(&self.cb)
    }

    /// All cells colored for `color`: edges, played stones and fill-in.
    #[inline]
    pub fn color(&self, color: Color) -> Bitset {
        match color {
            Color::Black => self.black,
            Color::White => self.white,
        }
    }

    #[inline]
    pub fn dead(&self) -> Bitset {
        self.dead
    }

    /// Interior cells a player actually played (no fill-in, no edges).
    pub fn played(&self) -> Bitset {
        self.played & self.cb.cells()
    }

    pub fn played_by(&self, color: Color) -> Bitset {
        self.played() & self.color(color)
    }

    #[inline]
    pub fn empty(&self) -> Bitset {
        self.cb.cells() - self.black - self.white - self.dead
    }

    pub fn state(&self, p: HexPoint) -> CellState {
        if self.black.get(p) {
            CellState::Stone(Color::Black)
        } else if self.white.get(p) {
            CellState::Stone(Color::White)
        } else if self.dead.get(p) {
            CellState::Dead
        } else {
            CellState::Empty
        }
    }

    pub fn is_empty_cell(&self, p: HexPoint) -> bool {
        self.empty().get(p)
    }

    /// Zobrist hash of the played stones, side to move excluded.
    #[inline]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Hash keyed for the side to move; this is what the transposition
    /// table and position database index on.
    #[inline]
    pub fn hash_for(&self, to_play: Color) -> u64 {
        self.hash ^ ZOBRIST_KEYS.to_move[to_play.disc()]
    }

    /// Hash of the 180-degree rotated position. Used by the position
    /// database for symmetry canonicalization.
    pub fn rotated_hash_for(&self, to_play: Color) -> u64 {
        let mut hash = ZOBRIST_KEYS.to_move[to_play.disc()];
        for color in [Color::Black, Color::White] {
            for p in self.played_by(color) {
                let rotated = self.cb.rotate180(p);
                hash ^= ZOBRIST_KEYS.cells[color.disc()][rotated.index() as usize];
            }
        }
        hash
    }

    pub fn play_move(&mut self, color: Color, cell: HexPoint) -> Result<(), InvalidMove> {
        if !cell.is_interior() || !self.cb.cells().get(cell) {
            return Err(InvalidMove(format!("{} is not a cell", cell.index())));
        }
        if !self.is_empty_cell(cell) {
            return Err(InvalidMove(format!(
                "{} is occupied",
                self.cb.point_to_string(cell)
            )));
        }
        match color {
            Color::Black => self.black.insert(cell),
            Color::White => self.white.insert(cell),
        }
        self.played.insert(cell);
        self.hash ^= ZOBRIST_KEYS.cells[color.disc()][cell.index() as usize];
        Ok(())
    }

    /// Reverses a `play_move`. The caller supplies the same color and cell.
    pub fn undo_move(&mut self, color: Color, cell: HexPoint) {
        debug_assert!(self.played.get(cell) && self.color(color).get(cell));
        match color {
            Color::Black => self.black.remove(cell),
            Color::White => self.white.remove(cell),
        }
        self.played.remove(cell);
        self.hash ^= ZOBRIST_KEYS.cells[color.disc()][cell.index() as usize];
    }

    /// Adds fill-in stones. Does not modify the hash.
    pub fn add_fillin(&mut self, fill: Fill, cells: Bitset) {
        debug_assert!(cells.is_subset_of(self.empty()));
        match fill {
            Fill::Dead => self.dead |= cells,
            Fill::Stone(Color::Black) => self.black |= cells,
            Fill::Stone(Color::White) => self.white |= cells,
        }
        self.check_invariants();
    }

    /// Drops all fill-in, leaving only played stones and the edges.
    pub fn clear_fillin(&mut self) {
        let edges_black = Bitset::single(NORTH).set(SOUTH);
        let edges_white = Bitset::single(EAST).set(WEST);
        self.black = (self.black & self.played) | edges_black;
        self.white = (self.white & self.played) | edges_white;
        self.dead = Bitset::empty();
        self.played = (self.played & self.cb.cells()) | edges_black | edges_white;
    }

    /// Plays a whole stone set at once. The hash is not modified; callers
    /// undo this by restoring a snapshot.
    pub fn play_stones(&mut self, color: Color, cells: Bitset) {
        debug_assert!(cells.is_subset_of(self.empty()));
        match color {
            Color::Black => self.black |= cells,
            Color::White => self.white |= cells,
        }
        self.played |= cells;
        self.check_invariants();
    }

    fn check_invariants(&self) {
        debug_assert!(!self.black.intersects(self.white));
        debug_assert!(!self.black.intersects(self.dead));
        debug_assert!(!self.white.intersects(self.dead));
    }
}

impl fmt::Debug for StoneBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cb = &self.cb;
        for r in 0..cb.height() {
            for _ in 0..r {
                write!(f, " ")?;
            }
            for c in 0..cb.width() {
                let ch = match self.state(cb.point(r, c)) {
                    CellState::Empty => '.',
                    CellState::Dead => '#',
                    CellState::Stone(Color::Black) => 'b',
                    CellState::Stone(Color::White) => 'w',
                };
                write!(f, "{} ", ch)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
