//! Board state: geometry, stones, groups, inferior-cell annotations and
//! virtual connections, kept mutually consistent under move and undo.

use std::sync::Arc;

use board_game_traits::Color;

pub mod bitset;
pub mod cell;
pub mod constants;
pub mod groups;
pub mod stones;

pub use bitset::Bitset;
pub use cell::{HexPoint, EAST, NORTH, SOUTH, WEST};
pub use constants::ConstBoard;
pub use groups::Groups;
pub use stones::{CellState, Fill, InvalidMove, StoneBoard};

use crate::ice::{IceEngine, InferiorCells, VulnerableKiller};
use crate::vc::{Decomposition, VcBuilder, VcSet};

/// Feature switches for the composed board.
#[derive(Clone, Copy, Debug)]
pub struct BoardConfig {
    /// Whether connection sets are computed after every change.
    pub use_vcs: bool,
    /// Whether inferior-cell analysis runs after every change.
    pub use_ice: bool,
    /// Whether inferior-cell info found under a move is kept as
    /// vulnerability info when the move is undone.
    pub backup_ice_info: bool,
}

impl Default for BoardConfig {
    fn default() -> Self {
        BoardConfig {
            use_vcs: true,
            use_ice: true,
            backup_ice_info: true,
        }
    }
}

struct HistoryFrame {
    stones: StoneBoard,
    inf: InferiorCells,
    #[allow(dead_code)]
    to_play: Color,
    last_played: Option<HexPoint>,
}

/// The full board: stones plus every derived structure, with a history
/// stack for undo. After any mutating call, groups reflect the painted
/// stones (dead fill-in blocks both colors) and both connection sets
/// are current.
pub struct HexBoard {
    stones: StoneBoard,
    groups: Groups,
    inf: InferiorCells,
    vcs: [VcSet; 2],
    history: Vec<HistoryFrame>,
    ice: Arc<IceEngine>,
    builder: VcBuilder,
    pub config: BoardConfig,
}

impl HexBoard {
    pub fn new(
        cb: Arc<ConstBoard>,
        ice: Arc<IceEngine>,
        builder: VcBuilder,
        config: BoardConfig,
    ) -> HexBoard {
        let stones = StoneBoard::new(cb);
        let groups = Groups::build(&stones);
        let mut vcs = [VcSet::empty(Color::White), VcSet::empty(Color::White)];
        vcs[Color::Black.disc()] = VcSet::empty(Color::Black);
        HexBoard {
            vcs,
            stones,
            groups,
            inf: InferiorCells::default(),
            history: Vec::new(),
            ice,
            builder,
            config,
        }
    }

    #[inline]
    pub fn stones(&self) -> &StoneBoard {
        &self.stones
    }

    #[inline]
    pub fn const_board(&self) -> &ConstBoard {
        self.stones.const_board()
    }

    #[inline]
    pub fn groups(&self) -> &Groups {
        &self.groups
    }

    #[inline]
    pub fn inferior_cells(&self) -> &InferiorCells {
        &self.inf
    }

    /// The connection set for `color`.
    #[inline]
    pub fn cons(&self, color: Color) -> &VcSet {
        &self.vcs[color.disc()]
    }

    pub fn ice(&self) -> &IceEngine {
        &self.ice
    }

    pub fn ice_arc(&self) -> Arc<IceEngine> {
        Arc::clone(&self.ice)
    }

    pub fn winner(&self) -> Option<Color> {
        self.groups.winner()
    }

    pub fn is_game_over(&self) -> bool {
        self.groups.is_game_over()
    }

    fn compute_inferior_cells(&mut self, to_play: Color) {
        if !self.config.use_ice {
            return;
        }
        let mut new = InferiorCells::default();
        let ice = Arc::clone(&self.ice);
        ice.compute_inferior_cells(to_play, &mut self.stones, &mut self.groups, &mut new);
        self.inf.merge_update(&new);
    }

    fn build_vcs(&mut self) {
        if self.config.use_vcs {
            for color in [Color::White, Color::Black] {
                self.vcs[color.disc()] =
                    self.builder.build(&self.stones, &self.groups, color);
            }
        }
    }

    /// Copies a stone layout into this board. Derived state is stale
    /// until the next `compute_all`.
    pub fn set_state(&mut self, stones: &StoneBoard) {
        self.stones = stones.clone();
        self.history.clear();
        self.inf.clear();
        self.groups = Groups::build(&self.stones);
    }

    /// Clears history, drops stale fill-in and recomputes everything for
    /// the current stones.
    pub fn compute_all(&mut self, to_play: Color) {
        self.history.clear();
        self.stones.clear_fillin();
        self.groups = Groups::build(&self.stones);
        self.inf.clear();
        if self.config.use_ice {
            let mut new = InferiorCells::default();
            let ice = Arc::clone(&self.ice);
            ice.compute_inferior_cells(to_play, &mut self.stones, &mut self.groups, &mut new);
            self.inf = new;
        }
        self.build_vcs();
    }

    /// Pushes a history frame, plays the move (hash updated), reruns the
    /// inferior-cell analysis for the opponent and rebuilds connections.
    pub fn play_move(&mut self, color: Color, cell: HexPoint) -> Result<(), InvalidMove> {
        if !self.stones.is_empty_cell(cell) {
            return Err(InvalidMove(format!(
                "{} is occupied",
                self.const_board().point_to_string(cell)
            )));
        }
        self.push_history(color, Some(cell));
        self.stones.play_move(color, cell)?;
        self.groups = Groups::build(&self.stones);
        self.compute_inferior_cells(!color);
        self.build_vcs();
        Ok(())
    }

    /// Plays a whole stone set for `color`. The hash is not modified and
    /// one `undo_move` reverts everything.
    pub fn play_stones(&mut self, color: Color, cells: Bitset, to_play: Color) {
        self.push_history(color, None);
        let cells = cells & self.stones.empty();
        self.stones.play_stones(color, cells);
        self.groups = Groups::build(&self.stones);
        self.compute_inferior_cells(to_play);
        self.build_vcs();
    }

    /// Adds stones without pushing history; the next `undo_move` reverts
    /// them together with the preceding frame.
    pub fn add_stones(&mut self, color: Color, cells: Bitset) {
        let cells = cells & self.stones.empty();
        self.stones.play_stones(color, cells);
        self.groups = Groups::build(&self.stones);
        self.build_vcs();
    }

    /// Restores the previous frame. With `backup_ice_info`, cells proved
    /// dead under the undone move are kept as vulnerable to it.
    pub fn undo_move(&mut self) -> Option<HexPoint> {
        let mut frame = self.history.pop()?;
        if self.config.backup_ice_info {
            if let Some(killer) = frame.last_played {
                let parent_empty = frame.stones.empty();
                let child_fillin = self.inf.all_fillin();
                for d in self.inf.dead() & parent_empty {
                    let carrier = (child_fillin.clear(d)).clear(killer) & parent_empty;
                    frame.inf.add_vulnerable(d, VulnerableKiller { killer, carrier });
                }
            }
        }
        self.stones = frame.stones;
        self.inf = frame.inf;
        self.groups = Groups::build(&self.stones);
        self.build_vcs();
        frame.last_played
    }

    pub fn depth(&self) -> usize {
        self.history.len()
    }

    fn push_history(&mut self, to_play: Color, last_played: Option<HexPoint>) {
        self.history.push(HistoryFrame {
            stones: self.stones.clone(),
            inf: self.inf.clone(),
            to_play,
            last_played,
        });
    }

    /// A decomposition of the empties by an opponent chain, if the
    /// connection sets expose one.
    pub fn decomposition(&self, chain_color: Color) -> Option<Decomposition> {
        if !self.config.use_vcs {
            return None;
        }
        self.cons(chain_color)
            .find_decomposition(&self.stones, &self.groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ice::IceConfig;

    fn board(w: u8, h: u8) -> HexBoard {
        HexBoard::new(
            Arc::new(ConstBoard::new(w, h)),
            Arc::new(IceEngine::new(IceConfig::default())),
            VcBuilder::default(),
            BoardConfig::default(),
        )
    }

    #[test]
    fn play_undo_restores_hash_and_fillin_test() {
        let mut brd = board(4, 4);
        brd.compute_all(Color::Black);
        let hash = brd.stones().hash();
        let b2 = brd.const_board().parse_point("b2").unwrap();
        let c3 = brd.const_board().parse_point("c3").unwrap();
        brd.play_move(Color::Black, b2).unwrap();
        brd.play_move(Color::White, c3).unwrap();
        assert_ne!(brd.stones().hash(), hash);
        brd.undo_move();
        brd.undo_move();
        assert_eq!(brd.stones().hash(), hash);
        assert!(brd.stones().empty().get(b2));
        assert!(brd.stones().empty().get(c3));
    }

    #[test]
    fn play_stones_is_one_undo_test() {
        let mut brd = board(4, 4);
        brd.compute_all(Color::Black);
        let hash = brd.stones().hash();
        let cells = Bitset::single(brd.const_board().parse_point("a1").unwrap())
            .set(brd.const_board().parse_point("b1").unwrap());
        brd.play_stones(Color::White, cells, Color::Black);
        assert_eq!(brd.stones().hash(), hash, "batch play must not touch the hash");
        assert_eq!((brd.stones().empty() & cells).count(), 0);
        brd.undo_move();
        assert_eq!((brd.stones().empty() & cells).count(), 2);
    }

    #[test]
    fn derived_state_tracks_moves_test() {
        let mut brd = board(3, 3);
        brd.compute_all(Color::White);
        let b2 = brd.const_board().parse_point("b2").unwrap();
        brd.play_move(Color::White, b2).unwrap();
        assert_eq!(brd.groups().group(b2).color(), Some(Color::White));
        assert!(
            !brd.cons(Color::White).winning_semis().is_empty()
                || !brd.cons(Color::White).winning_fulls().is_empty(),
            "white b2 on 3x3 bridges to both edges"
        );
    }

    #[test]
    fn vulnerable_backup_on_undo_test() {
        let mut brd = board(5, 5);
        brd.config.backup_ice_info = true;
        brd.compute_all(Color::Black);
        let c3 = brd.const_board().parse_point("c3").unwrap();
        brd.play_move(Color::Black, c3).unwrap();
        let child_dead = brd.inferior_cells().dead();
        brd.undo_move();
        for d in child_dead & brd.stones().empty() {
            assert!(
                brd.inferior_cells().killers_of(d).any(|k| k.killer == c3),
                "cell dead under the move should be vulnerable to it"
            );
        }
    }
}
