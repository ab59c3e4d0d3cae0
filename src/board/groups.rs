use arrayvec::ArrayVec;
use board_game_traits::Color;

use crate::board::bitset::Bitset;
use crate::board::cell::{HexPoint, EAST, NORTH, SOUTH, WEST};
use crate::board::stones::{CellState, StoneBoard};

/// A maximal connected component of same-colored points (edges included),
/// or a singleton for an empty or dead cell.
#[derive(Clone, Debug)]
pub struct Group {
    pub captain: HexPoint,
    pub state: CellState,
    pub members: Bitset,
    /// All points adjacent to the group, of any state.
    pub nbs: Bitset,
}

impl Group {
    pub fn color(&self) -> Option<Color> {
        match self.state {
            CellState::Stone(color) => Some(color),
            _ => None,
        }
    }

    pub fn size(&self) -> u32 {
        self.members.count()
    }
}

/// Partition of the board into groups, rebuilt from a `StoneBoard`
/// snapshot whenever stones or fill-in change.
#[derive(Clone)]
pub struct Groups {
    slot_of: Vec<u8>,
    groups: Vec<Group>,
}

impl Groups {
    pub fn build(stones: &StoneBoard) -> Groups {
        let cb = stones.const_board();
        let mut slot_of = vec![u8::MAX; cb.num_points()];
        let mut groups = Vec::new();

        // Ascending point order makes an edge the captain of its group.
        for start in stones.const_board().all() {
            if slot_of[start.index() as usize] != u8::MAX {
                continue;
            }
            let state = stones.state(start);
            let mut members = Bitset::single(start);
            if let CellState::Stone(color) = state {
                // Each point enters the frontier at most once.
                let mut frontier = ArrayVec::<HexPoint, { HexPoint::MAX_POINTS }>::new();
                frontier.push(start);
                while let Some(p) = frontier.pop() {
                    for nb in cb.nbs(p) {
                        if !members.get(nb) && stones.color(color).get(nb) {
                            members.insert(nb);
                            frontier.push(nb);
                        }
                    }
                }
            }
            let mut nbs = Bitset::empty();
            for p in members {
                nbs |= cb.nbs(p);
            }
            nbs -= members;
            let slot = groups.len() as u8;
            for p in members {
                slot_of[p.index() as usize] = slot;
            }
            groups.push(Group {
                captain: start,
                state,
                members,
                nbs,
            });
        }
        Groups { slot_of, groups }
    }

    #[inline]
    pub fn group(&self, p: HexPoint) -> &Group {
        &self.groups[self.slot_of[p.index() as usize] as usize]
    }

    #[inline]
    pub fn captain_of(&self, p: HexPoint) -> HexPoint {
        self.group(p).captain
    }

    /// Points adjacent to the group containing `p`.
    #[inline]
    pub fn nbs(&self, p: HexPoint) -> Bitset {
        self.group(p).nbs
    }

    pub fn iter(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter()
    }

    pub fn of_color(&self, color: Color) -> impl Iterator<Item = &Group> {
        self.groups
            .iter()
            .filter(move |g| g.color() == Some(color))
    }

    pub fn is_game_over(&self) -> bool {
        self.winner().is_some()
    }

    /// The player whose edges are in one group, if any.
    pub fn winner(&self) -> Option<Color> {
        if self.captain_of(NORTH) == self.captain_of(SOUTH) {
            Some(Color::Black)
        } else if self.captain_of(EAST) == self.captain_of(WEST) {
            Some(Color::White)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::board::constants::ConstBoard;

    fn played(moves: &[(&str, Color)], w: u8, h: u8) -> StoneBoard {
        let cb = Arc::new(ConstBoard::new(w, h));
        let mut brd = StoneBoard::new(Arc::clone(&cb));
        for (name, color) in moves {
            let p = cb.parse_point(name).unwrap();
            brd.play_move(*color, p).unwrap();
        }
        brd
    }

    #[test]
    fn edges_are_separate_groups_initially_test() {
        let brd = played(&[], 3, 3);
        let groups = Groups::build(&brd);
        assert_ne!(groups.captain_of(NORTH), groups.captain_of(SOUTH));
        assert_ne!(groups.captain_of(EAST), groups.captain_of(WEST));
        assert!(!groups.is_game_over());
    }

    #[test]
    fn chain_joins_edge_group_test() {
        let brd = played(&[("a1", Color::Black), ("a2", Color::Black)], 3, 3);
        let groups = Groups::build(&brd);
        let a1 = brd.const_board().parse_point("a1").unwrap();
        assert_eq!(groups.captain_of(a1), NORTH);
        assert_eq!(groups.group(a1).size(), 3);
    }

    #[test]
    fn spanning_chain_wins_test() {
        let brd = played(
            &[("a1", Color::Black), ("a2", Color::Black), ("a3", Color::Black)],
            3,
            3,
        );
        let groups = Groups::build(&brd);
        assert_eq!(groups.winner(), Some(Color::Black));
    }

    #[test]
    fn liberties_of_group_test() {
        let brd = played(&[("b2", Color::White)], 3, 3);
        let groups = Groups::build(&brd);
        let b2 = brd.const_board().parse_point("b2").unwrap();
        let liberties = groups.nbs(b2) & brd.empty();
        assert_eq!(liberties.count(), 6);
    }
}
