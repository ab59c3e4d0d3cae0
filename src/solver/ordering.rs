//! Candidate selection and ranking. Ranking keys are compared
//! lexicographically: resulting mustplay size (when probing is enabled),
//! then resistance, then distance from the board center.

use board_game_traits::Color;

use crate::board::{Bitset, HexBoard, HexPoint};

/// Probe each candidate and order by the opponent's resulting mustplay
/// size, ascending. Expensive (full board updates per candidate) but by
/// far the strongest ordering.
pub const ORDER_WITH_MUSTPLAY: u32 = 1;
/// Use the resistance evaluation as a tiebreak.
pub const ORDER_WITH_RESIST: u32 = 2;
/// Prefer moves near the board center.
pub const ORDER_FROM_CENTER: u32 = 4;

/// Sort key for one candidate; smaller is tried first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct MoveScore {
    pub mustplay_size: u32,
    pub neg_resist: i32,
    pub center_dist: u32,
}

impl MoveScore {
    pub fn worst() -> MoveScore {
        MoveScore {
            mustplay_size: u32::MAX,
            neg_resist: i32::MAX,
            center_dist: u32::MAX,
        }
    }
}

/// Filters the mustplay down to moves worth trying: inferior cells are
/// removed as long as their replacement is still available. Falls back to
/// the unfiltered set rather than returning nothing.
pub fn moves_to_consider(brd: &HexBoard, mustplay: Bitset) -> Bitset {
    let inf = brd.inferior_cells();
    let empty = brd.stones().empty();
    let base = mustplay & empty;
    let mut consider = base;

    consider -= inf.dead();
    for color in [Color::Black, Color::White] {
        consider -= inf.captured(color);
        consider -= inf.perm_inf(color);
    }

    for v in inf.vulnerable() & consider {
        let killable = inf
            .killers_of(v)
            .any(|k| empty.get(k.killer) && k.carrier.is_subset_of(empty));
        if killable {
            consider.remove(v);
        }
    }

    for r in inf.reversible() & consider {
        consider.remove(r);
    }

    // Drop dominated cells only while their dominator is still in the
    // set, so mutual domination cannot empty it.
    for cell in inf.dominated() & consider {
        let dominators = inf.dominators_of(cell);
        if (dominators & consider).clear(cell).any() {
            consider.remove(cell);
        }
    }

    if consider.is_empty() {
        base
    } else {
        consider
    }
}

/// The set the side to move must play into, or all empties when the
/// opponent has no winning semi connection.
pub fn mustplay(brd: &HexBoard, to_play: Color) -> Bitset {
    let carrier = brd.cons(!to_play).mustplay_carrier() & brd.stones().empty();
    if carrier.is_empty() {
        brd.stones().empty()
    } else {
        carrier
    }
}

/// Center-distance key for a candidate.
pub fn center_key(brd: &HexBoard, cell: HexPoint) -> u32 {
    brd.const_board().center_dist2(cell)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_score_orders_lexicographically_test() {
        let a = MoveScore {
            mustplay_size: 2,
            neg_resist: 5,
            center_dist: 9,
        };
        let b = MoveScore {
            mustplay_size: 3,
            neg_resist: -10,
            center_dist: 0,
        };
        let c = MoveScore {
            mustplay_size: 2,
            neg_resist: 6,
            center_dist: 0,
        };
        assert!(a < b);
        assert!(a < c);
        let mut scores = vec![b, a, c];
        scores.sort();
        assert_eq!(scores[0], a);
    }
}
