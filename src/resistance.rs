//! Crude connection-resistance evaluation used as a move ordering
//! tiebreak. Approximates the circuit evaluation with a cheapest-path
//! potential: own stones conduct freely, empty cells cost one, opponent
//! stones and dead fill-in block.

use std::collections::VecDeque;

use board_game_traits::Color;

use crate::board::cell::HexPoint;
use crate::board::stones::StoneBoard;

const BLOCKED: u32 = u32::MAX;

fn distances(stones: &StoneBoard, color: Color, from: HexPoint) -> Vec<u32> {
    let cb = stones.const_board();
    let mut dist = vec![BLOCKED; cb.num_points()];
    let mut queue = VecDeque::new();
    dist[from.index() as usize] = 0;
    queue.push_back(from);
    while let Some(p) = queue.pop_front() {
        let d = dist[p.index() as usize];
        for nb in cb.nbs(p) & cb.cells() {
            let cost = if stones.color(color).get(nb) {
                0
            } else if stones.is_empty_cell(nb) {
                1
            } else {
                continue;
            };
            let nd = d + cost;
            if nd < dist[nb.index() as usize] {
                dist[nb.index() as usize] = nd;
                if cost == 0 {
                    queue.push_front(nb);
                } else {
                    queue.push_back(nb);
                }
            }
        }
    }
    dist
}

/// Cheapest number of new stones `color` needs to connect its edges, or
/// `None` when blocked entirely.
pub fn crossing_potential(stones: &StoneBoard, color: Color) -> Option<u32> {
    let d1 = distances(stones, color, HexPoint::edge1(color));
    let d2 = distances(stones, color, HexPoint::edge2(color));
    let mut best = None;
    for p in stones.const_board().cells() {
        let (a, b) = (d1[p.index() as usize], d2[p.index() as usize]);
        if a == BLOCKED || b == BLOCKED {
            continue;
        }
        // An empty cell is charged on both sides; count it once.
        let here = if stones.is_empty_cell(p) { a + b - 1 } else { a + b };
        if best.map_or(true, |current| here < current) {
            best = Some(here);
        }
    }
    best
}

/// Positional score from `color`'s point of view; higher is better.
pub fn resistance_score(stones: &StoneBoard, color: Color) -> i32 {
    let own = crossing_potential(stones, color);
    let other = crossing_potential(stones, !color);
    match (own, other) {
        (None, None) => 0,
        (None, Some(_)) => -1000,
        (Some(_), None) => 1000,
        (Some(own), Some(other)) => other as i32 - own as i32,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::board::constants::ConstBoard;

    fn setup(moves: &[(&str, Color)], w: u8, h: u8) -> StoneBoard {
        let cb = Arc::new(ConstBoard::new(w, h));
        let mut stones = StoneBoard::new(Arc::clone(&cb));
        for (name, color) in moves {
            let p = cb.parse_point(name).unwrap();
            stones.play_move(*color, p).unwrap();
        }
        stones
    }

    #[test]
    fn empty_board_potential_is_span_test() {
        let stones = setup(&[], 4, 6);
        assert_eq!(crossing_potential(&stones, Color::White), Some(4));
        assert_eq!(crossing_potential(&stones, Color::Black), Some(6));
    }

    #[test]
    fn own_stones_reduce_potential_test() {
        let stones = setup(&[("b2", Color::White)], 4, 4);
        assert_eq!(crossing_potential(&stones, Color::White), Some(3));
        assert!(resistance_score(&stones, Color::White) > 0);
    }

    #[test]
    fn blocked_side_scores_badly_test() {
        // A full black column walls white off entirely.
        let stones = setup(
            &[("b1", Color::Black), ("b2", Color::Black), ("b3", Color::Black)],
            3,
            3,
        );
        assert_eq!(crossing_potential(&stones, Color::White), None);
        assert_eq!(resistance_score(&stones, Color::White), -1000);
    }
}
