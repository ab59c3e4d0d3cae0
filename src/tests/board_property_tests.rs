use std::sync::Arc;

use board_game_traits::Color;
use rand::prelude::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::board::{ConstBoard, Groups, HexPoint, StoneBoard};
use crate::ice::{ColorSet, IceConfig, IceEngine, InferiorCells};
use crate::tests::stone_board;

#[test]
fn random_play_undo_hash_roundtrip_test() {
    let mut rng = rand::rngs::StdRng::from_seed([7; 32]);
    let cb = Arc::new(ConstBoard::new(6, 7));
    let mut stones = StoneBoard::new(Arc::clone(&cb));
    let initial = stones.hash();

    for _ in 0..50 {
        let mut played: Vec<(Color, HexPoint)> = Vec::new();
        let mut to_play = Color::Black;
        let count = rng.gen_range(1..20);
        for _ in 0..count {
            let empties: Vec<HexPoint> = stones.empty().into_iter().collect();
            let cell = *empties.choose(&mut rng).unwrap();
            stones.play_move(to_play, cell).unwrap();
            played.push((to_play, cell));
            to_play = !to_play;
        }
        for (color, cell) in played.into_iter().rev() {
            stones.undo_move(color, cell);
        }
        assert_eq!(stones.hash(), initial);
    }
}

#[test]
fn hash_is_position_not_path_test() {
    let mut a = stone_board(5, 5, &[("b2", Color::Black), ("c3", Color::White)]);
    let b = stone_board(5, 5, &[("c3", Color::White), ("b2", Color::Black)]);
    assert_eq!(a.hash(), b.hash());
    assert_eq!(a.hash_for(Color::Black), b.hash_for(Color::Black));
    assert_ne!(a.hash_for(Color::Black), b.hash_for(Color::White));

    let c3 = a.const_board().parse_point("c3").unwrap();
    a.undo_move(Color::White, c3);
    assert_ne!(a.hash(), b.hash());
}

fn run_fillin(
    stones: &StoneBoard,
    config: IceConfig,
    to_play: Color,
) -> (StoneBoard, InferiorCells) {
    let mut scratch = stones.clone();
    let mut groups = Groups::build(&scratch);
    let mut inf = InferiorCells::default();
    let engine = IceEngine::new(config);
    engine.compute_fillin(to_play, &mut scratch, &mut groups, &mut inf, ColorSet::ALL);
    (scratch, inf)
}

// A pocket position with captures available near the south edge.
fn pocket_position() -> StoneBoard {
    stone_board(
        4,
        4,
        &[
            ("b3", Color::Black),
            ("c3", Color::Black),
            ("a4", Color::Black),
            ("d3", Color::Black),
            ("d4", Color::Black),
            ("b1", Color::White),
        ],
    )
}

#[test]
fn fillin_is_confluent_across_rule_orders_test() {
    let stones = pocket_position();
    let mut iterative = IceConfig::default();
    iterative.iterative_dead_regions = true;
    let mut three_sided = IceConfig::default();
    three_sided.find_three_sided_dead_regions = true;

    let (board_a, inf_a) = run_fillin(&stones, IceConfig::default(), Color::White);
    let (board_b, inf_b) = run_fillin(&stones, iterative, Color::White);
    let (board_c, _) = run_fillin(&stones, three_sided, Color::White);

    assert_eq!(board_a.hash(), board_b.hash());
    assert_eq!(board_a.hash(), board_c.hash());
    assert_eq!(board_a.empty(), board_b.empty());
    // Captures found must agree between orders.
    assert_eq!(
        inf_a.captured(Color::Black),
        inf_b.captured(Color::Black),
    );

    // And a second run finds nothing further.
    let (_, inf_again) = run_fillin(&board_a, IceConfig::default(), Color::White);
    assert!(inf_again.all_fillin().is_empty());
}

#[test]
fn fillin_annotations_are_on_empty_cells_test() {
    let stones = pocket_position();
    let mut scratch = stones.clone();
    let mut groups = Groups::build(&scratch);
    let mut inf = InferiorCells::default();
    let engine = IceEngine::new(IceConfig::default());
    engine.compute_inferior_cells(Color::White, &mut scratch, &mut groups, &mut inf);

    assert!(!inf.dead().intersects(inf.captured(Color::Black)));
    assert!(!inf.dead().intersects(inf.captured(Color::White)));
    assert!(!inf
        .captured(Color::Black)
        .intersects(inf.captured(Color::White)));
    // Vulnerable/reversible/dominated always refer to still-empty cells.
    assert!(inf.vulnerable().is_subset_of(scratch.empty()));
    assert!(inf.reversible().is_subset_of(scratch.empty()));
    assert!(inf.dominated().is_subset_of(scratch.empty()));
    for v in inf.vulnerable() {
        for killer in inf.killers_of(v) {
            assert!(
                scratch.empty().get(killer.killer),
                "killers must be playable"
            );
        }
    }
}

#[test]
fn captured_pocket_is_filled_test() {
    let (board, inf) = run_fillin(&pocket_position(), IceConfig::default(), Color::White);
    let b4 = board.const_board().parse_point("b4").unwrap();
    let c4 = board.const_board().parse_point("c4").unwrap();
    assert!(inf.captured(Color::Black).get(b4));
    assert!(inf.captured(Color::Black).get(c4));
    assert!(!board.empty().get(b4));
}
