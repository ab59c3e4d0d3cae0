use board_game_traits::Color;

use crate::board::{Bitset, Groups};
use crate::ice::{IceConfig, IceEngine};
use crate::solver::{
    shrink_proof, DfsSolver, SolveResult, SolverConfig, SolverDb,
};
use crate::tests::{hex_board, solve_position, solve_position_with, stone_board, winner_of};
use crate::vc::VcBuilder;

#[test]
fn solve_1x1_test() {
    // Whoever moves takes the only cell and connects everything.
    let (result, solution) = solve_position(1, 1, &[], Color::Black);
    assert_eq!(result, SolveResult::Win);
    let a1 = stone_board(1, 1, &[]).const_board().parse_point("a1").unwrap();
    assert!(solution.proof.get(a1));

    let (result, _) = solve_position(1, 1, &[], Color::White);
    assert_eq!(result, SolveResult::Win);
}

#[test]
fn white_wins_2x3_regardless_of_mover_test() {
    // Two columns against three rows: the shorter span wins from either
    // side of the move.
    assert_eq!(winner_of(2, 3, &[], Color::White), "white");
    assert_eq!(winner_of(2, 3, &[], Color::Black), "white");
}

#[test]
fn solve_2x2_first_player_wins_test() {
    assert_eq!(solve_position(2, 2, &[], Color::Black).0, SolveResult::Win);
    assert_eq!(solve_position(2, 2, &[], Color::White).0, SolveResult::Win);
}

#[test]
fn solve_3x3_first_player_wins_test() {
    assert_eq!(solve_position(3, 3, &[], Color::Black).0, SolveResult::Win);
    assert_eq!(solve_position(3, 3, &[], Color::White).0, SolveResult::Win);
}

#[test]
fn solved_win_comes_with_variation_test() {
    let (result, solution) = solve_position(3, 3, &[], Color::Black);
    assert_eq!(result, SolveResult::Win);
    assert!(!solution.pv.is_empty(), "a win needs a first move");
    assert!(solution.proof.any());
    assert!(solution.stats.explored_states > 0);
}

#[test]
fn terminal_positions_solve_immediately_test() {
    let moves = [
        ("a1", Color::Black),
        ("a2", Color::Black),
        ("a3", Color::Black),
    ];
    let (result, solution) = solve_position(3, 3, &moves, Color::Black);
    assert_eq!(result, SolveResult::Win);
    assert_eq!(solution.stats.expanded_states, 0);

    let (result, _) = solve_position(3, 3, &moves, Color::White);
    assert_eq!(result, SolveResult::Loss);
}

#[test]
fn full_board_is_terminal_test() {
    // Fill a 2x2 board completely; black's a-file chain spans.
    let moves = [
        ("a1", Color::Black),
        ("b1", Color::White),
        ("a2", Color::Black),
        ("b2", Color::White),
    ];
    let (result, solution) = solve_position(2, 2, &moves, Color::White);
    assert_eq!(result, SolveResult::Loss);
    let a1 = stone_board(2, 2, &[]).const_board().parse_point("a1").unwrap();
    assert!(solution.proof.get(a1));
}

#[test]
fn depth_limit_returns_unknown_test() {
    let mut config = SolverConfig::default();
    config.depth_limit = Some(1);
    let (result, _) = solve_position_with(
        4,
        4,
        &[],
        Color::Black,
        IceConfig::default(),
        config,
    );
    assert_eq!(result, SolveResult::Unknown);
}

#[test]
fn time_limit_returns_unknown_test() {
    let mut config = SolverConfig::default();
    config.time_limit = Some(std::time::Duration::from_nanos(1));
    let (result, _) = solve_position_with(
        5,
        5,
        &[],
        Color::Black,
        IceConfig::default(),
        config,
    );
    assert_eq!(result, SolveResult::Unknown);
}

#[test]
fn repeated_solve_hits_the_table_test() {
    let stones = stone_board(3, 3, &[("b2", Color::Black)]);
    let mut positions = SolverDb::new(14, None);

    let mut board = hex_board(&stones, IceConfig::default());
    let mut solver = DfsSolver::new(SolverConfig::default());
    let (first, first_solution) = solver.solve(&mut board, Color::White, &mut positions);

    let mut board = hex_board(&stones, IceConfig::default());
    let mut solver = DfsSolver::new(SolverConfig::default());
    let (second, second_solution) = solver.solve(&mut board, Color::White, &mut positions);

    assert_eq!(first, second);
    assert!(
        second_solution.stats.explored_states <= first_solution.stats.explored_states,
        "the stored root must not make the re-solve larger"
    );
}

/// Fills every empty cell outside the proof with the loser's stones and
/// checks the winner still wins. This is the meaning of a proof set.
fn assert_proof_is_sufficient(
    width: u8,
    height: u8,
    moves: &[(&str, Color)],
    to_play: Color,
) {
    let (result, solution) = solve_position(width, height, moves, to_play);
    let winner = match result {
        SolveResult::Win => to_play,
        SolveResult::Loss => !to_play,
        SolveResult::Unknown => panic!("expected a solved position"),
    };
    let mut filled = stone_board(width, height, moves);
    let outside = filled.empty() - solution.proof;
    filled.play_stones(!winner, outside);

    let mut board = hex_board(&filled, IceConfig::default());
    let mut positions = SolverDb::new(14, None);
    let mut solver = DfsSolver::new(SolverConfig::default());
    let (refilled, _) = solver.solve(&mut board, to_play, &mut positions);
    assert_eq!(
        refilled, result,
        "outcome must survive giving all non-proof cells to the loser"
    );
}

#[test]
fn win_proof_survives_hostile_fill_test() {
    assert_proof_is_sufficient(3, 3, &[], Color::Black);
}

#[test]
fn loss_proof_survives_hostile_fill_test() {
    // White to move on 3x3 after black takes the center is lost.
    assert_proof_is_sufficient(3, 3, &[("b2", Color::Black)], Color::White);
}

#[test]
fn proof_shrinking_is_monotone_test() {
    let stones = stone_board(3, 3, &[("b2", Color::Black)]);
    let engine = IceEngine::new(IceConfig::default());

    // Black's bridges to both edges prove the win; a proof padded with
    // junk cells must shrink back within itself.
    let (result, solution) = solve_position(3, 3, &[("b2", Color::Black)], Color::White);
    assert_eq!(result, SolveResult::Loss);
    let padded = solution.proof | Bitset::single(stones.const_board().parse_point("a1").unwrap());
    let shrunk = shrink_proof(padded, &stones, Color::White, &engine);
    assert!(shrunk.is_subset_of(padded));

    let again = shrink_proof(solution.proof, &stones, Color::White, &engine);
    assert!(again.is_subset_of(solution.proof));
}

#[test]
fn decomposition_solving_agrees_with_plain_search_test() {
    // White bridged to both edges on 3x3 splits the board; with
    // decompositions on, the answer must match the plain search.
    let moves = [("b2", Color::White)];
    let mut with_decomposition = SolverConfig::default();
    with_decomposition.use_decompositions = true;

    let plain = solve_position(3, 3, &moves, Color::Black).0;
    let split = solve_position_with(
        3,
        3,
        &moves,
        Color::Black,
        IceConfig::default(),
        with_decomposition,
    )
    .0;
    assert_eq!(plain, split);
    assert_eq!(plain, SolveResult::Loss, "white owns the split 3x3");
}

#[test]
fn ordering_flags_do_not_change_results_test() {
    use crate::solver::ordering::{ORDER_FROM_CENTER, ORDER_WITH_MUSTPLAY, ORDER_WITH_RESIST};
    let moves = [("b2", Color::Black), ("c2", Color::White)];
    let mut results = Vec::new();
    for flags in [
        ORDER_FROM_CENTER,
        ORDER_WITH_MUSTPLAY | ORDER_FROM_CENTER,
        ORDER_WITH_MUSTPLAY | ORDER_WITH_RESIST | ORDER_FROM_CENTER,
        ORDER_WITH_RESIST,
    ] {
        let mut config = SolverConfig::default();
        config.move_ordering = flags;
        results.push(
            solve_position_with(3, 4, &moves, Color::Black, IceConfig::default(), config).0,
        );
    }
    assert!(results.windows(2).all(|w| w[0] == w[1]), "{:?}", results);
}

#[test]
fn shrunk_proof_still_validates_after_ice_fill_test() {
    // Solve, then rebuild the hostile board and confirm the winner keeps
    // an edge-to-edge connection on it.
    let (result, solution) = solve_position(2, 3, &[], Color::White);
    let winner = match result {
        SolveResult::Win => Color::White,
        SolveResult::Loss => Color::Black,
        SolveResult::Unknown => panic!("2x3 must solve"),
    };
    let mut filled = stone_board(2, 3, &[]);
    let outside = filled.empty() - solution.proof;
    filled.play_stones(!winner, outside);
    let groups = Groups::build(&filled);
    let vcs = VcBuilder::default().build(&filled, &groups, winner);
    let connected = groups.winner() == Some(winner)
        || !vcs.winning_fulls().is_empty()
        || !vcs.winning_semis().is_empty();
    assert!(connected, "winner must retain a connection on the proof");
}
