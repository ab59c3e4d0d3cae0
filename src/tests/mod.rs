use std::sync::Arc;

use board_game_traits::Color;

use crate::board::{BoardConfig, ConstBoard, HexBoard, StoneBoard};
use crate::ice::{IceConfig, IceEngine};
use crate::solver::{DfsSolver, SolutionSet, SolveResult, SolverConfig, SolverDb};
use crate::vc::VcBuilder;

mod board_property_tests;
mod scenario_tests;
mod solver_tests;

pub fn stone_board(width: u8, height: u8, moves: &[(&str, Color)]) -> StoneBoard {
    let cb = Arc::new(ConstBoard::new(width, height));
    let mut stones = StoneBoard::new(Arc::clone(&cb));
    for (name, color) in moves {
        let cell = cb.parse_point(name).unwrap();
        stones
            .play_move(*color, cell)
            .unwrap_or_else(|err| panic!("move {}: {}", name, err));
    }
    stones
}

pub fn hex_board(stones: &StoneBoard, ice_config: IceConfig) -> HexBoard {
    let mut board = HexBoard::new(
        stones.const_board_arc(),
        Arc::new(IceEngine::new(ice_config)),
        VcBuilder::default(),
        BoardConfig::default(),
    );
    board.set_state(stones);
    board
}

pub fn solve_position(
    width: u8,
    height: u8,
    moves: &[(&str, Color)],
    to_play: Color,
) -> (SolveResult, SolutionSet) {
    solve_position_with(
        width,
        height,
        moves,
        to_play,
        IceConfig::default(),
        SolverConfig::default(),
    )
}

pub fn solve_position_with(
    width: u8,
    height: u8,
    moves: &[(&str, Color)],
    to_play: Color,
    ice_config: IceConfig,
    solver_config: SolverConfig,
) -> (SolveResult, SolutionSet) {
    let stones = stone_board(width, height, moves);
    let mut board = hex_board(&stones, ice_config);
    let mut positions = SolverDb::new(16, None);
    let mut solver = DfsSolver::new(solver_config);
    solver.solve(&mut board, to_play, &mut positions)
}

/// The winner of the position, as `solve-state` would report it.
pub fn winner_of(width: u8, height: u8, moves: &[(&str, Color)], to_play: Color) -> &'static str {
    match solve_position(width, height, moves, to_play).0 {
        SolveResult::Win => color_str(to_play),
        SolveResult::Loss => color_str(!to_play),
        SolveResult::Unknown => "unknown",
    }
}

pub fn color_str(color: Color) -> &'static str {
    match color {
        Color::Black => "black",
        Color::White => "white",
    }
}
