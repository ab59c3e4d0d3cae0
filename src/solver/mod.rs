//! Mustplay-driven depth-first solver with transposition support,
//! decomposition handling and proof shrinking.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use board_game_traits::Color;
use log::{debug, info, warn};

use crate::board::{Bitset, Groups, HexBoard, HexPoint, StoneBoard};
use crate::ice::{ColorSet, IceEngine, InferiorCells};
use crate::solver::ordering::{
    center_key, mustplay, moves_to_consider, MoveScore, ORDER_FROM_CENTER, ORDER_WITH_MUSTPLAY,
    ORDER_WITH_RESIST,
};
use crate::vc::Decomposition;

pub mod db;
pub mod ordering;
pub mod tt;

pub use db::{PositionDb, SolverDb, NO_MOVE};
pub use tt::{DfsData, TransTable};

/// Outcome for the player to move. `Unknown` only on depth limit, time
/// limit or external abort.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolveResult {
    Win,
    Loss,
    Unknown,
}

/// Counters for one branch of the search tree.
#[derive(Clone, Copy, Debug, Default)]
pub struct BranchStatistics {
    /// States in the tree if nothing were memoized.
    pub total_states: u64,
    /// States visited, leaf/transposition hits included.
    pub explored_states: u64,
    /// Expanded interior states.
    pub expanded_states: u64,
    /// Lower bound on explored states under perfect ordering.
    pub minimal_explored: u64,
    pub decompositions: u64,
    pub decompositions_won: u64,
    pub moves_to_consider: u64,
    pub winning_expanded: u64,
    pub branches_to_win: u64,
    /// Moves discarded by proof-based mustplay pruning.
    pub pruned: u64,
    /// Proofs successfully shrunk.
    pub shrunk: u64,
    /// Cells removed over all successful shrinkings.
    pub cells_removed: u64,
}

impl std::ops::AddAssign for BranchStatistics {
    fn add_assign(&mut self, o: BranchStatistics) {
        self.total_states += o.total_states;
        self.explored_states += o.explored_states;
        self.expanded_states += o.expanded_states;
        self.minimal_explored += o.minimal_explored;
        self.decompositions += o.decompositions;
        self.decompositions_won += o.decompositions_won;
        self.moves_to_consider += o.moves_to_consider;
        self.winning_expanded += o.winning_expanded;
        self.branches_to_win += o.branches_to_win;
        self.pruned += o.pruned;
        self.shrunk += o.shrunk;
        self.cells_removed += o.cells_removed;
    }
}

/// Per-depth counters for the whole run.
#[derive(Clone, Debug, Default)]
pub struct Histogram {
    pub terminal: BTreeMap<u32, u64>,
    pub states: BTreeMap<u32, u64>,
    pub winning: BTreeMap<u32, u64>,
    pub branches: BTreeMap<u32, u64>,
    pub mustplay: BTreeMap<u32, u64>,
    pub states_under_losing: BTreeMap<u32, u64>,
    pub tthits: BTreeMap<u32, u64>,
}

impl Histogram {
    fn bump(map: &mut BTreeMap<u32, u64>, depth: u32, amount: u64) {
        *map.entry(depth).or_insert(0) += amount;
    }

    pub fn dump(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "depth states terminal tthits winning branches");
        for (&depth, &states) in &self.states {
            let _ = writeln!(
                out,
                "{:5} {:6} {:8} {:6} {:7} {:8}",
                depth,
                states,
                self.terminal.get(&depth).copied().unwrap_or(0),
                self.tthits.get(&depth).copied().unwrap_or(0),
                self.winning.get(&depth).copied().unwrap_or(0),
                self.branches.get(&depth).copied().unwrap_or(0),
            );
        }
        out
    }
}

/// Everything produced by a solve: the proof, the principal variation
/// and the statistics.
#[derive(Clone, Debug, Default)]
pub struct SolutionSet {
    pub proof: Bitset,
    pub moves_to_connection: u32,
    pub pv: Vec<HexPoint>,
    pub stats: BranchStatistics,
}

#[derive(Clone, Copy, Debug)]
pub struct SolverConfig {
    /// Solve split positions one side at a time, composing proofs.
    pub use_decompositions: bool,
    /// Depth up to which the current variation is logged.
    pub progress_depth: u32,
    /// Depth up to which the board is dumped to the log.
    pub update_depth: u32,
    /// Shrink proofs with fill-in before storing them.
    pub shrink_proofs: bool,
    /// Keep inferior-cell info across undo.
    pub backup_ice_info: bool,
    /// Bitfield of `ORDER_*` flags.
    pub move_ordering: u32,
    /// Re-solve the root even when it is already stored.
    pub solve_root_again: bool,
    pub depth_limit: Option<u32>,
    pub time_limit: Option<Duration>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            use_decompositions: false,
            progress_depth: 0,
            update_depth: 4,
            shrink_proofs: true,
            backup_ice_info: true,
            move_ordering: ORDER_WITH_MUSTPLAY | ORDER_FROM_CENTER,
            solve_root_again: false,
            depth_limit: None,
            time_limit: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct GlobalStatistics {
    /// Times a move was played on the full board.
    played: u64,
}

pub struct DfsSolver {
    pub config: SolverConfig,
    abort_flag: Arc<AtomicBool>,
    aborted: bool,
    start_time: Instant,
    /// The position without fill-in; its hash keys the stores.
    clean: Option<StoneBoard>,
    statistics: GlobalStatistics,
    histogram: Histogram,
}

impl DfsSolver {
    pub fn new(config: SolverConfig) -> DfsSolver {
        DfsSolver {
            config,
            abort_flag: Arc::new(AtomicBool::new(false)),
            aborted: false,
            start_time: Instant::now(),
            clean: None,
            statistics: GlobalStatistics::default(),
            histogram: Histogram::default(),
        }
    }

    /// Shared flag that cancels the search from outside; every node entry
    /// polls it.
    pub fn abort_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.abort_flag)
    }

    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    /// Determines the winner of the position in `brd` with `to_play` to
    /// move. Stores solved subpositions in `positions`.
    pub fn solve(
        &mut self,
        brd: &mut HexBoard,
        to_play: Color,
        positions: &mut SolverDb,
    ) -> (SolveResult, SolutionSet) {
        self.aborted = false;
        self.abort_flag.store(false, Ordering::Relaxed);
        self.start_time = Instant::now();
        self.statistics = GlobalStatistics::default();
        self.histogram = Histogram::default();

        brd.config.backup_ice_info = self.config.backup_ice_info;
        brd.compute_all(to_play);
        let mut clean = brd.stones().clone();
        clean.clear_fillin();
        self.clean = Some(clean);

        let mut solution = SolutionSet::default();
        let mut variation = Vec::new();
        let win = self.solve_state(brd, positions, to_play, &mut variation, &mut solution);
        let elapsed = self.start_time.elapsed();

        if self.aborted {
            info!("solver: aborted after {:.1?}", elapsed);
            return (SolveResult::Unknown, solution);
        }
        self.dump_stats(&solution, elapsed);
        let result = if win {
            SolveResult::Win
        } else {
            SolveResult::Loss
        };
        (result, solution)
    }

    fn check_abort(&mut self) -> bool {
        if self.aborted {
            return true;
        }
        if self.abort_flag.load(Ordering::Relaxed) {
            info!("solver: abort requested");
            self.aborted = true;
            return true;
        }
        if let Some(limit) = self.config.time_limit {
            if self.start_time.elapsed() > limit {
                info!("solver: time limit reached");
                self.aborted = true;
                return true;
            }
        }
        false
    }

    fn clean_board(&self) -> &StoneBoard {
        self.clean.as_ref().expect("solve() initializes the mirror")
    }

    fn play(&mut self, brd: &mut HexBoard, color: Color, cell: HexPoint) {
        self.statistics.played += 1;
        let on_board = brd.play_move(color, cell);
        let on_clean = self
            .clean
            .as_mut()
            .map(|clean| clean.play_move(color, cell))
            .unwrap_or(Ok(()));
        if on_board.is_err() || on_clean.is_err() {
            // Board and mirror disagree; the state is not trustworthy.
            warn!("solver: inconsistent state playing {}, aborting", cell.index());
            self.aborted = true;
        }
    }

    fn undo(&mut self, brd: &mut HexBoard, color: Color, cell: HexPoint) {
        brd.undo_move();
        if let Some(clean) = self.clean.as_mut() {
            clean.undo_move(color, cell);
        }
    }

    /// Solves the current state for `color`; dispatches decompositions,
    /// shrinks and stores the proof on the way out.
    fn solve_state(
        &mut self,
        brd: &mut HexBoard,
        positions: &mut SolverDb,
        color: Color,
        variation: &mut Vec<HexPoint>,
        solution: &mut SolutionSet,
    ) -> bool {
        if self.check_abort() {
            return false;
        }
        let depth = variation.len() as u32;
        if self
            .config
            .depth_limit
            .map_or(false, |limit| depth >= limit)
        {
            self.aborted = true;
            return false;
        }
        if depth <= self.config.progress_depth && depth > 0 {
            info!("solver: {}", self.format_variation(brd, variation));
        }
        if depth <= self.config.update_depth {
            debug!("solver: depth {}\n{:?}", depth, brd.stones());
        }

        solution.stats.explored_states += 1;
        solution.stats.total_states += 1;
        Histogram::bump(&mut self.histogram.states, depth, 1);

        if let Some(win) = self.handle_leaf_node(brd, positions, color, depth, solution) {
            solution.stats.minimal_explored += 1;
            return win;
        }

        if self.config.use_decompositions {
            if let Some(decomposition) = brd.decomposition(!color) {
                solution.stats.decompositions += 1;
                let win = self.solve_decomposition(
                    brd,
                    positions,
                    color,
                    variation,
                    solution,
                    decomposition,
                );
                if self.aborted {
                    return false;
                }
                if win {
                    solution.stats.decompositions_won += 1;
                }
                self.handle_proof(brd, positions, color, win, solution);
                return win;
            }
        }

        let win = self.solve_interior_state(brd, positions, color, variation, solution);
        if !self.aborted {
            self.handle_proof(brd, positions, color, win, solution);
        }
        win
    }

    /// Terminal and transposition checks. `Some(win)` ends the node.
    fn handle_leaf_node(
        &mut self,
        brd: &HexBoard,
        positions: &mut SolverDb,
        color: Color,
        depth: u32,
        solution: &mut SolutionSet,
    ) -> Option<bool> {
        if let Some(win) = handle_terminal_node(brd, color, solution) {
            Histogram::bump(&mut self.histogram.terminal, depth, 1);
            return Some(win);
        }
        let root_node = depth == 0;
        if root_node && self.config.solve_root_again {
            return None;
        }
        if let Some((data, proof)) = positions.get(self.clean_board(), color) {
            Histogram::bump(&mut self.histogram.tthits, depth, 1);
            solution.moves_to_connection = data.nu_moves as u32;
            solution.pv.clear();
            if data.best_move != NO_MOVE {
                solution.pv.push(data.best_move);
            }
            let winner = if data.win { color } else { !color };
            solution.proof = proof.unwrap_or_else(|| default_proof_for_winner(brd, winner));
            return Some(data.win);
        }
        None
    }

    /// The mustplay-restricted expansion loop.
    fn solve_interior_state(
        &mut self,
        brd: &mut HexBoard,
        positions: &mut SolverDb,
        color: Color,
        variation: &mut Vec<HexPoint>,
        solution: &mut SolutionSet,
    ) -> bool {
        let depth = variation.len() as u32;
        solution.stats.expanded_states += 1;

        let initial_mustplay = mustplay(brd, color);
        Histogram::bump(
            &mut self.histogram.mustplay,
            depth,
            initial_mustplay.count() as u64,
        );

        // Losing proof starts from the opponent's winning-semi carriers.
        solution.proof = initial_proof(brd, color);

        let mut moves = Vec::new();
        let found_win = self.order_moves(
            brd,
            positions,
            color,
            initial_mustplay,
            depth,
            solution,
            &mut moves,
        );
        if self.aborted {
            return false;
        }
        solution.stats.moves_to_consider += moves.len() as u64;
        if found_win {
            solution.stats.winning_expanded += 1;
            solution.stats.branches_to_win += 1;
            solution.stats.minimal_explored += 1;
            Histogram::bump(&mut self.histogram.winning, depth, 1);
            Histogram::bump(&mut self.histogram.branches, depth, 1);
            return true;
        }

        let mut minimal_children = 0;
        let mut states_under_losing = 0;
        let mut index = 0;
        while index < moves.len() {
            let mv = moves[index];
            self.play(brd, color, mv);
            variation.push(mv);
            let mut child = SolutionSet::default();
            let child_win = self.solve_state(brd, positions, !color, variation, &mut child);
            variation.pop();
            self.undo(brd, color, mv);
            if self.aborted {
                return false;
            }

            solution.stats.total_states += child.stats.total_states;
            solution.stats.explored_states += child.stats.explored_states;
            solution.stats.expanded_states += child.stats.expanded_states;
            solution.stats.decompositions += child.stats.decompositions;
            solution.stats.decompositions_won += child.stats.decompositions_won;
            solution.stats.moves_to_consider += child.stats.moves_to_consider;
            solution.stats.winning_expanded += child.stats.winning_expanded;
            solution.stats.branches_to_win += child.stats.branches_to_win;
            solution.stats.pruned += child.stats.pruned;
            solution.stats.shrunk += child.stats.shrunk;
            solution.stats.cells_removed += child.stats.cells_removed;
            minimal_children += child.stats.minimal_explored;

            if !child_win {
                // The opponent loses after `mv`: a win here.
                solution.pv = std::iter::once(mv).chain(child.pv).collect();
                solution.proof = child.proof.set(mv);
                solution.moves_to_connection = child.moves_to_connection + 1;
                solution.stats.minimal_explored += child.stats.minimal_explored + 1;
                solution.stats.winning_expanded += 1;
                solution.stats.branches_to_win += index as u64 + 1;
                Histogram::bump(&mut self.histogram.winning, depth, 1);
                Histogram::bump(&mut self.histogram.branches, depth, index as u64 + 1);
                Histogram::bump(
                    &mut self.histogram.states_under_losing,
                    depth,
                    states_under_losing,
                );
                return true;
            }

            states_under_losing += child.stats.explored_states;
            solution.proof |= child.proof;
            solution.moves_to_connection =
                solution.moves_to_connection.max(child.moves_to_connection + 1);

            // Every later candidate outside the child's proof loses to
            // the very same opponent strategy.
            let before = moves.len();
            let keep = index + 1;
            moves.truncate_from_filtered(keep, |m| child.proof.get(m));
            solution.stats.pruned += (before - moves.len()) as u64;
            index += 1;
        }

        solution.stats.minimal_explored += minimal_children + 1;
        solution.proof |= initial_mustplay;
        false
    }

    /// Orders `mustplay` candidates; may shortcut on a proven win. Losing
    /// candidates found along the way are dropped with their proofs
    /// folded into `solution.proof`.
    #[allow(clippy::too_many_arguments)]
    fn order_moves(
        &mut self,
        brd: &mut HexBoard,
        positions: &mut SolverDb,
        color: Color,
        initial_mustplay: Bitset,
        depth: u32,
        solution: &mut SolutionSet,
        moves_out: &mut Vec<HexPoint>,
    ) -> bool {
        let consider = moves_to_consider(brd, initial_mustplay);
        let with_mustplay = self.config.move_ordering & ORDER_WITH_MUSTPLAY != 0;
        let with_resist = self.config.move_ordering & ORDER_WITH_RESIST != 0;
        let from_center = self.config.move_ordering & ORDER_FROM_CENTER != 0;

        let mut scored: Vec<(MoveScore, HexPoint)> = Vec::new();
        for mv in consider {
            let mut score = MoveScore {
                mustplay_size: 0,
                neg_resist: 0,
                center_dist: 0,
            };
            if from_center {
                score.center_dist = center_key(brd, mv);
            }
            if with_mustplay || with_resist {
                self.play(brd, color, mv);
                if self.aborted {
                    return false;
                }
                let probe = self.probe_child(brd, positions, color, depth);
                if with_resist {
                    score.neg_resist =
                        -crate::resistance::resistance_score(brd.stones(), color);
                }
                self.undo(brd, color, mv);
                match probe {
                    Probe::Win(child_proof) => {
                        solution.pv = vec![mv];
                        solution.proof = child_proof.set(mv);
                        solution.moves_to_connection = 1;
                        moves_out.clear();
                        moves_out.push(mv);
                        return true;
                    }
                    Probe::Loss(child_proof) => {
                        solution.proof |= child_proof;
                        solution.stats.pruned += 1;
                        continue;
                    }
                    Probe::Open(mustplay_size) => {
                        if with_mustplay {
                            score.mustplay_size = mustplay_size;
                        }
                    }
                }
            }
            scored.push((score, mv));
        }
        scored.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        moves_out.extend(scored.into_iter().map(|(_, mv)| mv));
        false
    }

    /// Inspects the child position during ordering: a settled result, or
    /// the opponent's mustplay size.
    fn probe_child(
        &mut self,
        brd: &HexBoard,
        positions: &mut SolverDb,
        color: Color,
        depth: u32,
    ) -> Probe {
        // We just played; the opponent is to move in the child.
        if brd.winner() == Some(color) || !brd.cons(color).winning_fulls().is_empty() {
            let carrier = brd
                .cons(color)
                .smallest_winning_full()
                .unwrap_or_default();
            return Probe::Win(carrier | winner_cells(brd, color));
        }
        if let Some((data, proof)) = positions.get(self.clean_board(), !color) {
            Histogram::bump(&mut self.histogram.tthits, depth + 1, 1);
            let winner = if data.win { !color } else { color };
            let proof = proof.unwrap_or_else(|| default_proof_for_winner(brd, winner));
            return if data.win {
                Probe::Loss(proof)
            } else {
                Probe::Win(proof)
            };
        }
        if let Some(semi) = brd.cons(!color).smallest_winning_semi() {
            // The opponent moves next and already has a winning semi.
            return Probe::Loss(semi.carrier | winner_cells(brd, !color));
        }
        let carrier = brd.cons(color).mustplay_carrier() & brd.stones().empty();
        let size = if carrier.is_empty() {
            brd.stones().empty().count()
        } else {
            carrier.count()
        };
        Probe::Open(size)
    }

    /// Splits the position along an opponent chain: winning either side
    /// against a worst-case fill of the other wins the whole position.
    fn solve_decomposition(
        &mut self,
        brd: &mut HexBoard,
        positions: &mut SolverDb,
        color: Color,
        variation: &mut Vec<HexPoint>,
        solution: &mut SolutionSet,
        decomposition: Decomposition,
    ) -> bool {
        let mut loss_proof = Bitset::empty();
        // Winning one side while the other is entirely the opponent's is
        // winning the whole position; losing both ways is a loss.
        for other in [decomposition.side_b, decomposition.side_a] {
            brd.play_stones(!color, other, color);
            let saved_clean = self.clean.clone();
            if let Some(clean) = self.clean.as_mut() {
                // The hypothetical stones are keyed into the stores as
                // real ones so subsolve entries cannot alias the parent
                // search.
                for cell in other {
                    if clean.play_move(!color, cell).is_err() {
                        self.aborted = true;
                    }
                }
            }
            let mut sub = SolutionSet::default();
            let win = self.solve_state(brd, positions, color, variation, &mut sub);
            brd.undo_move();
            self.clean = saved_clean;
            if self.aborted {
                return false;
            }
            solution.stats += sub.stats;
            if win {
                solution.pv = sub.pv;
                solution.moves_to_connection = sub.moves_to_connection;
                solution.proof = sub.proof | decomposition.carrier;
                return true;
            }
            loss_proof |= sub.proof;
        }
        solution.proof = loss_proof | decomposition.carrier;
        false
    }

    /// Optionally shrinks the proof, then stores the solved state.
    fn handle_proof(
        &mut self,
        brd: &HexBoard,
        positions: &mut SolverDb,
        color: Color,
        win: bool,
        solution: &mut SolutionSet,
    ) {
        if self.aborted {
            return;
        }
        let winner = if win { color } else { !color };
        if self.config.shrink_proofs {
            let shrunk = shrink_proof(
                solution.proof,
                self.clean_board(),
                !winner,
                brd.ice(),
            );
            if shrunk.count() < solution.proof.count() {
                solution.stats.shrunk += 1;
                solution.stats.cells_removed +=
                    (solution.proof.count() - shrunk.count()) as u64;
                debug_assert!(shrunk.is_subset_of(solution.proof));
                solution.proof = shrunk;
            }
        }
        let data = DfsData {
            win,
            nu_moves: solution.moves_to_connection.min(u16::MAX as u32) as u16,
            best_move: solution.pv.first().copied().unwrap_or(NO_MOVE),
            num_states: solution.stats.explored_states,
        };
        positions.put(self.clean_board(), color, data, Some(solution.proof));
    }

    fn format_variation(&self, brd: &HexBoard, variation: &[HexPoint]) -> String {
        variation
            .iter()
            .map(|p| brd.const_board().point_to_string(*p))
            .collect::<Vec<String>>()
            .join(" ")
    }

    fn dump_stats(&self, solution: &SolutionSet, elapsed: Duration) {
        let stats = &solution.stats;
        info!(
            "solver: {} explored ({} expanded, {} minimal) in {:.1?}, {} played",
            stats.explored_states,
            stats.expanded_states,
            stats.minimal_explored,
            elapsed,
            self.statistics.played,
        );
        debug!(
            "solver: {} pruned, {} decompositions ({} won), {} proofs shrunk ({} cells)",
            stats.pruned,
            stats.decompositions,
            stats.decompositions_won,
            stats.shrunk,
            stats.cells_removed,
        );
        debug!("solver histogram:\n{}", self.histogram.dump());
    }
}

enum Probe {
    Win(Bitset),
    Loss(Bitset),
    Open(u32),
}

/// Interior cells of the winner's color, fill-in included.
fn winner_cells(brd: &HexBoard, winner: Color) -> Bitset {
    brd.stones().color(winner) & brd.const_board().cells()
}

/// Winner's stones plus all empties: the proof of last resort, used for
/// transposition hits stored without one.
pub fn default_proof_for_winner(brd: &HexBoard, winner: Color) -> Bitset {
    winner_cells(brd, winner) | brd.stones().empty()
}

/// Union of the opponent's winning semi carriers plus their stones; the
/// base of any losing proof here.
fn initial_proof(brd: &HexBoard, color: Color) -> Bitset {
    brd.cons(!color).mustplay_carrier() | winner_cells(brd, !color)
}

/// Solid-chain, connection and no-moves-left terminal checks.
fn handle_terminal_node(brd: &HexBoard, color: Color, solution: &mut SolutionSet) -> Option<bool> {
    solution.moves_to_connection = 0;
    solution.pv.clear();

    if brd.winner() == Some(color) {
        solution.proof = winner_cells(brd, color);
        return Some(true);
    }
    if let Some(carrier) = brd.cons(color).smallest_winning_full() {
        solution.proof = carrier | winner_cells(brd, color);
        return Some(true);
    }
    if let Some(semi) = brd.cons(color).smallest_winning_semi() {
        // To move with a winning semi: play its key and hold the full.
        solution.proof = semi.carrier | winner_cells(brd, color);
        solution.pv.push(semi.key);
        solution.moves_to_connection = 1;
        return Some(true);
    }

    if brd.winner() == Some(!color) {
        solution.proof = winner_cells(brd, !color);
        return Some(false);
    }
    if let Some(carrier) = brd.cons(!color).smallest_winning_full() {
        solution.proof = carrier | winner_cells(brd, !color);
        return Some(false);
    }
    if brd.stones().empty().is_empty() {
        // Dead fill-in can exhaust the board without a chain; nothing
        // left to play is a loss.
        solution.proof = winner_cells(brd, !color);
        return Some(false);
    }
    None
}

/// Gives all cells outside the proof to the loser, reruns fill-in, and
/// drops every proof cell the fill-in reclaimed.
pub fn shrink_proof(
    proof: Bitset,
    clean: &StoneBoard,
    loser: Color,
    ice: &IceEngine,
) -> Bitset {
    let mut board = clean.clone();
    let outside = board.empty() - proof;
    if outside.is_empty() {
        return proof;
    }
    board.play_stones(loser, outside);
    let mut groups = Groups::build(&board);
    let mut inf = InferiorCells::default();
    ice.compute_fillin(loser, &mut board, &mut groups, &mut inf, ColorSet::ALL);
    proof - inf.all_fillin()
}

trait TruncateFiltered {
    fn truncate_from_filtered(&mut self, from: usize, keep: impl FnMut(HexPoint) -> bool);
}

impl TruncateFiltered for Vec<HexPoint> {
    /// Retains the prefix `..from` untouched and filters the tail.
    fn truncate_from_filtered(&mut self, from: usize, mut keep: impl FnMut(HexPoint) -> bool) {
        let mut kept = from;
        for i in from..self.len() {
            if keep(self[i]) {
                self[kept] = self[i];
                kept += 1;
            }
        }
        self.truncate(kept);
    }
}
