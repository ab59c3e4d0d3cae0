//! Inferior cell engine: proves empty cells dead, captured, permanently
//! inferior, vulnerable, reversible or dominated, and paints the provable
//! fill-in into the stone board.

use std::path::Path;
use std::time::Instant;

use arrayvec::ArrayVec;
use board_game_traits::Color;
use log::{debug, warn};

use crate::board::bitset::Bitset;
use crate::board::cell::HexPoint;
use crate::board::constants::ConstBoard;
use crate::board::groups::Groups;
use crate::board::stones::{CellState, Fill, StoneBoard};
use crate::pattern::{self, MatchMode, Patterns};

/// A killer reply with the cells that must stay empty for it to work.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VulnerableKiller {
    pub killer: HexPoint,
    pub carrier: Bitset,
}

/// Subset of {Black, White} a fill-in pass may capture for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorSet {
    black: bool,
    white: bool,
}

impl ColorSet {
    pub const ALL: ColorSet = ColorSet {
        black: true,
        white: true,
    };

    pub const NONE: ColorSet = ColorSet {
        black: false,
        white: false,
    };

    pub fn only(color: Color) -> ColorSet {
        match color {
            Color::Black => ColorSet {
                black: true,
                white: false,
            },
            Color::White => ColorSet {
                black: false,
                white: true,
            },
        }
    }

    pub fn contains(self, color: Color) -> bool {
        match color {
            Color::Black => self.black,
            Color::White => self.white,
        }
    }
}

/// Inferior-cell annotations for one board state.
#[derive(Clone, Debug, Default)]
pub struct InferiorCells {
    dead: Bitset,
    captured: [Bitset; 2],
    perm_inf: [Bitset; 2],
    perm_inf_carrier: [Bitset; 2],
    vulnerable: Vec<(HexPoint, VulnerableKiller)>,
    reversible: Vec<(HexPoint, HexPoint)>,
    dominated: Vec<(HexPoint, HexPoint)>,
}

impl InferiorCells {
    pub fn clear(&mut self) {
        *self = InferiorCells::default();
    }

    pub fn dead(&self) -> Bitset {
        self.dead
    }

    pub fn add_dead(&mut self, cells: Bitset) {
        self.dead |= cells;
        debug_assert!(!self.dead.intersects(self.captured[0] | self.captured[1]));
    }

    pub fn captured(&self, color: Color) -> Bitset {
        self.captured[color.disc()]
    }

    pub fn add_captured(&mut self, color: Color, cells: Bitset) {
        self.captured[color.disc()] |= cells;
        debug_assert!(!self.captured[0].intersects(self.captured[1]));
    }

    pub fn perm_inf(&self, color: Color) -> Bitset {
        self.perm_inf[color.disc()]
    }

    pub fn perm_inf_carrier(&self, color: Color) -> Bitset {
        self.perm_inf_carrier[color.disc()]
    }

    pub fn add_perm_inf(&mut self, color: Color, cells: Bitset, carrier: Bitset) {
        self.perm_inf[color.disc()] |= cells;
        self.perm_inf_carrier[color.disc()] |= carrier;
    }

    /// Captured and permanently-inferior fill-in for `color`.
    pub fn fillin(&self, color: Color) -> Bitset {
        self.captured[color.disc()] | self.perm_inf[color.disc()]
    }

    pub fn all_fillin(&self) -> Bitset {
        self.dead | self.fillin(Color::Black) | self.fillin(Color::White)
    }

    pub fn vulnerable(&self) -> Bitset {
        let mut cells = Bitset::empty();
        for (cell, _) in &self.vulnerable {
            cells.insert(*cell);
        }
        cells
    }

    pub fn add_vulnerable(&mut self, cell: HexPoint, killer: VulnerableKiller) {
        if !self
            .vulnerable
            .iter()
            .any(|(c, k)| *c == cell && *k == killer)
        {
            self.vulnerable.push((cell, killer));
        }
    }

    pub fn clear_vulnerable(&mut self) {
        self.vulnerable.clear();
    }

    pub fn killers_of(&self, cell: HexPoint) -> impl Iterator<Item = &VulnerableKiller> {
        self.vulnerable
            .iter()
            .filter(move |(c, _)| *c == cell)
            .map(|(_, k)| k)
    }

    pub fn reversible(&self) -> Bitset {
        let mut cells = Bitset::empty();
        for (cell, _) in &self.reversible {
            cells.insert(*cell);
        }
        cells
    }

    pub fn add_reversible(&mut self, cell: HexPoint, reverser: HexPoint) {
        if !self.reversible.contains(&(cell, reverser)) {
            self.reversible.push((cell, reverser));
        }
    }

    pub fn clear_reversible(&mut self) {
        self.reversible.clear();
    }

    pub fn dominated(&self) -> Bitset {
        let mut cells = Bitset::empty();
        for (cell, _) in &self.dominated {
            cells.insert(*cell);
        }
        cells
    }

    pub fn dominators_of(&self, cell: HexPoint) -> Bitset {
        let mut out = Bitset::empty();
        for (c, d) in &self.dominated {
            if *c == cell {
                out.insert(*d);
            }
        }
        out
    }

    pub fn add_dominated(&mut self, cell: HexPoint, dominator: HexPoint) {
        if !self.dominated.contains(&(cell, dominator)) {
            self.dominated.push((cell, dominator));
        }
    }

    pub fn clear_dominated(&mut self) {
        self.dominated.clear();
    }

    /// Drops move-relative annotations whose cell is no longer empty;
    /// late fill-in may have claimed them.
    pub fn prune_to_empty(&mut self, empty: Bitset) {
        self.vulnerable.retain(|(c, _)| empty.get(*c));
        self.reversible.retain(|(c, _)| empty.get(*c));
        self.dominated.retain(|(c, _)| empty.get(*c));
    }

    /// Mutually-killing vulnerable pairs with empty carriers; such a pair
    /// is captured by the opponent of the vulnerable color.
    pub fn find_presimplicial_pairs(&self) -> Bitset {
        let mut captured = Bitset::empty();
        for (v, vk) in &self.vulnerable {
            if captured.get(*v) || !vk.carrier.is_empty() || captured.get(vk.killer) {
                continue;
            }
            let k = vk.killer;
            let reciprocal = self
                .vulnerable
                .iter()
                .any(|(c, ck)| *c == k && ck.killer == *v && ck.carrier.is_empty());
            if reciprocal {
                captured.insert(*v);
                captured.insert(k);
            }
        }
        captured
    }

    /// Folds a newly computed set into an accumulated one: fill-in is
    /// added, the move-relative annotations are replaced.
    pub fn merge_update(&mut self, new: &InferiorCells) {
        self.vulnerable = new.vulnerable.clone();
        self.reversible = new.reversible.clone();
        self.dominated = new.dominated.clone();
        for color in [Color::Black, Color::White] {
            self.captured[color.disc()] |= new.captured[color.disc()];
            self.perm_inf[color.disc()] |= new.perm_inf[color.disc()];
            self.perm_inf_carrier[color.disc()] |= new.perm_inf_carrier[color.disc()];
        }
        self.dead |= new.dead;
    }
}

/// Engine configuration; defaults match the reference behavior.
#[derive(Clone, Copy, Debug)]
pub struct IceConfig {
    pub find_presimplicial_pairs: bool,
    pub find_permanently_inferior: bool,
    pub find_all_pattern_killers: bool,
    pub find_all_pattern_reversers: bool,
    pub find_all_pattern_dominators: bool,
    pub use_hand_patterns: bool,
    pub backup_opponent_dead: bool,
    pub find_three_sided_dead_regions: bool,
    pub iterative_dead_regions: bool,
}

impl Default for IceConfig {
    fn default() -> Self {
        IceConfig {
            find_presimplicial_pairs: true,
            find_permanently_inferior: true,
            find_all_pattern_killers: true,
            find_all_pattern_reversers: false,
            find_all_pattern_dominators: false,
            use_hand_patterns: true,
            backup_opponent_dead: false,
            find_three_sided_dead_regions: false,
            iterative_dead_regions: false,
        }
    }
}

pub struct IceEngine {
    pub config: IceConfig,
    patterns: Patterns,
}

impl IceEngine {
    pub fn new(config: IceConfig) -> IceEngine {
        let patterns = if config.use_hand_patterns {
            Patterns::hand_coded()
        } else {
            Patterns::default()
        };
        debug!("ice: {} patterns loaded", patterns.len());
        IceEngine { config, patterns }
    }

    /// Builds the engine with an additional pattern file. A missing or
    /// unreadable file degrades to the built-in table and graph rules.
    pub fn with_pattern_file(config: IceConfig, path: &Path) -> IceEngine {
        let mut engine = IceEngine::new(config);
        match Patterns::load(path) {
            Ok(loaded) => {
                debug!("ice: {} patterns from {}", loaded.len(), path.display());
                engine.patterns.merge(loaded);
            }
            Err(err) => {
                warn!(
                    "ice: no pattern file at {} ({}), using graph rules and the hand table only",
                    path.display(),
                    err
                );
            }
        }
        engine
    }

    pub fn patterns(&self) -> &Patterns {
        &self.patterns
    }

    /// Alternates pattern-based dead and per-color captured detection,
    /// painting hits into the board, until neither finds anything.
    fn compute_dead_captured(
        &self,
        stones: &mut StoneBoard,
        groups: &mut Groups,
        inf: &mut InferiorCells,
        colors: ColorSet,
    ) -> u32 {
        let mut count = 0;
        loop {
            loop {
                let dead = pattern::match_board(stones, self.patterns.dead(), stones.empty());
                if dead.is_empty() {
                    break;
                }
                count += dead.count();
                inf.add_dead(dead);
                stones.add_fillin(Fill::Dead, dead);
            }

            let mut found_captured = false;
            for color in [Color::Black, Color::White] {
                if !colors.contains(color) {
                    continue;
                }
                let captured = self.find_captured(stones, color);
                if captured.any() {
                    count += captured.count();
                    inf.add_captured(color, captured);
                    stones.add_fillin(Fill::Stone(color), captured);
                    found_captured = true;
                    break;
                }
            }
            if !found_captured {
                break;
            }
        }
        if count > 0 {
            *groups = Groups::build(stones);
        }
        count
    }

    /// Pattern-captured cells together with their carriers, skipping hits
    /// whose carrier collides with captures already taken this pass.
    fn find_captured(&self, stones: &StoneBoard, color: Color) -> Bitset {
        let mut captured = Bitset::empty();
        for p in stones.empty() {
            if captured.get(p) {
                continue;
            }
            let hits = pattern::match_cell(
                stones,
                self.patterns.captured(color),
                p,
                MatchMode::StopAtFirstHit,
            );
            if let Some(hit) = hits.first() {
                let carrier = hit.carrier.set(p);
                if !carrier.intersects(captured) {
                    captured |= carrier;
                }
            }
        }
        captured
    }

    fn fillin_permanently_inferior(
        &self,
        stones: &mut StoneBoard,
        groups: &mut Groups,
        color: Color,
        inf: &mut InferiorCells,
        colors: ColorSet,
    ) -> u32 {
        if !self.config.find_permanently_inferior || !colors.contains(color) {
            return 0;
        }
        let mut perm = Bitset::empty();
        let mut carrier = Bitset::empty();
        for p in stones.empty() {
            let hits = pattern::match_cell(
                stones,
                self.patterns.perm_inf(color),
                p,
                MatchMode::StopAtFirstHit,
            );
            if let Some(hit) = hits.first() {
                perm.insert(p);
                carrier |= hit.carrier;
            }
        }
        if perm.any() {
            inf.add_perm_inf(color, perm, carrier);
            stones.add_fillin(Fill::Stone(color), perm);
            *groups = Groups::build(stones);
        }
        perm.count()
    }

    /// Graph- and pattern-based vulnerable detection for `color`,
    /// filling in presimplicial pairs for the opponent.
    fn fill_in_vulnerable(
        &self,
        color: Color,
        stones: &mut StoneBoard,
        groups: &mut Groups,
        inf: &mut InferiorCells,
        colors: ColorSet,
    ) -> u32 {
        let mut count = 0;
        inf.clear_vulnerable();

        count += use_graph_theory_to_find_dead_vulnerable(color, stones, groups, inf);

        let mode = if self.config.find_all_pattern_killers {
            MatchMode::MatchAll
        } else {
            MatchMode::StopAtFirstHit
        };
        let consider = stones.empty() - inf.dead();
        for p in consider {
            for hit in pattern::match_cell(stones, self.patterns.vulnerable(color), p, mode) {
                if let Some(killer) = hit.killer {
                    inf.add_vulnerable(
                        p,
                        VulnerableKiller {
                            killer,
                            carrier: hit.carrier,
                        },
                    );
                }
            }
        }

        if self.config.find_presimplicial_pairs && colors.contains(!color) {
            let captured = inf.find_presimplicial_pairs();
            if captured.any() {
                inf.add_captured(!color, captured);
                stones.add_fillin(Fill::Stone(!color), captured);
                *groups = Groups::build(stones);
            }
            count += captured.count();
        }
        count
    }

    fn fill_in_unreachable(
        &self,
        stones: &mut StoneBoard,
        groups: &mut Groups,
        inf: &mut InferiorCells,
    ) -> u32 {
        let mut not_reachable = compute_dead_regions(stones, groups);
        if self.config.find_three_sided_dead_regions {
            not_reachable |= find_three_set_cliques(stones, groups);
        }
        if not_reachable.any() {
            inf.add_dead(not_reachable);
            stones.add_fillin(Fill::Dead, not_reachable);
            *groups = Groups::build(stones);
        }
        not_reachable.count()
    }

    /// Iterates all fill-in rules to a fixpoint. The final fill-in set is
    /// independent of rule order.
    pub fn compute_fillin(
        &self,
        to_play: Color,
        stones: &mut StoneBoard,
        groups: &mut Groups,
        out: &mut InferiorCells,
        colors: ColorSet,
    ) {
        out.clear();
        loop {
            let mut count = 0;
            count += self.compute_dead_captured(stones, groups, out, colors);
            count += self.fillin_permanently_inferior(stones, groups, to_play, out, colors);
            count += self.fillin_permanently_inferior(stones, groups, !to_play, out, colors);
            count += self.fill_in_vulnerable(!to_play, stones, groups, out, colors);
            count += self.fill_in_vulnerable(to_play, stones, groups, out, colors);
            if self.config.iterative_dead_regions {
                count += self.fill_in_unreachable(stones, groups, out);
            }
            if count == 0 {
                break;
            }
        }
        if !self.config.iterative_dead_regions {
            self.fill_in_unreachable(stones, groups, out);
        }
        out.prune_to_empty(stones.empty());
    }

    /// Full analysis for one position: fill-in plus reversible/dominated
    /// annotations on the remaining empties. The played-stone hash is
    /// unchanged by construction.
    pub fn compute_inferior_cells(
        &self,
        to_play: Color,
        stones: &mut StoneBoard,
        groups: &mut Groups,
        out: &mut InferiorCells,
    ) {
        let start = Instant::now();
        #[cfg(debug_assertions)]
        let old_hash = stones.hash();

        self.compute_fillin(to_play, stones, groups, out, ColorSet::ALL);

        let mode = if self.config.find_all_pattern_reversers {
            MatchMode::MatchAll
        } else {
            MatchMode::StopAtFirstHit
        };
        let consider = stones.empty() - out.vulnerable();
        for p in consider {
            for hit in pattern::match_cell(stones, self.patterns.reversible(to_play), p, mode) {
                if let Some(reverser) = hit.killer {
                    out.add_reversible(p, reverser);
                    for cell in hit.carrier & consider {
                        out.add_reversible(cell, reverser);
                    }
                }
            }
        }

        let mode = if self.config.find_all_pattern_dominators {
            MatchMode::MatchAll
        } else {
            MatchMode::StopAtFirstHit
        };
        let consider = stones.empty() - out.vulnerable() - out.reversible();
        for p in consider {
            for hit in pattern::match_cell(stones, self.patterns.dominated(to_play), p, mode) {
                if let Some(dominator) = hit.killer {
                    out.add_dominated(p, dominator);
                }
            }
        }

        if self.config.backup_opponent_dead {
            let found = self.backup_opponent_dead(to_play, stones, out);
            if found > 0 {
                debug!("ice: {} cells vulnerable to opponent moves", found);
            }
        }

        debug!(
            "ice: inferior cells in {:.1?} ({} filled)",
            start.elapsed(),
            out.all_fillin().count()
        );
        #[cfg(debug_assertions)]
        debug_assert_eq!(stones.hash(), old_hash);
    }

    /// Plays the opponent in every empty cell and reruns fill-in; a cell
    /// dead after such a move is vulnerable to it beforehand.
    fn backup_opponent_dead(
        &self,
        to_play: Color,
        stones: &StoneBoard,
        out: &mut InferiorCells,
    ) -> u32 {
        let already = out.vulnerable() | out.reversible() | out.dominated();
        let mut found = 0;
        for p in stones.empty() {
            let mut scratch = stones.clone();
            if scratch.play_move(!to_play, p).is_err() {
                continue;
            }
            let mut groups = Groups::build(&scratch);
            let mut inf = InferiorCells::default();
            self.compute_fillin(to_play, &mut scratch, &mut groups, &mut inf, ColorSet::ALL);
            let filled =
                inf.fillin(Color::Black) | inf.fillin(Color::White) | inf.dead();
            for d in inf.dead() {
                if !already.get(d) {
                    let carrier = filled.clear(d).clear(p);
                    out.add_vulnerable(d, VulnerableKiller { killer: p, carrier });
                    found += 1;
                }
            }
        }
        found
    }
}

/// Breadth-first reachability from `start` through `flow_set`, never
/// entering `stop_set`.
fn reachable_on_bitset(
    cb: &ConstBoard,
    flow_set: Bitset,
    stop_set: Bitset,
    start: HexPoint,
) -> Bitset {
    let mut reachable = Bitset::single(start);
    let mut frontier = ArrayVec::<HexPoint, { HexPoint::MAX_POINTS }>::new();
    frontier.push(start);
    while let Some(p) = frontier.pop() {
        for nb in cb.nbs(p) & flow_set - stop_set - reachable {
            reachable.insert(nb);
            frontier.push(nb);
        }
    }
    reachable
}

/// Empty cells unreachable from either of `color`'s edges through
/// non-opponent cells once `stop_set` is removed.
fn compute_edge_unreachable_regions(
    stones: &StoneBoard,
    color: Color,
    stop_set: Bitset,
    flow_from1: bool,
    flow_from2: bool,
) -> Bitset {
    let cb = stones.const_board();
    let flow_set = (stones.empty() | stones.color(color)) & cb.cells();
    let mut reachable = Bitset::empty();
    if flow_from1 {
        let edge = HexPoint::edge1(color);
        reachable |= reachable_on_bitset(cb, flow_set.set(edge), stop_set, edge);
    }
    if flow_from2 {
        let edge = HexPoint::edge2(color);
        reachable |= reachable_on_bitset(cb, flow_set.set(edge), stop_set, edge);
    }
    stones.empty() - reachable
}

/// Dead regions cut off by a single group's empty-neighbor clique.
/// Single-stone groups cannot isolate a region by themselves and are
/// skipped.
fn compute_dead_regions(stones: &StoneBoard, groups: &Groups) -> Bitset {
    if groups.is_game_over() {
        return stones.empty();
    }
    let mut dead = Bitset::empty();
    for group in groups.iter() {
        let color = match group.color() {
            Some(color) => color,
            None => continue,
        };
        if group.size() == 1 {
            continue;
        }
        let clique_cutset = group.nbs & stones.empty();
        dead |= compute_edge_unreachable_regions(
            stones,
            color,
            clique_cutset,
            group.captain != HexPoint::edge1(color),
            group.captain != HexPoint::edge2(color),
        );
    }
    debug_assert!(dead.is_subset_of(stones.empty()));
    dead
}

/// Captains of stone groups adjacent to `p`.
fn stone_group_nbs(stones: &StoneBoard, groups: &Groups, p: HexPoint) -> Bitset {
    let mut caps = Bitset::empty();
    for nb in stones.const_board().nbs(p) {
        if let CellState::Stone(_) = stones.state(nb) {
            caps.insert(groups.captain_of(nb));
        }
    }
    caps
}

/// Dead regions cut by a clique of two empty cells joined through shared
/// stone groups plus a third mutually adjacent empty cell.
fn find_type1_cliques(stones: &StoneBoard, groups: &Groups) -> Bitset {
    let cb = stones.const_board();
    let mut dead = Bitset::empty();
    let empty = stones.empty();

    for x in empty {
        for y in empty {
            if y >= x || cb.adjacent(x, y) {
                continue;
            }
            let xy_nbs = stone_group_nbs(stones, groups, x) & stone_group_nbs(stones, groups, y);
            if xy_nbs.is_empty() {
                continue;
            }
            for z in empty {
                if !cb.adjacent(x, z) || !cb.adjacent(y, z) {
                    continue;
                }
                let xy_exclusive = xy_nbs - stone_group_nbs(stones, groups, z);
                if xy_exclusive.is_empty() {
                    continue;
                }
                let clique = Bitset::single(x).set(y).set(z);
                if xy_exclusive.intersects(stones.color(Color::Black)) {
                    dead |= compute_edge_unreachable_regions(
                        stones,
                        Color::Black,
                        clique,
                        true,
                        true,
                    );
                }
                if xy_exclusive.intersects(stones.color(Color::White)) {
                    dead |= compute_edge_unreachable_regions(
                        stones,
                        Color::White,
                        clique,
                        true,
                        true,
                    );
                }
            }
        }
    }
    debug_assert!(dead.is_subset_of(empty));
    dead
}

/// Dead regions cut by two same-colored groups with common empty
/// neighbors plus two directly adjacent exclusive neighbors.
fn find_type2_cliques(stones: &StoneBoard, groups: &Groups) -> Bitset {
    let cb = stones.const_board();
    let mut dead = Bitset::empty();
    let empty = stones.empty();

    for color in [Color::Black, Color::White] {
        let group_list: Vec<&crate::board::groups::Group> = groups
            .of_color(color)
            .filter(|g| !g.captain.is_edge())
            .collect();
        for (i, g1) in group_list.iter().enumerate() {
            let g1_nbs = g1.nbs & empty;
            for g2 in group_list.iter().take(i) {
                let g2_nbs = g2.nbs & empty;
                let common = g1_nbs & g2_nbs;
                if common.is_empty() {
                    continue;
                }
                let g1_exclusive = g1_nbs - g2_nbs;
                let g2_exclusive = g2_nbs - g1_nbs;
                if g1_exclusive.is_empty() || g2_exclusive.is_empty() {
                    continue;
                }
                for x in g1_exclusive {
                    for y in g2_exclusive {
                        if !cb.adjacent(x, y) {
                            continue;
                        }
                        let clique = common.set(x).set(y);
                        dead |= compute_edge_unreachable_regions(
                            stones, color, clique, true, true,
                        );
                    }
                }
            }
        }
    }
    debug_assert!(dead.is_subset_of(empty));
    dead
}

/// Dead regions cut by the pairwise common empty neighbors of three
/// same-colored groups.
fn find_type3_cliques(stones: &StoneBoard, groups: &Groups) -> Bitset {
    let mut dead = Bitset::empty();
    let empty = stones.empty();

    for color in [Color::Black, Color::White] {
        let group_list: Vec<&crate::board::groups::Group> = groups
            .of_color(color)
            .filter(|g| !g.captain.is_edge())
            .collect();
        for (i, g1) in group_list.iter().enumerate() {
            let g1_nbs = g1.nbs & empty;
            for (j, g2) in group_list.iter().enumerate().take(i) {
                let g2_nbs = g2.nbs & empty;
                if (g1_nbs & g2_nbs).is_empty() {
                    continue;
                }
                for g3 in group_list.iter().take(j) {
                    let g3_nbs = g3.nbs & empty;
                    if (g1_nbs & g3_nbs).is_empty() || (g2_nbs & g3_nbs).is_empty() {
                        continue;
                    }
                    let clique =
                        (g1_nbs & g2_nbs) | (g1_nbs & g3_nbs) | (g2_nbs & g3_nbs);
                    dead |= compute_edge_unreachable_regions(stones, color, clique, true, true);
                }
            }
        }
    }
    debug_assert!(dead.is_subset_of(empty));
    dead
}

/// Union of the three clique-cutset searches. When the game is decided,
/// every empty cell is dead.
fn find_three_set_cliques(stones: &StoneBoard, groups: &Groups) -> Bitset {
    if groups.is_game_over() {
        return stones.empty();
    }
    find_type1_cliques(stones, groups) | find_type2_cliques(stones, groups)
        | find_type3_cliques(stones, groups)
}

/// True when the points form a clique, ignoring `exclude`.
fn is_clique(cb: &ConstBoard, points: Bitset, exclude: Option<HexPoint>) -> bool {
    for a in points {
        if Some(a) == exclude {
            continue;
        }
        for b in points {
            if b >= a || Some(b) == exclude {
                continue;
            }
            if !cb.adjacent(a, b) {
                return false;
            }
        }
    }
    true
}

/// Presimplicial analysis: collapses `color` groups onto their empty
/// neighborhoods and tests the reduced neighborhood of every empty cell
/// for being a clique (dead) or one removal away from one (vulnerable).
/// Found dead cells are painted into the board.
fn use_graph_theory_to_find_dead_vulnerable(
    color: Color,
    stones: &mut StoneBoard,
    groups: &mut Groups,
    inf: &mut InferiorCells,
) -> u32 {
    let cb = stones.const_board_arc();
    let empty = stones.empty();
    let adj_to_both_edges = (groups.nbs(HexPoint::edge1(color)) & empty)
        & (groups.nbs(HexPoint::edge2(color)) & empty);
    let consider = empty - adj_to_both_edges;
    let mut simplicial = Bitset::empty();

    for p in consider {
        let mut enbs = Bitset::empty();
        let mut cnbs = Bitset::empty();
        let mut empty_adj_to_group = Bitset::empty();
        let mut adj_to_edge = false;
        let mut edge_nbr = None;

        for nb in cb.nbs(p) {
            match stones.state(nb) {
                CellState::Empty => enbs.insert(nb),
                CellState::Stone(c) if c == color => {
                    let cap = groups.captain_of(nb);
                    let adj = (groups.nbs(cap) & stones.empty()).clear(p);
                    if cap.is_edge_of(color) {
                        debug_assert!(!adj_to_edge || edge_nbr == Some(cap));
                        adj_to_edge = true;
                        edge_nbr = Some(cap);
                        cnbs.insert(cap);
                        empty_adj_to_group |= adj;
                    } else if adj.count() == 1 {
                        enbs.insert(adj.first().unwrap());
                    } else if adj.count() >= 2 {
                        cnbs.insert(cap);
                        empty_adj_to_group |= adj;
                    }
                }
                _ => (),
            }
        }

        // Empty neighbors adjacent to a color group are covered by that
        // group's neighborhood already.
        enbs -= empty_adj_to_group;

        let entities = enbs.count() + cnbs.count();
        if entities <= 1 {
            simplicial.insert(p);
        } else if adj_to_edge || cnbs.count() >= 2 {
            if enbs.count() >= 2 {
                continue;
            }
            if cnbs.count() == 1 {
                debug_assert!(adj_to_edge && enbs.count() == 1);
                if let Some(killer) = enbs.first() {
                    inf.add_vulnerable(
                        p,
                        VulnerableKiller {
                            killer,
                            carrier: Bitset::empty(),
                        },
                    );
                }
            } else {
                let mut killers = Bitset::empty();
                let mut is_presimplicial = false;
                for cap in cnbs {
                    // Against an edge, only the edge group can cover the
                    // other groups' neighborhoods.
                    if adj_to_edge && Some(cap) != edge_nbr {
                        continue;
                    }
                    let remaining =
                        empty_adj_to_group - (groups.nbs(cap) & stones.empty());
                    if remaining.count() == 0 {
                        if enbs.count() == 0 {
                            simplicial.insert(p);
                        } else {
                            is_presimplicial = true;
                            killers.insert(enbs.first().unwrap());
                        }
                    } else if remaining.count() == 1 && enbs.count() == 0 {
                        is_presimplicial = true;
                        killers.insert(remaining.first().unwrap());
                    }
                }
                if !simplicial.get(p) && is_presimplicial {
                    debug_assert!(killers.any());
                    for killer in killers {
                        inf.add_vulnerable(
                            p,
                            VulnerableKiller {
                                killer,
                                carrier: Bitset::empty(),
                            },
                        );
                    }
                }
            }
        } else if entities >= 4 {
            // Too many entities; almost certainly neither dead nor
            // vulnerable.
        } else if cnbs.count() == 1 {
            if enbs.count() > 1 {
                continue;
            }
            debug_assert!(enbs.count() == 1);
            debug_assert!(empty_adj_to_group.count() >= 2);
            let omit = enbs.first().unwrap();
            inf.add_vulnerable(
                p,
                VulnerableKiller {
                    killer: omit,
                    carrier: Bitset::empty(),
                },
            );
            if empty_adj_to_group.count() == 2 {
                // The group's two liberties may themselves close the
                // neighborhood, giving additional killers.
                let vn = enbs | empty_adj_to_group;
                for ex in vn {
                    if ex == omit {
                        continue;
                    }
                    if is_clique(&cb, vn, Some(ex)) {
                        inf.add_vulnerable(
                            p,
                            VulnerableKiller {
                                killer: ex,
                                carrier: Bitset::empty(),
                            },
                        );
                    }
                }
            }
        } else {
            debug_assert!(cnbs.is_empty());
            if is_clique(&cb, enbs, None) {
                simplicial.insert(p);
            } else {
                for ex in enbs {
                    if is_clique(&cb, enbs, Some(ex)) {
                        inf.add_vulnerable(
                            p,
                            VulnerableKiller {
                                killer: ex,
                                carrier: Bitset::empty(),
                            },
                        );
                    }
                }
            }
        }
    }

    if simplicial.any() {
        inf.add_dead(simplicial);
        stones.add_fillin(Fill::Dead, simplicial);
        *groups = Groups::build(stones);
    }
    simplicial.count()
}
