//! Virtual connections via an and-or closure over cells and groups.
//!
//! A *full* connection between two endpoints holds even with the opponent
//! to move; a *semi* connection needs the owner to answer in its carrier
//! first (playing its key). The closure combines adjacent-pair base
//! connections with the and-rule (two fulls through a midpoint) and the
//! or-rule (semis whose carriers share no cell). Soft limits bound the
//! lists per endpoint pair; they cost completeness, never soundness.

use std::collections::{HashMap, VecDeque};

use board_game_traits::Color;

use crate::board::bitset::Bitset;
use crate::board::cell::HexPoint;
use crate::board::groups::Groups;
use crate::board::stones::StoneBoard;

/// A semi connection: the owner must play `key` to convert it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Semi {
    pub key: HexPoint,
    /// Cells that must stay empty, `key` included.
    pub carrier: Bitset,
}

#[derive(Clone, Debug, Default)]
pub struct VcList {
    pub fulls: Vec<Bitset>,
    pub semis: Vec<Semi>,
}

/// A decomposition of the empties by one of `color`'s groups chained to
/// both of its edges.
#[derive(Clone, Debug)]
pub struct Decomposition {
    pub group: HexPoint,
    pub carrier: Bitset,
    pub side_a: Bitset,
    pub side_b: Bitset,
}

/// All connections of one color for a single position.
#[derive(Clone, Debug)]
pub struct VcSet {
    color: Color,
    lists: HashMap<(HexPoint, HexPoint), VcList>,
}

fn pair_key(a: HexPoint, b: HexPoint) -> (HexPoint, HexPoint) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl VcSet {
    /// A set with no connections, for boards built with VCs disabled.
    pub fn empty(color: Color) -> VcSet {
        VcSet {
            color,
            lists: HashMap::new(),
        }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn list(&self, a: HexPoint, b: HexPoint) -> Option<&VcList> {
        self.lists.get(&pair_key(a, b))
    }

    fn edges(&self) -> (HexPoint, HexPoint) {
        (HexPoint::edge1(self.color), HexPoint::edge2(self.color))
    }

    /// Full connections between the owner's two edges; any one of these
    /// is a proven win for the owner regardless of who moves.
    pub fn winning_fulls(&self) -> &[Bitset] {
        let (e1, e2) = self.edges();
        self.list(e1, e2).map(|l| l.fulls.as_slice()).unwrap_or(&[])
    }

    /// Semi connections between the owner's two edges; a win if the owner
    /// moves first.
    pub fn winning_semis(&self) -> &[Semi] {
        let (e1, e2) = self.edges();
        self.list(e1, e2).map(|l| l.semis.as_slice()).unwrap_or(&[])
    }

    pub fn smallest_winning_full(&self) -> Option<Bitset> {
        self.winning_fulls()
            .iter()
            .min_by_key(|c| c.count())
            .copied()
    }

    pub fn smallest_winning_semi(&self) -> Option<&Semi> {
        self.winning_semis()
            .iter()
            .min_by_key(|s| s.carrier.count())
    }

    /// Union of the winning semi carriers: the set the opponent must play
    /// in to have any hope. Empty when no winning semi is known.
    pub fn mustplay_carrier(&self) -> Bitset {
        let mut carrier = Bitset::empty();
        for semi in self.winning_semis() {
            carrier |= semi.carrier;
        }
        carrier
    }

    /// Looks for a non-edge group of the owner with full connections to
    /// both edges whose chain splits the remaining empties in two.
    pub fn find_decomposition(&self, stones: &StoneBoard, groups: &Groups) -> Option<Decomposition> {
        let cb = stones.const_board();
        let (e1, e2) = self.edges();
        for group in groups.of_color(self.color) {
            if group.captain.is_edge() {
                continue;
            }
            let f1 = match self.list(group.captain, e1).and_then(|l| {
                l.fulls.iter().min_by_key(|c| c.count()).copied()
            }) {
                Some(c) => c,
                None => continue,
            };
            let f2 = match self.list(group.captain, e2).and_then(|l| {
                l.fulls.iter().min_by_key(|c| c.count()).copied()
            }) {
                Some(c) => c,
                None => continue,
            };
            let carrier = f1 | f2;
            let blocked = group.members | carrier;
            let open = stones.empty() - blocked;
            let mut seen = Bitset::empty();
            let mut components: Vec<Bitset> = Vec::new();
            for start in open {
                if seen.get(start) {
                    continue;
                }
                let mut component = Bitset::single(start);
                let mut frontier = vec![start];
                while let Some(p) = frontier.pop() {
                    for nb in cb.nbs(p) & open - component {
                        component.insert(nb);
                        frontier.push(nb);
                    }
                }
                seen |= component;
                components.push(component);
            }
            if components.len() >= 2 {
                components.sort_by_key(|c| std::cmp::Reverse(c.count()));
                let side_a = components[0];
                let mut side_b = Bitset::empty();
                for c in &components[1..] {
                    side_b |= *c;
                }
                return Some(Decomposition {
                    group: group.captain,
                    carrier,
                    side_a,
                    side_b,
                });
            }
        }
        None
    }
}

/// Closure driver with soft limits on list sizes and total work.
#[derive(Clone, Copy, Debug)]
pub struct VcBuilder {
    pub full_soft_limit: usize,
    pub semi_soft_limit: usize,
    pub max_events: usize,
}

impl Default for VcBuilder {
    fn default() -> Self {
        VcBuilder {
            full_soft_limit: 4,
            semi_soft_limit: 8,
            max_events: 40_000,
        }
    }
}

struct Closure<'a> {
    stones: &'a StoneBoard,
    groups: &'a Groups,
    color: Color,
    endpoints: Vec<HexPoint>,
    lists: HashMap<(HexPoint, HexPoint), VcList>,
    queue: VecDeque<(HexPoint, HexPoint)>,
    queued: HashMap<(HexPoint, HexPoint), bool>,
    builder: VcBuilder,
}

impl<'a> Closure<'a> {
    /// Member cells of an endpoint: the cell itself, or the whole group.
    fn members(&self, x: HexPoint) -> Bitset {
        if self.stones.is_empty_cell(x) {
            Bitset::single(x)
        } else {
            self.groups.group(x).members
        }
    }

    fn nbs_of(&self, x: HexPoint) -> Bitset {
        if self.stones.is_empty_cell(x) {
            self.stones.const_board().nbs(x)
        } else {
            self.groups.group(x).nbs
        }
    }

    fn is_group(&self, x: HexPoint) -> bool {
        !self.stones.is_empty_cell(x)
    }

    fn enqueue(&mut self, a: HexPoint, b: HexPoint) {
        let key = pair_key(a, b);
        let entry = self.queued.entry(key).or_insert(false);
        if !*entry {
            *entry = true;
            self.queue.push_back(key);
        }
    }

    /// Inserts a full unless subsumed; drops supersets it subsumes.
    fn add_full(&mut self, a: HexPoint, b: HexPoint, carrier: Bitset) {
        let limit = self.builder.full_soft_limit;
        let list = self.lists.entry(pair_key(a, b)).or_default();
        if list.fulls.iter().any(|c| c.is_subset_of(carrier)) {
            return;
        }
        list.fulls.retain(|c| !carrier.is_subset_of(*c));
        if list.fulls.len() >= limit {
            // Keep the smallest carriers; replace the largest if the new
            // one improves on it.
            if let Some((idx, largest)) = list
                .fulls
                .iter()
                .enumerate()
                .max_by_key(|(_, c)| c.count())
            {
                if carrier.count() < largest.count() {
                    list.fulls[idx] = carrier;
                    self.enqueue(a, b);
                }
            }
            return;
        }
        list.fulls.push(carrier);
        self.enqueue(a, b);
    }

    /// Inserts a semi unless subsumed, then applies the or-rule.
    fn add_semi(&mut self, a: HexPoint, b: HexPoint, semi: Semi) {
        let limit = self.builder.semi_soft_limit;
        {
            let list = self.lists.entry(pair_key(a, b)).or_default();
            if list
                .semis
                .iter()
                .any(|s| s.carrier.is_subset_of(semi.carrier))
            {
                return;
            }
            list.semis.retain(|s| !semi.carrier.is_subset_of(s.carrier));
            if list.semis.len() >= limit {
                return;
            }
            list.semis.push(semi);
        }
        if let Some(union) = self.or_rule(a, b) {
            self.add_full(a, b, union);
        }
    }

    /// Greedily picks semis whose common carrier intersection is empty;
    /// the union of the picked carriers is then a full connection.
    fn or_rule(&self, a: HexPoint, b: HexPoint) -> Option<Bitset> {
        let list = self.lists.get(&pair_key(a, b))?;
        if list.semis.len() < 2 {
            return None;
        }
        let first = list
            .semis
            .iter()
            .min_by_key(|s| s.carrier.count())?;
        let mut intersection = first.carrier;
        let mut union = first.carrier;
        while intersection.any() {
            let best = list
                .semis
                .iter()
                .min_by_key(|s| ((s.carrier & intersection).count(), s.carrier.count()))?;
            let reduced = intersection & best.carrier;
            if reduced.count() == intersection.count() {
                return None;
            }
            intersection = reduced;
            union |= best.carrier;
        }
        Some(union)
    }

    fn combine(&mut self, a: HexPoint, mid: HexPoint, b: HexPoint, c1: Bitset, c2: Bitset) {
        if a == b || c1.intersects(c2) {
            return;
        }
        if c1.intersects(self.members(b)) || c2.intersects(self.members(a)) {
            return;
        }
        if self.is_group(mid) {
            self.add_full(a, b, c1 | c2);
        } else {
            let carrier = (c1 | c2).set(mid);
            if carrier.intersects(self.members(a)) || carrier.intersects(self.members(b)) {
                return;
            }
            self.add_semi(
                a,
                b,
                Semi {
                    key: mid,
                    carrier,
                },
            );
        }
    }

    fn run(&mut self) {
        // Base case: directly adjacent endpoints are fully connected.
        let endpoints = self.endpoints.clone();
        for (i, &x) in endpoints.iter().enumerate() {
            for &y in endpoints.iter().take(i) {
                if self.nbs_of(x).intersects(self.members(y)) {
                    self.add_full(x, y, Bitset::empty());
                }
            }
        }

        let mut events = 0;
        while let Some((x, m)) = self.queue.pop_front() {
            self.queued.insert((x, m), false);
            events += 1;
            if events > self.builder.max_events {
                break;
            }
            let fulls_xm = match self.lists.get(&(x, m)) {
                Some(list) => list.fulls.clone(),
                None => continue,
            };
            // Either endpoint of the updated pair can act as midpoint.
            for &(a, mid) in &[(x, m), (m, x)] {
                for &y in &endpoints {
                    if y == a || y == mid {
                        continue;
                    }
                    let fulls_mid_y = match self.lists.get(&pair_key(mid, y)) {
                        Some(list) => list.fulls.clone(),
                        None => continue,
                    };
                    for &c1 in &fulls_xm {
                        for &c2 in &fulls_mid_y {
                            self.combine(a, mid, y, c1, c2);
                        }
                    }
                }
            }
        }
    }
}

impl VcBuilder {
    /// Builds the connection set for `color` from scratch. This is also
    /// the incremental-update entry point: after fill-in or a move, the
    /// caller simply rebuilds from the current board.
    pub fn build(&self, stones: &StoneBoard, groups: &Groups, color: Color) -> VcSet {
        let mut endpoints: Vec<HexPoint> = stones.empty().into_iter().collect();
        for group in groups.of_color(color) {
            endpoints.push(group.captain);
        }
        let mut closure = Closure {
            stones,
            groups,
            color,
            endpoints,
            lists: HashMap::new(),
            queue: VecDeque::new(),
            queued: HashMap::new(),
            builder: *self,
        };
        closure.run();
        let mut lists = closure.lists;
        if groups.winner() == Some(color) {
            // Both edges are one group; the spanning chain is a full
            // connection needing no carrier.
            let key = pair_key(HexPoint::edge1(color), HexPoint::edge2(color));
            lists.entry(key).or_default().fulls = vec![Bitset::empty()];
        }
        VcSet { color, lists }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::board::constants::ConstBoard;

    fn setup(moves: &[(&str, Color)], w: u8, h: u8) -> (StoneBoard, Groups) {
        let cb = Arc::new(ConstBoard::new(w, h));
        let mut stones = StoneBoard::new(Arc::clone(&cb));
        for (name, color) in moves {
            let p = cb.parse_point(name).unwrap();
            stones.play_move(*color, p).unwrap();
        }
        let groups = Groups::build(&stones);
        (stones, groups)
    }

    #[test]
    fn bridge_is_a_full_connection_test() {
        // b2 and the west edge on 3x3 share two empty common neighbors:
        // two semis whose carriers are disjoint, so the or-rule yields a
        // full connection.
        let (stones, groups) = setup(&[("b2", Color::White)], 3, 3);
        let vcs = VcBuilder::default().build(&stones, &groups, Color::White);
        let b2 = stones.const_board().parse_point("b2").unwrap();
        let list = vcs.list(b2, crate::board::cell::WEST).expect("list exists");
        assert!(
            !list.fulls.is_empty(),
            "bridge to the edge should be a full vc"
        );
        let a2 = stones.const_board().parse_point("a2").unwrap();
        let a3 = stones.const_board().parse_point("a3").unwrap();
        assert!(list
            .fulls
            .iter()
            .any(|c| *c == Bitset::single(a2).set(a3)));
    }

    #[test]
    fn single_row_is_won_by_black_outright_test() {
        // On a height-1 board every cell touches both black edges: the
        // three one-cell semis have disjoint carriers, so the or-rule
        // gives black a winning full connection without a stone played.
        let (stones, groups) = setup(&[], 3, 1);
        let vcs = VcBuilder::default().build(&stones, &groups, Color::Black);
        assert!(!vcs.winning_fulls().is_empty());
        // White, by contrast, can never cross three cells with two moves.
        let white = VcBuilder::default().build(&stones, &groups, Color::White);
        assert!(white.winning_fulls().is_empty());
    }

    #[test]
    fn solid_chain_is_a_winning_full_test() {
        let (stones, groups) = setup(
            &[("a2", Color::White), ("b2", Color::White), ("c2", Color::White)],
            3,
            3,
        );
        let vcs = VcBuilder::default().build(&stones, &groups, Color::White);
        assert!(vcs
            .winning_fulls()
            .iter()
            .any(|c| c.is_empty()));
    }

    #[test]
    fn mustplay_covers_bridge_carriers_test() {
        // Black threatens north and south through bridges; white's
        // mustplay must include those carriers.
        let (stones, groups) = setup(&[("b2", Color::Black)], 3, 3);
        let vcs = VcBuilder::default().build(&stones, &groups, Color::Black);
        let mustplay = vcs.mustplay_carrier();
        assert!(
            mustplay.any(),
            "black has at least one winning semi after b2 on 3x3"
        );
        let b1 = stones.const_board().parse_point("b1").unwrap();
        assert!(mustplay.get(b1));
    }

    #[test]
    fn chain_decomposition_is_detected_test() {
        // A white stone bridged to both edges splits the 3x3 empties into
        // a northern and a southern region.
        let (stones, groups) = setup(&[("b2", Color::White)], 3, 3);
        let vcs = VcBuilder::default().build(&stones, &groups, Color::White);
        let decomposition = vcs
            .find_decomposition(&stones, &groups)
            .expect("bridged stone splits the board");
        assert!(decomposition.side_a.any() && decomposition.side_b.any());
        assert!(!decomposition.side_a.intersects(decomposition.side_b));
    }
}
