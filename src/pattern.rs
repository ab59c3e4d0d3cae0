//! Local inferior-cell patterns and their matcher.
//!
//! A pattern is anchored on an empty cell and constrains cells of its
//! two-ring neighborhood by relative `(dr, dc)` offsets. Off-board offsets
//! match a color requirement when the crossed border belongs to that
//! color, which is how edge captures fall out of the same tables.

use std::fs;
use std::io;
use std::path::Path;

use board_game_traits::Color;

use crate::board::bitset::Bitset;
use crate::board::cell::HexPoint;
use crate::board::constants::{Offset, DIRECTIONS};
use crate::board::stones::{CellState, StoneBoard};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Requirement {
    Black,
    White,
    Empty,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatternKind {
    Dead,
    Captured,
    PermanentlyInferior,
    Vulnerable,
    Reversible,
    Dominated,
}

/// One compiled pattern. `color` is the acting color for all kinds except
/// `Dead`, which is colorless.
#[derive(Clone, Debug)]
pub struct Pattern {
    pub kind: PatternKind,
    pub color: Option<Color>,
    pub cells: Vec<((i8, i8), Requirement)>,
    /// Offset of the killer / reverser / dominator reply.
    pub killer: Option<(i8, i8)>,
    pub carrier: Vec<(i8, i8)>,
}

/// A successful match at a cell.
#[derive(Clone, Debug)]
pub struct PatternHit {
    pub killer: Option<HexPoint>,
    pub carrier: Bitset,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchMode {
    StopAtFirstHit,
    MatchAll,
}

/// The full pattern table, split by kind and acting color.
#[derive(Clone, Debug, Default)]
pub struct Patterns {
    dead: Vec<Pattern>,
    captured: [Vec<Pattern>; 2],
    perm_inf: [Vec<Pattern>; 2],
    vulnerable: [Vec<Pattern>; 2],
    reversible: [Vec<Pattern>; 2],
    dominated: [Vec<Pattern>; 2],
}

impl Patterns {
    pub fn dead(&self) -> &[Pattern] {
        &self.dead
    }

    pub fn captured(&self, color: Color) -> &[Pattern] {
        &self.captured[color.disc()]
    }

    pub fn perm_inf(&self, color: Color) -> &[Pattern] {
        &self.perm_inf[color.disc()]
    }

    pub fn vulnerable(&self, color: Color) -> &[Pattern] {
        &self.vulnerable[color.disc()]
    }

    pub fn reversible(&self, color: Color) -> &[Pattern] {
        &self.reversible[color.disc()]
    }

    pub fn dominated(&self, color: Color) -> &[Pattern] {
        &self.dominated[color.disc()]
    }

    pub fn len(&self) -> usize {
        self.dead.len()
            + self.captured.iter().map(Vec::len).sum::<usize>()
            + self.perm_inf.iter().map(Vec::len).sum::<usize>()
            + self.vulnerable.iter().map(Vec::len).sum::<usize>()
            + self.reversible.iter().map(Vec::len).sum::<usize>()
            + self.dominated.iter().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn add(&mut self, pattern: Pattern) {
        let color = pattern.color.map(|c| c.disc()).unwrap_or(0);
        match pattern.kind {
            PatternKind::Dead => self.dead.push(pattern),
            PatternKind::Captured => self.captured[color].push(pattern),
            PatternKind::PermanentlyInferior => self.perm_inf[color].push(pattern),
            PatternKind::Vulnerable => self.vulnerable[color].push(pattern),
            PatternKind::Reversible => self.reversible[color].push(pattern),
            PatternKind::Dominated => self.dominated[color].push(pattern),
        }
    }

    pub fn merge(&mut self, other: Patterns) {
        self.dead.extend(other.dead);
        for i in 0..2 {
            self.captured[i].extend(other.captured[i].iter().cloned());
            self.perm_inf[i].extend(other.perm_inf[i].iter().cloned());
            self.vulnerable[i].extend(other.vulnerable[i].iter().cloned());
            self.reversible[i].extend(other.reversible[i].iter().cloned());
            self.dominated[i].extend(other.dominated[i].iter().cloned());
        }
    }

    /// The built-in hand table: adjacent-pair and surrounded-cell captures,
    /// plus the two clique-neighborhood dead shapes. All orientations are
    /// expanded as concrete entries.
    pub fn hand_coded() -> Patterns {
        let mut patterns = Patterns::default();
        let req = |color: Color| match color {
            Color::Black => Requirement::Black,
            Color::White => Requirement::White,
        };

        for color in [Color::Black, Color::White] {
            // A cell whose every neighbor belongs to one color is that
            // color's to take whenever useful.
            patterns.add(Pattern {
                kind: PatternKind::Captured,
                color: Some(color),
                cells: DIRECTIONS.iter().map(|&d| (d, req(color))).collect(),
                killer: None,
                carrier: vec![],
            });

            // Adjacent pair {center, q}: every other neighbor of either
            // cell is `color`, so either intrusion is answered in the
            // other cell.
            for (i, &q) in DIRECTIONS.iter().enumerate() {
                let mut cells = vec![(q, Requirement::Empty)];
                for (j, &d) in DIRECTIONS.iter().enumerate() {
                    if j != i {
                        cells.push((d, req(color)));
                    }
                }
                for &d in DIRECTIONS.iter() {
                    let outer = (q.0 + d.0, q.1 + d.1);
                    if outer == (0, 0) || DIRECTIONS.contains(&outer) {
                        continue;
                    }
                    cells.push((outer, req(color)));
                }
                patterns.add(Pattern {
                    kind: PatternKind::Captured,
                    color: Some(color),
                    cells,
                    killer: None,
                    carrier: vec![q],
                });
            }

            // Four consecutive same-colored neighbors leave a clique
            // neighborhood: the run is one group, the remaining two
            // neighbors are adjacent to it and to each other.
            for i in 0..6 {
                let cells = (0..4)
                    .map(|k| (DIRECTIONS[(i + k) % 6], req(color)))
                    .collect();
                patterns.add(Pattern {
                    kind: PatternKind::Dead,
                    color: None,
                    cells,
                    killer: None,
                    carrier: vec![],
                });
            }
        }

        // Three consecutive black neighbors against three consecutive
        // white ones: two mutually adjacent groups cover the whole
        // neighborhood.
        for i in 0..6 {
            let mut cells = Vec::with_capacity(6);
            for k in 0..3 {
                cells.push((DIRECTIONS[(i + k) % 6], Requirement::Black));
            }
            for k in 3..6 {
                cells.push((DIRECTIONS[(i + k) % 6], Requirement::White));
            }
            patterns.add(Pattern {
                kind: PatternKind::Dead,
                color: None,
                cells,
                killer: None,
                carrier: vec![],
            });
        }
        patterns
    }

    /// Loads a pattern file. Format, one pattern per line:
    ///
    /// ```text
    /// kind color ; dr,dc=b dr,dc=w dr,dc=e ... [; killer dr,dc] [; carrier dr,dc ...]
    /// ```
    ///
    /// `kind` is one of dead/captured/perminf/vulnerable/reversible/
    /// dominated, `color` is black/white or `-` for dead patterns. Lines
    /// starting with `#` are comments.
    pub fn load(path: &Path) -> io::Result<Patterns> {
        let text = fs::read_to_string(path)?;
        let mut patterns = Patterns::default();
        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let pattern = parse_pattern_line(line).map_err(|err| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("pattern file line {}: {}", line_no + 1, err),
                )
            })?;
            patterns.add(pattern);
        }
        Ok(patterns)
    }
}

fn parse_offset(token: &str) -> Result<(i8, i8), String> {
    let (dr, dc) = token
        .split_once(',')
        .ok_or_else(|| format!("expected dr,dc in \"{}\"", token))?;
    let dr = dr
        .parse::<i8>()
        .map_err(|_| format!("bad row offset in \"{}\"", token))?;
    let dc = dc
        .parse::<i8>()
        .map_err(|_| format!("bad column offset in \"{}\"", token))?;
    Ok((dr, dc))
}

fn parse_pattern_line(line: &str) -> Result<Pattern, String> {
    let mut sections = line.split(';').map(str::trim);
    let head = sections.next().unwrap_or_default();
    let mut head_tokens = head.split_whitespace();
    let kind = match head_tokens.next() {
        Some("dead") => PatternKind::Dead,
        Some("captured") => PatternKind::Captured,
        Some("perminf") => PatternKind::PermanentlyInferior,
        Some("vulnerable") => PatternKind::Vulnerable,
        Some("reversible") => PatternKind::Reversible,
        Some("dominated") => PatternKind::Dominated,
        other => return Err(format!("unknown pattern kind {:?}", other)),
    };
    let color = match head_tokens.next() {
        Some("black") => Some(Color::Black),
        Some("white") => Some(Color::White),
        Some("-") | None => None,
        Some(other) => return Err(format!("unknown color \"{}\"", other)),
    };
    if color.is_none() && kind != PatternKind::Dead {
        return Err("only dead patterns may omit the color".to_string());
    }

    let cell_section = sections
        .next()
        .ok_or_else(|| "missing cell section".to_string())?;
    let mut cells = Vec::new();
    for token in cell_section.split_whitespace() {
        let (offset, state) = token
            .rsplit_once('=')
            .ok_or_else(|| format!("expected dr,dc=state in \"{}\"", token))?;
        let requirement = match state {
            "b" => Requirement::Black,
            "w" => Requirement::White,
            "e" => Requirement::Empty,
            other => return Err(format!("unknown cell state \"{}\"", other)),
        };
        cells.push((parse_offset(offset)?, requirement));
    }
    if cells.is_empty() {
        return Err("pattern has no cells".to_string());
    }

    let mut killer = None;
    let mut carrier = Vec::new();
    for section in sections {
        let mut tokens = section.split_whitespace();
        match tokens.next() {
            Some("killer") => {
                let token = tokens
                    .next()
                    .ok_or_else(|| "killer section needs an offset".to_string())?;
                killer = Some(parse_offset(token)?);
            }
            Some("carrier") => {
                for token in tokens.by_ref() {
                    carrier.push(parse_offset(token)?);
                }
            }
            Some(other) => return Err(format!("unknown section \"{}\"", other)),
            None => (),
        }
    }
    if killer.is_none()
        && matches!(
            kind,
            PatternKind::Vulnerable | PatternKind::Reversible | PatternKind::Dominated
        )
    {
        return Err(format!("{:?} pattern needs a killer", kind));
    }
    Ok(Pattern {
        kind,
        color,
        cells,
        killer,
        carrier,
    })
}

fn requirement_holds(stones: &StoneBoard, p: HexPoint, dr: i8, dc: i8, req: Requirement) -> bool {
    match stones.const_board().offset(p, dr, dc) {
        Offset::Cell(q) => match (req, stones.state(q)) {
            (Requirement::Black, CellState::Stone(Color::Black)) => true,
            (Requirement::White, CellState::Stone(Color::White)) => true,
            (Requirement::Empty, CellState::Empty) => true,
            _ => false,
        },
        Offset::OffBoard { black, white } => match req {
            Requirement::Black => black,
            Requirement::White => white,
            Requirement::Empty => false,
        },
    }
}

fn pattern_matches(stones: &StoneBoard, pattern: &Pattern, p: HexPoint) -> Option<PatternHit> {
    for &((dr, dc), req) in &pattern.cells {
        if !requirement_holds(stones, p, dr, dc, req) {
            return None;
        }
    }
    let killer = match pattern.killer {
        None => None,
        Some((dr, dc)) => match stones.const_board().offset(p, dr, dc) {
            Offset::Cell(q) => Some(q),
            Offset::OffBoard { .. } => return None,
        },
    };
    let mut carrier = Bitset::empty();
    for &(dr, dc) in &pattern.carrier {
        if let Offset::Cell(q) = stones.const_board().offset(p, dr, dc) {
            carrier.insert(q);
        }
    }
    Some(PatternHit { killer, carrier })
}

/// Matches a pattern list at one empty cell.
pub fn match_cell(
    stones: &StoneBoard,
    patterns: &[Pattern],
    p: HexPoint,
    mode: MatchMode,
) -> Vec<PatternHit> {
    let mut hits = Vec::new();
    for pattern in patterns {
        if let Some(hit) = pattern_matches(stones, pattern, p) {
            hits.push(hit);
            if mode == MatchMode::StopAtFirstHit {
                break;
            }
        }
    }
    hits
}

/// Cells of `consider` where at least one pattern matches.
pub fn match_board(stones: &StoneBoard, patterns: &[Pattern], consider: Bitset) -> Bitset {
    let mut matched = Bitset::empty();
    for p in consider {
        if !match_cell(stones, patterns, p, MatchMode::StopAtFirstHit).is_empty() {
            matched.insert(p);
        }
    }
    matched
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::board::bitset::Bitset;
    use crate::board::constants::ConstBoard;

    fn board_with(moves: &[(&str, Color)], w: u8, h: u8) -> StoneBoard {
        let cb = Arc::new(ConstBoard::new(w, h));
        let mut brd = StoneBoard::new(Arc::clone(&cb));
        for (name, color) in moves {
            let p = cb.parse_point(name).unwrap();
            brd.play_move(*color, p).unwrap();
        }
        brd
    }

    #[test]
    fn surrounded_cell_is_captured_test() {
        // b2 on 3x3 with all six neighbors black.
        let brd = board_with(
            &[
                ("b1", Color::Black),
                ("c1", Color::Black),
                ("a2", Color::Black),
                ("c2", Color::Black),
                ("a3", Color::Black),
                ("b3", Color::Black),
            ],
            3,
            3,
        );
        let patterns = Patterns::hand_coded();
        let b2 = brd.const_board().parse_point("b2").unwrap();
        let hits = match_cell(
            &brd,
            patterns.captured(Color::Black),
            b2,
            MatchMode::StopAtFirstHit,
        );
        assert_eq!(hits.len(), 1);
        assert!(hits[0].carrier.is_empty());
    }

    #[test]
    fn edge_pair_is_captured_test() {
        // On 4x4, b4 and c4 sit in a south-edge pocket: every neighbor of
        // the pair other than the pair itself is black, counting the south
        // edge as black stones.
        let brd = board_with(
            &[
                ("b3", Color::Black),
                ("c3", Color::Black),
                ("a4", Color::Black),
                ("d3", Color::Black),
                ("d4", Color::Black),
            ],
            4,
            4,
        );
        let patterns = Patterns::hand_coded();
        let b4 = brd.const_board().parse_point("b4").unwrap();
        let c4 = brd.const_board().parse_point("c4").unwrap();
        let hits = match_cell(
            &brd,
            patterns.captured(Color::Black),
            b4,
            MatchMode::StopAtFirstHit,
        );
        assert!(!hits.is_empty(), "b4 should be captured toward the edge");
        assert_eq!(hits[0].carrier, Bitset::single(c4));
    }

    #[test]
    fn dead_run_of_four_test() {
        // b2 on 4x4 with four consecutive white neighbors.
        let brd = board_with(
            &[
                ("b1", Color::White),
                ("c1", Color::White),
                ("c2", Color::White),
                ("b3", Color::White),
                ("a3", Color::White),
            ],
            4,
            4,
        );
        let patterns = Patterns::hand_coded();
        let b2 = brd.const_board().parse_point("b2").unwrap();
        let matched = match_board(&brd, patterns.dead(), Bitset::single(b2));
        assert!(matched.get(b2));
    }

    #[test]
    fn empty_neighbourhood_matches_nothing_test() {
        let brd = board_with(&[], 5, 5);
        let patterns = Patterns::hand_coded();
        let c3 = brd.const_board().parse_point("c3").unwrap();
        assert!(match_cell(&brd, patterns.dead(), c3, MatchMode::MatchAll).is_empty());
        assert!(match_cell(
            &brd,
            patterns.captured(Color::Black),
            c3,
            MatchMode::MatchAll
        )
        .is_empty());
    }

    #[test]
    fn pattern_line_parse_test() {
        let pattern =
            parse_pattern_line("vulnerable black ; 0,1=e -1,0=b ; killer 0,1 ; carrier 0,1")
                .unwrap();
        assert_eq!(pattern.kind, PatternKind::Vulnerable);
        assert_eq!(pattern.color, Some(Color::Black));
        assert_eq!(pattern.cells.len(), 2);
        assert_eq!(pattern.killer, Some((0, 1)));
        assert_eq!(pattern.carrier, vec![(0, 1)]);

        assert!(parse_pattern_line("vulnerable black ; 0,1=e").is_err());
        assert!(parse_pattern_line("captured ; 0,1=e").is_err());
        assert!(parse_pattern_line("nonsense black ; 0,1=e").is_err());
    }
}
