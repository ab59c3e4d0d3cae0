use board_game_traits::Color;

use crate::board::bitset::Bitset;
use crate::board::cell::{HexPoint, EAST, NORTH, SOUTH, WEST};

/// Interior neighbor offsets `(dr, dc)` in cyclic order; consecutive
/// entries are themselves adjacent cells, which several inferior-cell
/// arguments rely on.
pub const DIRECTIONS: [(i8, i8); 6] = [(-1, 0), (-1, 1), (0, 1), (1, 0), (1, -1), (0, -1)];

/// Where a relative offset from an interior cell lands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Offset {
    Cell(HexPoint),
    /// Off the board; records which borders were crossed. North/south
    /// borders act as black stones, east/west borders as white stones.
    OffBoard {
        black: bool,
        white: bool,
    },
}

/// Immutable board geometry: size, adjacency, masks and distance tables.
///
/// The four edge sentinels are adjacent to their border row/column and to
/// the two perpendicular edges.
#[derive(Debug, PartialEq, Eq)]
pub struct ConstBoard {
    width: u8,
    height: u8,
    nbs: Vec<Bitset>,
    cells: Bitset,
    all: Bitset,
    center_dist2: Vec<u32>,
}

impl ConstBoard {
    pub fn new(width: u8, height: u8) -> ConstBoard {
        assert!(width >= 1 && height >= 1);
        assert!(
            (width as usize) * (height as usize) + 4 <= HexPoint::MAX_POINTS,
            "board {}x{} exceeds the supported point capacity",
            width,
            height
        );
        let num_points = 4 + width as usize * height as usize;
        let mut nbs = vec![Bitset::empty(); num_points];

        let point = |r: i16, c: i16| -> HexPoint {
            HexPoint::from_index(
                HexPoint::FIRST_INTERIOR + (r as u8) * width + c as u8,
            )
        };

        let mut connect = |a: HexPoint, b: HexPoint| {
            nbs[a.index() as usize].insert(b);
            nbs[b.index() as usize].insert(a);
        };

        for r in 0..height as i16 {
            for c in 0..width as i16 {
                let p = point(r, c);
                for (dr, dc) in DIRECTIONS {
                    let (nr, nc) = (r + dr as i16, c + dc as i16);
                    if nr >= 0 && nr < height as i16 && nc >= 0 && nc < width as i16 {
                        connect(p, point(nr, nc));
                    }
                }
                if r == 0 {
                    connect(p, NORTH);
                }
                if r == height as i16 - 1 {
                    connect(p, SOUTH);
                }
                if c == 0 {
                    connect(p, WEST);
                }
                if c == width as i16 - 1 {
                    connect(p, EAST);
                }
            }
        }
        for edge_pair in [(NORTH, EAST), (NORTH, WEST), (SOUTH, EAST), (SOUTH, WEST)] {
            connect(edge_pair.0, edge_pair.1);
        }

        let mut cells = Bitset::empty();
        for i in HexPoint::FIRST_INTERIOR as usize..num_points {
            cells.insert(HexPoint::from_index(i as u8));
        }
        let all = cells
            .set(NORTH)
            .set(SOUTH)
            .set(EAST)
            .set(WEST);

        let mut center_dist2 = vec![0u32; num_points];
        for r in 0..height as i32 {
            for c in 0..width as i32 {
                let dr = 2 * r - (height as i32 - 1);
                let dc = 2 * c - (width as i32 - 1);
                center_dist2[point(r as i16, c as i16).index() as usize] =
                    (dr * dr + dc * dc) as u32;
            }
        }

        ConstBoard {
            width,
            height,
            nbs,
            cells,
            all,
            center_dist2,
        }
    }

    #[inline]
    pub fn width(&self) -> u8 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u8 {
        self.height
    }

    #[inline]
    pub fn num_points(&self) -> usize {
        4 + self.width as usize * self.height as usize
    }

    #[inline]
    pub fn point(&self, row: u8, col: u8) -> HexPoint {
        debug_assert!(row < self.height && col < self.width);
        HexPoint::from_index(HexPoint::FIRST_INTERIOR + row * self.width + col)
    }

    #[inline]
    pub fn row(&self, p: HexPoint) -> u8 {
        debug_assert!(p.is_interior());
        (p.index() - HexPoint::FIRST_INTERIOR) / self.width
    }

    #[inline]
    pub fn col(&self, p: HexPoint) -> u8 {
        debug_assert!(p.is_interior());
        (p.index() - HexPoint::FIRST_INTERIOR) % self.width
    }

    /// All points adjacent to `p`, edges included.
    #[inline]
    pub fn nbs(&self, p: HexPoint) -> Bitset {
        self.nbs[p.index() as usize]
    }

    #[inline]
    pub fn adjacent(&self, a: HexPoint, b: HexPoint) -> bool {
        self.nbs(a).get(b)
    }

    /// Mask of interior cells.
    #[inline]
    pub fn cells(&self) -> Bitset {
        self.cells
    }

    /// Mask of interior cells plus the four edges.
    #[inline]
    pub fn all(&self) -> Bitset {
        self.all
    }

    pub fn cells_iter(&self) -> impl Iterator<Item = HexPoint> {
        self.cells.into_iter()
    }

    /// Squared distance from the board center, in doubled coordinates.
    #[inline]
    pub fn center_dist2(&self, p: HexPoint) -> u32 {
        self.center_dist2[p.index() as usize]
    }

    /// Resolves a relative offset from an interior cell, reporting crossed
    /// borders for off-board targets.
    pub fn offset(&self, p: HexPoint, dr: i8, dc: i8) -> Offset {
        let r = self.row(p) as i16 + dr as i16;
        let c = self.col(p) as i16 + dc as i16;
        let black = r < 0 || r >= self.height as i16;
        let white = c < 0 || c >= self.width as i16;
        if !black && !white {
            Offset::Cell(self.point(r as u8, c as u8))
        } else {
            Offset::OffBoard { black, white }
        }
    }

    /// Maps a point through the 180-degree board rotation. Valid on any
    /// rectangle; preserves adjacency and edge ownership.
    pub fn rotate180(&self, p: HexPoint) -> HexPoint {
        match p {
            NORTH => SOUTH,
            SOUTH => NORTH,
            EAST => WEST,
            WEST => EAST,
            p => self.point(
                self.height - 1 - self.row(p),
                self.width - 1 - self.col(p),
            ),
        }
    }

    pub fn rotate180_set(&self, set: Bitset) -> Bitset {
        let mut out = Bitset::empty();
        for p in set {
            out.insert(self.rotate180(p));
        }
        out
    }

    pub fn point_to_string(&self, p: HexPoint) -> String {
        if p.is_edge() {
            p.to_string()
        } else {
            format!("{}{}", (b'a' + self.col(p)) as char, self.row(p) + 1)
        }
    }

    /// Parses `"a1"`-style cell names and edge names.
    pub fn parse_point(&self, input: &str) -> Result<HexPoint, pgn_traits::Error> {
        let input = input.to_lowercase();
        match input.as_str() {
            "north" => return Ok(NORTH),
            "south" => return Ok(SOUTH),
            "east" => return Ok(EAST),
            "west" => return Ok(WEST),
            _ => (),
        }
        let mut chars = input.chars();
        let col_ch = chars.next().ok_or_else(|| {
            pgn_traits::Error::new_parse_error("Empty cell name".to_string())
        })?;
        let col = (col_ch as i16) - ('a' as i16);
        let row: i16 = chars
            .as_str()
            .parse::<i16>()
            .map_err(|_| {
                pgn_traits::Error::new_parse_error(format!(
                    "Couldn't parse cell \"{}\"",
                    input
                ))
            })?
            - 1;
        if col < 0 || col >= self.width as i16 || row < 0 || row >= self.height as i16 {
            return Err(pgn_traits::Error::new_parse_error(format!(
                "Cell \"{}\" is outside the {}x{} board",
                input, self.width, self.height
            )));
        }
        Ok(self.point(row as u8, col as u8))
    }

    /// The two cells adjacent to both `a` and `b`; nonempty carriers of the
    /// bridge pattern between adjacent-but-one points.
    pub fn common_nbs(&self, a: HexPoint, b: HexPoint) -> Bitset {
        self.nbs(a) & self.nbs(b)
    }

    /// The edge `color` must reach first/second, as a pair.
    pub fn edges_of(&self, color: Color) -> (HexPoint, HexPoint) {
        (HexPoint::edge1(color), HexPoint::edge2(color))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbour_counts_test() {
        let cb = ConstBoard::new(3, 3);
        // Interior corner cells touch two edges and their interior fans.
        let a1 = cb.parse_point("a1").unwrap();
        assert!(cb.nbs(a1).get(NORTH));
        assert!(cb.nbs(a1).get(WEST));
        assert!(!cb.nbs(a1).get(SOUTH));
        let b2 = cb.parse_point("b2").unwrap();
        assert_eq!((cb.nbs(b2) & cb.cells()).count(), 6);
    }

    #[test]
    fn adjacency_is_symmetric_test() {
        let cb = ConstBoard::new(4, 3);
        for a in cb.all() {
            for b in cb.all() {
                assert_eq!(cb.adjacent(a, b), cb.adjacent(b, a));
            }
        }
    }

    #[test]
    fn parse_roundtrip_test() {
        let cb = ConstBoard::new(6, 7);
        for p in cb.cells_iter() {
            let name = cb.point_to_string(p);
            assert_eq!(cb.parse_point(&name).unwrap(), p);
        }
        assert!(cb.parse_point("g1").is_err());
        assert!(cb.parse_point("a8").is_err());
        assert_eq!(cb.parse_point("north").unwrap(), NORTH);
    }

    #[test]
    fn rotate180_involution_test() {
        let cb = ConstBoard::new(5, 4);
        for p in cb.all() {
            assert_eq!(cb.rotate180(cb.rotate180(p)), p);
        }
        let a1 = cb.parse_point("a1").unwrap();
        assert_eq!(cb.point_to_string(cb.rotate180(a1)), "e4");
    }
}
