use std::fmt;

use board_game_traits::Color;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A point on the board: one of the four edge sentinels, or an interior
/// cell. Interior indices start at `FIRST_INTERIOR` and are laid out
/// row-major by the owning `ConstBoard`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HexPoint {
    inner: u8,
}

pub const NORTH: HexPoint = HexPoint { inner: 0 };
pub const SOUTH: HexPoint = HexPoint { inner: 1 };
pub const EAST: HexPoint = HexPoint { inner: 2 };
pub const WEST: HexPoint = HexPoint { inner: 3 };

impl HexPoint {
    pub const FIRST_INTERIOR: u8 = 4;
    pub const MAX_POINTS: usize = 128;

    #[inline]
    pub const fn from_index(inner: u8) -> Self {
        HexPoint { inner }
    }

    #[inline]
    pub const fn index(self) -> u8 {
        self.inner
    }

    #[inline]
    pub const fn is_edge(self) -> bool {
        self.inner < Self::FIRST_INTERIOR
    }

    #[inline]
    pub const fn is_interior(self) -> bool {
        self.inner >= Self::FIRST_INTERIOR
    }

    /// The first of `color`'s two edges. Black connects north-south,
    /// White connects east-west.
    pub fn edge1(color: Color) -> Self {
        match color {
            Color::Black => NORTH,
            Color::White => EAST,
        }
    }

    /// The second of `color`'s two edges.
    pub fn edge2(color: Color) -> Self {
        match color {
            Color::Black => SOUTH,
            Color::White => WEST,
        }
    }

    /// The color owning this edge, or `None` for interior points.
    pub fn edge_owner(self) -> Option<Color> {
        match self {
            NORTH | SOUTH => Some(Color::Black),
            EAST | WEST => Some(Color::White),
            _ => None,
        }
    }

    pub fn is_edge_of(self, color: Color) -> bool {
        self.edge_owner() == Some(color)
    }
}

impl fmt::Display for HexPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            NORTH => write!(f, "north"),
            SOUTH => write!(f, "south"),
            EAST => write!(f, "east"),
            WEST => write!(f, "west"),
            p => write!(f, "#{}", p.index()),
        }
    }
}
