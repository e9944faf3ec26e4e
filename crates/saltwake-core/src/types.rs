//! Core types used throughout the Saltwake simulation

use std::fmt;

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

/// A cell on the world grid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Cell shifted by the given offset
    pub const fn offset(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Manhattan distance (4-connected step count on an open grid)
    pub fn manhattan(&self, other: Cell) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Chebyshev distance (8-connected step count on an open grid)
    pub fn chebyshev(&self, other: Cell) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }

    /// Straight-line distance in cells
    pub fn distance(&self, other: Cell) -> f32 {
        self.as_vec2().distance(other.as_vec2())
    }

    /// Whether `other` is one step away. Diagonal neighbours count only when
    /// `diagonal` is set.
    pub fn is_adjacent(&self, other: Cell, diagonal: bool) -> bool {
        if diagonal {
            self.chebyshev(other) == 1
        } else {
            self.manhattan(other) == 1
        }
    }

    /// Center of the cell as a float vector
    pub fn as_vec2(&self) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32)
    }
}

impl From<IVec2> for Cell {
    fn from(v: IVec2) -> Self {
        Self::new(v.x, v.y)
    }
}

impl From<Cell> for IVec2 {
    fn from(c: Cell) -> Self {
        IVec2::new(c.x, c.y)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Direction a sprite is facing. Grid `y` grows downward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

impl Facing {
    /// Facing when looking from `from` toward `to`. Horizontal wins ties so
    /// diagonal steps keep the side-on sprite. Returns None when the cells match.
    pub fn toward(from: Cell, to: Cell) -> Option<Facing> {
        let d = IVec2::from(to) - IVec2::from(from);
        if d == IVec2::ZERO {
            return None;
        }
        if d.x.abs() >= d.y.abs() {
            Some(if d.x > 0 { Facing::Right } else { Facing::Left })
        } else {
            Some(if d.y > 0 { Facing::Down } else { Facing::Up })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_distances() {
        let a = Cell::new(0, 0);
        let b = Cell::new(3, -4);
        assert_eq!(a.manhattan(b), 7);
        assert_eq!(a.chebyshev(b), 4);
        assert!((a.distance(b) - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_adjacency() {
        let a = Cell::new(2, 2);
        assert!(a.is_adjacent(Cell::new(2, 3), false));
        assert!(!a.is_adjacent(Cell::new(3, 3), false));
        assert!(a.is_adjacent(Cell::new(3, 3), true));
        assert!(!a.is_adjacent(a, true));
    }

    #[test]
    fn test_facing_toward() {
        let o = Cell::new(0, 0);
        assert_eq!(Facing::toward(o, Cell::new(1, 0)), Some(Facing::Right));
        assert_eq!(Facing::toward(o, Cell::new(-2, 1)), Some(Facing::Left));
        assert_eq!(Facing::toward(o, Cell::new(0, -1)), Some(Facing::Up));
        assert_eq!(Facing::toward(o, Cell::new(1, 1)), Some(Facing::Right));
        assert_eq!(Facing::toward(o, o), None);
    }

    #[test]
    fn test_cell_serializes_as_struct() {
        let json = serde_json::to_string(&Cell::new(4, 7)).unwrap();
        assert_eq!(json, r#"{"x":4,"y":7}"#);
    }
}
