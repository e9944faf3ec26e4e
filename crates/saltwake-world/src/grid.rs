//! Walkability grid consumed by the pathfinder
//!
//! An [`ObstacleMap`] is built once (from ASCII art or with the builder
//! methods) and is read-only afterwards.

use std::collections::HashSet;

use saltwake_core::Cell;
use serde::Serialize;

/// Read-only view of which cells an agent may stand on
pub trait Passable {
    /// Grid size as (width, height)
    fn dimensions(&self) -> (u32, u32);

    /// Whether the cell can be entered. Out-of-bounds cells are never passable.
    fn is_passable(&self, cell: Cell) -> bool;

    fn in_bounds(&self, cell: Cell) -> bool {
        let (w, h) = self.dimensions();
        cell.x >= 0 && cell.y >= 0 && (cell.x as u32) < w && (cell.y as u32) < h
    }
}

/// Errors raised while building a map
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("map has no rows")]
    Empty,

    #[error("row {row} has {found} tiles, expected {expected}")]
    RaggedRow { row: usize, expected: usize, found: usize },

    #[error("unknown tile '{tile}' at row {row}, column {col}")]
    UnknownTile { tile: char, row: usize, col: usize },
}

/// Fixed 2D walkability mask. Only built through the constructors, which keep
/// the mask length equal to `width * height`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObstacleMap {
    width: u32,
    height: u32,
    walkable: Vec<bool>,
}

impl ObstacleMap {
    /// A fully open map
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            walkable: vec![true; (width as usize) * (height as usize)],
        }
    }

    /// Parse a map drawn with `.` (floor), `#` (wall) and `~` (deep water).
    /// Leading/trailing blank lines and surrounding whitespace are ignored.
    pub fn from_ascii(art: &str) -> Result<Self, GridError> {
        let rows: Vec<&str> = art
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        let Some(first) = rows.first() else {
            return Err(GridError::Empty);
        };
        let width = first.chars().count();

        let mut walkable = Vec::with_capacity(width * rows.len());
        for (row, line) in rows.iter().enumerate() {
            let found = line.chars().count();
            if found != width {
                return Err(GridError::RaggedRow { row, expected: width, found });
            }
            for (col, tile) in line.chars().enumerate() {
                match tile {
                    '.' => walkable.push(true),
                    '#' | '~' => walkable.push(false),
                    _ => return Err(GridError::UnknownTile { tile, row, col }),
                }
            }
        }

        Ok(Self {
            width: width as u32,
            height: rows.len() as u32,
            walkable,
        })
    }

    /// Mark a single cell as blocked. Out-of-bounds cells are ignored.
    pub fn with_obstacle(mut self, cell: Cell) -> Self {
        if let Some(i) = self.index(cell) {
            self.walkable[i] = false;
        }
        self
    }

    /// Mark a `w` x `h` rectangle starting at `min` as blocked
    pub fn with_obstacle_rect(mut self, min: Cell, w: u32, h: u32) -> Self {
        for dy in 0..h as i32 {
            for dx in 0..w as i32 {
                self = self.with_obstacle(min.offset(dx, dy));
            }
        }
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major index of a cell, if it lies on the map
    pub fn index(&self, cell: Cell) -> Option<usize> {
        if self.in_bounds(cell) {
            Some(cell.y as usize * self.width as usize + cell.x as usize)
        } else {
            None
        }
    }

    pub fn is_walkable(&self, cell: Cell) -> bool {
        self.index(cell).map(|i| self.walkable[i]).unwrap_or(false)
    }

    /// All walkable cells in row-major order
    pub fn walkable_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        let w = self.width as usize;
        self.walkable
            .iter()
            .enumerate()
            .filter(|(_, open)| **open)
            .map(move |(i, _)| Cell::new((i % w) as i32, (i / w) as i32))
    }
}

impl Passable for ObstacleMap {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn is_passable(&self, cell: Cell) -> bool {
        self.is_walkable(cell)
    }
}

/// A base map with extra cells blocked, typically cells held by other agents
pub struct Overlay<'a, P: Passable> {
    base: &'a P,
    blocked: &'a HashSet<Cell>,
}

impl<'a, P: Passable> Overlay<'a, P> {
    pub fn new(base: &'a P, blocked: &'a HashSet<Cell>) -> Self {
        Self { base, blocked }
    }
}

impl<P: Passable> Passable for Overlay<'_, P> {
    fn dimensions(&self) -> (u32, u32) {
        self.base.dimensions()
    }

    fn is_passable(&self, cell: Cell) -> bool {
        self.base.is_passable(cell) && !self.blocked.contains(&cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_ascii() {
        let map = ObstacleMap::from_ascii(
            "
            ..#.
            .~..
            ",
        )
        .unwrap();
        assert_eq!(map.width(), 4);
        assert_eq!(map.height(), 2);
        assert!(map.is_walkable(Cell::new(0, 0)));
        assert!(!map.is_walkable(Cell::new(2, 0)));
        assert!(!map.is_walkable(Cell::new(1, 1)));
        assert!(!map.is_walkable(Cell::new(4, 0)));
        assert!(!map.is_walkable(Cell::new(-1, 0)));
    }

    #[test]
    fn test_from_ascii_errors() {
        assert_eq!(ObstacleMap::from_ascii("  \n "), Err(GridError::Empty));
        assert_eq!(
            ObstacleMap::from_ascii("...\n.."),
            Err(GridError::RaggedRow { row: 1, expected: 3, found: 2 })
        );
        assert_eq!(
            ObstacleMap::from_ascii(".x."),
            Err(GridError::UnknownTile { tile: 'x', row: 0, col: 1 })
        );
    }

    #[test]
    fn test_obstacle_rect() {
        let map = ObstacleMap::new(5, 5).with_obstacle_rect(Cell::new(1, 1), 2, 3);
        assert!(!map.is_walkable(Cell::new(1, 1)));
        assert!(!map.is_walkable(Cell::new(2, 3)));
        assert!(map.is_walkable(Cell::new(3, 1)));
        assert_eq!(map.walkable_cells().count(), 25 - 6);
    }

    #[test]
    fn test_overlay_blocks_extra_cells() {
        let map = ObstacleMap::new(3, 3);
        let blocked: HashSet<Cell> = [Cell::new(1, 1)].into_iter().collect();
        let overlay = Overlay::new(&map, &blocked);
        assert!(!overlay.is_passable(Cell::new(1, 1)));
        assert!(overlay.is_passable(Cell::new(0, 1)));
        assert!(map.is_passable(Cell::new(1, 1)));
        assert_eq!(overlay.dimensions(), (3, 3));
    }
}
