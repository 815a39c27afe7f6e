use std::fmt;

use serde::{Deserialize, Serialize};

pub mod analysis;
pub mod generator;
pub mod greedy;
pub mod informed;
pub mod map;
pub mod report;
pub mod scenario;
pub mod solver;

/// Side length of the square board.
pub const GRID_SIZE: usize = 9;

/// Ordered cells from a start cell to a target cell, both inclusive.
pub type Path = Vec<Position>;

/// Represents a cell coordinate: column `x`, row `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Position { x, y }
    }

    /// Returns manhattan distance between two positions
    pub fn manhattan(&self, other: &Position) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Returns the number of king moves between two positions.
    pub fn chebyshev(&self, other: &Position) -> usize {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }

    /// Offsets the position, returning `None` if it would leave the board.
    pub fn offset(&self, dx: isize, dy: isize) -> Option<Position> {
        let x = self.x.checked_add_signed(dx)?;
        let y = self.y.checked_add_signed(dy)?;
        (x < GRID_SIZE && y < GRID_SIZE).then_some(Position { x, y })
    }
}

/// Formats as `[x,y]`, the token used by scenario files and reports.
impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.x, self.y)
    }
}

/// Number of steps taken along a path.
pub fn step_count(path: &[Position]) -> usize {
    path.len().saturating_sub(1)
}
