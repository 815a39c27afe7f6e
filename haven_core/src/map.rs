use std::fmt;
use std::ops::Index;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{GRID_SIZE, Position};

/// Represents errors that can occur within the grid operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("Coordinates ({x}, {y}) are out of bounds for a {size}x{size} grid")]
    OutOfBounds { x: usize, y: usize, size: usize },
}

/// What occupies a cell. A cell carries exactly one tag at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    #[default]
    Empty,
    Pursuer,
    PursuerHazard,
    Monster,
    Rock,
    Goal,
    Haven,
    DangerZone,
}

impl Tag {
    /// True for tags placed by an agent, which projected danger zones never overwrite.
    pub fn is_agent(self) -> bool {
        match self {
            Tag::Empty | Tag::DangerZone => false,
            Tag::Pursuer
            | Tag::PursuerHazard
            | Tag::Monster
            | Tag::Rock
            | Tag::Goal
            | Tag::Haven => true,
        }
    }

    /// True for tags neither search may step onto.
    pub fn is_impassable(self) -> bool {
        match self {
            Tag::DangerZone | Tag::Rock | Tag::Monster | Tag::PursuerHazard => true,
            Tag::Empty | Tag::Pursuer | Tag::Goal | Tag::Haven => false,
        }
    }

    /// Single character used when printing a board.
    pub fn glyph(self) -> char {
        match self {
            Tag::Empty => '.',
            Tag::Pursuer => 'P',
            Tag::PursuerHazard => 'H',
            Tag::Monster => 'M',
            Tag::Rock => 'R',
            Tag::Goal => 'G',
            Tag::Haven => 'S',
            Tag::DangerZone => 'x',
        }
    }
}

/// Shape of the cells surrounding a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Neighborhood {
    /// The eight horizontally, vertically and diagonally adjacent cells.
    Moore,
    /// The four orthogonally adjacent cells.
    VonNeumann,
}

impl Neighborhood {
    /// Lists the in-bounds cells of this neighborhood around `position`.
    ///
    /// Cells are enumerated column offset first (-1, 0, 1), then row offset,
    /// which the greedy search relies on for its tie-breaking.
    pub fn around(self, position: Position) -> Vec<Position> {
        let mut neighbors = Vec::with_capacity(8);
        for dx in -1..=1 {
            for dy in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                if self == Neighborhood::VonNeumann && dx != 0 && dy != 0 {
                    continue;
                }
                if let Some(neighbor) = position.offset(dx, dy) {
                    neighbors.push(neighbor);
                }
            }
        }
        neighbors
    }
}

/// The six agents a scenario places on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentKind {
    Pursuer,
    PursuerHazard,
    Monster,
    Rock,
    Goal,
    Haven,
}

impl AgentKind {
    /// The tag this agent leaves on its own cell.
    pub fn tag(self) -> Tag {
        match self {
            AgentKind::Pursuer => Tag::Pursuer,
            AgentKind::PursuerHazard => Tag::PursuerHazard,
            AgentKind::Monster => Tag::Monster,
            AgentKind::Rock => Tag::Rock,
            AgentKind::Goal => Tag::Goal,
            AgentKind::Haven => Tag::Haven,
        }
    }

    /// The zone a hazardous agent turns into danger, if any.
    pub fn perception(self) -> Option<Neighborhood> {
        match self {
            AgentKind::Monster => Some(Neighborhood::Moore),
            AgentKind::PursuerHazard => Some(Neighborhood::VonNeumann),
            AgentKind::Pursuer | AgentKind::Rock | AgentKind::Goal | AgentKind::Haven => None,
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AgentKind::Pursuer => "pursuer",
            AgentKind::PursuerHazard => "pursuer hazard",
            AgentKind::Monster => "monster",
            AgentKind::Rock => "rock",
            AgentKind::Goal => "goal",
            AgentKind::Haven => "haven",
        };
        f.write_str(name)
    }
}

/// The 9x9 hazard board.
///
/// Stores one [`Tag`] per cell in row-major order, plus the rock and haven
/// locations which must be known even when their own cell tag was never set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    cells: Vec<Tag>,
    rock: Option<Position>,
    haven: Option<Position>,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

impl Grid {
    /// Creates a board with every cell empty.
    pub fn new() -> Self {
        Grid {
            cells: vec![Tag::Empty; GRID_SIZE * GRID_SIZE],
            rock: None,
            haven: None,
        }
    }

    /// Checks if raw coordinates fall inside the board.
    #[inline]
    pub fn is_valid_coordinate(x: isize, y: isize) -> bool {
        let range = 0..GRID_SIZE as isize;
        range.contains(&x) && range.contains(&y)
    }

    #[inline]
    fn index_of(position: Position) -> Result<usize, GridError> {
        if position.x < GRID_SIZE && position.y < GRID_SIZE {
            Ok(position.y * GRID_SIZE + position.x)
        } else {
            Err(GridError::OutOfBounds {
                x: position.x,
                y: position.y,
                size: GRID_SIZE,
            })
        }
    }

    /// Gets the tag at the given position.
    ///
    /// Returns `None` if the position is out of bounds.
    pub fn get(&self, position: Position) -> Option<Tag> {
        Self::index_of(position).ok().map(|index| self.cells[index])
    }

    /// Location recorded by the last rock placement.
    pub fn rock(&self) -> Option<Position> {
        self.rock
    }

    /// Location recorded by the last haven placement.
    pub fn haven(&self) -> Option<Position> {
        self.haven
    }

    /// Up to eight surrounding cells, clipped to the board. Column offset
    /// varies slowest, which fixes the greedy tie order.
    pub fn neighbors8(&self, position: Position) -> Vec<Position> {
        Neighborhood::Moore.around(position)
    }

    /// Up to four orthogonal neighbors, clipped to the board, in the same
    /// order as [`Grid::neighbors8`].
    pub fn neighbors4(&self, position: Position) -> Vec<Position> {
        Neighborhood::VonNeumann.around(position)
    }

    /// Places an agent, projecting its danger zone if it has one.
    ///
    /// Zone cells already holding an agent tag keep it. Rocks and havens are
    /// delegated to [`Grid::place_rock`] and [`Grid::place_haven`].
    pub fn place_agent(&mut self, kind: AgentKind, position: Position) -> Result<(), GridError> {
        match kind {
            AgentKind::Rock => self.place_rock(position),
            AgentKind::Haven => self.place_haven(position),
            AgentKind::Pursuer
            | AgentKind::PursuerHazard
            | AgentKind::Monster
            | AgentKind::Goal => {
                let index = Self::index_of(position)?;
                self.cells[index] = kind.tag();
                if let Some(zone) = kind.perception() {
                    for cell in zone.around(position) {
                        let index = Self::index_of(cell)?;
                        if !self.cells[index].is_agent() {
                            self.cells[index] = Tag::DangerZone;
                        }
                    }
                }
                Ok(())
            }
        }
    }

    /// Tags `position` as the rock if it is empty, and records it either way.
    pub fn place_rock(&mut self, position: Position) -> Result<(), GridError> {
        self.place_if_empty(position, Tag::Rock)?;
        self.rock = Some(position);
        Ok(())
    }

    /// Tags `position` as the haven if it is empty, and records it either way.
    pub fn place_haven(&mut self, position: Position) -> Result<(), GridError> {
        self.place_if_empty(position, Tag::Haven)?;
        self.haven = Some(position);
        Ok(())
    }

    fn place_if_empty(&mut self, position: Position, tag: Tag) -> Result<(), GridError> {
        let index = Self::index_of(position)?;
        if self.cells[index] == Tag::Empty {
            self.cells[index] = tag;
        }
        Ok(())
    }

    /// Empties every cell and forgets the rock and haven.
    pub fn clear(&mut self) {
        self.cells.fill(Tag::Empty);
        self.rock = None;
        self.haven = None;
    }

    /// Removes the monster at `position` together with its danger zone.
    ///
    /// The monster cell and all eight surrounding cells become empty, except
    /// the recorded rock cell which is left tagged as the rock. Nothing happens
    /// when `position` holds no monster or is the rock's cell. Returns whether
    /// a monster was removed.
    pub fn defeat_monster(&mut self, position: Position) -> bool {
        if self.get(position) != Some(Tag::Monster) || self.rock == Some(position) {
            return false;
        }
        let mut cleared = 0;
        for cell in std::iter::once(position).chain(self.neighbors8(position)) {
            let Ok(index) = Self::index_of(cell) else {
                continue;
            };
            self.cells[index] = if self.rock == Some(cell) {
                Tag::Rock
            } else {
                cleared += 1;
                Tag::Empty
            };
        }
        debug!(x = position.x, y = position.y, cleared, "Monster defeated");
        true
    }

    /// Returns an iterator that yields `(position, tag)` for each cell.
    pub fn enumerate(&self) -> impl Iterator<Item = (Position, Tag)> + '_ {
        self.cells.iter().enumerate().map(|(index, tag)| {
            (Position::new(index % GRID_SIZE, index / GRID_SIZE), *tag)
        })
    }
}

/// Allows indexing the grid by [`Position`].
impl Index<Position> for Grid {
    type Output = Tag;

    #[inline]
    fn index(&self, position: Position) -> &Self::Output {
        match Self::index_of(position) {
            Ok(index) => &self.cells[index],
            Err(err) => panic!("{err}"),
        }
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, " ")?;
        for x in 0..GRID_SIZE {
            write!(f, " {x}")?;
        }
        writeln!(f)?;
        for (position, tag) in self.enumerate() {
            if position.x == 0 {
                write!(f, "{}", position.y)?;
            }
            write!(f, " {}", tag.glyph())?;
            if position.x == GRID_SIZE - 1 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(x: usize, y: usize) -> Position {
        Position::new(x, y)
    }

    #[test]
    fn neighbors8_counts_follow_board_edges() {
        let grid = Grid::new();
        for (position, _) in grid.enumerate() {
            let neighbors = grid.neighbors8(position);
            let on_x_edge = position.x == 0 || position.x == GRID_SIZE - 1;
            let on_y_edge = position.y == 0 || position.y == GRID_SIZE - 1;
            let expected = match (on_x_edge, on_y_edge) {
                (true, true) => 3,
                (true, false) | (false, true) => 5,
                (false, false) => 8,
            };
            assert_eq!(neighbors.len(), expected, "at {position}");
            assert!(!neighbors.contains(&position));
            assert!(neighbors.iter().all(|n| grid.get(*n).is_some()));
            assert!(neighbors.iter().all(|n| n.chebyshev(&position) == 1));
        }
    }

    #[test]
    fn neighbors4_are_orthogonal() {
        let grid = Grid::new();
        assert_eq!(grid.neighbors4(pos(0, 0)), vec![pos(0, 1), pos(1, 0)]);
        assert_eq!(grid.neighbors4(pos(4, 0)).len(), 3);
        let center = grid.neighbors4(pos(4, 4));
        assert_eq!(center, vec![pos(3, 4), pos(4, 3), pos(4, 5), pos(5, 4)]);
        assert!(center.iter().all(|n| n.manhattan(&pos(4, 4)) == 1));
    }

    #[test]
    fn neighbors8_enumerates_columns_first() {
        let grid = Grid::new();
        assert_eq!(
            grid.neighbors8(pos(1, 1)),
            vec![
                pos(0, 0),
                pos(0, 1),
                pos(0, 2),
                pos(1, 0),
                pos(1, 2),
                pos(2, 0),
                pos(2, 1),
                pos(2, 2),
            ]
        );
    }

    #[test]
    fn coordinate_validity() {
        assert!(Grid::is_valid_coordinate(0, 0));
        assert!(Grid::is_valid_coordinate(8, 8));
        assert!(!Grid::is_valid_coordinate(-1, 3));
        assert!(!Grid::is_valid_coordinate(3, 9));
    }

    #[test]
    fn monster_projects_moore_zone() {
        let mut grid = Grid::new();
        grid.place_agent(AgentKind::Monster, pos(4, 4)).unwrap();
        assert_eq!(grid[pos(4, 4)], Tag::Monster);
        for cell in grid.neighbors8(pos(4, 4)) {
            assert_eq!(grid[cell], Tag::DangerZone);
        }
        let dangers = grid.enumerate().filter(|(_, t)| *t == Tag::DangerZone).count();
        assert_eq!(dangers, 8);
    }

    #[test]
    fn pursuer_hazard_projects_orthogonal_zone() {
        let mut grid = Grid::new();
        grid.place_agent(AgentKind::PursuerHazard, pos(2, 2)).unwrap();
        for cell in grid.neighbors4(pos(2, 2)) {
            assert_eq!(grid[cell], Tag::DangerZone);
        }
        for diagonal in [pos(1, 1), pos(3, 3), pos(1, 3), pos(3, 1)] {
            assert_eq!(grid[diagonal], Tag::Empty);
        }
    }

    #[test]
    fn danger_zones_never_overwrite_agents() {
        let mut grid = Grid::new();
        grid.place_agent(AgentKind::Pursuer, pos(0, 0)).unwrap();
        grid.place_agent(AgentKind::Goal, pos(2, 1)).unwrap();
        grid.place_agent(AgentKind::Monster, pos(1, 1)).unwrap();
        assert_eq!(grid[pos(0, 0)], Tag::Pursuer);
        assert_eq!(grid[pos(2, 1)], Tag::Goal);
        assert_eq!(grid[pos(1, 0)], Tag::DangerZone);
    }

    #[test]
    fn rock_and_haven_only_claim_empty_cells() {
        let mut grid = Grid::new();
        grid.place_agent(AgentKind::Monster, pos(4, 4)).unwrap();
        grid.place_rock(pos(5, 5)).unwrap();
        grid.place_haven(pos(4, 4)).unwrap();
        assert_eq!(grid[pos(5, 5)], Tag::DangerZone);
        assert_eq!(grid[pos(4, 4)], Tag::Monster);
        assert_eq!(grid.rock(), Some(pos(5, 5)));
        assert_eq!(grid.haven(), Some(pos(4, 4)));

        grid.place_agent(AgentKind::Haven, pos(8, 8)).unwrap();
        assert_eq!(grid[pos(8, 8)], Tag::Haven);
        assert_eq!(grid.haven(), Some(pos(8, 8)));
    }

    #[test]
    fn out_of_bounds_placement_is_rejected() {
        let mut grid = Grid::new();
        let err = grid.place_agent(AgentKind::Goal, pos(9, 0)).unwrap_err();
        assert_eq!(err, GridError::OutOfBounds { x: 9, y: 0, size: 9 });
        assert!(grid.place_rock(pos(0, 12)).is_err());
        assert_eq!(grid.rock(), None);
    }

    #[test]
    fn defeating_the_monster_clears_its_zone_but_keeps_the_rock() {
        let mut grid = Grid::new();
        grid.place_agent(AgentKind::Monster, pos(4, 4)).unwrap();
        grid.place_rock(pos(5, 5)).unwrap();

        assert!(grid.defeat_monster(pos(4, 4)));
        assert_eq!(grid[pos(4, 4)], Tag::Empty);
        for cell in grid.neighbors8(pos(4, 4)) {
            let expected = if cell == pos(5, 5) { Tag::Rock } else { Tag::Empty };
            assert_eq!(grid[cell], expected);
        }
        assert!(!grid.defeat_monster(pos(4, 4)));
    }

    #[test]
    fn monster_sharing_the_rock_cell_cannot_be_defeated() {
        let mut grid = Grid::new();
        grid.place_agent(AgentKind::Monster, pos(3, 3)).unwrap();
        grid.place_rock(pos(3, 3)).unwrap();
        assert!(!grid.defeat_monster(pos(3, 3)));
        assert_eq!(grid[pos(3, 3)], Tag::Monster);
    }

    #[test]
    fn clear_resets_everything() {
        let mut grid = Grid::new();
        grid.place_agent(AgentKind::Monster, pos(4, 4)).unwrap();
        grid.place_haven(pos(0, 8)).unwrap();
        grid.clear();
        assert_eq!(grid, Grid::new());
        assert!(grid.enumerate().all(|(_, tag)| tag == Tag::Empty));
    }

    #[test]
    fn display_prints_glyph_rows() {
        let mut grid = Grid::new();
        grid.place_agent(AgentKind::Pursuer, pos(0, 0)).unwrap();
        let rendered = grid.to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), GRID_SIZE + 1);
        assert_eq!(lines[0], "  0 1 2 3 4 5 6 7 8");
        assert_eq!(lines[1], "0 P . . . . . . . .");
    }
}
