use std::{
    cmp::Ordering,
    collections::{BinaryHeap, HashMap, HashSet},
};

use tracing::trace;

use crate::{GRID_SIZE, Path, Position, map::Grid};

/// Raised when the search's own bookkeeping turns out inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("Predecessor chain broken at {at} while rebuilding the path.")]
    BrokenChain { at: Position },
}

/// Per-search bookkeeping for one cell. Absent cells have an infinite `f`.
#[derive(Debug, Clone, Copy)]
struct CellState {
    g: usize,
    h: usize,
    f: usize,
    parent: Option<Position>,
}

impl Default for CellState {
    fn default() -> Self {
        CellState {
            g: 0,
            h: 0,
            f: usize::MAX,
            parent: None,
        }
    }
}

/// Frontier entry. Lowest priority first, then earliest arrival.
#[derive(Clone, Eq, PartialEq)]
struct PrioritizedItem {
    priority: usize,
    arrival: usize,
    position: Position,
}

impl Ord for PrioritizedItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.arrival.cmp(&self.arrival))
    }
}

impl PartialOrd for PrioritizedItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Best-first search over the eight-neighbor kernel with a Manhattan heuristic.
///
/// A search starting on the haven defeats any monster it finds next to a cell
/// it expands. That mutation is written to the borrowed grid and outlives the
/// search.
pub struct BestFirstSearch<'g> {
    grid: &'g mut Grid,
}

impl<'g> BestFirstSearch<'g> {
    pub fn new(grid: &'g mut Grid) -> Self {
        BestFirstSearch { grid }
    }

    /// Finds a path from `start` to `goal`, both inclusive.
    ///
    /// Returns `Ok(None)` when the frontier runs dry.
    #[tracing::instrument(level = "trace", skip_all, fields(start = %start, goal = %goal))]
    pub fn search(&mut self, start: Position, goal: Position) -> Result<Option<Path>, SearchError> {
        let defeats_monster = self.grid.haven() == Some(start);
        let mut states: HashMap<Position, CellState> = HashMap::new();
        let mut frontier = BinaryHeap::new();
        let mut open: HashSet<Position> = HashSet::new();
        let mut settled: HashSet<Position> = HashSet::new();
        let mut arrivals = 0;
        let mut expansions = 0;

        let h = start.manhattan(&goal);
        states.insert(
            start,
            CellState {
                g: 0,
                h,
                f: h,
                parent: None,
            },
        );
        frontier.push(PrioritizedItem {
            priority: h,
            arrival: arrivals,
            position: start,
        });
        open.insert(start);

        while let Some(PrioritizedItem {
            priority,
            position: current,
            ..
        }) = frontier.pop()
        {
            let Some(current_state) = states.get(&current).copied() else {
                continue;
            };
            // Relaxed cells leave their old entry behind.
            if settled.contains(&current) || priority != current_state.f {
                continue;
            }
            open.remove(&current);
            expansions += 1;

            for neighbor in self.grid.neighbors8(current) {
                if neighbor == goal {
                    states.entry(goal).or_default().parent = Some(current);
                    trace!(expansions, "Path found");
                    return Self::reconstruct_path(&states, start, goal).map(Some);
                }

                if defeats_monster {
                    self.grid.defeat_monster(neighbor);
                }
                if self.grid[neighbor].is_impassable() {
                    continue;
                }

                let g = current_state.g + 1;
                let h = neighbor.manhattan(&goal);
                if !open.contains(&neighbor) {
                    if !settled.contains(&neighbor) {
                        states.insert(
                            neighbor,
                            CellState {
                                g,
                                h,
                                f: g + h,
                                parent: Some(current),
                            },
                        );
                        arrivals += 1;
                        frontier.push(PrioritizedItem {
                            priority: g + h,
                            arrival: arrivals,
                            position: neighbor,
                        });
                        open.insert(neighbor);
                    }
                } else {
                    let state = states.entry(neighbor).or_default();
                    if current_state.f + 1 < state.f {
                        *state = CellState {
                            g,
                            h,
                            f: g + h,
                            parent: Some(current),
                        };
                        arrivals += 1;
                        frontier.push(PrioritizedItem {
                            priority: state.f,
                            arrival: arrivals,
                            position: neighbor,
                        });
                    }
                }
            }
            settled.insert(current);
        }

        trace!(expansions, "No path found");
        Ok(None)
    }

    fn reconstruct_path(
        states: &HashMap<Position, CellState>,
        start: Position,
        goal: Position,
    ) -> Result<Path, SearchError> {
        let mut path = vec![goal];
        let mut current = goal;
        while current != start {
            current = states
                .get(&current)
                .and_then(|state| state.parent)
                .ok_or(SearchError::BrokenChain { at: current })?;
            path.push(current);
            if path.len() > GRID_SIZE * GRID_SIZE {
                return Err(SearchError::BrokenChain { at: current });
            }
        }
        path.reverse();
        Ok(path)
    }
}
