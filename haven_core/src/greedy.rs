use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::{Path, Position, map::Grid};

/// Longest path, in cells, a single greedy walk may produce.
pub const MAX_PATH_CELLS: usize = 65;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalkEnd {
    Arrived,
    DeadEnd,
    DepthExceeded,
}

/// A neighbor that tied the running best while ranking.
///
/// Exploring it resumes from `path[..prefix_len]`, whose last cell is the
/// tied cell's parent.
#[derive(Debug, Clone, Copy)]
struct Fork {
    cell: Position,
    prefix_len: usize,
}

#[derive(Debug)]
struct Walk {
    path: Path,
    forks: Vec<Fork>,
    end: WalkEnd,
}

#[derive(Debug, Default)]
struct Ranking {
    best: Option<Position>,
    ties: Vec<Position>,
}

/// Greedy walk toward the target with one level of fork exploration.
///
/// If the direct walk dead-ends, a single retry goes through the haven and
/// defeats the monster on the way from the haven to the goal.
pub struct GreedySearch<'g> {
    grid: &'g mut Grid,
}

impl<'g> GreedySearch<'g> {
    pub fn new(grid: &'g mut Grid) -> Self {
        GreedySearch { grid }
    }

    /// Returns the best path found. It ends on `goal` only when the search
    /// succeeded.
    #[tracing::instrument(level = "trace", skip_all, fields(start = %start, goal = %goal))]
    pub fn search(&mut self, start: Position, goal: Position) -> Path {
        let main = self.walk(start, goal, false);
        match main.end {
            WalkEnd::Arrived => self.explore_forks(main, goal),
            WalkEnd::DepthExceeded => {
                debug!(cells = main.path.len(), "Greedy walk hit its depth bound");
                main.path
            }
            WalkEnd::DeadEnd => match self.grid.haven() {
                Some(haven) => self.via_haven(start, haven, goal),
                None => main.path,
            },
        }
    }

    /// Ranks the usable neighbors of `current` by Manhattan distance to `target`.
    ///
    /// The first strictly closer neighbor becomes the best; neighbors equal to
    /// the best at the time they are seen are reported as ties.
    fn rank(&self, current: Position, target: Position, visited: &[Position]) -> Ranking {
        let mut ranking = Ranking::default();
        let mut best_distance = usize::MAX;
        for neighbor in self.grid.neighbors8(current) {
            if visited.contains(&neighbor) || self.grid[neighbor].is_impassable() {
                continue;
            }
            let distance = neighbor.manhattan(&target);
            if ranking.best.is_none() || distance < best_distance {
                ranking.best = Some(neighbor);
                best_distance = distance;
            } else if distance == best_distance {
                ranking.ties.push(neighbor);
            }
        }
        ranking
    }

    fn walk(&mut self, start: Position, target: Position, defeats_monster: bool) -> Walk {
        let mut path = vec![start];
        let mut forks = Vec::new();
        let mut current = start;
        let end = loop {
            if current == target {
                break WalkEnd::Arrived;
            }
            if defeats_monster {
                for neighbor in self.grid.neighbors8(current) {
                    self.grid.defeat_monster(neighbor);
                }
            }
            let ranking = self.rank(current, target, &path);
            let Some(next) = ranking.best else {
                break WalkEnd::DeadEnd;
            };
            if path.len() >= MAX_PATH_CELLS {
                break WalkEnd::DepthExceeded;
            }
            let prefix_len = path.len();
            forks.extend(
                ranking
                    .ties
                    .into_iter()
                    .map(|cell| Fork { cell, prefix_len }),
            );
            path.push(next);
            current = next;
        };
        trace!(cells = path.len(), forks = forks.len(), ?end, "Walk finished");
        Walk { path, forks, end }
    }

    /// Keeps the shortest of the main walk and every fork that reaches `goal`.
    fn explore_forks(&mut self, main: Walk, goal: Position) -> Path {
        let mut worklist: VecDeque<Path> = main
            .forks
            .iter()
            .map(|fork| {
                let mut prefix = main.path[..fork.prefix_len].to_vec();
                prefix.push(fork.cell);
                prefix
            })
            .collect();
        let explored = worklist.len();
        let mut best = main.path;

        while let Some(prefix) = worklist.pop_front() {
            if let Some(candidate) = self.continue_fork(prefix, goal, best.len()) {
                if candidate.len() < best.len() {
                    best = candidate;
                }
            }
        }
        trace!(explored, cells = best.len(), "Forks explored");
        best
    }

    /// Greedily extends a fork prefix toward `goal` without recording new
    /// forks. Gives up once the path can no longer beat `bound` cells.
    fn continue_fork(&self, mut path: Path, goal: Position, bound: usize) -> Option<Path> {
        let mut current = *path.last()?;
        loop {
            if current == goal {
                return Some(path);
            }
            if path.len() >= bound.min(MAX_PATH_CELLS) {
                return None;
            }
            let next = self.rank(current, goal, &path).best?;
            path.push(next);
            current = next;
        }
    }

    // The first leg does not explore its forks.
    fn via_haven(&mut self, start: Position, haven: Position, goal: Position) -> Path {
        debug!(haven = %haven, "Direct walk dead-ended, retrying through the haven");
        let to_haven = self.walk(start, haven, false);
        if to_haven.end != WalkEnd::Arrived {
            return to_haven.path;
        }
        let to_goal = self.walk(haven, goal, true);
        let mut path = to_haven.path;
        path.extend(to_goal.path.into_iter().skip(1));
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{AgentKind, Tag};

    fn pos(x: usize, y: usize) -> Position {
        Position::new(x, y)
    }

    fn assert_connected(path: &[Position]) {
        for pair in path.windows(2) {
            assert_eq!(pair[0].chebyshev(&pair[1]), 1, "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn walks_straight_on_an_empty_grid() {
        let mut grid = Grid::new();
        let path = GreedySearch::new(&mut grid).search(pos(0, 0), pos(0, 8));
        let expected: Path = (0..9).map(|y| pos(0, y)).collect();
        assert_eq!(path, expected);
    }

    #[test]
    fn takes_the_diagonal() {
        let mut grid = Grid::new();
        let path = GreedySearch::new(&mut grid).search(pos(0, 0), pos(8, 8));
        let expected: Path = (0..9).map(|i| pos(i, i)).collect();
        assert_eq!(path, expected);
    }

    #[test]
    fn ties_are_measured_against_the_running_best() {
        let mut grid = Grid::new();
        grid.place_rock(pos(1, 1)).unwrap();
        let search = GreedySearch::new(&mut grid);

        let ranking = search.rank(pos(0, 0), pos(8, 8), &[]);
        assert_eq!(ranking.best, Some(pos(0, 1)));
        assert_eq!(ranking.ties, vec![pos(1, 0)]);

        let ranking = search.rank(pos(4, 4), pos(8, 8), &[]);
        assert_eq!(ranking.best, Some(pos(5, 5)));
        assert_eq!(ranking.ties, vec![pos(5, 4)]);
    }

    #[test]
    fn visited_and_blocked_neighbors_are_skipped() {
        let mut grid = Grid::new();
        grid.place_rock(pos(2, 1)).unwrap();
        let search = GreedySearch::new(&mut grid);
        let ranking = search.rank(pos(1, 1), pos(8, 1), &[pos(2, 2)]);
        assert_eq!(ranking.best, Some(pos(2, 0)));
        assert_eq!(ranking.ties, vec![pos(1, 0), pos(1, 2)]);
    }

    #[test]
    fn shorter_fork_replaces_the_main_walk() {
        let mut grid = Grid::new();
        for rock in [pos(1, 1), pos(0, 2), pos(1, 2)] {
            grid.place_rock(rock).unwrap();
        }
        let mut search = GreedySearch::new(&mut grid);

        let main = search.walk(pos(0, 0), pos(8, 8), false);
        assert_eq!(main.end, WalkEnd::Arrived);
        assert_eq!(main.path.len(), 11);
        assert!(!main.forks.is_empty());

        let path = search.search(pos(0, 0), pos(8, 8));
        assert_eq!(path.len(), 10);
        assert_eq!(path[1], pos(1, 0));
        assert_eq!(path.last(), Some(&pos(8, 8)));
        assert_connected(&path);
    }

    #[test]
    fn result_is_no_longer_than_any_explored_fork() {
        let mut grid = Grid::new();
        grid.place_agent(AgentKind::PursuerHazard, pos(3, 2)).unwrap();
        grid.place_rock(pos(1, 1)).unwrap();
        grid.place_rock(pos(6, 6)).unwrap();
        let (start, goal) = (pos(0, 0), pos(8, 8));
        let mut search = GreedySearch::new(&mut grid);

        let main = search.walk(start, goal, false);
        assert_eq!(main.end, WalkEnd::Arrived);
        let fork_paths: Vec<Path> = main
            .forks
            .iter()
            .filter_map(|fork| {
                let mut prefix = main.path[..fork.prefix_len].to_vec();
                prefix.push(fork.cell);
                search.continue_fork(prefix, goal, usize::MAX)
            })
            .collect();

        let path = search.search(start, goal);
        assert_eq!(path.last(), Some(&goal));
        assert!(path.len() <= main.path.len());
        for fork_path in &fork_paths {
            assert!(path.len() <= fork_path.len());
        }
    }

    #[test]
    fn dead_end_falls_back_through_the_haven() {
        let mut grid = Grid::new();
        for rock in [pos(5, 0), pos(1, 1), pos(2, 1), pos(3, 1), pos(4, 1), pos(5, 1)] {
            grid.place_rock(rock).unwrap();
        }
        grid.place_haven(pos(0, 4)).unwrap();
        let mut search = GreedySearch::new(&mut grid);

        let main = search.walk(pos(0, 0), pos(8, 0), false);
        assert_eq!(main.end, WalkEnd::DeadEnd);
        assert_eq!(main.path.last(), Some(&pos(4, 0)));

        let path = search.search(pos(0, 0), pos(8, 0));
        assert_eq!(path.first(), Some(&pos(0, 0)));
        assert_eq!(path.last(), Some(&pos(8, 0)));
        assert_eq!(path.iter().filter(|cell| **cell == pos(0, 4)).count(), 1);
        assert_eq!(path[4], pos(0, 4));
        assert_eq!(path.len(), 13);
        assert_connected(&path);
    }

    #[test]
    fn second_leg_defeats_a_monster_next_to_the_haven() {
        let mut grid = Grid::new();
        grid.place_haven(pos(3, 3)).unwrap();
        grid.place_agent(AgentKind::Monster, pos(4, 4)).unwrap();
        let mut search = GreedySearch::new(&mut grid);

        let leg = search.walk(pos(3, 3), pos(6, 6), true);
        assert_eq!(leg.end, WalkEnd::Arrived);
        assert_eq!(leg.path, vec![pos(3, 3), pos(4, 4), pos(5, 5), pos(6, 6)]);
        assert_eq!(grid[pos(4, 4)], Tag::Empty);
        assert_eq!(grid[pos(5, 3)], Tag::Empty);
    }

    #[test]
    fn enclosed_goal_without_a_haven_returns_the_dead_end_walk() {
        let mut grid = Grid::new();
        for cell in grid.neighbors8(pos(4, 4)) {
            grid.place_rock(cell).unwrap();
        }
        let mut search = GreedySearch::new(&mut grid);

        let main = search.walk(pos(0, 0), pos(4, 4), false);
        assert_eq!(main.end, WalkEnd::DeadEnd);
        assert_eq!(main.path.len(), 41);

        let path = search.search(pos(0, 0), pos(4, 4));
        assert_eq!(path, main.path);
        assert_connected(&path);
    }

    #[test]
    fn depth_bound_ends_the_search_without_the_haven() {
        let mut grid = Grid::new();
        for rock in [pos(0, 7), pos(1, 1), pos(1, 7), pos(1, 8), pos(2, 6)] {
            grid.place_rock(rock).unwrap();
        }
        grid.place_haven(pos(8, 0)).unwrap();
        let mut search = GreedySearch::new(&mut grid);

        let main = search.walk(pos(0, 0), pos(0, 8), false);
        assert_eq!(main.end, WalkEnd::DepthExceeded);
        assert_eq!(main.path.len(), MAX_PATH_CELLS);
        assert_eq!(main.path.last(), Some(&pos(8, 4)));

        let path = search.search(pos(0, 0), pos(0, 8));
        assert_eq!(path, main.path);
        assert!(!path.contains(&pos(8, 0)));
        assert_connected(&path);
    }
}
