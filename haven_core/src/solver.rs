use std::{
    fmt,
    time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    Path, Position,
    greedy::GreedySearch,
    informed::{BestFirstSearch, SearchError},
    map::{Grid, GridError},
    scenario::{Scenario, ScenarioError},
    step_count,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SolveError {
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
}

/// The two search strategies a puzzle can be solved with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Informed,
    Greedy,
}

impl Algorithm {
    pub const ALL: [Algorithm; 2] = [Algorithm::Informed, Algorithm::Greedy];

    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Informed => "informed",
            Algorithm::Greedy => "greedy",
        }
    }

    /// File a text report for this algorithm is written to.
    pub fn report_file_name(self) -> &'static str {
        match self {
            Algorithm::Informed => "output_informed.txt",
            Algorithm::Greedy => "output_greedy.txt",
        }
    }

    pub fn solver(self) -> Box<dyn Solver> {
        match self {
            Algorithm::Informed => Box::new(InformedSolver),
            Algorithm::Greedy => Box::new(GreedySolver),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of one solve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Win { path: Path, elapsed: Duration },
    Lose,
}

impl Outcome {
    pub fn is_win(&self) -> bool {
        matches!(self, Outcome::Win { .. })
    }

    pub fn path(&self) -> Option<&[Position]> {
        match self {
            Outcome::Win { path, .. } => Some(path.as_slice()),
            Outcome::Lose => None,
        }
    }

    pub fn steps(&self) -> Option<usize> {
        self.path().map(step_count)
    }

    pub fn elapsed(&self) -> Option<Duration> {
        match self {
            Outcome::Win { elapsed, .. } => Some(*elapsed),
            Outcome::Lose => None,
        }
    }
}

/// A strategy that takes the pursuer from its origin to the goal.
///
/// Implementations restore `grid` from `scenario` before searching, so the
/// same grid can be reused across solves.
pub trait Solver {
    fn algorithm(&self) -> Algorithm;

    fn solve(&self, grid: &mut Grid, scenario: &Scenario) -> Result<Outcome, SolveError>;
}

/// Restores the grid and reports whether the pursuer can move at all.
fn prepare(grid: &mut Grid, scenario: &Scenario) -> Result<bool, SolveError> {
    scenario.apply(grid)?;
    if scenario.origin_in_danger() {
        debug!(origin = %scenario.pursuer, "Pursuer starts inside a danger zone");
        return Ok(false);
    }
    Ok(true)
}

fn log_outcome(algorithm: Algorithm, outcome: &Outcome) {
    match outcome {
        Outcome::Win { path, elapsed } => info!(
            %algorithm,
            steps = step_count(path),
            elapsed_us = elapsed.as_micros() as u64,
            "Win"
        ),
        Outcome::Lose => info!(%algorithm, "Lose"),
    }
}

/// Best-first search, straight to the goal or via the haven.
#[derive(Debug, Clone, Copy, Default)]
pub struct InformedSolver;

impl Solver for InformedSolver {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Informed
    }

    fn solve(&self, grid: &mut Grid, scenario: &Scenario) -> Result<Outcome, SolveError> {
        let started = Instant::now();
        if !prepare(grid, scenario)? {
            log_outcome(self.algorithm(), &Outcome::Lose);
            return Ok(Outcome::Lose);
        }

        let mut search = BestFirstSearch::new(grid);
        let path = match search.search(scenario.pursuer, scenario.goal)? {
            Some(path) => Some(path),
            None => {
                debug!(haven = %scenario.haven, "No direct route, trying the haven");
                let to_haven = search.search(scenario.pursuer, scenario.haven)?;
                let to_goal = search.search(scenario.haven, scenario.goal)?;
                to_haven.zip(to_goal).map(|(mut path, rest)| {
                    path.extend(rest.into_iter().skip(1));
                    path
                })
            }
        };

        let outcome = match path {
            Some(path) => Outcome::Win {
                path,
                elapsed: started.elapsed(),
            },
            None => Outcome::Lose,
        };
        log_outcome(self.algorithm(), &outcome);
        Ok(outcome)
    }
}

/// Greedy walk with fork exploration and a haven fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedySolver;

impl Solver for GreedySolver {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Greedy
    }

    fn solve(&self, grid: &mut Grid, scenario: &Scenario) -> Result<Outcome, SolveError> {
        let started = Instant::now();
        if !prepare(grid, scenario)? {
            log_outcome(self.algorithm(), &Outcome::Lose);
            return Ok(Outcome::Lose);
        }

        let path = GreedySearch::new(grid).search(scenario.pursuer, scenario.goal);
        let outcome = if path.last() == Some(&scenario.goal) {
            Outcome::Win {
                path,
                elapsed: started.elapsed(),
            }
        } else {
            Outcome::Lose
        };
        log_outcome(self.algorithm(), &outcome);
        Ok(outcome)
    }
}

/// A validated scenario together with the grid it is solved on.
#[derive(Debug, Clone)]
pub struct Puzzle {
    scenario: Scenario,
    grid: Grid,
}

impl Puzzle {
    pub fn new(scenario: Scenario) -> Result<Self, ScenarioError> {
        scenario.validate()?;
        let grid = scenario.build_grid()?;
        Ok(Puzzle { scenario, grid })
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn solve(&mut self, algorithm: Algorithm) -> Result<Outcome, SolveError> {
        algorithm.solver().solve(&mut self.grid, &self.scenario)
    }

    /// Runs every algorithm in turn on the same grid.
    pub fn solve_all(&mut self) -> Result<Vec<(Algorithm, Outcome)>, SolveError> {
        let mut outcomes = Vec::with_capacity(Algorithm::ALL.len());
        for algorithm in Algorithm::ALL {
            outcomes.push((algorithm, self.solve(algorithm)?));
        }
        Ok(outcomes)
    }
}
