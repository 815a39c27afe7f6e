use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    Position,
    map::{AgentKind, Grid, GridError, Neighborhood},
};

/// The pursuer's mandatory starting cell.
pub const ORIGIN: Position = Position::new(0, 0);

/// Represents errors raised while reading or validating a scenario.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScenarioError {
    #[error("Scenario is empty.")]
    Empty,
    #[error("Expected 6 agent coordinates, found {0}.")]
    WrongAgentCount(usize),
    #[error("Malformed coordinate '{0}', expected [x,y].")]
    MalformedCoordinate(String),
    #[error("The {kind} at ({x}, {y}) is outside the grid.")]
    OutOfBounds { kind: AgentKind, x: isize, y: isize },
    #[error("Missing perception variant line.")]
    MissingVariant,
    #[error("Unknown perception variant '{0}', expected 1 or 2.")]
    UnknownVariant(String),
    #[error("The pursuer must start at [0,0], found {0}.")]
    PursuerNotAtOrigin(Position),
    #[error("The {kind} at {at} shares its cell with the {other}.")]
    Overlap {
        kind: AgentKind,
        other: AgentKind,
        at: Position,
    },
    #[error("The {kind} at {at} is adjacent to the pursuer hazard.")]
    NextToPursuerHazard { kind: AgentKind, at: Position },
    #[error("The {kind} at {at} lies inside a danger zone.")]
    InDangerZone { kind: AgentKind, at: Position },
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Shape of the pursuer's spyglass.
///
/// Read from scenario files and carried through reports, but the searches do
/// not consult it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerceptionVariant {
    #[default]
    Moore,
    ManhattanRadius2,
}

impl PerceptionVariant {
    pub fn code(self) -> u8 {
        match self {
            PerceptionVariant::Moore => 1,
            PerceptionVariant::ManhattanRadius2 => 2,
        }
    }
}

impl FromStr for PerceptionVariant {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(PerceptionVariant::Moore),
            "2" => Ok(PerceptionVariant::ManhattanRadius2),
            other => Err(ScenarioError::UnknownVariant(other.to_string())),
        }
    }
}

/// Where each of the six agents stands, plus the pursuer's perception variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub pursuer: Position,
    pub pursuer_hazard: Position,
    pub monster: Position,
    pub rock: Position,
    pub goal: Position,
    pub haven: Position,
    pub variant: PerceptionVariant,
}

impl Scenario {
    /// Agent kinds in the order scenario files list them.
    pub const ORDER: [AgentKind; 6] = [
        AgentKind::Pursuer,
        AgentKind::PursuerHazard,
        AgentKind::Monster,
        AgentKind::Rock,
        AgentKind::Goal,
        AgentKind::Haven,
    ];

    pub fn position_of(&self, kind: AgentKind) -> Position {
        match kind {
            AgentKind::Pursuer => self.pursuer,
            AgentKind::PursuerHazard => self.pursuer_hazard,
            AgentKind::Monster => self.monster,
            AgentKind::Rock => self.rock,
            AgentKind::Goal => self.goal,
            AgentKind::Haven => self.haven,
        }
    }

    pub fn set_position(&mut self, kind: AgentKind, position: Position) {
        let slot = match kind {
            AgentKind::Pursuer => &mut self.pursuer,
            AgentKind::PursuerHazard => &mut self.pursuer_hazard,
            AgentKind::Monster => &mut self.monster,
            AgentKind::Rock => &mut self.rock,
            AgentKind::Goal => &mut self.goal,
            AgentKind::Haven => &mut self.haven,
        };
        *slot = position;
    }

    /// Every placement, in file order.
    pub fn placements(&self) -> [(AgentKind, Position); 6] {
        Self::ORDER.map(|kind| (kind, self.position_of(kind)))
    }

    /// True if `position` lies in the monster's or the pursuer hazard's zone.
    pub fn in_danger_zone(&self, position: Position) -> bool {
        Neighborhood::Moore.around(self.monster).contains(&position)
            || Neighborhood::VonNeumann
                .around(self.pursuer_hazard)
                .contains(&position)
    }

    /// A pursuer starting inside a danger zone has already lost.
    pub fn origin_in_danger(&self) -> bool {
        self.in_danger_zone(self.pursuer)
    }

    /// Checks the placement rules, returning the first one broken.
    ///
    /// A pursuer standing in a danger zone is allowed; it simply cannot win.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        Self::ORDER
            .into_iter()
            .try_for_each(|kind| self.check_placement(kind))
    }

    /// Checks the rules for one agent against the agents listed before it.
    pub fn check_placement(&self, kind: AgentKind) -> Result<(), ScenarioError> {
        let order = Self::ORDER;
        let index = order.iter().position(|other| *other == kind).unwrap_or(0);
        let earlier = &order[..index];
        match kind {
            AgentKind::Pursuer if self.pursuer != ORIGIN => {
                Err(ScenarioError::PursuerNotAtOrigin(self.pursuer))
            }
            AgentKind::Pursuer => Ok(()),
            AgentKind::PursuerHazard => self.reject_overlap(kind, earlier),
            AgentKind::Monster | AgentKind::Rock => {
                self.reject_overlap(kind, earlier)?;
                self.reject_next_to_pursuer_hazard(kind)
            }
            AgentKind::Goal | AgentKind::Haven => {
                self.reject_overlap(kind, earlier)?;
                self.reject_danger_zone(kind)
            }
        }
    }

    fn reject_overlap(&self, kind: AgentKind, others: &[AgentKind]) -> Result<(), ScenarioError> {
        let at = self.position_of(kind);
        match others.iter().find(|other| self.position_of(**other) == at) {
            Some(other) => Err(ScenarioError::Overlap {
                kind,
                other: *other,
                at,
            }),
            None => Ok(()),
        }
    }

    fn reject_next_to_pursuer_hazard(&self, kind: AgentKind) -> Result<(), ScenarioError> {
        let at = self.position_of(kind);
        if Neighborhood::Moore.around(self.pursuer_hazard).contains(&at) {
            return Err(ScenarioError::NextToPursuerHazard { kind, at });
        }
        Ok(())
    }

    fn reject_danger_zone(&self, kind: AgentKind) -> Result<(), ScenarioError> {
        let at = self.position_of(kind);
        if self.in_danger_zone(at) {
            return Err(ScenarioError::InDangerZone { kind, at });
        }
        Ok(())
    }

    /// Restores `grid` to this scenario's pristine layout.
    ///
    /// Searches consume hazard tags (a defeated monster stays defeated), so
    /// every top-level solve calls this before searching.
    pub fn apply(&self, grid: &mut Grid) -> Result<(), GridError> {
        grid.clear();
        for (kind, position) in self.placements() {
            grid.place_agent(kind, position)?;
        }
        debug!(scenario = %self, "Grid restored");
        Ok(())
    }

    /// Builds a fresh grid laid out for this scenario.
    pub fn build_grid(&self) -> Result<Grid, ScenarioError> {
        let mut grid = Grid::new();
        self.apply(&mut grid)?;
        Ok(grid)
    }
}

/// Writes the two-line scenario file format.
impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens: Vec<String> = self
            .placements()
            .iter()
            .map(|(_, position)| position.to_string())
            .collect();
        writeln!(f, "{}", tokens.join(" "))?;
        write!(f, "{}", self.variant.code())
    }
}

/// Parses a single `[x,y]` token into raw, possibly out-of-bounds coordinates.
pub fn parse_coordinate(token: &str) -> Result<(isize, isize), ScenarioError> {
    let malformed = || ScenarioError::MalformedCoordinate(token.to_string());
    let inner = token
        .trim()
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(malformed)?;
    let (x, y) = inner.split_once(',').ok_or_else(malformed)?;
    let x = x.trim().parse::<isize>().map_err(|_| malformed())?;
    let y = y.trim().parse::<isize>().map_err(|_| malformed())?;
    Ok((x, y))
}

/// Parses the scenario file format and validates the result.
///
/// The first line holds six `[x,y]` tokens (pursuer, pursuer hazard, monster,
/// rock, goal, haven); the second holds the perception variant.
impl FromStr for Scenario {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut lines = s.lines().map(str::trim).filter(|line| !line.is_empty());
        let agents_line = lines.next().ok_or(ScenarioError::Empty)?;
        let tokens: Vec<&str> = agents_line.split_whitespace().collect();
        if tokens.len() != Self::ORDER.len() {
            return Err(ScenarioError::WrongAgentCount(tokens.len()));
        }

        let mut positions = [ORIGIN; 6];
        for ((kind, token), slot) in Self::ORDER.iter().zip(&tokens).zip(positions.iter_mut()) {
            let (x, y) = parse_coordinate(token)?;
            if !Grid::is_valid_coordinate(x, y) {
                return Err(ScenarioError::OutOfBounds { kind: *kind, x, y });
            }
            *slot = Position::new(x as usize, y as usize);
        }

        let variant = lines
            .next()
            .ok_or(ScenarioError::MissingVariant)?
            .parse::<PerceptionVariant>()?;

        let [pursuer, pursuer_hazard, monster, rock, goal, haven] = positions;
        let scenario = Scenario {
            pursuer,
            pursuer_hazard,
            monster,
            rock,
            goal,
            haven,
            variant,
        };
        scenario.validate()?;
        Ok(scenario)
    }
}
