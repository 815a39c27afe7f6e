use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::trace;

use crate::{
    GRID_SIZE, Position,
    map::AgentKind,
    scenario::{ORIGIN, PerceptionVariant, Scenario},
};

/// Produces random scenarios that always pass [`Scenario::validate`].
#[derive(Debug)]
pub struct ScenarioGenerator {
    rng: StdRng,
}

impl ScenarioGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn random_position(&mut self) -> Position {
        Position::new(
            self.rng.random_range(0..GRID_SIZE),
            self.rng.random_range(0..GRID_SIZE),
        )
    }

    /// Draws each agent in file order, redrawing until its rules hold.
    pub fn generate(&mut self) -> Scenario {
        let mut scenario = Scenario {
            pursuer: ORIGIN,
            pursuer_hazard: ORIGIN,
            monster: ORIGIN,
            rock: ORIGIN,
            goal: ORIGIN,
            haven: ORIGIN,
            variant: PerceptionVariant::default(),
        };
        let mut draws = 0;
        let agents = Scenario::ORDER
            .into_iter()
            .filter(|kind| *kind != AgentKind::Pursuer);
        for kind in agents {
            loop {
                let position = self.random_position();
                draws += 1;
                scenario.set_position(kind, position);
                if scenario.check_placement(kind).is_ok() {
                    break;
                }
            }
        }
        trace!(draws, scenario = %scenario, "Scenario generated");
        scenario
    }
}

impl Iterator for ScenarioGenerator {
    type Item = Scenario;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.generate())
    }
}
