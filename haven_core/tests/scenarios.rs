use haven_core::{
    Position,
    generator::ScenarioGenerator,
    greedy::MAX_PATH_CELLS,
    report::Report,
    scenario::Scenario,
    solver::{Algorithm, Outcome, Puzzle},
};

const CORNERS: &str = "[0,0] [2,2] [4,4] [8,0] [0,8] [8,8]\n1\n";

fn puzzle(text: &str) -> Puzzle {
    Puzzle::new(text.parse::<Scenario>().unwrap()).unwrap()
}

#[test]
fn both_algorithms_walk_the_left_column() {
    let mut puzzle = puzzle(CORNERS);
    let column: Vec<Position> = (0..9).map(|y| Position::new(0, y)).collect();
    for (algorithm, outcome) in puzzle.solve_all().unwrap() {
        assert_eq!(outcome.path(), Some(column.as_slice()), "{algorithm}");
        assert_eq!(outcome.steps(), Some(8));
    }
}

#[test]
fn hazard_next_to_the_origin_loses() {
    let mut puzzle = puzzle("[0,0] [1,0] [4,4] [8,0] [0,8] [8,8]\n1");
    assert!(puzzle.scenario().origin_in_danger());
    for (_, outcome) in puzzle.solve_all().unwrap() {
        assert_eq!(outcome, Outcome::Lose);
    }
}

#[test]
fn walled_off_goal_loses_after_searching() {
    // The goal's only neighbors are the rock and two cells of the monster's
    // zone, and the haven can never reach the monster.
    let mut puzzle = puzzle("[0,0] [2,2] [7,6] [7,8] [8,8] [0,8]\n1");
    assert!(!puzzle.scenario().origin_in_danger());
    for (algorithm, outcome) in puzzle.solve_all().unwrap() {
        assert_eq!(outcome, Outcome::Lose, "{algorithm}");
    }
}

#[test]
fn reports_for_the_corner_scenario() {
    let mut puzzle = puzzle(CORNERS);
    let outcome = puzzle.solve(Algorithm::Greedy).unwrap();
    let text = Report::new(Algorithm::Greedy, &outcome, puzzle.scenario().variant).render_text();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("Win"));
    assert_eq!(lines.next(), Some("8"));
    assert!(text.trim_end().ends_with(" ms"));
}

#[test]
fn generated_puzzles_solve_consistently() {
    for scenario in ScenarioGenerator::new(2024).take(60) {
        let mut puzzle = Puzzle::new(scenario).unwrap();
        let first = puzzle.solve_all().unwrap();
        let second = puzzle.solve_all().unwrap();

        for ((algorithm, a), (_, b)) in first.iter().zip(&second) {
            assert_eq!(a.path(), b.path(), "{algorithm} on {scenario}");
            if let Some(path) = a.path() {
                assert_eq!(path.first(), Some(&scenario.pursuer));
                assert_eq!(path.last(), Some(&scenario.goal));
                for pair in path.windows(2) {
                    assert_eq!(pair[0].chebyshev(&pair[1]), 1, "{algorithm} on {scenario}");
                }
            }
            if *algorithm == Algorithm::Greedy {
                if let Some(path) = a.path() {
                    assert!(path.len() <= 2 * MAX_PATH_CELLS);
                }
            }
        }
    }
}

#[test]
fn informed_never_loses_when_greedy_wins() {
    for scenario in ScenarioGenerator::new(99).take(60) {
        let mut puzzle = Puzzle::new(scenario).unwrap();
        let greedy = puzzle.solve(Algorithm::Greedy).unwrap();
        let informed = puzzle.solve(Algorithm::Informed).unwrap();
        if greedy.is_win() {
            assert!(informed.is_win(), "{scenario}");
        }
    }
}
