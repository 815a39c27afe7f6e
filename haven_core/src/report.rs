use std::fmt;

use serde::Serialize;

use crate::{
    GRID_SIZE, Path, Position,
    scenario::PerceptionVariant,
    solver::{Algorithm, Outcome},
};

const RULE: &str = "-------------------";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Win,
    Lose,
}

/// A solve outcome flattened for output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub algorithm: Algorithm,
    pub result: Verdict,
    pub steps: Option<usize>,
    pub path: Path,
    /// Wall-clock time of a winning solve, rounded to hundredths.
    pub elapsed_ms: Option<f64>,
    pub variant: PerceptionVariant,
}

/// Milliseconds rounded to two decimals.
pub fn round_ms(ms: f64) -> f64 {
    (ms * 100.0).round() / 100.0
}

impl Report {
    pub fn new(algorithm: Algorithm, outcome: &Outcome, variant: PerceptionVariant) -> Self {
        Report {
            algorithm,
            result: if outcome.is_win() {
                Verdict::Win
            } else {
                Verdict::Lose
            },
            steps: outcome.steps(),
            path: outcome.path().map(<[Position]>::to_vec).unwrap_or_default(),
            elapsed_ms: outcome
                .elapsed()
                .map(|elapsed| round_ms(elapsed.as_secs_f64() * 1000.0)),
            variant,
        }
    }

    /// Renders the plain-text report file contents.
    pub fn render_text(&self) -> String {
        self.to_string()
    }
}

/// Writes the verdict, step count, path tokens, a board with the path
/// starred, and the elapsed time. A loss is the single line `Lose`.
impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.result == Verdict::Lose {
            return writeln!(f, "Lose");
        }
        writeln!(f, "Win")?;
        writeln!(f, "{}", self.steps.unwrap_or_default())?;
        let tokens: Vec<String> = self.path.iter().map(Position::to_string).collect();
        writeln!(f, "{}", tokens.join(" "))?;
        writeln!(f, "{RULE}")?;
        write!(f, " ")?;
        for x in 0..GRID_SIZE {
            write!(f, " {x}")?;
        }
        writeln!(f)?;
        for y in 0..GRID_SIZE {
            write!(f, "{y}")?;
            for x in 0..GRID_SIZE {
                let mark = if self.path.contains(&Position::new(x, y)) {
                    '*'
                } else {
                    '-'
                };
                write!(f, " {mark}")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "{RULE}")?;
        writeln!(f, "{:.2} ms", self.elapsed_ms.unwrap_or_default())
    }
}
