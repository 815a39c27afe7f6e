//! Batch comparison of the two algorithms over generated scenarios.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::{
    generator::ScenarioGenerator,
    map::Grid,
    report::round_ms,
    solver::{Algorithm, SolveError},
};

/// Per-algorithm tally. Time statistics cover winning runs only and are in
/// milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub algorithm: Algorithm,
    pub wins: usize,
    pub losses: usize,
    pub mean_ms: f64,
    pub mode_ms: f64,
    pub median_ms: f64,
    pub std_dev_ms: f64,
}

impl Summary {
    fn from_samples(algorithm: Algorithm, samples: &[f64], losses: usize) -> Self {
        Summary {
            algorithm,
            wins: samples.len(),
            losses,
            mean_ms: mean(samples),
            mode_ms: mode(samples),
            median_ms: median(samples),
            std_dev_ms: std_dev(samples),
        }
    }
}

pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Most frequent value after rounding to hundredths. Among equally frequent
/// values the smallest wins.
pub fn mode(samples: &[f64]) -> f64 {
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for sample in samples {
        *counts.entry((sample * 100.0).round() as i64).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by(|(a_key, a_count), (b_key, b_count)| a_count.cmp(b_count).then(b_key.cmp(a_key)))
        .map_or(0.0, |(key, _)| key as f64 / 100.0)
}

pub fn median(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Sample standard deviation. Fewer than two samples give 0.
pub fn std_dev(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let mean = mean(samples);
    let squares: f64 = samples.iter().map(|sample| (sample - mean).powi(2)).sum();
    (squares / (samples.len() - 1) as f64).sqrt()
}

/// Solves `runs` generated scenarios with every algorithm.
pub fn analyze(runs: usize, seed: u64) -> Result<Vec<Summary>, SolveError> {
    let mut samples: HashMap<Algorithm, Vec<f64>> = HashMap::new();
    let mut losses: HashMap<Algorithm, usize> = HashMap::new();
    let mut grid = Grid::new();

    for (run, scenario) in ScenarioGenerator::new(seed).take(runs).enumerate() {
        for algorithm in Algorithm::ALL {
            let outcome = algorithm.solver().solve(&mut grid, &scenario)?;
            match outcome.elapsed() {
                Some(elapsed) => samples
                    .entry(algorithm)
                    .or_default()
                    .push(round_ms(elapsed.as_secs_f64() * 1000.0)),
                None => *losses.entry(algorithm).or_default() += 1,
            }
        }
        debug!(run, "Run finished");
    }

    let summaries: Vec<Summary> = Algorithm::ALL
        .into_iter()
        .map(|algorithm| {
            Summary::from_samples(
                algorithm,
                samples.get(&algorithm).map_or(&[][..], Vec::as_slice),
                losses.get(&algorithm).copied().unwrap_or_default(),
            )
        })
        .collect();
    for summary in &summaries {
        info!(
            algorithm = %summary.algorithm,
            wins = summary.wins,
            losses = summary.losses,
            mean_ms = summary.mean_ms,
            "Analysis finished"
        );
    }
    Ok(summaries)
}
