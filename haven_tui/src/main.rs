mod view;

use std::{
    fs,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use haven_core::{
    analysis::{Summary, analyze},
    generator::ScenarioGenerator,
    report::Report,
    scenario::Scenario,
    solver::{Algorithm, Puzzle},
};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(version, about = "Hazard grid path finder", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Solve a scenario file
    Solve {
        /// Scenario file to load
        #[arg(short, long, value_name = "SCENARIO_FILE", default_value = "input.txt")]
        input: PathBuf,
        #[arg(short, long, value_enum, default_value_t = AlgorithmChoice::Both)]
        algorithm: AlgorithmChoice,
        /// Write one text report per algorithm into this directory
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
        /// Print JSON instead of text reports
        #[arg(long)]
        json: bool,
        /// Show the paths on an interactive board
        #[arg(long)]
        view: bool,
    },
    /// Generate a random valid scenario
    Generate {
        #[arg(short, long)]
        seed: Option<u64>,
        /// Write the scenario here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Compare both algorithms over many generated scenarios
    Analyze {
        #[arg(short, long, default_value_t = 1000)]
        runs: usize,
        #[arg(short, long, default_value_t = 0)]
        seed: u64,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AlgorithmChoice {
    Informed,
    Greedy,
    Both,
}

impl AlgorithmChoice {
    fn algorithms(self) -> Vec<Algorithm> {
        match self {
            AlgorithmChoice::Informed => vec![Algorithm::Informed],
            AlgorithmChoice::Greedy => vec![Algorithm::Greedy],
            AlgorithmChoice::Both => Algorithm::ALL.to_vec(),
        }
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("haven_core=info,haven=info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;

    match cli.command {
        Command::Solve {
            input,
            algorithm,
            output_dir,
            json,
            view,
        } => solve(&input, algorithm, output_dir.as_deref(), json, view),
        Command::Generate { seed, output } => generate(seed, output.as_deref()),
        Command::Analyze { runs, seed, json } => run_analysis(runs, seed, json),
    }
}

fn load_scenario(path: &Path) -> Result<Scenario> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
    text.parse::<Scenario>()
        .with_context(|| format!("Invalid scenario in {}", path.display()))
}

fn solve(
    input: &Path,
    choice: AlgorithmChoice,
    output_dir: Option<&Path>,
    json: bool,
    view: bool,
) -> Result<()> {
    let scenario = load_scenario(input)?;
    let mut puzzle = Puzzle::new(scenario)?;
    info!(scenario = %scenario, "Scenario loaded");

    let mut reports = Vec::new();
    for algorithm in choice.algorithms() {
        let outcome = puzzle.solve(algorithm)?;
        reports.push(Report::new(algorithm, &outcome, scenario.variant));
    }

    if let Some(dir) = output_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
        for report in &reports {
            let path = dir.join(report.algorithm.report_file_name());
            fs::write(&path, report.render_text())
                .with_context(|| format!("Failed to write report {}", path.display()))?;
            info!(path = %path.display(), "Report written");
        }
    }

    if view {
        return view::show(&scenario, &reports);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            println!("== {} ==", report.algorithm);
            print!("{}", report.render_text());
        }
    }
    Ok(())
}

fn generate(seed: Option<u64>, output: Option<&Path>) -> Result<()> {
    let seed = match seed {
        Some(seed) => seed,
        None => SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .context("System clock is before the Unix epoch")?
            .as_nanos() as u64,
    };
    let scenario = ScenarioGenerator::new(seed).generate();
    info!(seed, "Scenario generated");

    match output {
        Some(path) => fs::write(path, format!("{scenario}\n"))
            .with_context(|| format!("Failed to write scenario to {}", path.display())),
        None => {
            println!("{scenario}");
            Ok(())
        }
    }
}

fn run_analysis(runs: usize, seed: u64, json: bool) -> Result<()> {
    let summaries = analyze(runs, seed)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        for summary in &summaries {
            print_summary(summary);
        }
    }
    Ok(())
}

fn print_summary(summary: &Summary) {
    println!("{}:", summary.algorithm);
    println!("  Mean: {:.2} ms", summary.mean_ms);
    println!("  Mode: {:.2} ms", summary.mode_ms);
    println!("  Median: {:.2} ms", summary.median_ms);
    println!("  Standard deviation: {:.2} ms", summary.std_dev_ms);
    println!("  Wins: {}", summary.wins);
    println!("  Losses: {}", summary.losses);
}
