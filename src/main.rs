use anyhow::{bail, Context, Result};
use clap::Parser;
use env_logger::Env;
use grasp_flp::config::Config;
use grasp_flp::fitness::FitnessKind;
use grasp_flp::generator::{generate, GeneratorConfig};
use grasp_flp::problem::Problem;
use grasp_flp::utils::{print_solution_visualization, save_solution, save_solution_json, SolutionReport};
use grasp_flp::GraspAlgorithm;
use log::{info, warn};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "grasp-flp",
    version,
    about = "GRASP solver for facility location with primary and backup coverage"
)]
struct Cli {
    /// Instance in the `.dat` format
    instance: Option<PathBuf>,
    /// Solve a random instance drawn from this seed instead of reading one
    #[arg(long, conflicts_with = "instance")]
    generate: Option<u64>,
    /// JSON file with solver settings; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    /// RCL width in [0, 1]
    #[arg(long)]
    alpha: Option<f64>,
    /// Maximum number of GRASP rounds
    #[arg(long)]
    rounds: Option<u32>,
    /// Time limit in seconds, checked between rounds
    #[arg(long)]
    time_limit: Option<f64>,
    #[arg(long)]
    seed: Option<u64>,
    /// Worker threads for neighborhood evaluation
    #[arg(long)]
    threads: Option<usize>,
    /// Opening score: density, waste-penalized or reduced-load
    #[arg(long)]
    fitness: Option<FitnessKind>,
    /// Location-search iterations applied to the final incumbent
    #[arg(long)]
    polish: Option<u32>,
    /// Write a text report here
    #[arg(long)]
    output: Option<PathBuf>,
    /// Write a JSON report here
    #[arg(long)]
    json: Option<PathBuf>,
    /// Print an ASCII plot of the solution
    #[arg(long)]
    plot: bool,
}

impl Cli {
    fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => {
                let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
                serde_json::from_reader(BufReader::new(file))
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => Config::new(),
        };

        if let Some(alpha) = self.alpha {
            config = config.with_alpha(alpha);
        }
        if let Some(rounds) = self.rounds {
            config = config.with_max_rounds(rounds);
        }
        if let Some(secs) = self.time_limit {
            if !secs.is_finite() || secs < 0.0 {
                bail!("time limit must be a non-negative number of seconds");
            }
            config = config.with_time_limit(Duration::from_secs_f64(secs));
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if let Some(threads) = self.threads {
            config = config.with_num_workers(threads);
        }
        if let Some(fitness) = self.fitness {
            config = config.with_fitness(fitness);
        }
        if let Some(iterations) = self.polish {
            config = config.with_polish_iterations(iterations);
        }

        Ok(config)
    }

    fn load_problem(&self) -> Result<Problem> {
        match (&self.instance, self.generate) {
            (Some(path), _) => Problem::from_file(path),
            (None, Some(seed)) => Ok(generate(&GeneratorConfig::default(), seed)),
            (None, None) => bail!("pass an instance file or --generate <SEED>"),
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.load_config()?;
    let problem = cli.load_problem()?;
    info!(
        "loaded {}: total demand {:.1}",
        problem.name,
        problem.total_demand()
    );

    let mut algorithm = GraspAlgorithm::new(problem, config);
    algorithm.run();
    println!("{}", algorithm.statistics().format());

    let best = match &algorithm.best_solution {
        Some(best) => best,
        None => {
            warn!("no feasible solution found");
            return Ok(());
        }
    };

    let report = SolutionReport::new(best, &algorithm.problem, &algorithm.index);
    if cli.output.is_none() && cli.json.is_none() {
        print!("{}", report);
    }

    if let Some(path) = &cli.output {
        save_solution(best, &algorithm.problem, &algorithm.index, path)?;
        info!("report written to {}", path.display());
    }
    if let Some(path) = &cli.json {
        save_solution_json(best, &algorithm.problem, &algorithm.index, path)?;
        info!("JSON report written to {}", path.display());
    }
    if cli.plot {
        print_solution_visualization(best, &algorithm.problem);
    }

    Ok(())
}
