//! Basic example of using the GRASP-FLP library.

use grasp_flp::config::Config;
use grasp_flp::fitness::FitnessKind;
use grasp_flp::generator::{generate, GeneratorConfig};
use grasp_flp::problem::Problem;
use grasp_flp::utils::{format_duration, print_solution_visualization, save_solution};
use grasp_flp::GraspAlgorithm;
use std::env;
use std::time::{Duration, Instant};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // Read an instance if one is given, otherwise draw a random one
    let args: Vec<String> = env::args().collect();
    let problem = if args.len() > 1 {
        println!("Loading problem from: {}", args[1]);
        Problem::from_file(&args[1])?
    } else {
        generate(&GeneratorConfig::default(), 42)
    };
    println!(
        "Loaded problem: {} with {} cities, {} locations and {} facility types",
        problem.name,
        problem.num_cities(),
        problem.num_locations(),
        problem.num_types()
    );

    let config = Config::new()
        .with_alpha(0.3)
        .with_max_rounds(50)
        .with_max_rounds_without_improvement(15)
        .with_fitness(FitnessKind::WastePenalized)
        .with_seed(42)
        .with_time_limit(Duration::from_secs(60));

    println!("Starting search (time limit: 60s)");
    let start_time = Instant::now();
    let mut algorithm = GraspAlgorithm::new(problem, config);
    let best_solution = algorithm.run().cloned();
    let runtime = start_time.elapsed();

    println!("Search completed in {}", format_duration(runtime));
    println!("{}", algorithm.statistics().format());

    let best_solution = match best_solution {
        Some(best) => best,
        None => {
            println!("No feasible solution found");
            return Ok(());
        }
    };

    let output_path = format!("{}.sol", algorithm.problem.name);
    println!("Saving solution to: {}", output_path);
    save_solution(&best_solution, &algorithm.problem, &algorithm.index, &output_path)?;

    print_solution_visualization(&best_solution, &algorithm.problem);

    Ok(())
}
