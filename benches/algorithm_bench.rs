//! Benchmarks for the GRASP facility-location engine.

#[cfg(feature = "bench")]
extern crate criterion;

#[cfg(feature = "bench")]
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use grasp_flp::compatibility::CompatibilityIndex;
use grasp_flp::config::Config;
use grasp_flp::generator::{generate, GeneratorConfig};
use grasp_flp::greedy::GreedyConstructor;
use grasp_flp::local_search::LocalSearch;
use grasp_flp::parallel::ParallelHarness;
use grasp_flp::problem::Problem;
use grasp_flp::solution::Solution;
use grasp_flp::GraspAlgorithm;
use std::time::Duration;

/// Create a benchmark problem with `size` cities and proportionally many locations.
fn create_benchmark_problem(size: usize) -> Problem {
    let config = GeneratorConfig {
        num_locations: (size * 10 / 17).max(2),
        num_cities: size,
        ..GeneratorConfig::default()
    };
    generate(&config, size as u64)
}

#[cfg(feature = "bench")]
fn benchmark_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("construction");

    for size in [50, 100, 170].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let problem = create_benchmark_problem(size);
            let index = CompatibilityIndex::new(&problem);
            let config = Config::new();
            let constructor = GreedyConstructor::from_kind(config.fitness, config.waste_penalty);
            let harness = ParallelHarness::new(config.num_workers);

            b.iter(|| {
                let mut state = Solution::new(&problem);
                constructor.construct(&problem, &index, &mut state, &harness);
            });
        });
    }

    group.finish();
}

#[cfg(feature = "bench")]
fn benchmark_local_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("local_search");

    for size in [50, 100, 170].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let problem = create_benchmark_problem(size);
            let index = CompatibilityIndex::new(&problem);
            let config = Config::new();
            let harness = ParallelHarness::new(config.num_workers);

            // Greedy start, then strip half the secondaries to give the refiner work
            let constructor = GreedyConstructor::from_kind(config.fitness, config.waste_penalty);
            let mut start = Solution::new(&problem);
            constructor.construct(&problem, &index, &mut start, &harness);
            for city in (0..problem.num_cities()).step_by(2) {
                start.assign(&problem, city, grasp_flp::problem::Role::Secondary, None);
            }

            b.iter(|| {
                let mut state = start.clone();
                let mut search = LocalSearch::from_config(&config);
                search.refine(&problem, &index, &mut state, &harness);
            });
        });
    }

    group.finish();
}

#[cfg(feature = "bench")]
fn benchmark_convergence(c: &mut Criterion) {
    let mut group = c.benchmark_group("convergence");
    group.measurement_time(Duration::from_secs(30));

    for size in [50, 100].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let problem = create_benchmark_problem(size);
            let config = Config::new()
                .with_seed(1)
                .with_max_rounds(20)
                .with_time_limit(Duration::from_secs(10));

            b.iter(|| {
                let mut algorithm = GraspAlgorithm::new(problem.clone(), config.clone());
                algorithm.run();
            });
        });
    }

    group.finish();
}

#[cfg(feature = "bench")]
criterion_group!(
    benches,
    benchmark_construction,
    benchmark_local_search,
    benchmark_convergence
);

#[cfg(feature = "bench")]
criterion_main!(benches);
