//! # GRASP-FLP
//!
//! A GRASP (Greedy Randomized Adaptive Search Procedure) engine for capacitated
//! facility location where every city needs a primary and a distinct backup
//! (secondary) facility.
//!
//! Each round purges the state, builds a solution with a randomized greedy
//! construction, repairs it with a best-improvement local search on a penalty
//! potential, and downgrades open locations to cheaper types. The best feasible
//! state across rounds is kept as the incumbent.

pub mod compatibility;
pub mod config;
pub mod fitness;
pub mod generator;
pub mod grasp;
pub mod greedy;
pub mod local_search;
pub mod location_search;
pub mod parallel;
pub mod problem;
pub mod solution;
pub mod utils;

use crate::compatibility::CompatibilityIndex;
use crate::config::Config;
use crate::grasp::GraspDriver;
use crate::location_search::LocationSearch;
use crate::parallel::ParallelHarness;
use crate::problem::Problem;
use crate::solution::Solution;
use crate::utils::SearchStatistics;

use log::{debug, info};
use std::time::{Duration, Instant};

/// The main algorithm structure that runs GRASP rounds and keeps the incumbent.
pub struct GraspAlgorithm {
    pub problem: Problem,
    pub index: CompatibilityIndex,
    pub config: Config,
    pub best_solution: Option<Solution>,
    pub run_time: Duration,
    pub rounds: u32,
    pub rounds_without_improvement: u32,
    pub feasible_rounds: u32,
    pub driver: GraspDriver,
    pub harness: ParallelHarness,
    pub start_time: Instant,
    state: Solution,
}

impl GraspAlgorithm {
    /// Create a new GRASP instance for the given problem and configuration.
    pub fn new(problem: Problem, config: Config) -> Self {
        let index = CompatibilityIndex::new(&problem);
        let state = Solution::new(&problem);

        GraspAlgorithm {
            index,
            state,
            driver: GraspDriver::new(&config),
            harness: ParallelHarness::new(config.num_workers),
            problem,
            config,
            best_solution: None,
            run_time: Duration::from_secs(0),
            rounds: 0,
            rounds_without_improvement: 0,
            feasible_rounds: 0,
            start_time: Instant::now(),
        }
    }

    /// Run the pure greedy round (alpha 0) and offer its result.
    pub fn initialize(&mut self) {
        let outcome = self.driver.run_round_with_alpha(
            &self.problem,
            &self.index,
            &mut self.state,
            &self.harness,
            0.0,
        );
        self.rounds += 1;
        self.record_round(outcome.feasible);

        info!(
            "greedy round: {} openings, feasible: {}, cost {:.2}",
            outcome.openings, outcome.feasible, outcome.cost
        );
    }

    /// Run rounds until a termination criterion is met.
    ///
    /// Returns the best feasible solution found, if any.
    pub fn run(&mut self) -> Option<&Solution> {
        self.start_time = Instant::now();
        info!(
            "{}: {} cities, {} locations, {} types, {} workers",
            self.problem.name,
            self.problem.num_cities(),
            self.problem.num_locations(),
            self.problem.num_types(),
            self.harness.workers()
        );

        self.initialize();

        while !self.should_terminate() {
            let outcome = self.driver.run_round(
                &self.problem,
                &self.index,
                &mut self.state,
                &self.harness,
            );
            self.rounds += 1;
            let improved = self.record_round(outcome.feasible);

            if improved {
                info!("round {}: new incumbent with cost {:.2}", self.rounds, outcome.cost);
            } else {
                debug!(
                    "round {}: feasible: {}, cost {:.2}",
                    self.rounds, outcome.feasible, outcome.cost
                );
            }
        }

        if self.config.polish_iterations > 0 {
            self.polish();
        }

        self.run_time = self.start_time.elapsed();
        info!(
            "finished {} rounds in {}",
            self.rounds,
            utils::format_duration(self.run_time)
        );

        self.best_solution.as_ref()
    }

    /// Offer the working state to the incumbent and update the counters.
    fn record_round(&mut self, feasible: bool) -> bool {
        if feasible {
            self.feasible_rounds += 1;
        }

        let improved = GraspDriver::offer(&self.problem, &self.index, &self.state, &mut self.best_solution);
        if improved {
            self.rounds_without_improvement = 0;
        } else {
            self.rounds_without_improvement += 1;
        }
        improved
    }

    /// Run the location-level search on the incumbent and keep it if it got cheaper.
    fn polish(&mut self) {
        let mut polished = match &self.best_solution {
            Some(best) => best.clone(),
            None => return,
        };

        let mut search = LocationSearch::new(self.config.polish_iterations, &self.config);
        search.improve(&self.problem, &self.index, &mut polished, &self.harness);

        if GraspDriver::offer(&self.problem, &self.index, &polished, &mut self.best_solution) {
            info!("polish lowered the cost to {:.2}", polished.opening_cost(&self.problem));
        }
    }

    /// Check if the termination criteria are met. The deadline is only
    /// consulted here, between rounds.
    pub fn should_terminate(&self) -> bool {
        if self.rounds >= self.config.max_rounds {
            return true;
        }

        if self.rounds_without_improvement >= self.config.max_rounds_without_improvement {
            return true;
        }

        if let Some(time_limit) = self.config.time_limit {
            if self.start_time.elapsed() >= time_limit {
                return true;
            }
        }

        false
    }

    /// Summary of the last run.
    pub fn statistics(&self) -> SearchStatistics {
        let best = self.best_solution.as_ref();
        SearchStatistics {
            rounds: self.rounds,
            feasible_rounds: self.feasible_rounds,
            runtime: self.run_time,
            best_cost: best.map(|s| s.opening_cost(&self.problem)),
            open_locations: best.map_or(0, |s| s.open_locations().count()),
            workers: self.harness.workers(),
            fitness: self.driver.constructor().fitness_name().to_string(),
        }
    }
}
