//! Configuration parameters for the GRASP engine.

use crate::fitness::FitnessKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration settings for construction, refinement and the GRASP loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// RCL width in `[0, 1]`: 0 is pure greedy, 1 is uniform over feasible openings
    pub alpha: f64,
    /// Maximum number of GRASP rounds
    pub max_rounds: u32,
    /// Maximum number of rounds without a new incumbent
    pub max_rounds_without_improvement: u32,
    /// Optional time limit, checked between rounds
    pub time_limit: Option<Duration>,
    /// Hard iteration cap of the assignment refiner
    pub ls_max_iterations: u32,
    /// Consecutive low-gain refiner iterations tolerated before stopping
    pub ls_stall_limit: u32,
    /// Potential decrease below which a refiner iteration counts as stalled
    pub ls_min_gain: f64,
    /// Worker threads; `None` uses the available hardware parallelism
    pub num_workers: Option<usize>,
    /// Seed for the GRASP random source; `None` draws one from entropy
    pub seed: Option<u64>,
    /// Scoring strategy for candidate openings
    pub fitness: FitnessKind,
    /// Weight of the unused-capacity penalty in `FitnessKind::WastePenalized`
    pub waste_penalty: f64,
    /// Iterations of location-search polish on the final incumbent (0 disables it)
    pub polish_iterations: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            alpha: 0.2,
            max_rounds: 100,
            max_rounds_without_improvement: 30,
            time_limit: None,
            ls_max_iterations: 10_000,
            ls_stall_limit: 5,
            ls_min_gain: 1e-6,
            num_workers: None,
            seed: None,
            fitness: FitnessKind::Density,
            waste_penalty: 0.5,
            polish_iterations: 0,
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Config::default()
    }

    /// Set the RCL width, clamped to `[0, 1]`.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha.clamp(0.0, 1.0);
        self
    }

    /// Set the maximum number of rounds.
    pub fn with_max_rounds(mut self, rounds: u32) -> Self {
        self.max_rounds = rounds;
        self
    }

    /// Set the maximum rounds without improvement.
    pub fn with_max_rounds_without_improvement(mut self, rounds: u32) -> Self {
        self.max_rounds_without_improvement = rounds;
        self
    }

    /// Set the time limit.
    pub fn with_time_limit(mut self, duration: Duration) -> Self {
        self.time_limit = Some(duration);
        self
    }

    /// Set the refiner iteration cap.
    pub fn with_ls_max_iterations(mut self, iterations: u32) -> Self {
        self.ls_max_iterations = iterations;
        self
    }

    /// Set the refiner stall limit.
    pub fn with_ls_stall_limit(mut self, limit: u32) -> Self {
        self.ls_stall_limit = limit;
        self
    }

    /// Set the gain below which a refiner iteration counts as stalled.
    pub fn with_ls_min_gain(mut self, gain: f64) -> Self {
        self.ls_min_gain = gain;
        self
    }

    /// Set the number of worker threads.
    pub fn with_num_workers(mut self, workers: usize) -> Self {
        self.num_workers = Some(workers.max(1));
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the scoring strategy.
    pub fn with_fitness(mut self, fitness: FitnessKind) -> Self {
        self.fitness = fitness;
        self
    }

    /// Set the waste penalty weight.
    pub fn with_waste_penalty(mut self, weight: f64) -> Self {
        self.waste_penalty = weight;
        self
    }

    /// Set the location-search polish iterations.
    pub fn with_polish_iterations(mut self, iterations: u32) -> Self {
        self.polish_iterations = iterations;
        self
    }
}
