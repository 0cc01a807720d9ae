//! Polish that changes which locations are open and with which type.
//!
//! Every neighbor re-runs the assignment search, so this is far more
//! expensive than the assignment moves and is only used on a final incumbent.

use crate::compatibility::CompatibilityIndex;
use crate::config::Config;
use crate::local_search::{retype_locations, LocalSearch};
use crate::parallel::{reduce_min_by, ParallelHarness};
use crate::problem::{Problem, Role};
use crate::solution::Solution;
use log::{debug, info};

/// Score added to a neighbor whose assignments could not be made feasible.
pub const INFEASIBLE_PENALTY: f64 = 10_000.0;
/// Score added per pair of open locations violating the minimum separation.
pub const SEPARATION_PENALTY: f64 = 1_000.0;

/// A change to the set of open locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationMove {
    /// Open, retype or close a location
    Set {
        location: usize,
        facility_type: Option<usize>,
    },
    /// Exchange the types of two locations
    Swap { first: usize, second: usize },
}

/// Opening cost plus penalties for infeasibility and separation conflicts.
pub fn location_score(
    problem: &Problem,
    index: &CompatibilityIndex,
    state: &Solution,
    feasible: bool,
) -> f64 {
    let mut score = state.opening_cost(problem);
    if !feasible {
        score += INFEASIBLE_PENALTY;
    }
    score + SEPARATION_PENALTY * state.separation_violations(index) as f64
}

/// Best-improvement search over location types.
pub struct LocationSearch {
    pub max_iterations: u32,
    /// Iteration cap of the assignment search run for every neighbor
    pub inner_iterations: u32,
    inner_stall_limit: u32,
    inner_min_gain: f64,
    /// Iterations performed by the last run
    pub iterations: u32,
}

impl LocationSearch {
    pub fn new(max_iterations: u32, config: &Config) -> Self {
        LocationSearch {
            max_iterations,
            inner_iterations: config.ls_max_iterations,
            inner_stall_limit: config.ls_stall_limit,
            inner_min_gain: config.ls_min_gain,
            iterations: 0,
        }
    }

    /// Every location move that changes `state`.
    pub fn neighborhood(problem: &Problem, state: &Solution) -> Vec<LocationMove> {
        let num_locations = problem.num_locations();
        let mut moves = Vec::new();

        for location in 0..num_locations {
            let current = state.location_type(location);
            for t in 0..problem.num_types() {
                if current != Some(t) {
                    moves.push(LocationMove::Set {
                        location,
                        facility_type: Some(t),
                    });
                }
            }
            if current.is_some() {
                moves.push(LocationMove::Set {
                    location,
                    facility_type: None,
                });
            }
        }

        for first in 0..num_locations {
            for second in (first + 1)..num_locations {
                if state.location_type(first) != state.location_type(second) {
                    moves.push(LocationMove::Swap { first, second });
                }
            }
        }

        moves
    }

    /// Apply `mv` to a copy of `base`, re-run the assignment search and score the result.
    pub fn evaluate(
        &self,
        problem: &Problem,
        index: &CompatibilityIndex,
        base: &Solution,
        mv: LocationMove,
    ) -> (f64, Solution) {
        let mut state = base.clone();

        match mv {
            LocationMove::Set {
                location,
                facility_type,
            } => {
                state.set_location_type(location, facility_type);
            }
            LocationMove::Swap { first, second } => {
                let first_type = state.location_type(first);
                let second_type = state.set_location_type(second, first_type);
                state.set_location_type(first, second_type);
            }
        }

        for city in 0..problem.num_cities() {
            for role in Role::ALL {
                if let Some(l) = state.assignment(city).get(role) {
                    if !state.is_open(l) {
                        state.assign(problem, city, role, None);
                    }
                }
            }
        }

        let serial = ParallelHarness::new(Some(1));
        let mut inner = LocalSearch::new(self.inner_iterations, self.inner_stall_limit, self.inner_min_gain);
        inner.refine_assignments(problem, index, &mut state, &serial);
        let feasible = state.is_feasible(problem, index);

        (location_score(problem, index, &state, feasible), state)
    }

    /// Improve `state` by changing location types until no neighbor helps.
    ///
    /// Returns the feasibility of the final state.
    pub fn improve(
        &mut self,
        problem: &Problem,
        index: &CompatibilityIndex,
        state: &mut Solution,
        harness: &ParallelHarness,
    ) -> bool {
        let mut current = location_score(problem, index, state, state.is_feasible(problem, index));
        self.iterations = 0;

        while self.iterations < self.max_iterations {
            let moves = Self::neighborhood(problem, state);
            let base: &Solution = state;

            let slots = harness.map_partitions(moves.len(), |range| {
                let mut best: Option<(f64, Solution)> = None;
                for i in range {
                    let (score, candidate) = self.evaluate(problem, index, base, moves[i]);
                    if best.as_ref().map_or(true, |(s, _)| score < *s) {
                        best = Some((score, candidate));
                    }
                }
                best
            });

            self.iterations += 1;

            match reduce_min_by(slots, |(score, _)| *score) {
                Some((score, candidate)) if score < current - 1e-9 => {
                    debug!("location search: score {:.2} -> {:.2}", current, score);
                    *state = candidate;
                    current = score;
                }
                _ => break,
            }
        }

        retype_locations(problem, index, state);
        let feasible = state.is_feasible(problem, index);
        info!(
            "location search finished after {} iterations, cost {:.2}, feasible: {}",
            self.iterations,
            state.opening_cost(problem),
            feasible
        );

        feasible
    }
}
