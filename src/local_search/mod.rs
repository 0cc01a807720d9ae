//! Local search on city assignments for a fixed set of open locations.

pub mod moves;
pub mod neighborhood;
pub mod potential;
pub mod retype;

use crate::compatibility::CompatibilityIndex;
use crate::config::Config;
use crate::parallel::ParallelHarness;
use crate::problem::Problem;
use crate::solution::Solution;
use log::debug;

pub use self::moves::Move;
pub use self::potential::Potential;
pub use self::retype::retype_locations;

/// Why the last refinement stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Feasible,
    LocalOptimum,
    IterationCap,
    Stalled,
}

/// Manages the refinement phase: best-improvement descent on the potential H.
pub struct LocalSearch {
    pub max_iterations: u32,
    /// Consecutive low-gain iterations tolerated before giving up
    pub stall_limit: u32,
    /// Gain below which an iteration counts towards the stall limit
    pub min_gain: f64,
    /// Iterations performed by the last run
    pub iterations: u32,
    /// H before the first and after every committed move of the last run
    pub potential_trace: Vec<f64>,
    pub stop_reason: Option<StopReason>,
}

impl LocalSearch {
    /// Create a new local search instance.
    pub fn new(max_iterations: u32, stall_limit: u32, min_gain: f64) -> Self {
        LocalSearch {
            max_iterations,
            stall_limit,
            min_gain,
            iterations: 0,
            potential_trace: Vec::new(),
            stop_reason: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        LocalSearch::new(config.ls_max_iterations, config.ls_stall_limit, config.ls_min_gain)
    }

    /// Improve the assignments of `state` until it is feasible or no move helps.
    ///
    /// Location types are left untouched. Returns the feasibility of the result.
    pub fn refine_assignments(
        &mut self,
        problem: &Problem,
        index: &CompatibilityIndex,
        state: &mut Solution,
        harness: &ParallelHarness,
    ) -> bool {
        let mut potential = Potential::new(problem, index, state);
        let mut stalled = 0;

        self.iterations = 0;
        self.potential_trace.clear();
        self.potential_trace.push(potential.value());

        let reason = loop {
            if state.is_feasible(problem, index) {
                break StopReason::Feasible;
            }
            if self.iterations >= self.max_iterations {
                break StopReason::IterationCap;
            }
            if stalled >= self.stall_limit {
                break StopReason::Stalled;
            }

            let (mv, delta) = match neighborhood::best_move(problem, index, state, &potential, harness) {
                Some(best) => best,
                None => break StopReason::LocalOptimum,
            };

            let changes = mv.apply(problem, state);
            potential.update(problem, index, state, &changes);
            self.potential_trace.push(potential.value());
            self.iterations += 1;

            if -delta < self.min_gain {
                stalled += 1;
            } else {
                stalled = 0;
            }
        };

        debug!(
            "assignment search stopped after {} iterations ({:?}), H = {:.3}",
            self.iterations,
            reason,
            potential.value()
        );
        self.stop_reason = Some(reason);

        reason == StopReason::Feasible
    }

    /// Refine assignments, then retype locations.
    ///
    /// Returns `true` if capacity, separation and coverage all hold afterwards.
    pub fn refine(
        &mut self,
        problem: &Problem,
        index: &CompatibilityIndex,
        state: &mut Solution,
        harness: &ParallelHarness,
    ) -> bool {
        self.refine_assignments(problem, index, state, harness);

        let retyped = retype_locations(problem, index, state);
        if retyped > 0 {
            debug!("retyped {} locations", retyped);
        }

        state.is_feasible(problem, index)
    }
}
