//! Randomized multi-start: purge, randomized greedy construction, refinement.

use crate::compatibility::CompatibilityIndex;
use crate::config::Config;
use crate::greedy::{Candidate, GreedyConstructor};
use crate::local_search::LocalSearch;
use crate::parallel::ParallelHarness;
use crate::problem::Problem;
use crate::solution::Solution;
use log::debug;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// What a single GRASP round produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundOutcome {
    /// Construction gave every city a distinct primary and secondary
    pub constructed: bool,
    /// The refined state passes the feasibility predicate
    pub feasible: bool,
    /// Openings committed during construction
    pub openings: usize,
    pub cost: f64,
}

/// Indices of the candidates whose fitness lies within `alpha` of the best.
///
/// With best fitness `B` and worst `W`, keeps every candidate with fitness
/// at least `B - alpha * (B - W)`.
pub fn restricted_candidate_list(candidates: &[Candidate], alpha: f64) -> Vec<usize> {
    if candidates.is_empty() {
        return Vec::new();
    }

    let best = candidates
        .iter()
        .map(|c| c.fitness)
        .fold(f64::NEG_INFINITY, f64::max);
    let worst = candidates
        .iter()
        .map(|c| c.fitness)
        .fold(f64::INFINITY, f64::min);

    let threshold = best - alpha * (best - worst);
    candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| c.fitness >= threshold)
        .map(|(i, _)| i)
        .collect()
}

/// Runs single GRASP rounds; the surrounding loop belongs to the caller.
pub struct GraspDriver {
    pub alpha: f64,
    constructor: GreedyConstructor,
    local_search: LocalSearch,
    rng: ChaCha8Rng,
}

impl GraspDriver {
    /// Create a driver from the configuration.
    pub fn new(config: &Config) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        GraspDriver {
            alpha: config.alpha,
            constructor: GreedyConstructor::from_kind(config.fitness, config.waste_penalty),
            local_search: LocalSearch::from_config(config),
            rng,
        }
    }

    pub fn constructor(&self) -> &GreedyConstructor {
        &self.constructor
    }

    pub fn local_search(&self) -> &LocalSearch {
        &self.local_search
    }

    /// Reset every location type and city role to unassigned.
    pub fn purge(&self, state: &mut Solution) {
        state.purge();
    }

    /// Pick an opening uniformly from the restricted candidate list.
    ///
    /// Returns `None` when no feasible opening exists.
    pub fn randomized_greedy_step(
        &mut self,
        problem: &Problem,
        index: &CompatibilityIndex,
        state: &Solution,
        harness: &ParallelHarness,
        alpha: f64,
    ) -> Option<Candidate> {
        let mut candidates = self
            .constructor
            .feasible_candidates(problem, index, state, harness);
        let rcl = restricted_candidate_list(&candidates, alpha);
        let &chosen = rcl.choose(&mut self.rng)?;

        Some(candidates.swap_remove(chosen))
    }

    /// Randomized greedy construction from the current state.
    ///
    /// Returns the number of openings committed and whether every city is complete.
    pub fn construct(
        &mut self,
        problem: &Problem,
        index: &CompatibilityIndex,
        state: &mut Solution,
        harness: &ParallelHarness,
        alpha: f64,
    ) -> (usize, bool) {
        let mut openings = 0;

        while !state.is_complete() {
            match self.randomized_greedy_step(problem, index, state, harness, alpha) {
                Some(candidate) => {
                    self.constructor.apply_action(problem, &candidate, state);
                    openings += 1;
                }
                None => break,
            }
        }

        (openings, state.is_complete())
    }

    /// One round with the driver's own alpha.
    pub fn run_round(
        &mut self,
        problem: &Problem,
        index: &CompatibilityIndex,
        state: &mut Solution,
        harness: &ParallelHarness,
    ) -> RoundOutcome {
        let alpha = self.alpha;
        self.run_round_with_alpha(problem, index, state, harness, alpha)
    }

    /// Purge, construct with `alpha`, refine.
    pub fn run_round_with_alpha(
        &mut self,
        problem: &Problem,
        index: &CompatibilityIndex,
        state: &mut Solution,
        harness: &ParallelHarness,
        alpha: f64,
    ) -> RoundOutcome {
        self.purge(state);

        let (openings, constructed) = self.construct(problem, index, state, harness, alpha);
        if openings == 0 && !constructed {
            debug!("round found no feasible opening");
            return RoundOutcome {
                constructed,
                feasible: false,
                openings,
                cost: state.opening_cost(problem),
            };
        }

        let feasible = self.local_search.refine(problem, index, state, harness);
        let cost = state.opening_cost(problem);
        debug!(
            "round: {} openings, constructed: {}, feasible: {}, cost {:.2}",
            openings, constructed, feasible, cost
        );

        RoundOutcome {
            constructed,
            feasible,
            openings,
            cost,
        }
    }

    /// A state may replace the incumbent iff it is feasible and strictly cheaper.
    pub fn is_improvement(
        problem: &Problem,
        index: &CompatibilityIndex,
        candidate: &Solution,
        incumbent: Option<&Solution>,
    ) -> bool {
        if !candidate.is_feasible(problem, index) {
            return false;
        }
        match incumbent {
            Some(best) => candidate.opening_cost(problem) < best.opening_cost(problem),
            None => true,
        }
    }

    /// Copy `state` into `incumbent` if it is an improvement; returns whether it was.
    pub fn offer(
        problem: &Problem,
        index: &CompatibilityIndex,
        state: &Solution,
        incumbent: &mut Option<Solution>,
    ) -> bool {
        if Self::is_improvement(problem, index, state, incumbent.as_ref()) {
            *incumbent = Some(state.clone());
            true
        } else {
            false
        }
    }
}
