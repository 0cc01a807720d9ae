//! Greedy construction: open the best (location, type) pair, one at a time.

use crate::compatibility::CompatibilityIndex;
use crate::fitness::{FitnessKind, FitnessStrategy, OpeningSummary};
use crate::parallel::{reduce_max_by, ParallelHarness};
use crate::problem::{Problem, Role};
use crate::solution::Solution;
use log::trace;
use std::ops::Range;

/// A tentative opening together with the roles it would take over.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub location: usize,
    pub facility_type: usize,
    /// Cities served by this opening and the role each would get, nearest first
    pub plan: Vec<(usize, Role)>,
    pub fitness: f64,
}

impl Candidate {
    /// A candidate that must never be applied.
    pub fn infeasible(location: usize, facility_type: usize) -> Self {
        Candidate {
            location,
            facility_type,
            plan: Vec::new(),
            fitness: f64::NEG_INFINITY,
        }
    }

    pub fn is_feasible(&self) -> bool {
        self.fitness > f64::NEG_INFINITY
    }
}

/// Builds solutions by repeatedly committing the best-scoring opening.
pub struct GreedyConstructor {
    fitness: Box<dyn FitnessStrategy>,
}

impl GreedyConstructor {
    /// Create a constructor scoring openings with `fitness`.
    pub fn new(fitness: Box<dyn FitnessStrategy>) -> Self {
        GreedyConstructor { fitness }
    }

    /// Create a constructor from a built-in strategy.
    pub fn from_kind(kind: FitnessKind, waste_penalty: f64) -> Self {
        GreedyConstructor::new(kind.build(waste_penalty))
    }

    pub fn fitness_name(&self) -> &str {
        self.fitness.name()
    }

    /// True if opening `location` would conflict with an already open location.
    pub fn is_location_blocked(
        &self,
        index: &CompatibilityIndex,
        state: &Solution,
        location: usize,
    ) -> bool {
        state
            .open_locations()
            .any(|other| !index.is_location_pair_compatible(location, other))
    }

    /// Evaluate opening `location` with `facility_type` in the current state.
    pub fn try_open(
        &self,
        problem: &Problem,
        index: &CompatibilityIndex,
        state: &Solution,
        location: usize,
        facility_type: usize,
    ) -> Candidate {
        if state.is_open(location) || self.is_location_blocked(index, state, location) {
            return Candidate::infeasible(location, facility_type);
        }

        self.plan_opening(problem, index, state, location, facility_type)
    }

    /// Walk the cities nearest first, taking primaries then secondaries until
    /// the next one would overflow the capacity.
    fn plan_opening(
        &self,
        problem: &Problem,
        index: &CompatibilityIndex,
        state: &Solution,
        location: usize,
        facility_type: usize,
    ) -> Candidate {
        let facility = &problem.facility_types[facility_type];
        let capacity = facility.capacity_units();
        let cities = index.cities_by_distance(location);

        let mut plan = Vec::new();
        let mut served = 0u64;

        for &c in cities {
            if !index.is_serviceable(c, location, facility_type, Role::Primary) {
                break;
            }
            if state.assignment(c).primary.is_some() {
                continue;
            }
            let units = problem.cities[c].load(Role::Primary);
            if served + units > capacity {
                break;
            }
            served += units;
            plan.push((c, Role::Primary));
        }
        let primary_count = plan.len();

        // Both passes share the nearest-first order, so the primaries planned
        // above show up in the same order here.
        let mut next_primary = 0;
        for &c in cities {
            if !index.is_serviceable(c, location, facility_type, Role::Secondary) {
                break;
            }
            if next_primary < primary_count && plan[next_primary].0 == c {
                next_primary += 1;
                continue;
            }
            if state.assignment(c).secondary.is_some() {
                continue;
            }
            let units = problem.cities[c].load(Role::Secondary);
            if served + units > capacity {
                break;
            }
            served += units;
            plan.push((c, Role::Secondary));
        }

        if plan.is_empty() {
            return Candidate::infeasible(location, facility_type);
        }

        let summary = OpeningSummary {
            served_load: served,
            capacity,
            primary_count,
            secondary_count: plan.len() - primary_count,
        };
        let fitness = self.fitness.score(&summary, facility);

        Candidate {
            location,
            facility_type,
            plan,
            fitness: if fitness.is_nan() {
                f64::NEG_INFINITY
            } else {
                fitness
            },
        }
    }

    /// Feasible candidates for every location in `range` and every type, in scan order.
    fn candidates_in<'a>(
        &'a self,
        problem: &'a Problem,
        index: &'a CompatibilityIndex,
        state: &'a Solution,
        range: Range<usize>,
    ) -> impl Iterator<Item = Candidate> + 'a {
        let available: Vec<usize> = range
            .filter(|&l| !state.is_open(l) && !self.is_location_blocked(index, state, l))
            .collect();

        available
            .into_iter()
            .flat_map(move |l| {
                (0..problem.num_types())
                    .map(move |t| self.plan_opening(problem, index, state, l, t))
            })
            .filter(Candidate::is_feasible)
    }

    /// Best feasible opening over all locations and types, if any.
    ///
    /// Ties go to the lowest location index, then the lowest type index.
    pub fn find_best_addition(
        &self,
        problem: &Problem,
        index: &CompatibilityIndex,
        state: &Solution,
        harness: &ParallelHarness,
    ) -> Option<Candidate> {
        let slots = harness.map_partitions(problem.num_locations(), |range| {
            let mut best: Option<Candidate> = None;
            for candidate in self.candidates_in(problem, index, state, range) {
                if best.as_ref().map_or(true, |b| candidate.fitness > b.fitness) {
                    best = Some(candidate);
                }
            }
            best
        });

        reduce_max_by(slots, |c| c.fitness)
    }

    /// Every feasible opening, ordered by location then type.
    pub fn feasible_candidates(
        &self,
        problem: &Problem,
        index: &CompatibilityIndex,
        state: &Solution,
        harness: &ParallelHarness,
    ) -> Vec<Candidate> {
        harness
            .map_partitions(problem.num_locations(), |range| {
                self.candidates_in(problem, index, state, range)
                    .collect::<Vec<_>>()
            })
            .into_iter()
            .flatten()
            .collect()
    }

    /// Commit an opening and every role in its plan.
    pub fn apply_action(&self, problem: &Problem, candidate: &Candidate, state: &mut Solution) {
        state.set_location_type(candidate.location, Some(candidate.facility_type));
        for &(city, role) in &candidate.plan {
            state.assign(problem, city, role, Some(candidate.location));
        }
    }

    /// Open locations until every city is complete or nothing feasible is left.
    ///
    /// Returns `true` if every city ended up with a distinct primary and secondary.
    pub fn construct(
        &self,
        problem: &Problem,
        index: &CompatibilityIndex,
        state: &mut Solution,
        harness: &ParallelHarness,
    ) -> bool {
        while !state.is_complete() {
            let candidate = match self.find_best_addition(problem, index, state, harness) {
                Some(candidate) => candidate,
                None => break,
            };

            trace!(
                "opening location {} as type {} (fitness {:.4}, {} roles)",
                candidate.location,
                candidate.facility_type,
                candidate.fitness,
                candidate.plan.len()
            );
            self.apply_action(problem, &candidate, state);
        }

        state.is_complete()
    }
}
