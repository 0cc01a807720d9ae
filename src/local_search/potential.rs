//! Incremental penalty potential guiding the assignment search.

use super::moves::{Changes, Move};
use crate::compatibility::CompatibilityIndex;
use crate::problem::{Problem, Role};
use crate::solution::{CityAssignment, Solution};

/// Penalty weight for a city without a primary.
pub const MISSING_PRIMARY_WEIGHT: f64 = 300.0;
/// Penalty weight for a city without a distinct secondary.
pub const MISSING_SECONDARY_WEIGHT: f64 = 100.0;
/// Penalty per pair of open locations closer than the minimum separation.
pub const SEPARATION_PENALTY: f64 = 1000.0;
/// Weight of the quadratic term once a location is over capacity.
pub const OVERLOAD_WEIGHT: f64 = 2.0;
/// Smallest overload (in tenths of a demand unit) the quadratic term charges for.
const MIN_OVERLOAD: f64 = 3.0;
/// Load ratios above this are clamped before exponentiation.
const MAX_LOAD_RATIO: f64 = 20.0;

/// Penalty of one city given its assignment.
pub fn city_term(
    problem: &Problem,
    index: &CompatibilityIndex,
    location_types: &[Option<usize>],
    city: usize,
    assignment: CityAssignment,
) -> f64 {
    let scale = problem.cities[city].demand_tenths() as f64 + 2.0;
    let missing = |weight: f64| scale * scale * weight;

    let reach_penalty = |location: usize, role: Role| -> Option<f64> {
        let t = location_types[location]?;
        if index.is_serviceable(city, location, t, role) {
            Some(0.0)
        } else {
            Some(
                problem.cities[city]
                    .position
                    .squared_distance(&problem.locations[location].position),
            )
        }
    };

    let primary = assignment
        .primary
        .and_then(|l| reach_penalty(l, Role::Primary))
        .unwrap_or_else(|| missing(MISSING_PRIMARY_WEIGHT));

    let secondary = match assignment.secondary {
        Some(l) if assignment.primary != Some(l) => reach_penalty(l, Role::Secondary),
        _ => None,
    }
    .unwrap_or_else(|| missing(MISSING_SECONDARY_WEIGHT));

    primary + secondary
}

/// Penalty of one location given its type and load.
///
/// Open locations pay `exp(load / capacity)`, the "useful load" barrier,
/// plus a quadratic charge on any overload.
pub fn location_term(problem: &Problem, facility_type: Option<usize>, load: u64) -> f64 {
    let t = match facility_type {
        Some(t) => t,
        None => return 0.0,
    };

    let capacity = problem.facility_types[t].capacity_units().max(1);
    let ratio = (load as f64 / capacity as f64).min(MAX_LOAD_RATIO);
    let mut term = ratio.exp();

    if load > capacity {
        let excess = ((load - capacity) as f64 / 10.0).max(MIN_OVERLOAD);
        term += OVERLOAD_WEIGHT * excess * excess;
    }

    term
}

/// Small fixed-size map from location to load change.
#[derive(Default)]
struct LoadDeltas {
    entries: [(usize, i64); 4],
    len: usize,
}

impl LoadDeltas {
    fn add(&mut self, location: usize, delta: i64) {
        for entry in &mut self.entries[..self.len] {
            if entry.0 == location {
                entry.1 += delta;
                return;
            }
        }
        self.entries[self.len] = (location, delta);
        self.len += 1;
    }

    fn iter(&self) -> impl Iterator<Item = &(usize, i64)> {
        self.entries[..self.len].iter()
    }
}

/// The potential H of a solution, split into per-city and per-location terms.
#[derive(Debug, Clone)]
pub struct Potential {
    city_terms: Vec<f64>,
    location_terms: Vec<f64>,
    separation: f64,
    total: f64,
}

impl Potential {
    /// Compute every term of `state` from scratch.
    pub fn new(problem: &Problem, index: &CompatibilityIndex, state: &Solution) -> Self {
        let types = state.location_types();

        let city_terms = (0..problem.num_cities())
            .map(|c| city_term(problem, index, types, c, state.assignment(c)))
            .collect();

        let location_terms = (0..problem.num_locations())
            .map(|l| location_term(problem, types[l], state.load(l)))
            .collect();

        let separation = SEPARATION_PENALTY * state.separation_violations(index) as f64;

        let mut potential = Potential {
            city_terms,
            location_terms,
            separation,
            total: 0.0,
        };
        potential.resum();
        potential
    }

    /// Current value of H.
    pub fn value(&self) -> f64 {
        self.total
    }

    fn resum(&mut self) {
        self.total = self.city_terms.iter().sum::<f64>()
            + self.location_terms.iter().sum::<f64>()
            + self.separation;
    }

    /// Change of H if `mv` were applied to `state`; `state` is left untouched.
    pub fn delta(&self, problem: &Problem, index: &CompatibilityIndex, state: &Solution, mv: &Move) -> f64 {
        let changes = mv.changes(state);
        let types = state.location_types();

        let mut loads = LoadDeltas::default();
        let mut cities: [Option<(usize, CityAssignment)>; 2] = [None, None];

        for change in changes.iter() {
            let units = problem.cities[change.city].load(change.role) as i64;
            if let Some(from) = change.from {
                loads.add(from, -units);
            }
            if let Some(to) = change.to {
                loads.add(to, units);
            }

            let slot = cities
                .iter_mut()
                .find(|s| s.map_or(true, |(c, _)| c == change.city));
            if let Some(slot) = slot {
                let mut assignment = slot.map_or(state.assignment(change.city), |(_, a)| a);
                match change.role {
                    Role::Primary => assignment.primary = change.to,
                    Role::Secondary => assignment.secondary = change.to,
                }
                *slot = Some((change.city, assignment));
            }
        }

        let mut delta = 0.0;
        for &(city, assignment) in cities.iter().flatten() {
            delta += city_term(problem, index, types, city, assignment) - self.city_terms[city];
        }
        for &(location, change) in loads.iter() {
            if change == 0 {
                continue;
            }
            let load = (state.load(location) as i64 + change).max(0) as u64;
            delta += location_term(problem, types[location], load) - self.location_terms[location];
        }

        delta
    }

    /// Refresh the terms touched by `changes`, which have already been applied to `state`.
    pub fn update(&mut self, problem: &Problem, index: &CompatibilityIndex, state: &Solution, changes: &Changes) {
        let types = state.location_types();

        for change in changes.iter() {
            let term = city_term(problem, index, types, change.city, state.assignment(change.city));
            self.total += term - std::mem::replace(&mut self.city_terms[change.city], term);
            for location in change.from.into_iter().chain(change.to) {
                let term = location_term(problem, types[location], state.load(location));
                self.total += term - std::mem::replace(&mut self.location_terms[location], term);
            }
        }
    }
}
