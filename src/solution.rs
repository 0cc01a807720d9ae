//! Solution representation: location types, city roles and derived loads.

use crate::compatibility::CompatibilityIndex;
use crate::problem::{Problem, Role, LOAD_SCALE};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The (primary, secondary) locations serving one city.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityAssignment {
    pub primary: Option<usize>,
    pub secondary: Option<usize>,
}

impl CityAssignment {
    pub fn get(&self, role: Role) -> Option<usize> {
        match role {
            Role::Primary => self.primary,
            Role::Secondary => self.secondary,
        }
    }

    fn slot(&mut self, role: Role) -> &mut Option<usize> {
        match role {
            Role::Primary => &mut self.primary,
            Role::Secondary => &mut self.secondary,
        }
    }

    /// Both roles set, at different locations.
    pub fn is_complete(&self) -> bool {
        matches!((self.primary, self.secondary), (Some(p), Some(s)) if p != s)
    }
}

/// A (possibly partial) assignment of facility types and city roles.
///
/// Loads are kept in hundredths of a demand unit and updated on every
/// assignment change, so `load(l)` is always the exact weighted demand
/// served by `l`.
#[derive(Clone, PartialEq, Serialize)]
pub struct Solution {
    location_types: Vec<Option<usize>>,
    assignments: Vec<CityAssignment>,
    location_loads: Vec<u64>,
}

impl Solution {
    /// Create an empty solution sized for `problem`.
    pub fn new(problem: &Problem) -> Self {
        Solution {
            location_types: vec![None; problem.num_locations()],
            assignments: vec![CityAssignment::default(); problem.num_cities()],
            location_loads: vec![0; problem.num_locations()],
        }
    }

    /// Reset every location type and city role to unassigned.
    pub fn purge(&mut self) {
        self.location_types.iter_mut().for_each(|t| *t = None);
        self.assignments
            .iter_mut()
            .for_each(|a| *a = CityAssignment::default());
        self.location_loads.iter_mut().for_each(|l| *l = 0);
    }

    pub fn location_type(&self, location: usize) -> Option<usize> {
        self.location_types[location]
    }

    pub fn location_types(&self) -> &[Option<usize>] {
        &self.location_types
    }

    pub fn assignment(&self, city: usize) -> CityAssignment {
        self.assignments[city]
    }

    pub fn assignments(&self) -> &[CityAssignment] {
        &self.assignments
    }

    /// Weighted demand served by `location`, in hundredths.
    pub fn load(&self, location: usize) -> u64 {
        self.location_loads[location]
    }

    pub fn loads(&self) -> &[u64] {
        &self.location_loads
    }

    pub fn is_open(&self, location: usize) -> bool {
        self.location_types[location].is_some()
    }

    /// Indices of all locations with a type.
    pub fn open_locations(&self) -> impl Iterator<Item = usize> + Clone + '_ {
        self.location_types
            .iter()
            .enumerate()
            .filter_map(|(l, t)| t.map(|_| l))
    }

    /// Set the type of a location, returning the previous one.
    pub fn set_location_type(&mut self, location: usize, facility_type: Option<usize>) -> Option<usize> {
        std::mem::replace(&mut self.location_types[location], facility_type)
    }

    /// Point `city`'s `role` at `location`, keeping loads in sync.
    /// Returns the previous location for that role.
    pub fn assign(
        &mut self,
        problem: &Problem,
        city: usize,
        role: Role,
        location: Option<usize>,
    ) -> Option<usize> {
        let units = problem.cities[city].load(role);
        let previous = std::mem::replace(self.assignments[city].slot(role), location);

        if let Some(old) = previous {
            self.location_loads[old] -= units;
        }
        if let Some(new) = location {
            self.location_loads[new] += units;
        }

        previous
    }

    /// Exchange `role_a` of `city_a` with `role_b` of `city_b`.
    pub fn swap_roles(
        &mut self,
        problem: &Problem,
        city_a: usize,
        role_a: Role,
        city_b: usize,
        role_b: Role,
    ) {
        let loc_a = self.assignments[city_a].get(role_a);
        let loc_b = self.assignments[city_b].get(role_b);
        self.assign(problem, city_a, role_a, loc_b);
        self.assign(problem, city_b, role_b, loc_a);
    }

    /// Total cost of all opened facilities.
    pub fn opening_cost(&self, problem: &Problem) -> f64 {
        self.location_types
            .iter()
            .flatten()
            .map(|&t| problem.facility_types[t].cost)
            .fold(0.0, |total, cost| total + cost)
    }

    /// Every city has a primary and a distinct secondary.
    pub fn is_complete(&self) -> bool {
        self.assignments.iter().all(CityAssignment::is_complete)
    }

    /// Number of (city, role) slots still unassigned.
    pub fn missing_roles(&self) -> usize {
        self.assignments
            .iter()
            .map(|a| a.primary.is_none() as usize + a.secondary.is_none() as usize)
            .sum()
    }

    /// Open locations whose load exceeds the capacity of their type.
    pub fn capacity_violations(&self, problem: &Problem) -> Vec<usize> {
        self.location_types
            .iter()
            .enumerate()
            .filter(|&(l, t)| match t {
                Some(t) => self.location_loads[l] > problem.facility_types[*t].capacity_units(),
                None => self.location_loads[l] > 0,
            })
            .map(|(l, _)| l)
            .collect()
    }

    /// Pairs of open locations closer than the minimum separation.
    pub fn separation_violations(&self, index: &CompatibilityIndex) -> usize {
        self.open_locations()
            .tuple_combinations()
            .filter(|&(l1, l2)| !index.is_location_pair_compatible(l1, l2))
            .count()
    }

    /// True iff `city` is served in both roles by distinct open locations within reach.
    pub fn is_city_covered(&self, index: &CompatibilityIndex, city: usize) -> bool {
        let assignment = self.assignments[city];
        if !assignment.is_complete() {
            return false;
        }

        Role::ALL.iter().all(|&role| match assignment.get(role) {
            Some(l) => match self.location_types[l] {
                Some(t) => index.is_serviceable(city, l, t, role),
                None => false,
            },
            None => false,
        })
    }

    pub fn satisfies_capacity(&self, problem: &Problem) -> bool {
        self.capacity_violations(problem).is_empty()
    }

    pub fn satisfies_separation(&self, index: &CompatibilityIndex) -> bool {
        self.separation_violations(index) == 0
    }

    pub fn satisfies_coverage(&self, index: &CompatibilityIndex) -> bool {
        (0..self.assignments.len()).all(|c| self.is_city_covered(index, c))
    }

    /// Capacity, separation and coverage all hold.
    pub fn is_feasible(&self, problem: &Problem, index: &CompatibilityIndex) -> bool {
        self.satisfies_coverage(index)
            && self.satisfies_capacity(problem)
            && self.satisfies_separation(index)
    }

    /// Loads rebuilt from scratch from the city assignments.
    pub fn recompute_loads(&self, problem: &Problem) -> Vec<u64> {
        let mut loads = vec![0; self.location_loads.len()];
        for (c, assignment) in self.assignments.iter().enumerate() {
            for role in Role::ALL {
                if let Some(l) = assignment.get(role) {
                    loads[l] += problem.cities[c].load(role);
                }
            }
        }
        loads
    }

    /// Check that incremental loads match the assignments.
    pub fn loads_consistent(&self, problem: &Problem) -> bool {
        self.recompute_loads(problem) == self.location_loads
    }
}

impl fmt::Debug for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Solution:")?;
        writeln!(f, "  Open locations: {}", self.open_locations().count())?;
        writeln!(f, "  Missing roles: {}", self.missing_roles())?;

        for (l, t) in self.location_types.iter().enumerate() {
            if let Some(t) = t {
                writeln!(
                    f,
                    "  Location {}: type {} (Load: {:.2})",
                    l,
                    t,
                    self.location_loads[l] as f64 / LOAD_SCALE as f64
                )?;
            }
        }

        Ok(())
    }
}
