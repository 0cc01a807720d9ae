//! Precomputed compatibility tables shared by every search component.

use crate::problem::{Problem, Role};
use itertools::iproduct;
use std::cmp::Ordering;

/// Read-only lookup tables derived once from a [`Problem`].
///
/// All tables are flat buffers; nothing here changes after construction.
#[derive(Debug, Clone)]
pub struct CompatibilityIndex {
    num_cities: usize,
    num_locations: usize,
    num_types: usize,
    /// `num_locations * num_locations` separation flags
    location_pairs: Vec<bool>,
    /// `num_cities * num_locations * num_types * 2` service-distance flags
    serviceable: Vec<bool>,
    /// For every location, all cities sorted nearest first
    cities_by_distance: Vec<usize>,
}

impl CompatibilityIndex {
    /// Build every table for `problem`.
    pub fn new(problem: &Problem) -> Self {
        let num_cities = problem.num_cities();
        let num_locations = problem.num_locations();
        let num_types = problem.num_types();

        let mut location_pairs = vec![true; num_locations * num_locations];
        for (l1, l2) in iproduct!(0..num_locations, 0..num_locations) {
            if l1 < l2 {
                let ok = problem.location_distance(l1, l2) >= problem.min_separation;
                location_pairs[l1 * num_locations + l2] = ok;
                location_pairs[l2 * num_locations + l1] = ok;
            }
        }

        let mut serviceable = vec![false; num_cities * num_locations * num_types * 2];
        for (c, l) in iproduct!(0..num_cities, 0..num_locations) {
            let dist = problem.city_location_distance(c, l);
            for (t, facility) in problem.facility_types.iter().enumerate() {
                for role in Role::ALL {
                    let idx = ((c * num_locations + l) * num_types + t) * 2 + role.index();
                    serviceable[idx] = dist <= facility.reach(role);
                }
            }
        }

        let mut cities_by_distance = Vec::with_capacity(num_locations * num_cities);
        for l in 0..num_locations {
            let mut order: Vec<(usize, f64)> = (0..num_cities)
                .map(|c| {
                    let d = problem.cities[c]
                        .position
                        .squared_distance(&problem.locations[l].position);
                    (c, d)
                })
                .collect();
            order.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
            cities_by_distance.extend(order.into_iter().map(|(c, _)| c));
        }

        CompatibilityIndex {
            num_cities,
            num_locations,
            num_types,
            location_pairs,
            serviceable,
            cities_by_distance,
        }
    }

    /// True iff both locations may be open at the same time.
    #[inline]
    pub fn is_location_pair_compatible(&self, l1: usize, l2: usize) -> bool {
        self.location_pairs[l1 * self.num_locations + l2]
    }

    /// True iff `city` is within reach of `location` opened with `facility_type` in `role`.
    #[inline]
    pub fn is_serviceable(&self, city: usize, location: usize, facility_type: usize, role: Role) -> bool {
        let idx = ((city * self.num_locations + location) * self.num_types + facility_type) * 2
            + role.index();
        self.serviceable[idx]
    }

    /// All cities ordered by increasing distance to `location`.
    #[inline]
    pub fn cities_by_distance(&self, location: usize) -> &[usize] {
        let start = location * self.num_cities;
        &self.cities_by_distance[start..start + self.num_cities]
    }

    pub fn num_cities(&self) -> usize {
        self.num_cities
    }

    pub fn num_locations(&self) -> usize {
        self.num_locations
    }

    pub fn num_types(&self) -> usize {
        self.num_types
    }
}
