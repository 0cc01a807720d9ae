//! Post-pass that downgrades open locations to the cheapest sufficient type.

use crate::compatibility::CompatibilityIndex;
use crate::problem::{Problem, Role};
use crate::solution::Solution;

/// Give every open location the cheapest type that still covers its load and
/// its assigned cities, and close locations nobody uses.
///
/// A type is only considered if it costs no more than the current one; among
/// equally cheap types the lowest index wins. Returns the number of locations
/// whose type changed.
pub fn retype_locations(problem: &Problem, index: &CompatibilityIndex, state: &mut Solution) -> usize {
    let mut served_by: Vec<Vec<(usize, Role)>> = vec![Vec::new(); problem.num_locations()];
    for (c, assignment) in state.assignments().iter().enumerate() {
        for role in Role::ALL {
            if let Some(l) = assignment.get(role) {
                served_by[l].push((c, role));
            }
        }
    }

    let mut changed = 0;

    for l in 0..problem.num_locations() {
        let current = match state.location_type(l) {
            Some(t) => t,
            None => continue,
        };

        if state.load(l) == 0 && served_by[l].is_empty() {
            state.set_location_type(l, None);
            changed += 1;
            continue;
        }

        let current_cost = problem.facility_types[current].cost;
        let mut best: Option<usize> = None;

        for (t, facility) in problem.facility_types.iter().enumerate() {
            if facility.cost > current_cost || facility.capacity_units() < state.load(l) {
                continue;
            }
            let covers = served_by[l]
                .iter()
                .all(|&(c, role)| index.is_serviceable(c, l, t, role));
            if !covers {
                continue;
            }
            if best.map_or(true, |b| facility.cost < problem.facility_types[b].cost) {
                best = Some(t);
            }
        }

        if let Some(t) = best {
            if t != current {
                state.set_location_type(l, Some(t));
                changed += 1;
            }
        }
    }

    changed
}
