//! Full neighborhood scan: reassignments and all pairwise swaps.

use super::moves::Move;
use super::potential::Potential;
use crate::compatibility::CompatibilityIndex;
use crate::parallel::{reduce_min_by, ParallelHarness};
use crate::problem::Problem;
use crate::solution::Solution;

/// Moves must lower H by more than this to count as improving.
pub const IMPROVEMENT_EPSILON: f64 = 1e-9;

/// Best strictly improving move and its ΔH, if any.
///
/// Cities are split across workers; each scans its cities in index order
/// (reassignments first, then swaps with every later city) and keeps the
/// first move with the lowest ΔH. The state is only read.
pub fn best_move(
    problem: &Problem,
    index: &CompatibilityIndex,
    state: &Solution,
    potential: &Potential,
    harness: &ParallelHarness,
) -> Option<(Move, f64)> {
    let open: Vec<usize> = state.open_locations().collect();
    let num_cities = problem.num_cities();

    let slots = harness.map_partitions(num_cities, |range| {
        let mut best: Option<(Move, f64)> = None;
        let mut consider = |mv: Move| {
            let delta = potential.delta(problem, index, state, &mv);
            if delta < -IMPROVEMENT_EPSILON && best.map_or(true, |(_, d)| delta < d) {
                best = Some((mv, delta));
            }
        };

        for c in range {
            let assignment = state.assignment(c);

            for &l in &open {
                if assignment.primary != Some(l) {
                    consider(Move::SetPrimary { city: c, location: l });
                }
                if assignment.secondary != Some(l) {
                    consider(Move::SetSecondary { city: c, location: l });
                }
            }

            for c2 in (c + 1)..num_cities {
                let other = state.assignment(c2);

                if let (Some(a), Some(b)) = (assignment.primary, other.primary) {
                    if a != b {
                        consider(Move::SwapPrimaryPrimary {
                            city_a: c,
                            city_b: c2,
                        });
                    }
                }
                if let (Some(a), Some(b)) = (assignment.secondary, other.secondary) {
                    if a != b {
                        consider(Move::SwapSecondarySecondary {
                            city_a: c,
                            city_b: c2,
                        });
                    }
                }
                if let (Some(a), Some(b)) = (assignment.primary, other.secondary) {
                    if a != b {
                        consider(Move::SwapPrimarySecondary {
                            primary_city: c,
                            secondary_city: c2,
                        });
                    }
                }
                if let (Some(a), Some(b)) = (other.primary, assignment.secondary) {
                    if a != b {
                        consider(Move::SwapPrimarySecondary {
                            primary_city: c2,
                            secondary_city: c,
                        });
                    }
                }
            }
        }

        best
    });

    reduce_min_by(slots, |&(_, delta)| delta)
}
