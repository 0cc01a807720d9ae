//! Tests for the location-level polish.

use grasp_flp::compatibility::CompatibilityIndex;
use grasp_flp::config::Config;
use grasp_flp::location_search::{location_score, LocationMove, LocationSearch, INFEASIBLE_PENALTY};
use grasp_flp::parallel::ParallelHarness;
use grasp_flp::problem::{City, FacilityType, Location, Problem, Role};
use grasp_flp::solution::Solution;

/// Three locations close together, two cities reachable from all of them.
fn create_three_location_problem() -> Problem {
    let cities = vec![City::new(0, 1.0, 1.0, 2.0), City::new(1, 1.0, -1.0, 2.0)];
    let locations = vec![
        Location::new(0, 0.0, 0.0),
        Location::new(1, 2.0, 0.0),
        Location::new(2, 1.0, 3.0),
    ];
    let types = vec![FacilityType::new(0, 10.0, 100.0, 5.0)];

    Problem::new("ThreeLocations".to_string(), cities, locations, types, 0.0)
}

/// All three locations open; city 0 uses 0 and 1, city 1 uses 2 and 1.
fn create_wasteful_solution(problem: &Problem) -> Solution {
    let mut state = Solution::new(problem);
    for l in 0..3 {
        state.set_location_type(l, Some(0));
    }
    state.assign(problem, 0, Role::Primary, Some(0));
    state.assign(problem, 0, Role::Secondary, Some(1));
    state.assign(problem, 1, Role::Primary, Some(2));
    state.assign(problem, 1, Role::Secondary, Some(1));
    state
}

#[test]
fn test_neighborhood_lists_closings_and_type_changes() {
    let problem = create_three_location_problem();
    let mut state = create_wasteful_solution(&problem);

    // One type and every location open: only closings remain
    let moves = LocationSearch::neighborhood(&problem, &state);
    assert_eq!(moves.len(), 3);
    assert!(moves.iter().all(|m| matches!(m, LocationMove::Set { facility_type: None, .. })));

    state.set_location_type(2, None);
    let moves = LocationSearch::neighborhood(&problem, &state);
    assert!(moves.contains(&LocationMove::Set {
        location: 2,
        facility_type: Some(0)
    }));
    assert!(moves.contains(&LocationMove::Swap { first: 0, second: 2 }));
    assert!(!moves.contains(&LocationMove::Swap { first: 0, second: 1 }));
}

#[test]
fn test_evaluate_closing_reassigns_cities() {
    let problem = create_three_location_problem();
    let index = CompatibilityIndex::new(&problem);
    let state = create_wasteful_solution(&problem);
    let search = LocationSearch::new(5, &Config::new());

    let (score, candidate) = search.evaluate(
        &problem,
        &index,
        &state,
        LocationMove::Set {
            location: 2,
            facility_type: None,
        },
    );

    assert!(!candidate.is_open(2));
    assert!(candidate.is_feasible(&problem, &index));
    assert_eq!(score, 10.0);
    assert_eq!(candidate.load(2), 0);
    assert!(candidate.loads_consistent(&problem));

    // The base state is untouched
    assert!(state.is_open(2));
}

#[test]
fn test_improve_closes_redundant_location() {
    let problem = create_three_location_problem();
    let index = CompatibilityIndex::new(&problem);
    let mut state = create_wasteful_solution(&problem);
    assert!(state.is_feasible(&problem, &index));
    assert_eq!(state.opening_cost(&problem), 15.0);

    let mut search = LocationSearch::new(5, &Config::new());
    let feasible = search.improve(&problem, &index, &mut state, &ParallelHarness::new(Some(2)));

    assert!(feasible);
    assert_eq!(state.opening_cost(&problem), 10.0);
    assert_eq!(state.open_locations().count(), 2);
    assert!(search.iterations >= 1);
}

#[test]
fn test_score_penalizes_infeasibility() {
    let problem = create_three_location_problem();
    let index = CompatibilityIndex::new(&problem);
    let state = Solution::new(&problem);

    assert_eq!(location_score(&problem, &index, &state, true), 0.0);
    assert_eq!(location_score(&problem, &index, &state, false), INFEASIBLE_PENALTY);
}
