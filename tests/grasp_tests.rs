//! Tests for the GRASP driver: RCL, randomized steps, rounds and the incumbent contract.

use grasp_flp::compatibility::CompatibilityIndex;
use grasp_flp::config::Config;
use grasp_flp::generator::{generate, GeneratorConfig};
use grasp_flp::grasp::{restricted_candidate_list, GraspDriver};
use grasp_flp::greedy::Candidate;
use grasp_flp::parallel::ParallelHarness;
use grasp_flp::problem::{City, FacilityType, Location, Problem, Role};
use grasp_flp::solution::Solution;

/// Two locations, one type (cap 100, radius 10, cost 5), two cities of demand 10.
fn create_two_location_problem() -> Problem {
    let cities = vec![City::new(0, 1.0, 1.0, 10.0), City::new(1, 1.0, -1.0, 10.0)];
    let locations = vec![Location::new(0, 0.0, 0.0), Location::new(1, 2.0, 0.0)];
    let types = vec![FacilityType::new(0, 10.0, 100.0, 5.0)];

    Problem::new("TwoLocations".to_string(), cities, locations, types, 0.0)
}

fn create_generated_problem(seed: u64) -> Problem {
    let config = GeneratorConfig {
        num_locations: 20,
        num_cities: 30,
        num_types: 4,
        min_separation: 2.0,
        width: 50.0,
        height: 50.0,
    };
    generate(&config, seed)
}

fn candidate(location: usize, fitness: f64) -> Candidate {
    Candidate {
        location,
        facility_type: 0,
        plan: vec![(0, Role::Primary)],
        fitness,
    }
}

fn feasible_state(problem: &Problem) -> Solution {
    let mut state = Solution::new(problem);
    state.set_location_type(0, Some(0));
    state.set_location_type(1, Some(0));
    for c in 0..2 {
        state.assign(problem, c, Role::Primary, Some(0));
        state.assign(problem, c, Role::Secondary, Some(1));
    }
    state
}

#[test]
fn test_rcl_bounds() {
    let candidates = vec![candidate(0, 1.0), candidate(1, 4.0), candidate(2, 3.0), candidate(3, 4.0)];

    assert_eq!(restricted_candidate_list(&candidates, 0.0), vec![1, 3]);
    assert_eq!(restricted_candidate_list(&candidates, 0.5), vec![1, 2, 3]);
    assert_eq!(restricted_candidate_list(&candidates, 1.0), vec![0, 1, 2, 3]);
    assert!(restricted_candidate_list(&[], 0.3).is_empty());
}

#[test]
fn test_alpha_zero_step_matches_greedy_fitness() {
    let problem = create_generated_problem(1);
    let index = CompatibilityIndex::new(&problem);
    let harness = ParallelHarness::new(Some(2));
    let state = Solution::new(&problem);

    for seed in 0..10 {
        let mut driver = GraspDriver::new(&Config::new().with_seed(seed));
        let best = driver
            .constructor()
            .find_best_addition(&problem, &index, &state, &harness)
            .unwrap();
        let step = driver
            .randomized_greedy_step(&problem, &index, &state, &harness, 0.0)
            .unwrap();

        assert_eq!(step.fitness, best.fitness);
    }
}

#[test]
fn test_alpha_one_step_picks_any_feasible_candidate() {
    let problem = create_generated_problem(2);
    let index = CompatibilityIndex::new(&problem);
    let harness = ParallelHarness::new(Some(1));
    let state = Solution::new(&problem);
    let mut driver = GraspDriver::new(&Config::new().with_seed(9));

    let all = driver
        .constructor()
        .feasible_candidates(&problem, &index, &state, &harness);

    for _ in 0..20 {
        let step = driver
            .randomized_greedy_step(&problem, &index, &state, &harness, 1.0)
            .unwrap();
        assert!(step.is_feasible());
        assert!(all.contains(&step));
    }
}

#[test]
fn test_round_on_two_location_scenario() {
    let problem = create_two_location_problem();
    let index = CompatibilityIndex::new(&problem);
    let harness = ParallelHarness::new(Some(1));
    let mut driver = GraspDriver::new(&Config::new().with_seed(3));
    let mut state = Solution::new(&problem);

    let outcome = driver.run_round_with_alpha(&problem, &index, &mut state, &harness, 0.0);

    assert!(outcome.constructed);
    assert!(outcome.feasible);
    assert_eq!(outcome.openings, 2);
    assert_eq!(outcome.cost, 10.0);
    assert!(state.is_feasible(&problem, &index));
}

#[test]
fn test_round_without_feasible_step_is_discardable() {
    let cities = vec![City::new(0, 500.0, 500.0, 1.0)];
    let locations = vec![Location::new(0, 0.0, 0.0)];
    let types = vec![FacilityType::new(0, 5.0, 10.0, 1.0)];
    let problem = Problem::new("Unreachable".to_string(), cities, locations, types, 0.0);
    let index = CompatibilityIndex::new(&problem);
    let harness = ParallelHarness::new(Some(1));
    let mut driver = GraspDriver::new(&Config::new().with_seed(3));
    let mut state = Solution::new(&problem);

    let outcome = driver.run_round(&problem, &index, &mut state, &harness);

    assert_eq!(outcome.openings, 0);
    assert!(!outcome.constructed);
    assert!(!outcome.feasible);

    let mut incumbent = None;
    assert!(!GraspDriver::offer(&problem, &index, &state, &mut incumbent));
    assert!(incumbent.is_none());
}

#[test]
fn test_round_starts_from_purged_state() {
    let problem = create_two_location_problem();
    let index = CompatibilityIndex::new(&problem);
    let harness = ParallelHarness::new(Some(1));
    let driver = GraspDriver::new(&Config::new().with_seed(3));

    let mut state = feasible_state(&problem);
    driver.purge(&mut state);
    assert_eq!(state, Solution::new(&problem));
    assert!(!state.is_feasible(&problem, &index));

    // A stale state gives the same round as a fresh one under the same seed
    let mut stale = feasible_state(&problem);
    stale.assign(&problem, 0, Role::Secondary, Some(0));
    let mut fresh = Solution::new(&problem);
    let mut other = GraspDriver::new(&Config::new().with_seed(4));
    let mut twin = GraspDriver::new(&Config::new().with_seed(4));
    other.run_round_with_alpha(&problem, &index, &mut stale, &harness, 0.0);
    twin.run_round_with_alpha(&problem, &index, &mut fresh, &harness, 0.0);
    assert_eq!(stale, fresh);
}

#[test]
fn test_offer_contract() {
    let problem = create_two_location_problem();
    let index = CompatibilityIndex::new(&problem);
    let mut incumbent: Option<Solution> = None;

    // Infeasible states never become the incumbent
    let empty = Solution::new(&problem);
    assert!(!GraspDriver::is_improvement(&problem, &index, &empty, None));
    assert!(!GraspDriver::offer(&problem, &index, &empty, &mut incumbent));

    let state = feasible_state(&problem);
    assert!(GraspDriver::offer(&problem, &index, &state, &mut incumbent));
    assert_eq!(incumbent.as_ref(), Some(&state));

    // Equal cost is not an improvement
    assert!(!GraspDriver::offer(&problem, &index, &state, &mut incumbent));

    // The incumbent is a copy, not a view of the working state
    let mut working = state.clone();
    working.purge();
    assert_eq!(incumbent.as_ref(), Some(&state));
}

#[test]
fn test_offer_accepts_strictly_cheaper() {
    let cities = vec![City::new(0, 1.0, 0.0, 1.0)];
    let locations = vec![
        Location::new(0, 0.0, 0.0),
        Location::new(1, 2.0, 0.0),
        Location::new(2, 0.0, 2.0),
    ];
    let types = vec![
        FacilityType::new(0, 10.0, 100.0, 5.0),
        FacilityType::new(1, 10.0, 100.0, 3.0),
    ];
    let problem = Problem::new("Cheaper".to_string(), cities, locations, types, 0.0);
    let index = CompatibilityIndex::new(&problem);

    let mut expensive = Solution::new(&problem);
    expensive.set_location_type(0, Some(0));
    expensive.set_location_type(1, Some(0));
    expensive.assign(&problem, 0, Role::Primary, Some(0));
    expensive.assign(&problem, 0, Role::Secondary, Some(1));

    let mut cheap = expensive.clone();
    cheap.set_location_type(1, Some(1));

    let mut incumbent = None;
    assert!(GraspDriver::offer(&problem, &index, &expensive, &mut incumbent));
    assert!(GraspDriver::offer(&problem, &index, &cheap, &mut incumbent));
    assert_eq!(incumbent.as_ref().map(|s| s.opening_cost(&problem)), Some(8.0));
    assert!(!GraspDriver::offer(&problem, &index, &expensive, &mut incumbent));
}
