//! Random instance generation.

use crate::problem::{City, FacilityType, Location, Point, Problem};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Shape of a generated instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub num_locations: usize,
    pub num_cities: usize,
    pub num_types: usize,
    pub min_separation: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            num_locations: 100,
            num_cities: 170,
            num_types: 10,
            min_separation: 1.1,
            width: 100.0,
            height: 100.0,
        }
    }
}

/// Draw a random instance; the same seed always gives the same instance.
///
/// Demands are integers in `[0, 10)`, capacities in `[5, 20)` with a cost of
/// roughly half the capacity, radii in `[2, 10)`. Demands and capacities are
/// redrawn until the largest type on every location could hold 1.3 times the
/// total demand; without locations or types the first draw is kept. Each city is dropped near a random location, within 90% of
/// the largest service radius, so it can usually be covered.
pub fn generate(config: &GeneratorConfig, seed: u64) -> Problem {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let radii: Vec<f64> = (0..config.num_types)
        .map(|_| rng.gen_range(2..10) as f64)
        .collect();

    let (demands, capacities) = loop {
        let demands: Vec<f64> = (0..config.num_cities)
            .map(|_| rng.gen_range(0..10) as f64)
            .collect();
        let capacities: Vec<f64> = (0..config.num_types)
            .map(|_| rng.gen_range(5..20) as f64)
            .collect();

        let max_capacity = capacities.iter().copied().fold(0.0, f64::max);
        let needed: f64 = demands.iter().map(|d| d * 1.3).sum();
        if config.num_locations == 0
            || config.num_types == 0
            || max_capacity * config.num_locations as f64 > needed
        {
            break (demands, capacities);
        }
    };

    let cost_offset = rng.gen_range(0..2) as f64;
    let facility_types: Vec<FacilityType> = (0..config.num_types)
        .map(|t| {
            let cost = (capacities[t] / 2.0).floor() + cost_offset;
            FacilityType::new(t, radii[t], capacities[t], cost)
        })
        .collect();

    let locations = place_locations(config, &mut rng);

    let max_radius = radii.iter().copied().fold(0.0, f64::max);
    let cities = demands
        .iter()
        .enumerate()
        .map(|(id, &demand)| {
            let position = if locations.is_empty() {
                Point::new(
                    rng.gen_range(0.0..config.width.max(1.0)),
                    rng.gen_range(0.0..config.height.max(1.0)),
                )
            } else {
                let anchor = &locations[rng.gen_range(0..locations.len())];
                let angle = rng.gen_range(0.0..2.0 * PI);
                let dist = rng.gen_range(0.0..=0.9 * max_radius);
                Point::new(
                    anchor.position.x + dist * angle.cos(),
                    anchor.position.y + dist * angle.sin(),
                )
            };
            City::new(id, position.x, position.y, demand)
        })
        .collect();

    Problem::new(
        format!("generated-{}", seed),
        cities,
        locations,
        facility_types,
        config.min_separation,
    )
}

/// Integer grid positions, rejection-sampled against the minimum separation.
/// The area grows by 10 in both directions after 1000 failed attempts.
fn place_locations(config: &GeneratorConfig, rng: &mut ChaCha8Rng) -> Vec<Location> {
    let mut width = config.width.max(1.0) as i64;
    let mut height = config.height.max(1.0) as i64;
    let mut placed: Vec<Location> = Vec::with_capacity(config.num_locations);

    while placed.len() < config.num_locations {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let candidate = Point::new(rng.gen_range(0..width) as f64, rng.gen_range(0..height) as f64);
            let clear = placed
                .iter()
                .all(|l| l.position.distance(&candidate) > config.min_separation);
            if clear {
                placed.push(Location::new(placed.len(), candidate.x, candidate.y));
                break;
            }
            if attempts > 1000 {
                width += 10;
                height += 10;
                attempts = 0;
            }
        }
    }

    placed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_locations_respect_separation() {
        let config = GeneratorConfig {
            num_locations: 30,
            num_cities: 20,
            num_types: 3,
            min_separation: 5.0,
            width: 20.0,
            height: 20.0,
        };
        let problem = generate(&config, 7);
        assert_eq!(problem.num_locations(), 30);
        for i in 0..30 {
            for j in (i + 1)..30 {
                assert!(problem.location_distance(i, j) > 5.0);
            }
        }
    }

    #[test]
    fn generates_without_locations() {
        let config = GeneratorConfig {
            num_locations: 0,
            num_cities: 3,
            num_types: 2,
            ..GeneratorConfig::default()
        };
        let problem = generate(&config, 1);
        assert_eq!(problem.num_locations(), 0);
        assert_eq!(problem.num_cities(), 3);
        assert_eq!(problem.num_types(), 2);
    }
}
