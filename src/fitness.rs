//! Scoring strategies for candidate openings.

use crate::problem::{FacilityType, LOAD_SCALE};
use serde::{Deserialize, Serialize};

/// What a tentative opening would achieve, as measured by the greedy walk.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OpeningSummary {
    /// Weighted load the opening would serve, in hundredths
    pub served_load: u64,
    /// Capacity of the facility type, in hundredths
    pub capacity: u64,
    /// Cities that would get their primary here
    pub primary_count: usize,
    /// Cities that would get their secondary here
    pub secondary_count: usize,
}

impl OpeningSummary {
    pub fn served_demand(&self) -> f64 {
        self.served_load as f64 / LOAD_SCALE as f64
    }

    /// Share of the capacity left unused, in `[0, 1]`.
    pub fn unused_fraction(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        self.capacity.saturating_sub(self.served_load) as f64 / self.capacity as f64
    }
}

/// Scores a feasible opening; higher is better.
pub trait FitnessStrategy: Send + Sync {
    fn score(&self, opening: &OpeningSummary, facility: &FacilityType) -> f64;

    fn name(&self) -> &str;
}

fn per_cost(value: f64, facility: &FacilityType) -> f64 {
    value / facility.cost.max(f64::EPSILON)
}

/// Served demand per unit of opening cost.
#[derive(Debug, Clone, Copy, Default)]
pub struct Density;

impl FitnessStrategy for Density {
    fn score(&self, opening: &OpeningSummary, facility: &FacilityType) -> f64 {
        per_cost(opening.served_demand(), facility)
    }

    fn name(&self) -> &str {
        "density"
    }
}

/// Density scaled down by the share of capacity the opening leaves idle.
///
/// Openings that only pick up secondary roles fill little of their capacity
/// and are pushed down the ranking.
#[derive(Debug, Clone, Copy)]
pub struct WastePenalized {
    pub weight: f64,
}

impl FitnessStrategy for WastePenalized {
    fn score(&self, opening: &OpeningSummary, facility: &FacilityType) -> f64 {
        let density = per_cost(opening.served_demand(), facility);
        density * (1.0 - self.weight * opening.unused_fraction())
    }

    fn name(&self) -> &str {
        "waste-penalized"
    }
}

/// Roles covered per unit of cost, counting a secondary as a tenth of a primary.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReducedLoad;

impl FitnessStrategy for ReducedLoad {
    fn score(&self, opening: &OpeningSummary, facility: &FacilityType) -> f64 {
        let covered = opening.primary_count as f64 + 0.1 * opening.secondary_count as f64;
        per_cost(covered, facility)
    }

    fn name(&self) -> &str {
        "reduced-load"
    }
}

/// Serializable selector for the built-in strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FitnessKind {
    #[default]
    Density,
    WastePenalized,
    ReducedLoad,
}

impl FitnessKind {
    /// Build the strategy; `waste_penalty` is only used by `WastePenalized`.
    pub fn build(self, waste_penalty: f64) -> Box<dyn FitnessStrategy> {
        match self {
            FitnessKind::Density => Box::new(Density),
            FitnessKind::WastePenalized => Box::new(WastePenalized {
                weight: waste_penalty,
            }),
            FitnessKind::ReducedLoad => Box::new(ReducedLoad),
        }
    }
}

impl std::str::FromStr for FitnessKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "density" => Ok(FitnessKind::Density),
            "waste-penalized" => Ok(FitnessKind::WastePenalized),
            "reduced-load" => Ok(FitnessKind::ReducedLoad),
            other => Err(format!("unknown fitness strategy '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facility() -> FacilityType {
        FacilityType::new(0, 10.0, 100.0, 5.0)
    }

    #[test]
    fn density_is_served_demand_over_cost() {
        let opening = OpeningSummary {
            served_load: 2000,
            capacity: 10000,
            primary_count: 2,
            secondary_count: 0,
        };
        assert!((Density.score(&opening, &facility()) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn waste_penalty_prefers_fuller_openings() {
        let strategy = WastePenalized { weight: 0.5 };
        let full = OpeningSummary {
            served_load: 10000,
            capacity: 10000,
            primary_count: 10,
            secondary_count: 0,
        };
        let sparse = OpeningSummary {
            served_load: 1000,
            capacity: 10000,
            primary_count: 0,
            secondary_count: 10,
        };
        let f = facility();
        assert!(strategy.score(&full, &f) > strategy.score(&sparse, &f));
        assert!((strategy.score(&full, &f) - Density.score(&full, &f)).abs() < 1e-12);
    }

    #[test]
    fn kind_parses_cli_names() {
        assert_eq!("reduced-load".parse::<FitnessKind>(), Ok(FitnessKind::ReducedLoad));
        assert!("nope".parse::<FitnessKind>().is_err());
    }
}
