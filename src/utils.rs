//! Reporting helpers: text and JSON solution reports, run statistics and a
//! console plot.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::compatibility::CompatibilityIndex;
use crate::problem::{Problem, Role, LOAD_SCALE};
use crate::solution::Solution;

/// Format a duration as hours, minutes, and seconds.
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}h {:02}m {:02}s", hours, minutes, seconds)
}

/// One open location in a report.
#[derive(Debug, Clone, Serialize)]
pub struct OpenLocationReport {
    pub location: usize,
    pub facility_type: usize,
    /// Load in demand units
    pub load: f64,
    pub capacity: f64,
    pub cost: f64,
}

/// One city's roles in a report.
#[derive(Debug, Clone, Serialize)]
pub struct CityReport {
    pub city: usize,
    pub primary: Option<usize>,
    pub secondary: Option<usize>,
}

/// A self-contained, serializable view of a solution.
#[derive(Debug, Clone, Serialize)]
pub struct SolutionReport {
    pub instance: String,
    pub cost: f64,
    pub feasible: bool,
    pub open_locations: Vec<OpenLocationReport>,
    pub cities: Vec<CityReport>,
    /// Cities lacking a primary, a secondary, or both
    pub incomplete_cities: Vec<usize>,
    /// Open locations whose load exceeds capacity
    pub overloaded_locations: Vec<usize>,
    pub separation_violations: usize,
}

impl SolutionReport {
    pub fn new(solution: &Solution, problem: &Problem, index: &CompatibilityIndex) -> Self {
        let open_locations = solution
            .open_locations()
            .filter_map(|l| {
                let t = solution.location_type(l)?;
                let facility = &problem.facility_types[t];
                Some(OpenLocationReport {
                    location: l,
                    facility_type: t,
                    load: solution.load(l) as f64 / LOAD_SCALE as f64,
                    capacity: facility.capacity,
                    cost: facility.cost,
                })
            })
            .collect();

        let cities = solution
            .assignments()
            .iter()
            .enumerate()
            .map(|(c, a)| CityReport {
                city: c,
                primary: a.get(Role::Primary),
                secondary: a.get(Role::Secondary),
            })
            .collect();

        let incomplete_cities = solution
            .assignments()
            .iter()
            .enumerate()
            .filter(|(_, a)| !a.is_complete())
            .map(|(c, _)| c)
            .collect();

        SolutionReport {
            instance: problem.name.clone(),
            cost: solution.opening_cost(problem),
            feasible: solution.is_feasible(problem, index),
            open_locations,
            cities,
            incomplete_cities,
            overloaded_locations: solution.capacity_violations(problem),
            separation_violations: solution.separation_violations(index),
        }
    }
}

fn format_slot(slot: Option<usize>) -> String {
    slot.map_or_else(|| "-".to_string(), |l| l.to_string())
}

impl fmt::Display for SolutionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Facility location solution for instance: {}", self.instance)?;
        writeln!(f, "Total Cost: {:.2}", self.cost)?;
        writeln!(f, "Is Feasible: {}", self.feasible)?;
        writeln!(f, "Open Locations: {}", self.open_locations.len())?;
        writeln!(f)?;

        for open in &self.open_locations {
            writeln!(
                f,
                "Location #{}: type {} (cost {:.2}), load {:.2} / {:.2}",
                open.location, open.facility_type, open.cost, open.load, open.capacity
            )?;
        }
        writeln!(f)?;

        for city in &self.cities {
            writeln!(
                f,
                "City #{}: primary {}, secondary {}",
                city.city,
                format_slot(city.primary),
                format_slot(city.secondary)
            )?;
        }

        if !self.incomplete_cities.is_empty() {
            writeln!(f)?;
            writeln!(f, "Cities missing a role: {:?}", self.incomplete_cities)?;
        }
        if !self.overloaded_locations.is_empty() {
            writeln!(f, "Overloaded locations: {:?}", self.overloaded_locations)?;
        }
        if self.separation_violations > 0 {
            writeln!(f, "Separation violations: {}", self.separation_violations)?;
        }

        Ok(())
    }
}

/// Save a human-readable report to a file.
pub fn save_solution<P: AsRef<Path>>(
    solution: &Solution,
    problem: &Problem,
    index: &CompatibilityIndex,
    path: P,
) -> Result<()> {
    let path = path.as_ref();
    let mut file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write!(file, "{}", SolutionReport::new(solution, problem, index))?;
    Ok(())
}

/// Save the report as JSON.
pub fn save_solution_json<P: AsRef<Path>>(
    solution: &Solution,
    problem: &Problem,
    index: &CompatibilityIndex,
    path: P,
) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &SolutionReport::new(solution, problem, index))?;
    writer.flush()?;
    Ok(())
}

/// Statistics about the search process.
#[derive(Debug, Clone, Serialize)]
pub struct SearchStatistics {
    pub rounds: u32,
    pub feasible_rounds: u32,
    pub runtime: Duration,
    pub best_cost: Option<f64>,
    pub open_locations: usize,
    pub workers: usize,
    pub fitness: String,
}

impl SearchStatistics {
    /// Format the statistics as a string.
    pub fn format(&self) -> String {
        let best_cost = self
            .best_cost
            .map_or_else(|| "none".to_string(), |c| format!("{:.2}", c));

        format!(
            "Search Statistics:
- Rounds: {}
- Feasible Rounds: {}
- Runtime: {}
- Best Solution Cost: {}
- Open Locations: {}
- Workers: {}
- Fitness: {}",
            self.rounds,
            self.feasible_rounds,
            format_duration(self.runtime),
            best_cost,
            self.open_locations,
            self.workers,
            self.fitness
        )
    }
}

/// Print solution visualization to console.
pub fn print_solution_visualization(solution: &Solution, problem: &Problem) {
    println!("Solution Visualization for {}", problem.name);
    println!("Total Cost: {:.2}", solution.opening_cost(problem));
    println!("Open Locations: {}", solution.open_locations().count());
    println!();

    let points = problem
        .cities
        .iter()
        .map(|c| c.position)
        .chain(problem.locations.iter().map(|l| l.position));

    let (mut min_x, mut min_y, mut max_x, mut max_y) = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    if min_x > max_x {
        println!("(empty instance)");
        return;
    }

    let width = 80;
    let height = 25;
    let span_x = (max_x - min_x).max(1e-9);
    let span_y = (max_y - min_y).max(1e-9);
    let cell = |x: f64, y: f64| {
        let col = ((x - min_x) / span_x * (width as f64 - 1.0)) as usize;
        let row = ((y - min_y) / span_y * (height as f64 - 1.0)) as usize;
        (row.min(height - 1), col.min(width - 1))
    };

    let mut grid = vec![vec![' '; width]; height];

    for (c, city) in problem.cities.iter().enumerate() {
        let (row, col) = cell(city.position.x, city.position.y);
        grid[row][col] = if solution.assignment(c).is_complete() { '.' } else { '!' };
    }

    // Locations drawn last so they stay visible
    for (l, location) in problem.locations.iter().enumerate() {
        let (row, col) = cell(location.position.x, location.position.y);
        grid[row][col] = if solution.is_open(l) { 'F' } else { 'o' };
    }

    for row in grid.iter().rev() {
        println!("{}", row.iter().collect::<String>());
    }
    println!();

    println!("Legend:");
    println!("F - Open location");
    println!("o - Closed location");
    println!(". - Covered city");
    println!("! - City missing a role");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_are_formatted_as_hms() {
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h 02m 05s");
        assert_eq!(format_duration(Duration::from_secs(0)), "0h 00m 00s");
    }
}
