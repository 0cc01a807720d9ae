//! Problem definition and data structures for facility coverage instances.

use anyhow::{anyhow, bail, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Hundredths of a demand unit per demand unit.
pub const LOAD_SCALE: u64 = 100;

/// Ratio between the secondary and the primary service distance of a type.
pub const SECONDARY_RADIUS_FACTOR: f64 = 3.0;

/// A position in the plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Calculate the Euclidean distance between two points.
    pub fn distance(&self, other: &Point) -> f64 {
        self.squared_distance(other).sqrt()
    }

    pub fn squared_distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// The two coverage relations a city needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Full-weight coverage.
    Primary,
    /// Backup coverage at a tenth of the weight, allowed three times further away.
    Secondary,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Primary, Role::Secondary];

    pub fn index(self) -> usize {
        match self {
            Role::Primary => 0,
            Role::Secondary => 1,
        }
    }

    /// Multiplier applied to a facility type's service radius for this role.
    pub fn radius_factor(self) -> f64 {
        match self {
            Role::Primary => 1.0,
            Role::Secondary => SECONDARY_RADIUS_FACTOR,
        }
    }
}

/// A demand point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct City {
    pub id: usize,
    pub demand: f64,
    pub position: Point,
}

impl City {
    /// Create a new city.
    pub fn new(id: usize, x: f64, y: f64, demand: f64) -> Self {
        City {
            id,
            demand,
            position: Point::new(x, y),
        }
    }

    /// Demand quantized to tenths of a unit.
    pub fn demand_tenths(&self) -> u64 {
        (self.demand * 10.0).round().max(0.0) as u64
    }

    /// Load this city puts on a location when served in `role`, in hundredths.
    pub fn load(&self, role: Role) -> u64 {
        match role {
            Role::Primary => 10 * self.demand_tenths(),
            Role::Secondary => self.demand_tenths(),
        }
    }
}

/// A candidate site where a facility can be opened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: usize,
    pub position: Point,
}

impl Location {
    pub fn new(id: usize, x: f64, y: f64) -> Self {
        Location {
            id,
            position: Point::new(x, y),
        }
    }
}

/// An entry of the facility catalogue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityType {
    pub id: usize,
    pub service_radius: f64,
    pub capacity: f64,
    pub cost: f64,
}

impl FacilityType {
    pub fn new(id: usize, service_radius: f64, capacity: f64, cost: f64) -> Self {
        FacilityType {
            id,
            service_radius,
            capacity,
            cost,
        }
    }

    /// Capacity in hundredths of a demand unit.
    pub fn capacity_units(&self) -> u64 {
        (self.capacity * LOAD_SCALE as f64).round().max(0.0) as u64
    }

    /// Maximum service distance for `role`.
    pub fn reach(&self, role: Role) -> f64 {
        self.service_radius * role.radius_factor()
    }
}

/// Represents a facility coverage problem instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    pub name: String,
    pub cities: Vec<City>,
    pub locations: Vec<Location>,
    pub facility_types: Vec<FacilityType>,
    pub min_separation: f64,
}

impl Problem {
    /// Create a new problem.
    pub fn new(
        name: String,
        cities: Vec<City>,
        locations: Vec<Location>,
        facility_types: Vec<FacilityType>,
        min_separation: f64,
    ) -> Self {
        Problem {
            name,
            cities,
            locations,
            facility_types,
            min_separation,
        }
    }

    pub fn num_cities(&self) -> usize {
        self.cities.len()
    }

    pub fn num_locations(&self) -> usize {
        self.locations.len()
    }

    pub fn num_types(&self) -> usize {
        self.facility_types.len()
    }

    /// Distance between a city and a candidate location.
    pub fn city_location_distance(&self, city: usize, location: usize) -> f64 {
        self.cities[city]
            .position
            .distance(&self.locations[location].position)
    }

    /// Distance between two candidate locations.
    pub fn location_distance(&self, l1: usize, l2: usize) -> f64 {
        self.locations[l1]
            .position
            .distance(&self.locations[l2].position)
    }

    /// Sum of all city demands.
    pub fn total_demand(&self) -> f64 {
        self.cities.iter().map(|c| c.demand).sum()
    }

    /// Load a problem from a `.dat` file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read instance {}", path.display()))?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "instance".to_string());

        Self::parse(&name, &text).with_context(|| format!("invalid instance {}", path.display()))
    }

    /// Parse the `key = value;` instance format.
    ///
    /// Values are scalars or bracketed lists, possibly nested (`[[x y] ...]`).
    /// Nested lists are flattened, so positions arrive as `x0 y0 x1 y1 ...`.
    pub fn parse(name: &str, text: &str) -> Result<Self> {
        let mut fields = DatFields::default();
        let tokens = tokenize(text);
        let mut pos = 0;

        while pos < tokens.len() {
            let key = match &tokens[pos] {
                Token::Word(word) => word.clone(),
                other => bail!("expected a key, found {:?}", other),
            };
            pos += 1;

            if tokens.get(pos) != Some(&Token::Equals) {
                bail!("expected '=' after '{}'", key);
            }
            pos += 1;

            let values = read_value(&tokens, &mut pos).with_context(|| format!("in '{}'", key))?;

            if tokens.get(pos) == Some(&Token::Semicolon) {
                pos += 1;
            }

            match key.as_str() {
                "nLocations" => fields.n_locations = Some(single_count(&key, &values)?),
                "nCities" => fields.n_cities = Some(single_count(&key, &values)?),
                "nTypes" => fields.n_types = Some(single_count(&key, &values)?),
                "p" => fields.demands = values,
                "posCities" => fields.city_positions = values,
                "posLocations" => fields.location_positions = values,
                "d_city" => fields.radii = values,
                "cap" => fields.capacities = values,
                "cost" => fields.costs = values,
                "d_center" => {
                    fields.min_separation = Some(
                        *values
                            .first()
                            .ok_or_else(|| anyhow!("'d_center' has no value"))?,
                    )
                }
                _ => warn!("ignoring unknown instance key '{}'", key),
            }
        }

        fields.build(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Number(f64),
    Equals,
    Semicolon,
    Open,
    Close,
}

fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();

    for line in text.lines() {
        let line = match line.find("//") {
            Some(idx) => &line[..idx],
            None => line,
        };

        let spaced = line
            .replace('=', " = ")
            .replace(';', " ; ")
            .replace('[', " [ ")
            .replace(']', " ] ")
            .replace(',', " ");

        for raw in spaced.split_whitespace() {
            let token = match raw {
                "=" => Token::Equals,
                ";" => Token::Semicolon,
                "[" => Token::Open,
                "]" => Token::Close,
                _ => match raw.parse::<f64>() {
                    Ok(value) => Token::Number(value),
                    Err(_) => Token::Word(raw.to_string()),
                },
            };
            tokens.push(token);
        }
    }

    tokens
}

fn read_value(tokens: &[Token], pos: &mut usize) -> Result<Vec<f64>> {
    match tokens.get(*pos) {
        Some(Token::Number(value)) => {
            *pos += 1;
            Ok(vec![*value])
        }
        Some(Token::Open) => {
            let mut values = Vec::new();
            let mut depth = 0usize;
            loop {
                match tokens.get(*pos) {
                    Some(Token::Open) => depth += 1,
                    Some(Token::Close) => {
                        depth -= 1;
                        if depth == 0 {
                            *pos += 1;
                            return Ok(values);
                        }
                    }
                    Some(Token::Number(value)) => values.push(*value),
                    Some(other) => bail!("unexpected {:?} inside list", other),
                    None => bail!("unterminated list"),
                }
                *pos += 1;
            }
        }
        Some(other) => bail!("expected a number or list, found {:?}", other),
        None => bail!("missing value"),
    }
}

fn single_count(key: &str, values: &[f64]) -> Result<usize> {
    match values {
        [value] if *value >= 0.0 && value.fract() == 0.0 => Ok(*value as usize),
        _ => bail!("'{}' must be a single non-negative integer", key),
    }
}

/// Raw fields collected while parsing, validated together at the end.
#[derive(Default)]
struct DatFields {
    n_locations: Option<usize>,
    n_cities: Option<usize>,
    n_types: Option<usize>,
    demands: Vec<f64>,
    city_positions: Vec<f64>,
    location_positions: Vec<f64>,
    radii: Vec<f64>,
    capacities: Vec<f64>,
    costs: Vec<f64>,
    min_separation: Option<f64>,
}

impl DatFields {
    fn build(self, name: &str) -> Result<Problem> {
        let n_cities = self.n_cities.unwrap_or(self.demands.len());
        let n_locations = self
            .n_locations
            .unwrap_or(self.location_positions.len() / 2);
        let n_types = self.n_types.unwrap_or(self.capacities.len());

        expect_len("p", &self.demands, n_cities)?;
        expect_len("posCities", &self.city_positions, 2 * n_cities)?;
        expect_len("posLocations", &self.location_positions, 2 * n_locations)?;
        expect_len("d_city", &self.radii, n_types)?;
        expect_len("cap", &self.capacities, n_types)?;
        expect_len("cost", &self.costs, n_types)?;

        let min_separation = self
            .min_separation
            .ok_or_else(|| anyhow!("missing 'd_center'"))?;

        let cities = (0..n_cities)
            .map(|i| {
                City::new(
                    i,
                    self.city_positions[2 * i],
                    self.city_positions[2 * i + 1],
                    self.demands[i],
                )
            })
            .collect();

        let locations = (0..n_locations)
            .map(|i| {
                Location::new(
                    i,
                    self.location_positions[2 * i],
                    self.location_positions[2 * i + 1],
                )
            })
            .collect();

        let facility_types = (0..n_types)
            .map(|t| FacilityType::new(t, self.radii[t], self.capacities[t], self.costs[t]))
            .collect();

        Ok(Problem::new(
            name.to_string(),
            cities,
            locations,
            facility_types,
            min_separation,
        ))
    }
}

fn expect_len(key: &str, values: &[f64], expected: usize) -> Result<()> {
    if values.len() != expected {
        bail!(
            "'{}' has {} values, expected {}",
            key,
            values.len(),
            expected
        );
    }
    Ok(())
}
