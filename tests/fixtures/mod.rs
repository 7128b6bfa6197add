//! Test fixtures for itinerary-planner.
//!
//! Provides:
//! - Real Bangkok hotels and attractions (from OpenStreetMap)
//! - A Manhattan travel matrix with predictable distances
//! - Place builders

#![allow(dead_code)]

pub mod bangkok_locations;

use std::collections::HashSet;

use itinerary_planner::matrix::{MatrixError, TravelMatrices};
use itinerary_planner::milp::{MilpModel, SolveLimits, SolverError, SolverOutcome};
use itinerary_planner::place::PlaceInput;
use itinerary_planner::traits::{MilpSolver, TravelMatrixProvider};

pub use bangkok_locations::*;

/// Manhattan distance over raw coordinates: 1 coordinate unit = 1 km,
/// travelled at `speed_kmh`.
pub struct ManhattanMatrix {
    pub speed_kmh: f64,
    /// Directed `(from, to)` index pairs reported as unreachable.
    pub blocked: HashSet<(usize, usize)>,
}

impl ManhattanMatrix {
    pub fn new() -> Self {
        Self {
            speed_kmh: 10.0,
            blocked: HashSet::new(),
        }
    }

    pub fn block(mut self, from: usize, to: usize) -> Self {
        self.blocked.insert((from, to));
        self
    }
}

impl TravelMatrixProvider for ManhattanMatrix {
    fn matrices_for(&self, locations: &[(f64, f64)]) -> Result<TravelMatrices, MatrixError> {
        let mut matrices = TravelMatrices::zeros(locations.len());
        for (i, from) in locations.iter().enumerate() {
            for (j, to) in locations.iter().enumerate() {
                if i == j {
                    continue;
                }
                let km = (from.0 - to.0).abs() + (from.1 - to.1).abs();
                let (km, hours) = if self.blocked.contains(&(i, j)) {
                    (f64::INFINITY, f64::INFINITY)
                } else {
                    (km, km / self.speed_kmh)
                };
                matrices.distance_km[i][j] = km;
                matrices.time_hours[i][j] = hours;
            }
        }
        Ok(matrices)
    }
}

/// Fails the test if the pipeline reaches the matrix provider.
pub struct UnreachableMatrix;

impl TravelMatrixProvider for UnreachableMatrix {
    fn matrices_for(&self, _locations: &[(f64, f64)]) -> Result<TravelMatrices, MatrixError> {
        panic!("matrix provider must not be called");
    }
}

/// Fails the test if the pipeline reaches the solver.
pub struct UnreachableSolver;

impl MilpSolver for UnreachableSolver {
    fn solve(&self, _model: &MilpModel, _limits: &SolveLimits) -> Result<SolverOutcome, SolverError> {
        panic!("solver must not be called");
    }
}

pub fn hotel(name: &str, lat: f64, lon: f64) -> PlaceInput {
    PlaceInput::new(name, lat, lon)
}

pub fn attraction(name: &str, lat: f64, lon: f64, hours: f64) -> PlaceInput {
    PlaceInput::new(name, lat, lon).with_duration(hours)
}

pub fn to_input(location: &Location) -> PlaceInput {
    PlaceInput::new(location.name, location.lat, location.lon).with_duration(location.visit_hours)
}
