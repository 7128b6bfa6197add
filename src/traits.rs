//! Capability traits consumed by the itinerary planner.
//!
//! The planner core depends only on these seams; concrete travel-matrix
//! sources and MILP engines live behind them.

use crate::matrix::{MatrixError, TravelMatrices};
use crate::milp::{MilpModel, SolveLimits, SolverError, SolverOutcome};

/// Provides distance/time matrices for a set of locations.
///
/// Locations are `(lat, lon)` pairs. The returned matrices are indexed by the
/// provided location order. Unreachable pairs are reported as `f64::INFINITY`
/// rather than failing the whole call.
pub trait TravelMatrixProvider {
    fn matrices_for(&self, locations: &[(f64, f64)]) -> Result<TravelMatrices, MatrixError>;
}

/// A generic mixed-integer linear solver.
///
/// Implementations minimise the model objective and report a status plus one
/// value per declared variable (when a solution exists).
pub trait MilpSolver {
    fn solve(&self, model: &MilpModel, limits: &SolveLimits) -> Result<SolverOutcome, SolverError>;
}

impl<T: TravelMatrixProvider + ?Sized> TravelMatrixProvider for &T {
    fn matrices_for(&self, locations: &[(f64, f64)]) -> Result<TravelMatrices, MatrixError> {
        (**self).matrices_for(locations)
    }
}
