//! Itinerary planner entry point.
//!
//! Pipeline per call: normalize places, fetch travel matrices once, then for
//! each strategy build the model, solve it and extract the itinerary.

use std::fmt;
use std::time::Duration;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::itinerary::{assemble, Itinerary};
use crate::matrix::{MatrixError, TravelMatrices};
use crate::milp::{SolveLimits, SolveStatus, SolverError};
use crate::model::{ItineraryModel, ModelInput, ObjectiveWeights};
use crate::place::{PlaceInput, PlaceTable};
use crate::reconstruct::{reconstruct, unvisited};
use crate::traits::{MilpSolver, TravelMatrixProvider};

const DEFAULT_STRATEGY_TITLE: &str = "Optimized Plan";

#[derive(Debug, Clone)]
pub struct SolveOptions {
    /// Wall-clock budget for each strategy's solve.
    pub time_limit: Option<Duration>,
    /// Solve strategies concurrently on the rayon pool.
    pub parallel_strategies: bool,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            time_limit: None,
            parallel_strategies: true,
        }
    }
}

/// A titled weight preset; each strategy yields one itinerary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub title: String,
    #[serde(default)]
    pub weights: ObjectiveWeights,
}

impl Strategy {
    pub fn new(title: impl Into<String>, weights: ObjectiveWeights) -> Self {
        Self {
            title: title.into(),
            weights,
        }
    }

    /// The caller's own weights plus the shortest-route and most-balanced extremes.
    pub fn presets(weights: ObjectiveWeights) -> Vec<Self> {
        vec![
            Self::new(DEFAULT_STRATEGY_TITLE, weights),
            Self::new("Shortest Route", ObjectiveWeights::new(1.0, 0.0)),
            Self::new("Most Balanced Plan", ObjectiveWeights::new(0.1, 1.0)),
        ]
    }
}

/// Immutable input snapshot for one optimization call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    #[serde(default)]
    pub hotels: Vec<PlaceInput>,
    #[serde(default)]
    pub attractions: Vec<PlaceInput>,
    pub trip_duration_days: usize,
    pub max_daily_hours: f64,
    #[serde(default)]
    pub is_daily_limit_flexible: bool,
    #[serde(default)]
    pub objective_weights: ObjectiveWeights,
    /// Empty means a single strategy using `objective_weights`.
    #[serde(default)]
    pub strategies: Vec<Strategy>,
}

impl PlanRequest {
    pub fn new(
        hotels: Vec<PlaceInput>,
        attractions: Vec<PlaceInput>,
        trip_duration_days: usize,
        max_daily_hours: f64,
        is_daily_limit_flexible: bool,
    ) -> Self {
        Self {
            hotels,
            attractions,
            trip_duration_days,
            max_daily_hours,
            is_daily_limit_flexible,
            objective_weights: ObjectiveWeights::default(),
            strategies: Vec::new(),
        }
    }

    pub fn with_weights(mut self, weights: ObjectiveWeights) -> Self {
        self.objective_weights = weights;
        self
    }

    pub fn with_strategies(mut self, strategies: Vec<Strategy>) -> Self {
        self.strategies = strategies;
        self
    }

    fn effective_strategies(&self) -> Vec<Strategy> {
        if self.strategies.is_empty() {
            vec![Strategy::new(DEFAULT_STRATEGY_TITLE, self.objective_weights)]
        } else {
            self.strategies.clone()
        }
    }
}

#[derive(Debug)]
pub enum PlanError {
    Matrix(MatrixError),
    Solver(SolverError),
    /// No assignment satisfies the constraints; relax the budget, switch to
    /// flexible mode, or drop places.
    Infeasible { strategy: String },
    /// The solver stopped (e.g. on its time limit) without any solution.
    NoSolutionFound { strategy: String },
}

impl From<MatrixError> for PlanError {
    fn from(err: MatrixError) -> Self {
        PlanError::Matrix(err)
    }
}

impl From<SolverError> for PlanError {
    fn from(err: SolverError) -> Self {
        PlanError::Solver(err)
    }
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanError::Matrix(err) => write!(f, "travel matrix unavailable: {}", err),
            PlanError::Solver(err) => write!(f, "{}", err),
            PlanError::Infeasible { strategy } => {
                write!(f, "no feasible itinerary for strategy '{}'", strategy)
            }
            PlanError::NoSolutionFound { strategy } => {
                write!(f, "solver found no itinerary for strategy '{}'", strategy)
            }
        }
    }
}

impl std::error::Error for PlanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlanError::Matrix(err) => Some(err),
            PlanError::Solver(err) => Some(err),
            _ => None,
        }
    }
}

/// Plans one itinerary per strategy.
///
/// Returns an empty list, without touching the matrix provider or the solver,
/// when there is no named attraction or the trip has no days. Itineraries
/// come back in strategy order.
pub fn solve<M, S>(
    request: &PlanRequest,
    matrix_provider: &M,
    milp_solver: &S,
    options: &SolveOptions,
) -> Result<Vec<Itinerary>, PlanError>
where
    M: TravelMatrixProvider + ?Sized,
    S: MilpSolver + Sync + ?Sized,
{
    info!(
        hotels = request.hotels.len(),
        attractions = request.attractions.len(),
        days = request.trip_duration_days,
        max_daily_hours = request.max_daily_hours,
        flexible = request.is_daily_limit_flexible,
        "planning itinerary"
    );

    if request.trip_duration_days == 0 {
        warn!("trip has no days, nothing to plan");
        return Ok(Vec::new());
    }

    let Some(places) = PlaceTable::normalize(&request.hotels, &request.attractions) else {
        warn!("no named attraction supplied, nothing to plan");
        return Ok(Vec::new());
    };

    let matrices = matrix_provider
        .matrices_for(&places.locations())?
        .validated(places.len())?;

    let strategies = request.effective_strategies();
    let limits = SolveLimits {
        time_limit: options.time_limit,
    };

    let run = |strategy: &Strategy| {
        solve_strategy(request, &places, &matrices, strategy, milp_solver, &limits)
    };
    let results: Vec<Result<Itinerary, PlanError>> =
        if options.parallel_strategies && strategies.len() > 1 {
            strategies.par_iter().map(run).collect()
        } else {
            strategies.iter().map(run).collect()
        };

    results.into_iter().collect()
}

fn solve_strategy<S>(
    request: &PlanRequest,
    places: &PlaceTable,
    matrices: &TravelMatrices,
    strategy: &Strategy,
    milp_solver: &S,
    limits: &SolveLimits,
) -> Result<Itinerary, PlanError>
where
    S: MilpSolver + ?Sized,
{
    let built = ItineraryModel::build(&ModelInput {
        places,
        matrices,
        days: request.trip_duration_days,
        max_daily_hours: request.max_daily_hours,
        flexible: request.is_daily_limit_flexible,
        weights: strategy.weights,
    });

    let outcome = milp_solver.solve(&built.model, limits)?;
    match outcome.status {
        SolveStatus::Optimal | SolveStatus::Feasible => {}
        SolveStatus::Infeasible => {
            warn!(strategy = %strategy.title, "itinerary model is infeasible");
            return Err(PlanError::Infeasible {
                strategy: strategy.title.clone(),
            });
        }
        SolveStatus::NoSolutionFound => {
            warn!(strategy = %strategy.title, "solver returned no solution");
            return Err(PlanError::NoSolutionFound {
                strategy: strategy.title.clone(),
            });
        }
    }

    let routes = reconstruct(&built.vars, places, matrices, &outcome.values);
    for route in &routes {
        debug!(
            strategy = %strategy.title,
            day = route.day,
            stops = route.arcs.len(),
            travel_time = route.metrics.travel_time,
            visit_time = route.metrics.visit_time,
            distance = route.metrics.distance,
            "reconstructed day route"
        );
    }

    let dropped = unvisited(&built.vars, places, &outcome.values);
    let breakdown = built.objective.evaluate(&outcome.values);
    let itinerary = assemble(
        &strategy.title,
        outcome.status,
        &routes,
        &dropped,
        places,
        breakdown,
    );

    info!(
        strategy = %strategy.title,
        status = ?outcome.status,
        total_distance = itinerary.total_distance,
        unassigned = itinerary.unassigned.len(),
        "itinerary ready"
    );

    Ok(itinerary)
}
