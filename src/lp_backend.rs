//! HiGHS adapter for [`MilpSolver`].
//!
//! The time limit is enforced inside HiGHS, so a stopped solve returns on
//! the calling thread with whatever incumbent the branch-and-bound holds.

use highs::{Col, HighsModelStatus, RowProblem, Sense};
use tracing::{debug, warn};

use crate::milp::{Comparison, MilpModel, SolveLimits, SolveStatus, SolverError, SolverOutcome, VarKind};
use crate::traits::MilpSolver;

/// Absolute tolerance when checking an incumbent left by a stopped solve.
const FEASIBILITY_TOLERANCE: f64 = 1e-6;

/// Solves [`MilpModel`]s with the bundled HiGHS engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct HighsSolver;

impl HighsSolver {
    pub fn new() -> Self {
        Self
    }
}

impl MilpSolver for HighsSolver {
    fn solve(&self, model: &MilpModel, limits: &SolveLimits) -> Result<SolverOutcome, SolverError> {
        model.validate()?;
        debug!(
            model = model.name(),
            vars = model.num_vars(),
            constraints = model.constraints().len(),
            time_limit = ?limits.time_limit,
            "solving MILP"
        );

        let problem = to_problem(model);
        let mut highs = problem
            .try_optimise(Sense::Minimise)
            .map_err(|status| SolverError::Backend(format!("HiGHS rejected the model: {:?}", status)))?;
        highs.make_quiet();
        if let Some(limit) = limits.time_limit {
            highs.set_option("time_limit", limit.as_secs_f64());
        }

        let solved = highs
            .try_solve()
            .map_err(|status| SolverError::Backend(format!("HiGHS failed to run: {:?}", status)))?;
        let status = solved.status();
        let values = solved.get_solution().columns().to_vec();

        classify(status, values, model)
    }
}

fn to_problem(model: &MilpModel) -> RowProblem {
    let mut costs = vec![0.0; model.num_vars()];
    for (var, coef) in model.objective().collapsed() {
        costs[var.index()] = coef;
    }

    let mut problem = RowProblem::default();
    let columns: Vec<Col> = model
        .vars()
        .iter()
        .zip(costs)
        .map(|(decl, cost)| {
            let integer = decl.kind != VarKind::Continuous;
            problem.add_column_with_integrality(cost, decl.lower..=decl.upper, integer)
        })
        .collect();

    for constraint in model.constraints() {
        let factors: Vec<(Col, f64)> = constraint
            .expr
            .collapsed()
            .into_iter()
            .map(|(var, coef)| (columns[var.index()], coef))
            .collect();
        let rhs = constraint.rhs - constraint.expr.constant_term();
        match constraint.cmp {
            Comparison::Eq => {
                problem.add_row(rhs..=rhs, &factors);
            }
            Comparison::Le => {
                problem.add_row(..=rhs, &factors);
            }
            Comparison::Ge => {
                problem.add_row(rhs.., &factors);
            }
        }
    }

    problem
}

/// Maps a HiGHS model status onto [`SolveStatus`].
///
/// A solve stopped by a limit keeps its column values only when they form
/// a feasible assignment; that incumbent is reported as
/// [`SolveStatus::Feasible`].
fn classify(status: HighsModelStatus, values: Vec<f64>, model: &MilpModel) -> Result<SolverOutcome, SolverError> {
    match status {
        HighsModelStatus::Optimal => Ok(SolverOutcome::solved(SolveStatus::Optimal, values, model.objective())),
        HighsModelStatus::Infeasible | HighsModelStatus::UnboundedOrInfeasible => {
            Ok(SolverOutcome::unsolved(SolveStatus::Infeasible))
        }
        HighsModelStatus::Unbounded => Ok(SolverOutcome::unsolved(SolveStatus::NoSolutionFound)),
        HighsModelStatus::LoadError
        | HighsModelStatus::ModelError
        | HighsModelStatus::PresolveError
        | HighsModelStatus::SolveError
        | HighsModelStatus::PostsolveError => Err(SolverError::Backend(format!("HiGHS stopped with {:?}", status))),
        stopped => {
            if model.is_feasible(&values, FEASIBILITY_TOLERANCE) {
                warn!(model = model.name(), status = ?stopped, "solver stopped early, returning best incumbent");
                Ok(SolverOutcome::solved(SolveStatus::Feasible, values, model.objective()))
            } else {
                warn!(model = model.name(), status = ?stopped, "solver stopped early without an incumbent");
                Ok(SolverOutcome::unsolved(SolveStatus::NoSolutionFound))
            }
        }
    }
}
