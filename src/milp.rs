//! Solver-agnostic mixed-integer linear model.
//!
//! The itinerary formulation is written against these types only; a
//! [`MilpSolver`](crate::traits::MilpSolver) translates them into a concrete
//! engine.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Handle to a declared variable, dense over `[0, model.num_vars())`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Binary,
    Integer,
    Continuous,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: String,
    pub kind: VarKind,
    pub lower: f64,
    pub upper: f64,
}

/// `constant + sum(coef * var)`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinExpr {
    terms: Vec<(VarId, f64)>,
    constant: f64,
}

impl LinExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(value: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    pub fn sum<I>(terms: I) -> Self
    where
        I: IntoIterator<Item = (VarId, f64)>,
    {
        Self {
            terms: terms.into_iter().collect(),
            constant: 0.0,
        }
    }

    pub fn add_term(&mut self, var: VarId, coef: f64) -> &mut Self {
        self.terms.push((var, coef));
        self
    }

    pub fn add_constant(&mut self, value: f64) -> &mut Self {
        self.constant += value;
        self
    }

    /// Appends `scale * other`.
    pub fn add_scaled(&mut self, other: &LinExpr, scale: f64) -> &mut Self {
        self.terms
            .extend(other.terms.iter().map(|(var, coef)| (*var, coef * scale)));
        self.constant += other.constant * scale;
        self
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    pub fn constant_term(&self) -> f64 {
        self.constant
    }

    /// Terms with repeated variables summed, zero coefficients dropped,
    /// ordered by variable.
    pub fn collapsed(&self) -> Vec<(VarId, f64)> {
        let mut merged: BTreeMap<VarId, f64> = BTreeMap::new();
        for (var, coef) in &self.terms {
            *merged.entry(*var).or_insert(0.0) += coef;
        }
        merged.into_iter().filter(|(_, coef)| *coef != 0.0).collect()
    }

    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coef)| coef * values[var.index()])
            .sum::<f64>()
            + self.constant
    }
}

impl From<VarId> for LinExpr {
    fn from(var: VarId) -> Self {
        Self::sum([(var, 1.0)])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Le,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinConstraint {
    pub name: String,
    pub expr: LinExpr,
    pub cmp: Comparison,
    pub rhs: f64,
}

impl LinConstraint {
    /// Whether `values` satisfy the constraint within `tolerance`.
    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let lhs = self.expr.evaluate(values);
        match self.cmp {
            Comparison::Eq => (lhs - self.rhs).abs() <= tolerance,
            Comparison::Le => lhs <= self.rhs + tolerance,
            Comparison::Ge => lhs + tolerance >= self.rhs,
        }
    }
}

/// A minimisation model.
#[derive(Debug, Clone, Default)]
pub struct MilpModel {
    name: String,
    vars: Vec<VarDecl>,
    constraints: Vec<LinConstraint>,
    objective: LinExpr,
}

impl MilpModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn add_var(&mut self, name: String, kind: VarKind, lower: f64, upper: f64) -> VarId {
        let id = VarId(self.vars.len());
        self.vars.push(VarDecl {
            name,
            kind,
            lower,
            upper,
        });
        id
    }

    pub fn add_binary(&mut self, name: impl Into<String>) -> VarId {
        self.add_var(name.into(), VarKind::Binary, 0.0, 1.0)
    }

    pub fn add_integer(&mut self, name: impl Into<String>, lower: f64, upper: f64) -> VarId {
        self.add_var(name.into(), VarKind::Integer, lower, upper)
    }

    pub fn add_continuous(&mut self, name: impl Into<String>, lower: f64, upper: f64) -> VarId {
        self.add_var(name.into(), VarKind::Continuous, lower, upper)
    }

    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        expr: LinExpr,
        cmp: Comparison,
        rhs: f64,
    ) {
        self.constraints.push(LinConstraint {
            name: name.into(),
            expr,
            cmp,
            rhs,
        });
    }

    pub fn set_objective(&mut self, objective: LinExpr) {
        self.objective = objective;
    }

    pub fn vars(&self) -> &[VarDecl] {
        &self.vars
    }

    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    pub fn constraints(&self) -> &[LinConstraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &LinExpr {
        &self.objective
    }

    /// Whether `values` respects every bound, integrality and constraint
    /// within `tolerance`.
    pub fn is_feasible(&self, values: &[f64], tolerance: f64) -> bool {
        if values.len() != self.vars.len() {
            return false;
        }
        let within_bounds = self.vars.iter().zip(values).all(|(decl, value)| {
            let integral = decl.kind == VarKind::Continuous || (value - value.round()).abs() <= tolerance;
            integral && *value >= decl.lower - tolerance && *value <= decl.upper + tolerance
        });
        within_bounds
            && self
                .constraints
                .iter()
                .all(|constraint| constraint.is_satisfied(values, tolerance))
    }

    /// Rejects references to undeclared variables, non-finite coefficients
    /// and inverted bounds.
    pub fn validate(&self) -> Result<(), SolverError> {
        for decl in &self.vars {
            if decl.lower.is_nan() || decl.upper.is_nan() || decl.lower > decl.upper {
                return Err(SolverError::MalformedModel(format!(
                    "variable {} has bounds [{}, {}]",
                    decl.name, decl.lower, decl.upper
                )));
            }
        }

        let check = |owner: &str, expr: &LinExpr| -> Result<(), SolverError> {
            if !expr.constant.is_finite() {
                return Err(SolverError::MalformedModel(format!(
                    "{} has a non-finite constant",
                    owner
                )));
            }
            for (var, coef) in &expr.terms {
                if var.index() >= self.vars.len() {
                    return Err(SolverError::MalformedModel(format!(
                        "{} references undeclared variable #{}",
                        owner,
                        var.index()
                    )));
                }
                if !coef.is_finite() {
                    return Err(SolverError::MalformedModel(format!(
                        "{} has a non-finite coefficient on {}",
                        owner,
                        self.vars[var.index()].name
                    )));
                }
            }
            Ok(())
        };

        check("objective", &self.objective)?;
        for constraint in &self.constraints {
            check(&constraint.name, &constraint.expr)?;
            if !constraint.rhs.is_finite() {
                return Err(SolverError::MalformedModel(format!(
                    "{} has a non-finite right-hand side",
                    constraint.name
                )));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SolveStatus {
    Optimal,
    /// Best solution found within the limits, optimality not proven.
    Feasible,
    Infeasible,
    NoSolutionFound,
}

impl SolveStatus {
    pub fn has_solution(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SolveLimits {
    /// Wall-clock budget for one solve.
    pub time_limit: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct SolverOutcome {
    pub status: SolveStatus,
    /// One value per declared variable; empty without a solution.
    pub values: Vec<f64>,
    pub objective_value: Option<f64>,
}

impl SolverOutcome {
    pub fn solved(status: SolveStatus, values: Vec<f64>, objective: &LinExpr) -> Self {
        let objective_value = Some(objective.evaluate(&values));
        Self {
            status,
            values,
            objective_value,
        }
    }

    pub fn unsolved(status: SolveStatus) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective_value: None,
        }
    }

    pub fn value(&self, var: VarId) -> f64 {
        self.values.get(var.index()).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SolverError {
    /// The model itself is inconsistent; a construction defect.
    MalformedModel(String),
    Backend(String),
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverError::MalformedModel(msg) => write!(f, "malformed model: {}", msg),
            SolverError::Backend(msg) => write!(f, "solver backend failed: {}", msg),
        }
    }
}

impl std::error::Error for SolverError {}
