//! Multi-day hotel-anchored routing formulation.
//!
//! Variables per day `k`:
//! - `x[i][j][k]` binary, arc `i -> j` used on day `k`
//! - `y[i][k]` binary, attraction `i` visited on day `k`
//! - `u[i][k]` integer order marker for subtour elimination
//! - `slack[k]` overflow above the daily budget (flexible mode only)
//! - `T[k]`, `T_avg`, `Z[k]` day total, mean day total, absolute deviation
//!
//! The objective blends min-max normalized components so no term dominates
//! purely through its magnitude.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::matrix::TravelMatrices;
use crate::milp::{Comparison, LinExpr, MilpModel, VarId};
use crate::place::PlaceTable;

const DEFAULT_WEIGHT: f64 = 0.5;

/// Spans at or below this are treated as degenerate when normalizing.
const MIN_SPAN: f64 = 1e-9;

/// Caller preference between short routes and evenly loaded days.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveWeights {
    #[serde(default = "default_weight")]
    pub distance_weight: f64,
    #[serde(default = "default_weight")]
    pub time_balance_weight: f64,
}

fn default_weight() -> f64 {
    DEFAULT_WEIGHT
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            distance_weight: DEFAULT_WEIGHT,
            time_balance_weight: DEFAULT_WEIGHT,
        }
    }
}

impl ObjectiveWeights {
    pub fn new(distance_weight: f64, time_balance_weight: f64) -> Self {
        Self {
            distance_weight,
            time_balance_weight,
        }
    }

    /// Both weights clamped to `[0, 1]`; non-finite weights fall back to the default.
    pub fn clamped(self) -> Self {
        let clamp = |w: f64| if w.is_finite() { w.clamp(0.0, 1.0) } else { DEFAULT_WEIGHT };
        Self {
            distance_weight: clamp(self.distance_weight),
            time_balance_weight: clamp(self.time_balance_weight),
        }
    }
}

/// Static bounds used for min-max normalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    fn span(&self) -> f64 {
        let span = self.max - self.min;
        if span > MIN_SPAN { span } else { 1.0 }
    }

    pub fn normalize(&self, value: f64) -> f64 {
        (value - self.min) / self.span()
    }
}

/// One raw cost component and its normalization bounds.
#[derive(Debug, Clone)]
pub struct ObjectiveComponent {
    pub raw: LinExpr,
    pub bounds: Bounds,
}

impl ObjectiveComponent {
    fn new(raw: LinExpr, bounds: Bounds) -> Self {
        Self { raw, bounds }
    }

    /// Appends `weight * normalized(raw)` to `objective`.
    fn add_weighted(&self, objective: &mut LinExpr, weight: f64) {
        let span = self.bounds.span();
        objective.add_scaled(&self.raw, weight / span);
        objective.add_constant(-weight * self.bounds.min / span);
    }

    /// Normalized value on `values`, clamped to `[0, 1]`.
    ///
    /// The static bounds are not tight: an empty strict-mode trip travels
    /// less than the lower distance bound, and multi-day trips can leave
    /// hotels more often than the upper bound assumes.
    pub fn normalized(&self, values: &[f64]) -> f64 {
        self.bounds.normalize(self.raw.evaluate(values)).clamp(0.0, 1.0)
    }
}

/// Components of the blended objective.
#[derive(Debug, Clone)]
pub struct ObjectiveTerms {
    pub weights: ObjectiveWeights,
    pub distance: ObjectiveComponent,
    pub balance: ObjectiveComponent,
    /// Flexible mode: time above the daily budget.
    pub overflow: Option<ObjectiveComponent>,
    /// Strict mode: attractions left out of the trip.
    pub omission: Option<ObjectiveComponent>,
}

/// Normalized objective components evaluated on one assignment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ObjectiveBreakdown {
    pub distance: f64,
    pub time_balance: f64,
    pub overflow: Option<f64>,
    pub omission: Option<f64>,
    /// `distance_weight * distance + time_balance_weight * time_balance + (overflow | omission)`
    /// over the reported components.
    pub total: f64,
}

impl ObjectiveTerms {
    pub fn evaluate(&self, values: &[f64]) -> ObjectiveBreakdown {
        let distance = self.distance.normalized(values);
        let time_balance = self.balance.normalized(values);
        let overflow = self.overflow.as_ref().map(|c| c.normalized(values));
        let omission = self.omission.as_ref().map(|c| c.normalized(values));

        let total = self.weights.distance_weight * distance
            + self.weights.time_balance_weight * time_balance
            + overflow.unwrap_or(0.0)
            + omission.unwrap_or(0.0);

        ObjectiveBreakdown {
            distance,
            time_balance,
            overflow,
            omission,
            total,
        }
    }
}

/// Inputs for one model build.
#[derive(Debug, Clone, Copy)]
pub struct ModelInput<'a> {
    pub places: &'a PlaceTable,
    pub matrices: &'a TravelMatrices,
    pub days: usize,
    pub max_daily_hours: f64,
    pub flexible: bool,
    pub weights: ObjectiveWeights,
}

/// Variable handles, indexed the same way as the place table.
#[derive(Debug, Clone)]
pub struct ModelVars {
    /// `x[i][j][k]`; `None` on the diagonal and for unreachable pairs.
    pub x: Vec<Vec<Vec<Option<VarId>>>>,
    /// `y[i][k]`; `None` for hotels.
    pub y: Vec<Vec<Option<VarId>>>,
    pub u: Vec<Vec<VarId>>,
    /// Empty in strict mode.
    pub slack: Vec<VarId>,
    pub day_total: Vec<VarId>,
    pub avg_total: VarId,
    pub deviation: Vec<VarId>,
}

impl ModelVars {
    pub fn arc(&self, from: usize, to: usize, day: usize) -> Option<VarId> {
        self.x[from][to][day]
    }

    pub fn visit(&self, place: usize, day: usize) -> Option<VarId> {
        self.y[place][day]
    }

    pub fn days(&self) -> usize {
        self.day_total.len()
    }

    fn arcs_into(&self, to: usize, from: Range<usize>, day: usize) -> impl Iterator<Item = VarId> + '_ {
        from.filter_map(move |i| self.x[i][to][day])
    }

    fn arcs_out_of(&self, from: usize, to: Range<usize>, day: usize) -> impl Iterator<Item = VarId> + '_ {
        to.filter_map(move |j| self.x[from][j][day])
    }
}

/// A built model together with the handles needed to read a solution back.
#[derive(Debug, Clone)]
pub struct ItineraryModel {
    pub model: MilpModel,
    pub vars: ModelVars,
    pub objective: ObjectiveTerms,
}

impl ItineraryModel {
    /// Builds the formulation. Infeasible inputs still yield a well-formed
    /// model; infeasibility is reported by the solver.
    pub fn build(input: &ModelInput<'_>) -> Self {
        let places = input.places;
        let matrices = input.matrices;
        let n = places.len();
        let days = input.days;
        let t_max = input.max_daily_hours.max(0.0);
        let hotels = places.hotels();
        let attractions = places.attractions();
        let all = 0..n;
        let weights = input.weights.clamped();

        let mut model = MilpModel::new(format!("itinerary_{}p_{}d", n, days));

        // ******************** VARIABLES ********************
        let mut unreachable = 0usize;
        let mut x = vec![vec![vec![None; days]; n]; n];
        for i in all.clone() {
            for j in all.clone() {
                if i == j {
                    continue;
                }
                if !matrices.is_reachable(i, j) {
                    unreachable += 1;
                    continue;
                }
                for (k, slot) in x[i][j].iter_mut().enumerate() {
                    *slot = Some(model.add_binary(format!("x_{i}_{j}_{k}")));
                }
            }
        }
        if unreachable > 0 {
            warn!(pairs = unreachable, "forbidding arcs without a finite travel distance/time");
        }

        let mut y = vec![vec![None; days]; n];
        for i in attractions.clone() {
            for (k, slot) in y[i].iter_mut().enumerate() {
                *slot = Some(model.add_binary(format!("y_{i}_{k}")));
            }
        }

        let order_max = n.saturating_sub(1) as f64;
        let u: Vec<Vec<VarId>> = all
            .clone()
            .map(|i| {
                (0..days)
                    .map(|k| model.add_integer(format!("u_{i}_{k}"), 0.0, order_max))
                    .collect()
            })
            .collect();

        let slack: Vec<VarId> = if input.flexible {
            (0..days)
                .map(|k| model.add_continuous(format!("slack_{k}"), 0.0, f64::INFINITY))
                .collect()
        } else {
            Vec::new()
        };
        let day_total: Vec<VarId> = (0..days)
            .map(|k| model.add_continuous(format!("T_{k}"), 0.0, f64::INFINITY))
            .collect();
        let avg_total = model.add_continuous("T_avg", 0.0, f64::INFINITY);
        let deviation: Vec<VarId> = (0..days)
            .map(|k| model.add_continuous(format!("Z_{k}"), 0.0, f64::INFINITY))
            .collect();

        let vars = ModelVars {
            x,
            y,
            u,
            slack,
            day_total,
            avg_total,
            deviation,
        };

        // ******************** CONSTRAINTS ********************
        let degree_cmp = if input.flexible {
            Comparison::Eq
        } else {
            Comparison::Le
        };

        // every attraction entered and left once over the trip (flexible) or at most once (strict)
        for i in attractions.clone() {
            let incoming = ones((0..days).flat_map(|k| vars.arcs_into(i, all.clone(), k)));
            model.add_constraint(format!("in_degree_{i}"), incoming, degree_cmp, 1.0);

            let outgoing = ones((0..days).flat_map(|k| vars.arcs_out_of(i, all.clone(), k)));
            model.add_constraint(format!("out_degree_{i}"), outgoing, degree_cmp, 1.0);
        }

        for k in 0..days {
            // one departure from and one return to a hotel per day; strict mode may idle a day
            let depart = ones(
                hotels
                    .clone()
                    .flat_map(|h| vars.arcs_out_of(h, attractions.clone(), k)),
            );
            model.add_constraint(format!("depart_{k}"), depart, degree_cmp, 1.0);

            let ret = ones(
                hotels
                    .clone()
                    .flat_map(|h| vars.arcs_into(h, attractions.clone(), k)),
            );
            model.add_constraint(format!("return_{k}"), ret, degree_cmp, 1.0);

            // flow conservation ties arcs to visitation
            for i in attractions.clone() {
                let Some(visit) = vars.visit(i, k) else {
                    continue;
                };
                let mut flow_in = ones(vars.arcs_into(i, all.clone(), k));
                flow_in.add_term(visit, -1.0);
                model.add_constraint(format!("flow_in_{i}_{k}"), flow_in, Comparison::Eq, 0.0);

                let mut flow_out = ones(vars.arcs_out_of(i, all.clone(), k));
                flow_out.add_term(visit, -1.0);
                model.add_constraint(format!("flow_out_{i}_{k}"), flow_out, Comparison::Eq, 0.0);
            }

            // Miller-Tucker-Zemlin over attractions only
            let big_n = n as f64;
            for i in attractions.clone() {
                for j in attractions.clone() {
                    let Some(arc) = vars.arc(i, j, k) else {
                        continue;
                    };
                    let expr = LinExpr::sum([(vars.u[i][k], 1.0), (vars.u[j][k], -1.0), (arc, big_n)]);
                    model.add_constraint(format!("mtz_{i}_{j}_{k}"), expr, Comparison::Le, big_n - 1.0);
                }
            }

            for h in hotels.clone() {
                model.add_constraint(
                    format!("order_hotel_{h}_{k}"),
                    LinExpr::from(vars.u[h][k]),
                    Comparison::Eq,
                    0.0,
                );
            }
            for i in attractions.clone() {
                let Some(visit) = vars.visit(i, k) else {
                    continue;
                };
                model.add_constraint(
                    format!("order_lower_{i}_{k}"),
                    LinExpr::sum([(vars.u[i][k], 1.0), (visit, -1.0)]),
                    Comparison::Ge,
                    0.0,
                );
                model.add_constraint(
                    format!("order_upper_{i}_{k}"),
                    LinExpr::sum([(vars.u[i][k], 1.0), (visit, -order_max)]),
                    Comparison::Le,
                    0.0,
                );
            }

            let mut spent = day_travel(&vars, matrices, n, k);
            spent.add_scaled(&day_visit(&vars, places, k), 1.0);

            let mut budget = spent.clone();
            if let Some(overflow) = vars.slack.get(k) {
                budget.add_term(*overflow, -1.0);
            }
            model.add_constraint(format!("budget_{k}"), budget, Comparison::Le, t_max);

            let mut total = LinExpr::from(vars.day_total[k]);
            total.add_scaled(&spent, -1.0);
            model.add_constraint(format!("day_total_{k}"), total, Comparison::Eq, 0.0);

            // Z[k] >= |T[k] - T_avg|
            model.add_constraint(
                format!("dev_pos_{k}"),
                LinExpr::sum([
                    (vars.deviation[k], 1.0),
                    (vars.day_total[k], -1.0),
                    (vars.avg_total, 1.0),
                ]),
                Comparison::Ge,
                0.0,
            );
            model.add_constraint(
                format!("dev_neg_{k}"),
                LinExpr::sum([
                    (vars.deviation[k], 1.0),
                    (vars.day_total[k], 1.0),
                    (vars.avg_total, -1.0),
                ]),
                Comparison::Ge,
                0.0,
            );

            for h in hotels.clone() {
                // the hotel a day leaves from is the hotel the day returns to
                let mut closure = ones(vars.arcs_out_of(h, attractions.clone(), k));
                for arc in vars.arcs_into(h, attractions.clone(), k) {
                    closure.add_term(arc, -1.0);
                }
                model.add_constraint(format!("closure_{h}_{k}"), closure, Comparison::Eq, 0.0);

                // hotel continuity across consecutive days
                if k >= 1 {
                    let mut continuity = ones(vars.arcs_out_of(h, attractions.clone(), k));
                    for arc in vars.arcs_into(h, attractions.clone(), k - 1) {
                        continuity.add_term(arc, -1.0);
                    }
                    model.add_constraint(
                        format!("continuity_{h}_{k}"),
                        continuity,
                        Comparison::Eq,
                        0.0,
                    );
                }

                for other in hotels.clone() {
                    if let Some(arc) = vars.arc(h, other, k) {
                        model.add_constraint(
                            format!("no_hotel_hop_{h}_{other}_{k}"),
                            LinExpr::from(arc),
                            Comparison::Eq,
                            0.0,
                        );
                    }
                }
            }
        }

        let mut average = LinExpr::sum([(vars.avg_total, days as f64)]);
        for total in &vars.day_total {
            average.add_term(*total, -1.0);
        }
        model.add_constraint("avg_total", average, Comparison::Eq, 0.0);

        // ******************** OBJECTIVE ********************
        let objective = objective_terms(&vars, input, weights, t_max);
        let mut blended = LinExpr::new();
        objective.distance.add_weighted(&mut blended, weights.distance_weight);
        objective.balance.add_weighted(&mut blended, weights.time_balance_weight);
        if let Some(overflow) = &objective.overflow {
            overflow.add_weighted(&mut blended, 1.0);
        }
        if let Some(omission) = &objective.omission {
            omission.add_weighted(&mut blended, 1.0);
        }
        model.set_objective(blended);

        debug!(
            model = model.name(),
            vars = model.num_vars(),
            constraints = model.constraints().len(),
            flexible = input.flexible,
            "built itinerary model"
        );

        Self {
            model,
            vars,
            objective,
        }
    }
}

fn ones(vars: impl IntoIterator<Item = VarId>) -> LinExpr {
    LinExpr::sum(vars.into_iter().map(|var| (var, 1.0)))
}

/// Travel time of day `k`: `sum t[i][j] * x[i][j][k]`.
fn day_travel(vars: &ModelVars, matrices: &TravelMatrices, n: usize, k: usize) -> LinExpr {
    let mut expr = LinExpr::new();
    for i in 0..n {
        for j in 0..n {
            if let Some(arc) = vars.arc(i, j, k) {
                expr.add_term(arc, matrices.time(i, j));
            }
        }
    }
    expr
}

/// Visit time of day `k`: `sum v[i] * y[i][k]`.
fn day_visit(vars: &ModelVars, places: &PlaceTable, k: usize) -> LinExpr {
    LinExpr::sum(
        places
            .attractions()
            .filter_map(|i| vars.visit(i, k).map(|visit| (visit, places.places()[i].visit_duration))),
    )
}

fn objective_terms(
    vars: &ModelVars,
    input: &ModelInput<'_>,
    weights: ObjectiveWeights,
    t_max: f64,
) -> ObjectiveTerms {
    let matrices = input.matrices;
    let n = input.places.len();
    let days = input.days;

    let mut distance = LinExpr::new();
    for k in 0..days {
        for i in 0..n {
            for j in 0..n {
                if let Some(arc) = vars.arc(i, j, k) {
                    distance.add_term(arc, matrices.distance(i, j));
                }
            }
        }
    }

    let day_budget = t_max * days as f64;
    let balance = LinExpr::sum(vars.deviation.iter().map(|z| (*z, 1.0)));

    let (overflow, omission) = if input.flexible {
        let overflow = LinExpr::sum(vars.slack.iter().map(|s| (*s, 1.0)));
        (
            Some(ObjectiveComponent::new(overflow, Bounds::new(0.0, day_budget))),
            None,
        )
    } else {
        let attraction_count = input.places.attractions().len() as f64;
        let mut omitted = LinExpr::constant(attraction_count);
        for row in &vars.y {
            for visit in row.iter().flatten() {
                omitted.add_term(*visit, -1.0);
            }
        }
        (
            None,
            Some(ObjectiveComponent::new(omitted, Bounds::new(0.0, attraction_count))),
        )
    };

    ObjectiveTerms {
        weights,
        distance: ObjectiveComponent::new(distance, distance_bounds(matrices)),
        balance: ObjectiveComponent::new(balance, Bounds::new(0.0, day_budget)),
        overflow,
        omission,
    }
}

/// `[sum_i min_j d[i][j], sum_i max_j d[i][j]]` over finite off-diagonal entries.
pub fn distance_bounds(matrices: &TravelMatrices) -> Bounds {
    let n = matrices.len();
    let mut lower = 0.0;
    let mut upper = 0.0;

    for i in 0..n {
        let row = (0..n)
            .filter(|j| *j != i)
            .map(|j| matrices.distance(i, j))
            .filter(|d| d.is_finite());
        let (min, max) = row.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), d| {
            (lo.min(d), hi.max(d))
        });
        if min.is_finite() {
            lower += min;
            upper += max;
        }
    }

    Bounds::new(lower, upper)
}
