//! Rebuilds ordered day routes and per-day metrics from a solver assignment.

use serde::Serialize;

use crate::matrix::TravelMatrices;
use crate::milp::VarId;
use crate::model::ModelVars;
use crate::place::PlaceTable;

/// Binary variables above this value count as selected.
pub const ARC_THRESHOLD: f64 = 0.5;

/// Time (hours) and distance (km) of one day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DayMetrics {
    pub travel_time: f64,
    pub visit_time: f64,
    pub total_time: f64,
    pub distance: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayRoute {
    pub day: usize,
    /// Departure hotel; `None` when the day carries no attractions.
    pub hotel: Option<usize>,
    /// Walked `(from, to)` hops in travel order.
    pub arcs: Vec<(usize, usize)>,
    pub metrics: DayMetrics,
}

impl DayRoute {
    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// Place indices in visiting order, starting with the departure hotel.
    pub fn sequence(&self) -> Vec<usize> {
        let Some(hotel) = self.hotel else {
            return Vec::new();
        };
        std::iter::once(hotel)
            .chain(self.arcs.iter().map(|(_, to)| *to))
            .collect()
    }
}

fn selected(var: Option<VarId>, values: &[f64]) -> bool {
    var.and_then(|v| values.get(v.index()))
        .is_some_and(|value| *value > ARC_THRESHOLD)
}

/// One [`DayRoute`] per day, in day order.
pub fn reconstruct(
    vars: &ModelVars,
    places: &PlaceTable,
    matrices: &TravelMatrices,
    values: &[f64],
) -> Vec<DayRoute> {
    (0..vars.days())
        .map(|day| reconstruct_day(vars, places, matrices, values, day))
        .collect()
}

fn reconstruct_day(
    vars: &ModelVars,
    places: &PlaceTable,
    matrices: &TravelMatrices,
    values: &[f64],
    day: usize,
) -> DayRoute {
    let n = places.len();
    let metrics = day_metrics(vars, places, matrices, values, day);

    let start = places
        .hotels()
        .find(|h| (0..n).any(|j| selected(vars.arc(*h, j, day), values)));
    let Some(start) = start else {
        return DayRoute {
            day,
            hotel: None,
            arcs: Vec::new(),
            metrics,
        };
    };

    let mut arcs = Vec::new();
    let mut seen = vec![false; n];
    let mut current = start;
    seen[start] = true;

    // a simple tour has at most n hops
    for _ in 0..n {
        let Some(next) = (0..n).find(|j| selected(vars.arc(current, *j, day), values)) else {
            break;
        };
        arcs.push((current, next));
        if places.is_hotel(next) || seen[next] {
            break;
        }
        seen[next] = true;
        current = next;
    }

    DayRoute {
        day,
        hotel: Some(start),
        arcs,
        metrics,
    }
}

/// Metrics from every selected arc and visit of the day.
fn day_metrics(
    vars: &ModelVars,
    places: &PlaceTable,
    matrices: &TravelMatrices,
    values: &[f64],
    day: usize,
) -> DayMetrics {
    let n = places.len();
    let mut metrics = DayMetrics::default();

    for i in 0..n {
        for j in 0..n {
            if selected(vars.arc(i, j, day), values) {
                metrics.travel_time += matrices.time(i, j);
                metrics.distance += matrices.distance(i, j);
            }
        }
    }
    metrics.visit_time = places
        .attractions()
        .filter(|i| selected(vars.visit(*i, day), values))
        .map(|i| places.places()[i].visit_duration)
        .sum();
    metrics.total_time = metrics.travel_time + metrics.visit_time;

    metrics
}

/// Attractions not visited on any day.
pub fn unvisited(vars: &ModelVars, places: &PlaceTable, values: &[f64]) -> Vec<usize> {
    places
        .attractions()
        .filter(|i| !(0..vars.days()).any(|day| selected(vars.visit(*i, day), values)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ItineraryModel, ModelInput, ObjectiveWeights};
    use crate::place::PlaceInput;

    struct Fixture {
        places: PlaceTable,
        matrices: TravelMatrices,
        built: ItineraryModel,
    }

    impl Fixture {
        /// One hotel, `attractions` attractions of one hour each; hop `i -> j` costs `|i - j|` km and hours/10.
        fn new(attractions: usize, days: usize) -> Self {
            let hotels = vec![PlaceInput::new("Hotel", 0.0, 0.0)];
            let spots: Vec<PlaceInput> = (0..attractions)
                .map(|i| PlaceInput::new(format!("Spot {i}"), 0.0, i as f64 + 1.0).with_duration(1.0))
                .collect();
            let places = PlaceTable::normalize(&hotels, &spots).unwrap();

            let n = places.len();
            let mut matrices = TravelMatrices::zeros(n);
            for i in 0..n {
                for j in 0..n {
                    let gap = (i as f64 - j as f64).abs();
                    matrices.distance_km[i][j] = gap;
                    matrices.time_hours[i][j] = gap / 10.0;
                }
            }

            let built = ItineraryModel::build(&ModelInput {
                places: &places,
                matrices: &matrices,
                days,
                max_daily_hours: 8.0,
                flexible: true,
                weights: ObjectiveWeights::default(),
            });

            Self {
                places,
                matrices,
                built,
            }
        }

        fn values(&self, arcs: &[(usize, usize, usize)], value: f64) -> Vec<f64> {
            let vars = &self.built.vars;
            let mut values = vec![0.0; self.built.model.num_vars()];
            for (from, to, day) in arcs {
                values[vars.arc(*from, *to, *day).unwrap().index()] = value;
                if !self.places.is_hotel(*to) {
                    values[vars.visit(*to, *day).unwrap().index()] = value;
                }
            }
            values
        }

        fn routes(&self, values: &[f64]) -> Vec<DayRoute> {
            reconstruct(&self.built.vars, &self.places, &self.matrices, values)
        }
    }

    #[test]
    fn test_walks_route_in_order() {
        let fixture = Fixture::new(3, 1);
        let values = fixture.values(&[(0, 2, 0), (2, 1, 0), (1, 3, 0), (3, 0, 0)], 1.0);

        let routes = fixture.routes(&values);

        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].hotel, Some(0));
        assert_eq!(routes[0].sequence(), vec![0, 2, 1, 3, 0]);
    }

    #[test]
    fn test_metrics_are_recomputed_from_assignment() {
        let fixture = Fixture::new(2, 1);
        let values = fixture.values(&[(0, 1, 0), (1, 2, 0), (2, 0, 0)], 1.0);

        let metrics = fixture.routes(&values)[0].metrics;

        // hops 0->1, 1->2, 2->0 cover 1 + 1 + 2 km
        assert!((metrics.distance - 4.0).abs() < 1e-9);
        assert!((metrics.travel_time - 0.4).abs() < 1e-9);
        assert!((metrics.visit_time - 2.0).abs() < 1e-9);
        assert!((metrics.total_time - 2.4).abs() < 1e-9);
    }

    #[test]
    fn test_day_without_departure_is_empty() {
        let fixture = Fixture::new(2, 2);
        let values = fixture.values(&[(0, 1, 0), (1, 2, 0), (2, 0, 0)], 1.0);

        let routes = fixture.routes(&values);

        assert!(!routes[0].is_empty());
        assert!(routes[1].is_empty());
        assert_eq!(routes[1].hotel, None);
        assert!(routes[1].sequence().is_empty());
        assert_eq!(routes[1].metrics, DayMetrics::default());
    }

    #[test]
    fn test_threshold_tolerates_solver_noise() {
        let fixture = Fixture::new(2, 1);
        let mut values = fixture.values(&[(0, 1, 0), (1, 2, 0), (2, 0, 0)], 0.999_999);
        values[fixture.built.vars.arc(0, 2, 0).unwrap().index()] = 1e-7;

        let routes = fixture.routes(&values);

        assert_eq!(routes[0].sequence(), vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_walk_stops_on_detached_loop() {
        let fixture = Fixture::new(3, 1);
        // hotel feeds into the loop 1 -> 2 -> 1 that never returns
        let values = fixture.values(&[(0, 1, 0), (1, 2, 0), (2, 1, 0)], 1.0);

        let route = &fixture.routes(&values)[0];

        assert_eq!(route.arcs, vec![(0, 1), (1, 2), (2, 1)]);
    }

    #[test]
    fn test_unvisited_lists_dropped_attractions() {
        let fixture = Fixture::new(3, 1);
        let values = fixture.values(&[(0, 2, 0), (2, 0, 0)], 1.0);

        let dropped = unvisited(&fixture.built.vars, &fixture.places, &values);

        assert_eq!(dropped, vec![1, 3]);
    }
}
