//! Output itineraries handed to the presentation layer.

use serde::Serialize;

use crate::milp::SolveStatus;
use crate::model::ObjectiveBreakdown;
use crate::place::{Place, PlaceTable};
use crate::reconstruct::{DayMetrics, DayRoute};

/// A complete multi-day plan for one strategy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Itinerary {
    pub title: String,
    pub status: SolveStatus,
    /// Sum of the per-day distances, in km.
    pub total_distance: f64,
    /// `daily_routes[k]` lists the places of day `k` including the bracketing
    /// hotel stops; empty for a day without attractions.
    pub daily_routes: Vec<Vec<Place>>,
    pub day_metrics: Vec<DayMetrics>,
    /// Attractions left out of the trip (strict mode only).
    pub unassigned: Vec<Place>,
    pub objective: ObjectiveBreakdown,
    /// Set when no hotel was supplied and the synthetic fallback anchored the
    /// plan; such a plan is not a real recommendation.
    pub fallback_hotel: bool,
}

impl Itinerary {
    pub fn days(&self) -> usize {
        self.daily_routes.len()
    }

    /// Total hours across all days.
    pub fn total_time(&self) -> f64 {
        self.day_metrics.iter().map(|m| m.total_time).sum()
    }
}

/// Builds an [`Itinerary`] from reconstructed day routes.
///
/// Indices are resolved against the place table built for the same solve.
pub fn assemble(
    title: &str,
    status: SolveStatus,
    routes: &[DayRoute],
    unassigned: &[usize],
    places: &PlaceTable,
    objective: ObjectiveBreakdown,
) -> Itinerary {
    let resolve = |index: usize| places.places()[index].clone();

    let daily_routes = routes
        .iter()
        .map(|route| route.sequence().into_iter().map(resolve).collect())
        .collect();
    let day_metrics: Vec<DayMetrics> = routes.iter().map(|route| route.metrics).collect();
    let total_distance = day_metrics.iter().map(|m| m.distance).sum();

    Itinerary {
        title: title.to_string(),
        status,
        total_distance,
        daily_routes,
        day_metrics,
        unassigned: unassigned.iter().copied().map(resolve).collect(),
        objective,
        fallback_hotel: places.has_synthetic_hotel(),
    }
}
