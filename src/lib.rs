//! Multi-day hotel-anchored sightseeing itinerary planner.
//!
//! Places and travel matrices go in, a mixed-integer routing model is built
//! and handed to a pluggable solver, and ordered day routes come back out.

pub mod traits;
pub mod place;
pub mod matrix;
pub mod haversine;
pub mod osrm;
pub mod geoapify;
pub mod milp;
pub mod lp_backend;
pub mod model;
pub mod reconstruct;
pub mod itinerary;
pub mod solver;
