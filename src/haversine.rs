//! Haversine travel matrix provider (fallback when no routing service is available).
//!
//! Uses great-circle distance to estimate travel distance and time.
//! Less accurate than OSRM or Geoapify (ignores roads) but always available.

use crate::matrix::{MatrixError, TravelMatrices};
use crate::traits::TravelMatrixProvider;

/// Average driving speed assumption for time estimation.
const DEFAULT_SPEED_KMH: f64 = 40.0;

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine-based travel matrix provider.
///
/// Estimates travel time using straight-line distance and an assumed speed.
#[derive(Debug, Clone)]
pub struct HaversineMatrix {
    /// Assumed average driving speed in km/h.
    pub speed_kmh: f64,
}

impl Default for HaversineMatrix {
    fn default() -> Self {
        Self {
            speed_kmh: DEFAULT_SPEED_KMH,
        }
    }
}

impl HaversineMatrix {
    pub fn new(speed_kmh: f64) -> Self {
        Self { speed_kmh }
    }

    /// Calculate haversine distance between two points in kilometers.
    pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
        let (lat1, lon1) = from;
        let (lat2, lon2) = to;

        let lat1_rad = lat1.to_radians();
        let lat2_rad = lat2.to_radians();
        let delta_lat = (lat2 - lat1).to_radians();
        let delta_lon = (lon2 - lon1).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_KM * c
    }

    /// Convert distance in km to travel time in hours.
    fn km_to_hours(&self, km: f64) -> f64 {
        if self.speed_kmh > 0.0 {
            km / self.speed_kmh
        } else {
            f64::INFINITY
        }
    }
}

impl TravelMatrixProvider for HaversineMatrix {
    fn matrices_for(&self, locations: &[(f64, f64)]) -> Result<TravelMatrices, MatrixError> {
        let mut matrices = TravelMatrices::zeros(locations.len());

        for (i, from) in locations.iter().enumerate() {
            for (j, to) in locations.iter().enumerate() {
                if i != j {
                    let km = Self::haversine_km(*from, *to);
                    matrices.distance_km[i][j] = km;
                    matrices.time_hours[i][j] = self.km_to_hours(km);
                }
            }
        }

        Ok(matrices)
    }
}
