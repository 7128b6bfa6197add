//! Geoapify Route Matrix adapter.

use serde::{Deserialize, Serialize};

use crate::matrix::{MatrixError, TravelMatrices};
use crate::traits::TravelMatrixProvider;

const API_KEY_ENV: &str = "GEOAPIFY_API_KEY";

#[derive(Debug, Clone)]
pub struct GeoapifyConfig {
    pub base_url: String,
    pub api_key: String,
    /// Travel mode, e.g. "drive", "walk", "transit".
    pub mode: String,
    pub timeout_secs: u64,
}

impl Default for GeoapifyConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.geoapify.com/v1/routematrix".to_string(),
            api_key: String::new(),
            mode: "drive".to_string(),
            timeout_secs: 30,
        }
    }
}

impl GeoapifyConfig {
    /// Default config with the API key taken from `GEOAPIFY_API_KEY`.
    pub fn from_env() -> Result<Self, MatrixError> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| MatrixError::MissingApiKey)?;
        Ok(Self {
            api_key,
            ..Self::default()
        })
    }
}

#[derive(Debug, Clone)]
pub struct GeoapifyClient {
    config: GeoapifyConfig,
    client: reqwest::blocking::Client,
}

impl GeoapifyClient {
    pub fn new(config: GeoapifyConfig) -> Result<Self, MatrixError> {
        if config.api_key.trim().is_empty() {
            return Err(MatrixError::MissingApiKey);
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }
}

impl TravelMatrixProvider for GeoapifyClient {
    fn matrices_for(&self, locations: &[(f64, f64)]) -> Result<TravelMatrices, MatrixError> {
        if locations.is_empty() {
            return Ok(TravelMatrices::zeros(0));
        }

        let request = MatrixRequest::new(&self.config.mode, locations);
        let body = self
            .client
            .post(&self.config.base_url)
            .query(&[("apiKey", self.config.api_key.as_str())])
            .json(&request)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<MatrixResponse>())?;

        body.into_matrices(locations.len())
    }
}

#[derive(Debug, Serialize)]
struct MatrixRequest<'a> {
    mode: &'a str,
    sources: Vec<Waypoint>,
    targets: Vec<Waypoint>,
}

impl<'a> MatrixRequest<'a> {
    fn new(mode: &'a str, locations: &[(f64, f64)]) -> Self {
        let waypoints: Vec<Waypoint> = locations
            .iter()
            .map(|(lat, lon)| Waypoint { location: [*lon, *lat] })
            .collect();

        Self {
            mode,
            sources: waypoints.clone(),
            targets: waypoints,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct Waypoint {
    /// `[lon, lat]`
    location: [f64; 2],
}

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    #[serde(default)]
    sources_to_targets: Vec<Vec<MatrixCell>>,
}

#[derive(Debug, Deserialize)]
struct MatrixCell {
    /// Meters.
    distance: Option<f64>,
    /// Seconds.
    time: Option<f64>,
}

impl MatrixResponse {
    fn into_matrices(self, expected: usize) -> Result<TravelMatrices, MatrixError> {
        if self.sources_to_targets.is_empty() {
            return Err(MatrixError::EmptyResponse);
        }

        let mut distance_km = Vec::with_capacity(expected);
        let mut time_hours = Vec::with_capacity(expected);
        for row in self.sources_to_targets {
            distance_km.push(
                row.iter()
                    .map(|cell| cell.distance.map_or(f64::INFINITY, |m| m / 1000.0))
                    .collect(),
            );
            time_hours.push(
                row.iter()
                    .map(|cell| cell.time.map_or(f64::INFINITY, |s| s / 3600.0))
                    .collect(),
            );
        }

        TravelMatrices::new(distance_km, time_hours).validated(expected)
    }
}
