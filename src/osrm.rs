//! OSRM HTTP adapter for travel matrices.

use serde::Deserialize;

use crate::matrix::{MatrixError, TravelMatrices};
use crate::traits::TravelMatrixProvider;

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "car".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn table_url(&self, locations: &[(f64, f64)]) -> String {
        let coords = locations
            .iter()
            .map(|(lat, lon)| format!("{:.6},{:.6}", lon, lat))
            .collect::<Vec<_>>()
            .join(";");

        format!(
            "{}/table/v1/{}/{}?annotations=duration,distance",
            self.config.base_url, self.config.profile, coords
        )
    }
}

impl TravelMatrixProvider for OsrmClient {
    fn matrices_for(&self, locations: &[(f64, f64)]) -> Result<TravelMatrices, MatrixError> {
        if locations.is_empty() {
            return Ok(TravelMatrices::zeros(0));
        }

        let body = self
            .client
            .get(self.table_url(locations))
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<OsrmTableResponse>())?;

        body.into_matrices(locations.len())
    }
}

#[derive(Debug, Deserialize)]
struct OsrmTableResponse {
    /// Seconds; `null` where no route exists.
    durations: Option<Vec<Vec<Option<f64>>>>,
    /// Meters; `null` where no route exists.
    distances: Option<Vec<Vec<Option<f64>>>>,
}

impl OsrmTableResponse {
    fn into_matrices(self, expected: usize) -> Result<TravelMatrices, MatrixError> {
        let (Some(durations), Some(distances)) = (self.durations, self.distances) else {
            return Err(MatrixError::EmptyResponse);
        };

        let convert = |rows: Vec<Vec<Option<f64>>>, scale: f64| -> Vec<Vec<f64>> {
            rows.into_iter()
                .map(|row| {
                    row.into_iter()
                        .map(|value| value.map_or(f64::INFINITY, |v| v / scale))
                        .collect()
                })
                .collect()
        };

        TravelMatrices::new(convert(distances, 1000.0), convert(durations, 3600.0)).validated(expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_url_uses_lon_lat_order() {
        let client = OsrmClient::new(OsrmConfig::default()).unwrap();
        let url = client.table_url(&[(13.7563, 100.5018), (13.75, 100.49)]);
        assert_eq!(
            url,
            "http://localhost:5000/table/v1/car/100.501800,13.756300;100.490000,13.750000?annotations=duration,distance"
        );
    }

    #[test]
    fn test_response_converts_units_and_nulls() {
        let body: OsrmTableResponse = serde_json::from_str(
            r#"{
                "code": "Ok",
                "durations": [[0, 1800], [null, 0]],
                "distances": [[0, 12000], [null, 0]]
            }"#,
        )
        .unwrap();

        let matrices = body.into_matrices(2).unwrap();
        assert_eq!(matrices.distance(0, 1), 12.0);
        assert_eq!(matrices.time(0, 1), 0.5);
        assert!(matrices.distance(1, 0).is_infinite());
        assert!(matrices.time(1, 0).is_infinite());
    }

    #[test]
    fn test_response_without_distances_is_empty() {
        let body: OsrmTableResponse =
            serde_json::from_str(r#"{"code": "Ok", "durations": [[0]]}"#).unwrap();
        assert!(matches!(body.into_matrices(1), Err(MatrixError::EmptyResponse)));
    }
}
