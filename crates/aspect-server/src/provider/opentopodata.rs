//! OpenTopoData elevation adapter.
//!
//! One GET with every grid location in a pipe-delimited `locations`
//! parameter. The response carries a `status` field and `results` in request
//! order, which is what lets the grid be reassembled by position.

use aspect_core::{grid_locations, ElevationGrid, GeoPoint};
use reqwest::Client;
use serde::Deserialize;

use super::{format_coord, ElevationProvider, GridFuture, ProviderError};

#[derive(Debug, Deserialize)]
struct OpenTopoDataResponse {
    status: Option<String>,
    results: Option<Vec<OpenTopoDataSample>>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenTopoDataSample {
    elevation: Option<f64>,
}

pub struct OpenTopoDataProvider {
    client: Client,
    base_url: String,
    spacing_m: f64,
}

impl OpenTopoDataProvider {
    pub const ID: &'static str = "opentopodata";

    pub fn new(client: Client, base_url: impl Into<String>, spacing_m: f64) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            spacing_m,
        }
    }

    async fn fetch(&self, center: GeoPoint, size: usize) -> Result<ElevationGrid, ProviderError> {
        let locations = grid_locations(center, size, self.spacing_m);
        tracing::debug!(
            provider = Self::ID,
            samples = locations.len(),
            "Requesting elevation grid"
        );

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("locations", locations_param(&locations))])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::HttpStatus(response.status().as_u16()));
        }

        let payload: OpenTopoDataResponse = response.json().await?;
        parse_payload(payload, size, self.spacing_m)
    }
}

impl ElevationProvider for OpenTopoDataProvider {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn fetch_elevation_grid(&self, center: GeoPoint, size: usize) -> GridFuture<'_> {
        Box::pin(self.fetch(center, size))
    }
}

fn locations_param(locations: &[GeoPoint]) -> String {
    locations
        .iter()
        .map(|p| format!("{},{}", format_coord(p.latitude), format_coord(p.longitude)))
        .collect::<Vec<_>>()
        .join("|")
}

fn parse_payload(
    payload: OpenTopoDataResponse,
    size: usize,
    spacing_m: f64,
) -> Result<ElevationGrid, ProviderError> {
    match payload.status.as_deref() {
        Some("OK") => {}
        other => {
            let status = other.unwrap_or("missing");
            return Err(ProviderError::Status(match payload.error {
                Some(error) => format!("{status}: {error}"),
                None => status.to_string(),
            }));
        }
    }

    let results = payload
        .results
        .ok_or_else(|| ProviderError::Malformed("missing results".to_string()))?;
    let samples = results.into_iter().map(|sample| sample.elevation).collect();
    Ok(ElevationGrid::from_samples(size, spacing_m, samples)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aspect_core::GridError;

    fn payload(json: serde_json::Value) -> OpenTopoDataResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn locations_are_pipe_delimited_lat_lon() {
        let param = locations_param(&[GeoPoint::new(59.8, 10.25), GeoPoint::new(-1.5, 2.0)]);
        assert_eq!(param, "59.800000,10.250000|-1.500000,2.000000");
    }

    #[test]
    fn parses_results_in_request_order() {
        let results: Vec<_> = (0..9).map(|i| serde_json::json!({ "elevation": i as f64 })).collect();
        let grid = parse_payload(
            payload(serde_json::json!({ "status": "OK", "results": results })),
            3,
            30.0,
        )
        .unwrap();
        assert_eq!(grid.get(0, 0), Some(0.0));
        assert_eq!(grid.get(0, 2), Some(2.0));
        assert_eq!(grid.get(2, 0), Some(6.0));
        assert_eq!(grid.center(), 4.0);
    }

    #[test]
    fn non_ok_status_is_an_error() {
        let err = parse_payload(
            payload(serde_json::json!({ "status": "INVALID_REQUEST", "error": "Too many locations" })),
            3,
            30.0,
        )
        .unwrap_err();
        assert!(matches!(err, ProviderError::Status(ref s) if s.contains("INVALID_REQUEST")));
    }

    #[test]
    fn null_elevation_rejects_grid() {
        let mut results: Vec<_> = (0..9).map(|_| serde_json::json!({ "elevation": 100.0 })).collect();
        results[7] = serde_json::json!({ "elevation": null });
        let err = parse_payload(
            payload(serde_json::json!({ "status": "OK", "results": results })),
            3,
            30.0,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ProviderError::IncompleteGrid(GridError::MissingSample { row: 2, col: 1 })
        ));
    }

    #[test]
    fn short_result_list_rejects_grid() {
        let results: Vec<_> = (0..8).map(|_| serde_json::json!({ "elevation": 100.0 })).collect();
        let err = parse_payload(
            payload(serde_json::json!({ "status": "OK", "results": results })),
            3,
            30.0,
        )
        .unwrap_err();
        assert!(matches!(err, ProviderError::IncompleteGrid(GridError::SampleCount { .. })));
    }
}
