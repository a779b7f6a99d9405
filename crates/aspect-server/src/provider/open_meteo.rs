//! Open-Meteo elevation adapter.

use aspect_core::{grid_locations, ElevationGrid, GeoPoint};
use reqwest::Client;
use serde::Deserialize;

use super::{format_coord, ElevationProvider, GridFuture, ProviderError};

/// Open-Meteo caps a single elevation request at this many coordinates.
const MAX_POINTS_PER_REQUEST: usize = 100;

#[derive(Debug, Deserialize)]
struct OpenMeteoElevationResponse {
    elevation: Option<Vec<Option<f64>>>,
}

pub struct OpenMeteoProvider {
    client: Client,
    base_url: String,
    spacing_m: f64,
}

impl OpenMeteoProvider {
    pub const ID: &'static str = "open-meteo";

    pub fn new(client: Client, base_url: impl Into<String>, spacing_m: f64) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            spacing_m,
        }
    }

    async fn fetch(&self, center: GeoPoint, size: usize) -> Result<ElevationGrid, ProviderError> {
        let locations = grid_locations(center, size, self.spacing_m);
        if locations.len() > MAX_POINTS_PER_REQUEST {
            return Err(ProviderError::TooManySamples {
                requested: locations.len(),
                limit: MAX_POINTS_PER_REQUEST,
            });
        }
        tracing::debug!(
            provider = Self::ID,
            samples = locations.len(),
            "Requesting elevation grid"
        );

        let latitudes = join_params(locations.iter().map(|p| p.latitude));
        let longitudes = join_params(locations.iter().map(|p| p.longitude));
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("latitude", latitudes), ("longitude", longitudes)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::HttpStatus(response.status().as_u16()));
        }

        let payload: OpenMeteoElevationResponse = response.json().await?;
        let samples = payload
            .elevation
            .ok_or_else(|| ProviderError::Malformed("missing elevation".to_string()))?;
        Ok(ElevationGrid::from_samples(size, self.spacing_m, samples)?)
    }
}

impl ElevationProvider for OpenMeteoProvider {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn fetch_elevation_grid(&self, center: GeoPoint, size: usize) -> GridFuture<'_> {
        Box::pin(self.fetch(center, size))
    }
}

fn join_params(values: impl Iterator<Item = f64>) -> String {
    values.map(format_coord).collect::<Vec<_>>().join(",")
}
