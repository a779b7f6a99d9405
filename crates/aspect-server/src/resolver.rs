//! Wall aspect resolution: geometry first, then cliff detection, then the
//! terrain gradient.
//!
//! Stages run in order and the first accepted estimate wins. Geometry needs
//! no network. The DEM stages share one 7×7 grid fetch; the terrain fallback
//! reads the centre 3×3 window of that same grid, so a request makes at most
//! one upstream call.

use aspect_core::{
    detect_cliff_with, estimate_from_outline_with, terrain_gradient_aspect_with, AspectEstimate,
    ElevationGrid, EstimatorThresholds, GeoPoint, Outline,
};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::AspectError;
use crate::provider::{fetch_bounded, ElevationProvider};

/// Grid fetched for cliff detection.
pub const CLIFF_GRID_SIZE: usize = 7;
/// Window used for the terrain gradient fallback.
pub const TERRAIN_GRID_SIZE: usize = 3;

#[derive(Debug, Clone)]
pub struct ResolveRequest {
    pub point: GeoPoint,
    pub outline: Option<Outline>,
}

impl ResolveRequest {
    pub fn new(point: GeoPoint) -> Self {
        Self {
            point,
            outline: None,
        }
    }

    pub fn with_outline(mut self, outline: Outline) -> Self {
        self.outline = Some(outline);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    TryGeometry,
    TryCliff,
    FallbackTerrain,
}

#[derive(Debug, Clone)]
pub struct Resolver {
    thresholds: EstimatorThresholds,
    geometry_min_confidence: f64,
    fetch_deadline: Duration,
}

impl Resolver {
    pub fn new(config: &Config) -> Self {
        Self {
            thresholds: EstimatorThresholds::default(),
            geometry_min_confidence: config.geometry_min_confidence,
            fetch_deadline: config.elevation_timeout,
        }
    }

    pub fn with_thresholds(mut self, thresholds: EstimatorThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Resolve the aspect for one request.
    ///
    /// Always yields an estimate once the provider returns a grid. Provider
    /// failures surface as [`AspectError::Provider`]; no estimate is
    /// substituted for them.
    pub async fn resolve(
        &self,
        provider: &dyn ElevationProvider,
        request: &ResolveRequest,
        cancel: &CancellationToken,
    ) -> Result<AspectEstimate, AspectError> {
        if !request.point.is_valid() {
            return Err(AspectError::Validation(format!(
                "coordinate out of range: lat {}, lon {}",
                request.point.latitude, request.point.longitude
            )));
        }

        let mut stage = Stage::TryGeometry;
        let mut grid: Option<ElevationGrid> = None;

        loop {
            tracing::debug!(?stage, "Aspect resolution stage");
            stage = match stage {
                Stage::TryGeometry => {
                    if let Some(estimate) = self.try_geometry(request) {
                        return Ok(estimate);
                    }
                    Stage::TryCliff
                }
                Stage::TryCliff => {
                    let fetched = self.fetch_cliff_grid(provider, request.point, cancel).await?;
                    if let Some(estimate) = detect_cliff_with(&fetched, &self.thresholds) {
                        tracing::debug!(
                            aspect_deg = estimate.aspect_deg(),
                            confidence = estimate.confidence(),
                            "Cliff detected"
                        );
                        return Ok(estimate);
                    }
                    grid = Some(fetched);
                    Stage::FallbackTerrain
                }
                Stage::FallbackTerrain => {
                    let fetched = grid.take().ok_or_else(|| {
                        AspectError::Internal("terrain fallback reached without a grid".to_string())
                    })?;
                    let window = fetched
                        .center_window(TERRAIN_GRID_SIZE)
                        .map_err(|err| AspectError::Internal(err.to_string()))?;
                    return Ok(terrain_gradient_aspect_with(&window, &self.thresholds));
                }
            };
        }
    }

    fn try_geometry(&self, request: &ResolveRequest) -> Option<AspectEstimate> {
        let outline = request.outline.as_ref().filter(|outline| outline.len() >= 2)?;
        if let Some(bad) = outline.iter().find(|point| !point.is_valid()) {
            tracing::warn!(?bad, "Ignoring outline with invalid point");
            return None;
        }

        let estimate = estimate_from_outline_with(outline, request.point, &self.thresholds)?;
        if estimate.confidence() > self.geometry_min_confidence {
            tracing::debug!(
                aspect_deg = estimate.aspect_deg(),
                confidence = estimate.confidence(),
                "Geometry estimate accepted"
            );
            Some(estimate)
        } else {
            tracing::debug!(
                confidence = estimate.confidence(),
                threshold = self.geometry_min_confidence,
                "Geometry estimate below threshold"
            );
            None
        }
    }

    async fn fetch_cliff_grid(
        &self,
        provider: &dyn ElevationProvider,
        point: GeoPoint,
        cancel: &CancellationToken,
    ) -> Result<ElevationGrid, AspectError> {
        let grid = fetch_bounded(provider, point, CLIFF_GRID_SIZE, self.fetch_deadline, cancel)
            .await?;
        if grid.size() != CLIFF_GRID_SIZE {
            return Err(AspectError::Internal(format!(
                "provider {} returned a {}x{} grid, expected {}x{}",
                provider.id(),
                grid.size(),
                grid.size(),
                CLIFF_GRID_SIZE,
                CLIFF_GRID_SIZE
            )));
        }
        Ok(grid)
    }
}
