//! REST API routes.

use axum::{
    extract::{Query, State},
    middleware,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::rate_limit::{self, RateLimiter};
use crate::config::Config;
use crate::error::AspectError;
use crate::resolver::ResolveRequest;
use crate::state::AppState;
use aspect_core::{AspectMethod, CompassDirection, GeoPoint, Outline};

/// Create the API router.
pub fn create_router(config: &Config) -> Router<Arc<AppState>> {
    let limiter = RateLimiter::from_config(config);

    let aspect_routes = Router::new()
        .route("/aspect", get(get_aspect))
        .layer(middleware::from_fn_with_state(limiter, rate_limit::rate_limit));

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/providers", get(list_providers))
        .merge(aspect_routes)
}

// === Request/Response types ===

#[derive(Debug, Deserialize)]
pub struct AspectQuery {
    pub lat: Option<String>,
    pub lon: Option<String>,
    /// JSON array of `{lat, lon}` tracing the wall
    pub geometry: Option<String>,
    pub provider: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AspectResponse {
    pub lat: f64,
    pub lon: f64,
    pub aspect_deg: u16,
    pub aspect_dir: CompassDirection,
    pub method: AspectMethod,
    pub confidence: f64,
    pub provider: String,
}

#[derive(Debug, Serialize)]
pub struct ProvidersResponse {
    pub default: String,
    pub providers: Vec<&'static str>,
}

// === Handlers ===

async fn get_aspect(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AspectQuery>,
) -> Result<Json<AspectResponse>, AspectError> {
    let point = parse_point(&query)?;

    let requested = query
        .provider
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());
    let provider = state.providers().get(requested).ok_or_else(|| {
        AspectError::Validation(format!(
            "Unknown provider: {}. Supported providers: {}",
            requested.unwrap_or(state.providers().default_id()),
            state.providers().ids().join(", ")
        ))
    })?;

    let request = ResolveRequest {
        point,
        outline: query.geometry.as_deref().and_then(parse_geometry),
    };

    let cancel = state.shutdown_token().child_token();
    let estimate = state
        .resolver()
        .resolve(provider.as_ref(), &request, &cancel)
        .await?;

    tracing::info!(
        lat = point.latitude,
        lon = point.longitude,
        aspect_deg = estimate.aspect_deg(),
        method = %estimate.method(),
        confidence = estimate.confidence(),
        provider = provider.id(),
        "Resolved aspect"
    );

    Ok(Json(AspectResponse {
        lat: point.latitude,
        lon: point.longitude,
        aspect_deg: estimate.aspect_deg(),
        aspect_dir: estimate.aspect_dir(),
        method: estimate.method(),
        confidence: estimate.confidence(),
        provider: provider.id().to_string(),
    }))
}

async fn list_providers(State(state): State<Arc<AppState>>) -> Json<ProvidersResponse> {
    Json(ProvidersResponse {
        default: state.providers().default_id().to_string(),
        providers: state.providers().ids(),
    })
}

// === Parsing ===

fn parse_point(query: &AspectQuery) -> Result<GeoPoint, AspectError> {
    let (Some(lat), Some(lon)) = (query.lat.as_deref(), query.lon.as_deref()) else {
        return Err(AspectError::Validation(
            "Missing latitude or longitude parameters".to_string(),
        ));
    };

    let latitude = parse_coordinate(lat);
    let longitude = parse_coordinate(lon);
    let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
        return Err(AspectError::Validation(
            "Invalid latitude or longitude values".to_string(),
        ));
    };

    let point = GeoPoint::new(latitude, longitude);
    if !point.is_valid() {
        return Err(AspectError::Validation(
            "Latitude must be between -90 and 90, longitude between -180 and 180".to_string(),
        ));
    }
    Ok(point)
}

fn parse_coordinate(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Parse the `geometry` parameter. Anything unusable is logged and dropped
/// so the request continues on the elevation-based path.
fn parse_geometry(raw: &str) -> Option<Outline> {
    let outline: Outline = match serde_json::from_str(raw) {
        Ok(outline) => outline,
        Err(err) => {
            tracing::warn!("Ignoring malformed geometry parameter: {}", err);
            return None;
        }
    };

    if outline.iter().any(|point| !point.is_valid()) {
        tracing::warn!("Ignoring geometry with out-of-range points");
        return None;
    }
    if outline.len() < 2 {
        tracing::debug!(points = outline.len(), "Geometry too short, ignoring");
        return None;
    }
    Some(outline)
}
