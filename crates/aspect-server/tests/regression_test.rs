//! End-to-end resolution against a local elevation service.
//!
//! A stub upstream answers OpenTopoData and Open-Meteo requests from a
//! synthetic DEM: an amphitheatre rim that falls away toward a known facing.

use axum::{
    body::Body,
    extract::{Query, State},
    http::{Request, StatusCode},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use aspect_core::geodesy::{meters_per_deg_lat, meters_per_deg_lon};
use aspect_core::{angular_difference, GeoPoint};
use aspect_server::{api, config::Config, state::AppState};

const KOLSAS: GeoPoint = GeoPoint {
    latitude: 59.9147,
    longitude: 10.5127,
};
const KOLSAS_ASPECT: f64 = 225.0;

const DAMTJERN: GeoPoint = GeoPoint {
    latitude: 59.8041553,
    longitude: 10.2836618,
};
const DAMTJERN_ASPECT: f64 = 135.0;

const TOLERANCE_DEG: f64 = 30.0;

#[derive(Clone, Copy)]
enum Upstream {
    /// Amphitheatre escarpment at whichever reference site lies within 500 m.
    Escarpments,
    /// Tilted plane rising toward the south: north-facing slope, no cliff.
    NorthSlope,
    ErrorStatus,
    NullElevation,
    Stalled,
}

struct Escarpment {
    site: GeoPoint,
    facing_deg: f64,
}

const ESCARPMENTS: [Escarpment; 2] = [
    Escarpment {
        site: KOLSAS,
        facing_deg: KOLSAS_ASPECT,
    },
    Escarpment {
        site: DAMTJERN,
        facing_deg: DAMTJERN_ASPECT,
    },
];

fn local_offset(site: GeoPoint, point: GeoPoint) -> (f64, f64) {
    let north = (point.latitude - site.latitude) * meters_per_deg_lat(site.latitude);
    let east = (point.longitude - site.longitude) * meters_per_deg_lon(site.latitude);
    (north, east)
}

fn dem(upstream: Upstream, point: GeoPoint) -> Option<f64> {
    match upstream {
        Upstream::Escarpments => {
            for escarpment in &ESCARPMENTS {
                let (north, east) = local_offset(escarpment.site, point);
                if north.hypot(east) > 500.0 {
                    continue;
                }
                let facing = escarpment.facing_deg.to_radians();
                let outward = north * facing.cos() + east * facing.sin();
                let lateral = east * facing.cos() - north * facing.sin();
                // amphitheatre: rim at the site, ground falls 1.2 m per meter
                // beyond it and rises toward the flanks
                return Some(380.0 - 1.2 * outward.max(0.0) + 0.02 * lateral * lateral);
            }
            Some(100.0)
        }
        Upstream::NorthSlope => {
            let (north, _) = local_offset(KOLSAS, point);
            Some(300.0 - 0.3 * north)
        }
        Upstream::NullElevation => None,
        Upstream::ErrorStatus | Upstream::Stalled => Some(0.0),
    }
}

fn parse_pairs(locations: &str) -> Vec<GeoPoint> {
    locations
        .split('|')
        .filter_map(|pair| {
            let (lat, lon) = pair.split_once(',')?;
            Some(GeoPoint::new(lat.parse().ok()?, lon.parse().ok()?))
        })
        .collect()
}

async fn opentopodata(
    State(upstream): State<Upstream>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    match upstream {
        Upstream::ErrorStatus => {
            return Json(json!({"status": "INVALID_REQUEST", "error": "Too many locations"}))
        }
        Upstream::Stalled => tokio::time::sleep(Duration::from_secs(5)).await,
        _ => {}
    }
    let points = parse_pairs(params.get("locations").map(String::as_str).unwrap_or(""));
    let results: Vec<Value> = points
        .into_iter()
        .map(|point| json!({"elevation": dem(upstream, point), "location": {"lat": point.latitude, "lng": point.longitude}}))
        .collect();
    Json(json!({"status": "OK", "results": results}))
}

async fn open_meteo(
    State(upstream): State<Upstream>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let split = |key: &str| -> Vec<f64> {
        params
            .get(key)
            .map(|raw| raw.split(',').filter_map(|v| v.parse().ok()).collect())
            .unwrap_or_default()
    };
    let elevation: Vec<Option<f64>> = split("latitude")
        .into_iter()
        .zip(split("longitude"))
        .map(|(lat, lon)| dem(upstream, GeoPoint::new(lat, lon)))
        .collect();
    Json(json!({"elevation": elevation}))
}

async fn spawn_upstream(upstream: Upstream) -> SocketAddr {
    let router = Router::new()
        .route("/v1/eudem", get(opentopodata))
        .route("/v1/elevation", get(open_meteo))
        .with_state(upstream);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

async fn setup_app(upstream: Upstream) -> Router {
    let addr = spawn_upstream(upstream).await;
    let config = Config {
        opentopodata_url: format!("http://{addr}/v1/eudem"),
        open_meteo_url: format!("http://{addr}/v1/elevation"),
        elevation_timeout: Duration::from_millis(300),
        rate_limit_enabled: false,
        ..Config::default()
    };
    api::app(Arc::new(AppState::from_config(config).unwrap()))
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn aspect_uri(site: GeoPoint, provider: Option<&str>) -> String {
    let mut uri = format!("/aspect?lat={}&lon={}", site.latitude, site.longitude);
    if let Some(provider) = provider {
        uri.push_str(&format!("&provider={provider}"));
    }
    uri
}

fn assert_within_tolerance(body: &Value, expected: f64) {
    let aspect = body["aspectDeg"].as_f64().unwrap();
    let diff = angular_difference(aspect, expected);
    assert!(
        diff <= TOLERANCE_DEG,
        "aspect {aspect} is {diff} degrees from reference {expected}"
    );
}

#[tokio::test]
async fn kolsas_resolves_south_west() {
    let app = setup_app(Upstream::Escarpments).await;
    let (status, body) = get_json(app, &aspect_uri(KOLSAS, None)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["method"], "cliff_detection");
    assert_eq!(body["provider"], "opentopodata");
    assert_within_tolerance(&body, KOLSAS_ASPECT);
    assert_eq!(body["aspectDir"], "SW");
}

#[tokio::test]
async fn damtjern_resolves_south_east() {
    let app = setup_app(Upstream::Escarpments).await;
    let (status, body) = get_json(app, &aspect_uri(DAMTJERN, None)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["method"], "cliff_detection");
    assert_within_tolerance(&body, DAMTJERN_ASPECT);
    assert_eq!(body["aspectDir"], "SE");
}

#[tokio::test]
async fn open_meteo_agrees_with_opentopodata() {
    let app = setup_app(Upstream::Escarpments).await;
    let (status, body) = get_json(app, &aspect_uri(DAMTJERN, Some("open-meteo"))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["provider"], "open-meteo");
    assert_within_tolerance(&body, DAMTJERN_ASPECT);
}

#[tokio::test]
async fn gentle_slope_uses_terrain_gradient() {
    let app = setup_app(Upstream::NorthSlope).await;
    let (status, body) = get_json(app, &aspect_uri(KOLSAS, None)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["method"], "terrain");
    assert_eq!(body["aspectDir"], "N");
    let confidence = body["confidence"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&confidence));
}

#[tokio::test]
async fn upstream_error_status_is_bad_gateway() {
    let app = setup_app(Upstream::ErrorStatus).await;
    let (status, body) = get_json(app, &aspect_uri(KOLSAS, None)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["details"]
        .as_str()
        .unwrap()
        .contains("INVALID_REQUEST"));
}

#[tokio::test]
async fn null_elevation_is_bad_gateway() {
    let app = setup_app(Upstream::NullElevation).await;
    let (status, body) = get_json(app, &aspect_uri(KOLSAS, None)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["details"].as_str().unwrap().contains("incomplete"));
}

#[tokio::test]
async fn stalled_upstream_times_out() {
    let app = setup_app(Upstream::Stalled).await;
    let (status, body) = get_json(app, &aspect_uri(KOLSAS, None)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["details"].as_str().unwrap().contains("timed out"));
}
