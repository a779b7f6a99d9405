//! Server configuration from environment.

use std::env;
use std::time::Duration;

pub const DEFAULT_OPENTOPODATA_URL: &str = "https://api.opentopodata.org/v1/eudem";
pub const DEFAULT_OPEN_METEO_URL: &str = "https://api.open-meteo.com/v1/elevation";

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    /// Provider used when a request names none
    pub default_provider: String,
    pub opentopodata_url: String,
    pub open_meteo_url: String,
    pub user_agent: String,
    /// Deadline for the single upstream elevation round trip
    pub elevation_timeout: Duration,
    /// Physical spacing between grid samples in meters
    pub grid_spacing_m: f64,
    /// Geometry estimates must strictly exceed this confidence to win
    pub geometry_min_confidence: f64,
    pub rate_limit_enabled: bool,
    pub rate_limit_rps: u32,
    pub trust_proxy: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            default_provider: "opentopodata".to_string(),
            opentopodata_url: DEFAULT_OPENTOPODATA_URL.to_string(),
            open_meteo_url: DEFAULT_OPEN_METEO_URL.to_string(),
            user_agent: format!("crag-aspect/{}", env!("CARGO_PKG_VERSION")),
            elevation_timeout: Duration::from_millis(15_000),
            grid_spacing_m: 30.0,
            geometry_min_confidence: 0.3,
            rate_limit_enabled: true,
            rate_limit_rps: 5,
            trust_proxy: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_var("ASPECT_PORT").unwrap_or(defaults.server_port),
            default_provider: env::var("ASPECT_DEFAULT_PROVIDER")
                .ok()
                .map(|value| value.trim().to_lowercase())
                .filter(|value| !value.is_empty())
                .unwrap_or(defaults.default_provider),
            opentopodata_url: non_empty_var("OPENTOPODATA_URL")
                .unwrap_or(defaults.opentopodata_url),
            open_meteo_url: non_empty_var("OPEN_METEO_ELEVATION_URL")
                .unwrap_or(defaults.open_meteo_url),
            user_agent: non_empty_var("ASPECT_USER_AGENT").unwrap_or(defaults.user_agent),
            elevation_timeout: parse_var::<u64>("ASPECT_ELEVATION_TIMEOUT_MS")
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.elevation_timeout),
            grid_spacing_m: parse_var::<f64>("ASPECT_GRID_SPACING_M")
                .filter(|m| m.is_finite() && *m > 0.0)
                .unwrap_or(defaults.grid_spacing_m),
            geometry_min_confidence: parse_var::<f64>("ASPECT_GEOMETRY_MIN_CONFIDENCE")
                .filter(|c| (0.0..=1.0).contains(c))
                .unwrap_or(defaults.geometry_min_confidence),
            rate_limit_enabled: parse_bool("ASPECT_RATE_LIMIT_ENABLED")
                .unwrap_or(defaults.rate_limit_enabled),
            rate_limit_rps: parse_var::<u32>("ASPECT_RATE_LIMIT_RPS")
                .filter(|rps| *rps > 0)
                .unwrap_or(defaults.rate_limit_rps),
            trust_proxy: parse_bool("ASPECT_TRUST_PROXY").unwrap_or(defaults.trust_proxy),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

fn parse_bool(key: &str) -> Option<bool> {
    match env::var(key).ok()?.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
