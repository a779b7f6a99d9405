//! Elevation grid providers.
//!
//! Each upstream elevation data source is an [`ElevationProvider`]. The
//! resolver only sees the trait; the [`ProviderRegistry`] picks the concrete
//! adapter from the request's `provider` parameter.

pub mod open_meteo;
pub mod opentopodata;

use aspect_core::{ElevationGrid, GeoPoint, GridError};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::Config;

pub use open_meteo::OpenMeteoProvider;
pub use opentopodata::OpenTopoDataProvider;

/// Boxed future returned by [`ElevationProvider::fetch_elevation_grid`].
pub type GridFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ElevationGrid, ProviderError>> + Send + 'a>>;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("elevation request failed: {0}")]
    Transport(String),
    #[error("elevation provider HTTP {0}")]
    HttpStatus(u16),
    #[error("elevation provider returned status {0}")]
    Status(String),
    #[error("malformed elevation response: {0}")]
    Malformed(String),
    #[error("incomplete elevation grid: {0}")]
    IncompleteGrid(#[from] GridError),
    #[error("{requested} samples exceed the provider limit of {limit} per request")]
    TooManySamples { requested: usize, limit: usize },
    #[error("elevation request timed out after {0:?}")]
    Timeout(Duration),
    #[error("elevation request cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::Malformed(err.to_string())
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}

/// A source of elevation grids.
///
/// Implementations issue exactly one upstream round trip per call and return
/// either a complete `size`×`size` grid centered on `center` or an error.
/// The trait returns a boxed future so providers can be stored as trait
/// objects and selected at runtime.
pub trait ElevationProvider: Send + Sync {
    /// Identifier accepted in the `provider` request parameter.
    fn id(&self) -> &'static str;

    fn fetch_elevation_grid(&self, center: GeoPoint, size: usize) -> GridFuture<'_>;
}

/// Fetch a grid with an explicit deadline and cancellation token.
///
/// On timeout or cancellation the in-flight request future is dropped, which
/// aborts the upstream call. Nothing is retried here.
pub async fn fetch_bounded(
    provider: &dyn ElevationProvider,
    center: GeoPoint,
    size: usize,
    deadline: Duration,
    cancel: &CancellationToken,
) -> Result<ElevationGrid, ProviderError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ProviderError::Cancelled),
        result = tokio::time::timeout(deadline, provider.fetch_elevation_grid(center, size)) => {
            match result {
                Ok(grid) => grid,
                Err(_) => Err(ProviderError::Timeout(deadline)),
            }
        }
    }
}

/// Registered providers keyed by id, with a default.
#[derive(Clone)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn ElevationProvider>>,
    default_id: String,
}

impl ProviderRegistry {
    pub fn new(default_id: impl Into<String>) -> Self {
        Self {
            providers: Vec::new(),
            default_id: default_id.into(),
        }
    }

    /// Register a provider, replacing any existing one with the same id.
    pub fn register(mut self, provider: Arc<dyn ElevationProvider>) -> Self {
        self.providers.retain(|existing| existing.id() != provider.id());
        self.providers.push(provider);
        self
    }

    /// Registry with every built-in adapter, sharing one HTTP client.
    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.elevation_timeout)
            .build()?;

        Ok(Self::new(config.default_provider.clone())
            .register(Arc::new(OpenTopoDataProvider::new(
                client.clone(),
                config.opentopodata_url.clone(),
                config.grid_spacing_m,
            )))
            .register(Arc::new(OpenMeteoProvider::new(
                client,
                config.open_meteo_url.clone(),
                config.grid_spacing_m,
            ))))
    }

    /// Look up a provider; `None` selects the default.
    pub fn get(&self, id: Option<&str>) -> Option<Arc<dyn ElevationProvider>> {
        let wanted = id.unwrap_or(&self.default_id);
        self.providers
            .iter()
            .find(|provider| provider.id() == wanted)
            .cloned()
    }

    pub fn default_id(&self) -> &str {
        &self.default_id
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.providers.iter().map(|provider| provider.id()).collect()
    }
}

/// Render coordinates the way upstream services expect them.
pub(crate) fn format_coord(value: f64) -> String {
    format!("{:.6}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowProvider;

    impl ElevationProvider for SlowProvider {
        fn id(&self) -> &'static str {
            "slow"
        }

        fn fetch_elevation_grid(&self, _center: GeoPoint, size: usize) -> GridFuture<'_> {
            Box::pin(async move {
                tokio::time::sleep(Duration::from_secs(60)).await;
                ElevationGrid::from_samples(size, 30.0, vec![Some(1.0); size * size])
                    .map_err(ProviderError::from)
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_bounded_times_out() {
        let cancel = CancellationToken::new();
        let err = fetch_bounded(
            &SlowProvider,
            GeoPoint::new(59.9, 10.5),
            3,
            Duration::from_secs(15),
            &cancel,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ProviderError::Timeout(d) if d == Duration::from_secs(15)));
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_bounded_observes_cancellation() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });
        let err = fetch_bounded(
            &SlowProvider,
            GeoPoint::new(59.9, 10.5),
            3,
            Duration::from_secs(15),
            &cancel,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ProviderError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_bounded_returns_grid_within_deadline() {
        let cancel = CancellationToken::new();
        let grid = fetch_bounded(
            &SlowProvider,
            GeoPoint::new(59.9, 10.5),
            3,
            Duration::from_secs(120),
            &cancel,
        )
        .await
        .unwrap();
        assert_eq!(grid.size(), 3);
    }

    #[test]
    fn registry_selects_by_id_and_default() {
        let registry = ProviderRegistry::from_config(&Config::default()).unwrap();
        assert_eq!(registry.default_id(), "opentopodata");
        assert_eq!(registry.get(None).unwrap().id(), "opentopodata");
        assert_eq!(registry.get(Some("open-meteo")).unwrap().id(), "open-meteo");
        assert!(registry.get(Some("srtm90m")).is_none());
        assert_eq!(registry.ids(), vec!["opentopodata", "open-meteo"]);
    }

    #[test]
    fn register_replaces_same_id() {
        let registry = ProviderRegistry::new("slow")
            .register(Arc::new(SlowProvider))
            .register(Arc::new(SlowProvider));
        assert_eq!(registry.ids(), vec!["slow"]);
    }
}
