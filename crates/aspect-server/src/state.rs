//! Shared application state.

use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::provider::{ProviderError, ProviderRegistry};
use crate::resolver::Resolver;

/// Read-only state shared by all requests. Requests never mutate it.
pub struct AppState {
    config: Config,
    providers: ProviderRegistry,
    resolver: Resolver,
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: Config, providers: ProviderRegistry) -> Self {
        let resolver = Resolver::new(&config);
        Self {
            config,
            providers,
            resolver,
            shutdown: CancellationToken::new(),
        }
    }

    /// State with the built-in providers configured from `config`.
    pub fn from_config(config: Config) -> Result<Self, ProviderError> {
        let providers = ProviderRegistry::from_config(&config)?;
        Ok(Self::new(config, providers))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Cancelled when the server shuts down; in-flight fetches observe it.
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }
}
