//! Aspect CLI - command line tools for the crag aspect service.
//!
//! - resolve_aspect: resolve one coordinate
//! - recalculate_aspects: batch maintenance over a crag record file

pub mod records;
pub mod summary;

use aspect_sdk::{AspectClient, RetryPolicy};
use clap::Args;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Connection flags shared by the binaries.
#[derive(Args, Debug, Clone)]
pub struct ClientArgs {
    /// Aspect service URL
    #[arg(long, default_value = "http://localhost:3000")]
    pub url: String,

    /// Per-request timeout in milliseconds
    #[arg(long, default_value_t = 20_000)]
    pub timeout_ms: u64,

    /// Retries for transport failures, timeouts, 5xx and 429
    #[arg(long, default_value_t = 2)]
    pub retries: u32,
}

impl ClientArgs {
    pub fn client(&self) -> AspectClient {
        AspectClient::new(self.url.clone())
            .with_timeout(Duration::from_millis(self.timeout_ms))
            .with_retry_policy(RetryPolicy {
                retries: self.retries,
                ..RetryPolicy::default()
            })
    }
}

/// Log to stderr so stdout stays clean for results.
pub fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("aspect_sdk=info".parse()?),
        )
        .init();
    Ok(())
}
