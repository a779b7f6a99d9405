//! Resolve the aspect of a single coordinate.
//!
//! Usage:
//!   cargo run -p aspect-cli --bin resolve_aspect -- --lat 59.9147 --lon 10.5127
//!   cargo run -p aspect-cli --bin resolve_aspect -- --list-providers

use anyhow::{Context, Result};
use aspect_cli::{init_tracing, ClientArgs};
use aspect_sdk::{AspectRequest, GeoPoint};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about = "Resolve the compass aspect of a climbing wall")]
struct Args {
    #[command(flatten)]
    client: ClientArgs,

    #[arg(long, allow_hyphen_values = true, required_unless_present = "list_providers")]
    lat: Option<f64>,

    #[arg(long, allow_hyphen_values = true, required_unless_present = "list_providers")]
    lon: Option<f64>,

    /// List the server's elevation providers and exit
    #[arg(long, conflicts_with_all = ["lat", "lon", "geometry"])]
    list_providers: bool,

    /// Wall outline as a JSON array of {"lat", "lon"} points
    #[arg(long)]
    geometry: Option<String>,

    /// Elevation provider id (server default when omitted)
    #[arg(long)]
    provider: Option<String>,

    /// Print the raw JSON response
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;
    let args = Args::parse();

    let client = args.client.client();

    if args.list_providers {
        let listing = client.providers().await?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&listing)?);
        } else {
            for id in &listing.providers {
                let marker = if *id == listing.default { " (default)" } else { "" };
                println!("{id}{marker}");
            }
        }
        return Ok(());
    }

    let (Some(lat), Some(lon)) = (args.lat, args.lon) else {
        anyhow::bail!("--lat and --lon are required");
    };
    let mut request = AspectRequest::new(GeoPoint::new(lat, lon));
    if let Some(raw) = &args.geometry {
        let outline: Vec<GeoPoint> =
            serde_json::from_str(raw).context("--geometry must be a JSON array of points")?;
        request = request.with_geometry(outline);
    }
    if let Some(provider) = args.provider {
        request = request.with_provider(provider);
    }

    let response = client.resolve_with_retry(&request).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!(
            "{}° ({}) [{}] confidence {:.0}% via {}",
            response.aspect_deg,
            response.aspect_dir,
            response.method,
            response.confidence * 100.0,
            response.provider
        );
    }
    Ok(())
}
