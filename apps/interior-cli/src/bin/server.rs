use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use interior_cli::api::{serve, ApiState};
use interior_cli::bootstrap::{build_engine, build_gateways, init_tracing, load_records};
use interior_core::catalog::CatalogReader;
use interior_core::config::{expand_path, Config};
use interior_vector::ImageIndexer;

#[derive(Debug, Parser)]
#[command(name = "interior-server", about = "HTTP API for interior image search")]
struct Args {
    /// Override server.host
    #[arg(long)]
    host: Option<String>,
    /// Override server.port
    #[arg(long)]
    port: Option<u16>,
    /// Keep vectors in process instead of Qdrant
    #[arg(long)]
    memory: bool,
    /// Analysis JSON file or directory to index at startup
    #[arg(long)]
    seed: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = Config::load()?;
    let settings = config.settings()?;
    tracing::info!(env = config.env_name(), "configuration loaded");

    let gateways = build_gateways(&settings, args.memory)?;
    if let Some(qdrant) = &gateways.qdrant {
        qdrant.ensure_collection().await.context("preparing qdrant collection")?;
    }
    if let Some(seed) = &args.seed {
        let records = load_records(seed)?;
        let stats = ImageIndexer::new(gateways.index.clone(), gateways.embedder.clone())
            .index_records(records)
            .await?;
        tracing::info!(indexed = stats.indexed, skipped = stats.skipped, "seed data indexed");
    }

    let engine = build_engine(&settings, &gateways)?;
    let catalog = CatalogReader::new(expand_path(&settings.catalog.csv_path));
    let state = Arc::new(ApiState::new(
        engine,
        catalog,
        &settings.search,
        Duration::from_secs(settings.server.request_timeout_secs),
    ));

    let host = args.host.unwrap_or(settings.server.host);
    let port = args.port.unwrap_or(settings.server.port);
    let bind: SocketAddr = format!("{host}:{port}").parse().with_context(|| format!("invalid bind address {host}:{port}"))?;
    serve(bind, state).await
}
