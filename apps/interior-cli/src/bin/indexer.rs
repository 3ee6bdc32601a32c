use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

use interior_cli::bootstrap::{build_gateways, init_tracing, load_records};
use interior_core::config::{expand_path, Config};
use interior_vector::ImageIndexer;

#[derive(Debug, Parser)]
#[command(name = "interior-indexer", about = "Index image-analysis records into the vector store")]
struct Args {
    /// JSON file (array of records) or a directory of *.json files
    input: PathBuf,
    /// Records embedded and upserted per request
    #[arg(long, default_value_t = 10)]
    batch_size: usize,
    /// Stop after this many records
    #[arg(long)]
    limit: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    let settings = Config::load()?.settings()?;

    let input = expand_path(args.input.to_string_lossy());
    let mut records = load_records(&input).with_context(|| format!("loading {}", input.display()))?;
    if let Some(limit) = args.limit {
        records.truncate(limit);
    }
    println!("Interior image indexer\n======================");
    println!("Input: {} ({} records)", input.display(), records.len());

    let gateways = build_gateways(&settings, false)?;
    if let Some(qdrant) = &gateways.qdrant {
        if qdrant.ensure_collection().await? {
            println!("Created collection '{}'", qdrant.collection());
        }
    }
    let stats = ImageIndexer::new(gateways.index.clone(), gateways.embedder.clone())
        .with_batch_size(args.batch_size)
        .index_records(records)
        .await?;

    println!("\nIndexed {} images, skipped {}", stats.indexed, stats.skipped);
    Ok(())
}
