use clap::Parser;

use interior_cli::bootstrap::{build_engine, build_gateways, init_tracing};
use interior_core::config::Config;
use interior_core::types::{Filters, FilterValue, PartialWeights, Query, VectorField};
use interior_search::format_ranked;

#[derive(Debug, Parser)]
#[command(name = "interior-search", about = "Run one image search and print the results")]
struct Args {
    /// Query text, used for every field without its own text
    query: Option<String>,
    #[arg(long)]
    primary: Option<String>,
    #[arg(long)]
    semantic: Option<String>,
    #[arg(long)]
    object: Option<String>,
    #[arg(short, long, default_value_t = 10)]
    limit: usize,
    /// Payload filter as key=value; repeatable
    #[arg(long = "filter", value_name = "KEY=VALUE")]
    filters: Vec<String>,
    /// Weights for primary,semantic,object, e.g. 0.6,0.2,0.2
    #[arg(long, value_delimiter = ',', num_args = 3)]
    weights: Option<Vec<f32>>,
    /// Print the raw JSON response
    #[arg(long)]
    json: bool,
}

fn parse_filters(raw: &[String]) -> anyhow::Result<Filters> {
    let mut filters = Filters::new();
    for item in raw {
        let Some((key, value)) = item.split_once('=') else {
            anyhow::bail!("filter '{item}' must look like key=value");
        };
        filters.insert(key.trim().to_string(), FilterValue::from(value.trim()));
    }
    Ok(filters)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    let settings = Config::load()?.settings()?;

    let mut query = Query { text: args.query.clone(), ..Query::default() };
    for (field, text) in [
        (VectorField::PrimarySearch, &args.primary),
        (VectorField::SemanticDesc, &args.semantic),
        (VectorField::ObjectFocus, &args.object),
    ] {
        if let Some(text) = text {
            query = query.with_field(field, text.clone());
        }
    }
    let weights = args.weights.as_ref().map(|w| PartialWeights {
        primary_search: w.first().copied(),
        semantic_desc: w.get(1).copied(),
        object_focus: w.get(2).copied(),
    });
    let filters = parse_filters(&args.filters)?;

    let gateways = build_gateways(&settings, false)?;
    let engine = build_engine(&settings, &gateways)?;
    let ranked = engine.search(&query, args.limit, &filters, weights.as_ref()).await?;
    let response = format_ranked(&ranked);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }
    println!("Query: {}", query.intent_text());
    println!("Detected intent: {}", response.detected_intent.as_deref().unwrap_or("none"));
    println!("Found {} results", response.total);
    for (i, hit) in response.results.iter().enumerate() {
        println!("\n  {}. score={:.4}  id={}  room={}  theme={}", i + 1, hit.score, hit.image_id, hit.room_type, hit.design_theme);
        println!("     url: {}", hit.image_url);
        if !hit.tags.search.is_empty() {
            println!("     tags: {}", hit.tags.search.join(", "));
        }
    }
    Ok(())
}
