use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use interior_core::config::Settings;
use interior_core::traits::{Embedder, VectorIndex};
use interior_embed::get_default_embedder;
use interior_search::ImageSearchEngine;
use interior_vector::{InMemoryIndex, QdrantIndex};

/// `RUST_LOG` wins; otherwise `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub struct Gateways {
    pub embedder: Arc<dyn Embedder>,
    pub index: Arc<dyn VectorIndex>,
    /// Set when the index is Qdrant, for collection bootstrap.
    pub qdrant: Option<Arc<QdrantIndex>>,
}

pub fn build_gateways(settings: &Settings, in_memory: bool) -> Result<Gateways> {
    let embedder = get_default_embedder(&settings.embedding)?;
    let dim = settings.embedding.dimension;
    if embedder.dim() != dim {
        bail!("embedder produces {} dimensions but embedding.dimension is {dim}", embedder.dim());
    }
    if in_memory {
        tracing::info!(dim, "using in-memory vector index");
        return Ok(Gateways { embedder, index: Arc::new(InMemoryIndex::new(dim)), qdrant: None });
    }
    let qdrant = Arc::new(QdrantIndex::new(&settings.qdrant, dim)?);
    tracing::info!(url = %settings.qdrant.url, collection = %settings.qdrant.collection, "using qdrant vector index");
    Ok(Gateways { embedder, index: qdrant.clone(), qdrant: Some(qdrant) })
}

pub fn build_engine(settings: &Settings, gateways: &Gateways) -> Result<ImageSearchEngine> {
    Ok(ImageSearchEngine::from_settings(gateways.embedder.clone(), gateways.index.clone(), &settings.search)?)
}

/// Analysis records from a JSON file (an array or a single object) or from
/// every `*.json` file under a directory, in path order.
pub fn load_records(path: &Path) -> Result<Vec<Value>> {
    let mut files = Vec::new();
    if path.is_dir() {
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() && entry.path().extension().is_some_and(|e| e == "json") {
                files.push(entry.into_path());
            }
        }
    } else {
        files.push(path.to_path_buf());
    }

    let mut records = Vec::new();
    for file in files {
        let content = fs::read_to_string(&file).with_context(|| format!("reading {}", file.display()))?;
        let value: Value = serde_json::from_str(&content).with_context(|| format!("parsing {}", file.display()))?;
        match value {
            Value::Array(items) => records.extend(items),
            other @ Value::Object(_) => records.push(other),
            _ => tracing::warn!(file = %file.display(), "expected a JSON array or object; skipped"),
        }
    }
    Ok(records)
}
