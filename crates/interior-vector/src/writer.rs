//! Ingestion: turns image-analysis records into three-vector points and
//! writes them to the index in batches.

use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;

use interior_core::analysis::ImageAnalysis;
use interior_core::traits::{Embedder, VectorIndex};
use interior_core::types::{NamedVectors, Payload, Point, VectorField};
use interior_core::{Error, Result};

use crate::schema::point_id;

/// A record ready for embedding: the text per vector field and the payload.
#[derive(Debug, Clone)]
pub struct PreparedPoint {
    pub image_id: String,
    pub texts: Vec<(VectorField, String)>,
    pub payload: Payload,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub indexed: usize,
    pub skipped: usize,
}

fn join_lower<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn lower_all(items: &[String]) -> Vec<String> {
    items.iter().map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty()).collect()
}

/// Embedding text for each of the three vectors.
pub fn field_texts(a: &ImageAnalysis) -> Vec<(VectorField, String)> {
    let tags = &a.ai_generated_tags;
    let ctx = &tags.indian_context;
    let primary = join_lower([
        tags.room.as_str(),
        tags.theme.as_str(),
        ctx.regional_style.as_str(),
        ctx.space_utilization.as_str(),
    ]);
    let semantic = join_lower(
        [a.description.as_str(), ctx.cultural_significance.as_str()]
            .into_iter()
            .chain(ctx.modern_adaptations.iter().map(String::as_str)),
    );
    let object = join_lower(
        tags.objects
            .iter()
            .map(|o| o.kind.as_str())
            .chain(tags.objects.iter().flat_map(|o| o.features.iter().map(String::as_str)))
            .chain(tags.visual_attributes.materials.iter().map(String::as_str))
            .chain(tags.primary_features.iter().map(String::as_str))
            .chain(tags.visual_attributes.colors.iter().map(String::as_str)),
    );
    vec![
        (VectorField::PrimarySearch, primary),
        (VectorField::SemanticDesc, semantic),
        (VectorField::ObjectFocus, object),
    ]
}

/// Lower-cased, de-duplicated tags in first-seen order.
pub fn search_tags(a: &ImageAnalysis) -> Vec<String> {
    let tags = &a.ai_generated_tags;
    let candidates = [tags.room.as_str(), tags.theme.as_str(), tags.indian_context.space_utilization.as_str()]
        .into_iter()
        .chain(tags.visual_attributes.colors.iter().map(String::as_str))
        .chain(tags.visual_attributes.materials.iter().map(String::as_str))
        .chain(tags.primary_features.iter().map(String::as_str))
        .chain(tags.objects.iter().map(|o| o.kind.as_str()))
        .chain(tags.objects.iter().flat_map(|o| o.features.iter().map(String::as_str)))
        .chain(a.metadata.tags.iter().map(String::as_str));
    let mut seen = HashSet::new();
    candidates
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}

/// Build the stored point for one record. `raw` is kept verbatim under
/// `original_analysis`.
pub fn prepare(a: &ImageAnalysis, raw: Value, created_at: &str) -> Result<PreparedPoint> {
    let image_id = a.image_id.trim();
    if image_id.is_empty() {
        return Err(Error::Catalog("analysis record has an empty image_id".into()));
    }
    let texts = field_texts(a);
    if texts.iter().all(|(_, t)| t.is_empty()) {
        return Err(Error::Catalog(format!("analysis record {image_id} has no text to embed")));
    }
    let tags = &a.ai_generated_tags;
    let ctx = &tags.indian_context;
    let embedding_texts: serde_json::Map<String, Value> =
        texts.iter().map(|(f, t)| (f.as_str().to_string(), json!(t))).collect();

    let payload = json!({
        "image_id": image_id,
        "image_url": a.image_url,
        "embedding_texts": embedding_texts,
        "room_type": tags.room.trim().to_lowercase(),
        "design_theme": tags.theme.trim().to_lowercase(),
        "regional_style": ctx.regional_style.trim().to_lowercase(),
        "space_utilization": ctx.space_utilization.trim().to_lowercase(),
        "colors": lower_all(&tags.visual_attributes.colors),
        "materials": lower_all(&tags.visual_attributes.materials),
        "primary_features": lower_all(&tags.primary_features),
        "object_types": tags.objects.iter().map(|o| o.kind.trim().to_lowercase()).filter(|s| !s.is_empty()).collect::<Vec<_>>(),
        "object_features": tags.objects.iter().flat_map(|o| lower_all(&o.features)).collect::<Vec<_>>(),
        "confidence_scores": a.confidence_scores,
        "budget_category": a.metadata.budget_indicator.trim().to_lowercase(),
        "space_type": a.metadata.space_type.trim().to_lowercase(),
        "functionality": a.metadata.functionality.trim().to_lowercase(),
        "search_tags": search_tags(a),
        "indian_specific": {
            "traditional_elements": ctx.traditional_elements,
            "modern_adaptations": ctx.modern_adaptations,
            "cultural_significance": ctx.cultural_significance,
        },
        "original_analysis": raw,
        "created_at": created_at,
    });
    let Value::Object(payload) = payload else {
        return Err(Error::Catalog("payload must be a JSON object".into()));
    };
    Ok(PreparedPoint {
        image_id: image_id.to_string(),
        texts: texts.into_iter().filter(|(_, t)| !t.is_empty()).collect(),
        payload,
    })
}

pub struct ImageIndexer {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
}

impl ImageIndexer {
    pub fn new(index: Arc<dyn VectorIndex>, embedder: Arc<dyn Embedder>) -> Self {
        Self { index, embedder, batch_size: 10 }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Index raw analysis records. Records that do not parse or carry no
    /// text are logged and skipped; embedding and index failures abort.
    pub async fn index_records(&self, records: Vec<Value>) -> Result<IndexStats> {
        let mut stats = IndexStats::default();
        if records.is_empty() {
            tracing::info!("no analysis records to index");
            return Ok(stats);
        }
        let created_at = chrono::Utc::now().to_rfc3339();
        let mut prepared = Vec::with_capacity(records.len());
        for raw in records {
            let outcome = serde_json::from_value::<ImageAnalysis>(raw.clone())
                .map_err(|e| Error::Catalog(format!("malformed analysis record: {e}")))
                .and_then(|a| prepare(&a, raw, &created_at));
            match outcome {
                Ok(p) => prepared.push(p),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping analysis record");
                    stats.skipped += 1;
                }
            }
        }

        let pb = ProgressBar::new(prepared.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} images ({percent}%) {msg}")
                .map(|s| s.progress_chars("#>-"))
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        for batch in prepared.chunks(self.batch_size) {
            let points = self.embed_batch(batch).await?;
            self.index.upsert(&points).await?;
            stats.indexed += points.len();
            pb.set_position(stats.indexed as u64);
            pb.set_message(format!("batch of {}", points.len()));
        }
        pb.finish_with_message("indexing complete");
        tracing::info!(indexed = stats.indexed, skipped = stats.skipped, "indexing finished");
        Ok(stats)
    }

    async fn embed_batch(&self, batch: &[PreparedPoint]) -> Result<Vec<Point>> {
        let texts: Vec<String> = batch.iter().flat_map(|p| p.texts.iter().map(|(_, t)| t.clone())).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != texts.len() {
            return Err(Error::EmbeddingFailure(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                embeddings.len()
            )));
        }
        let mut embeddings = embeddings.into_iter();
        let mut points = Vec::with_capacity(batch.len());
        for p in batch {
            let vectors: NamedVectors = p.texts.iter().map(|(f, _)| *f).zip(embeddings.by_ref()).collect();
            points.push(Point { id: point_id(&p.image_id), vectors, payload: p.payload.clone() });
        }
        Ok(points)
    }
}
