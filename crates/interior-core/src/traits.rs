use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Candidate, Filters, ImageMetadata, NamedVectors, Point, WeightVector};

/// Text → fixed-length vector. Implementations own any retry policy.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

/// Multi-named-vector store with metadata filtering.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Weighted multi-vector search, ordered by combined score descending.
    async fn search(
        &self,
        vectors: &NamedVectors,
        weights: &WeightVector,
        filters: &Filters,
        limit: usize,
    ) -> Result<Vec<Candidate>>;

    async fn upsert(&self, points: &[Point]) -> Result<()>;

    /// Payload of the point stored for `image_id`, if any.
    async fn retrieve(&self, image_id: &str) -> Result<Option<ImageMetadata>>;

    /// Up to `limit` payloads in storage order.
    async fn scroll(&self, limit: usize) -> Result<Vec<ImageMetadata>>;
}
