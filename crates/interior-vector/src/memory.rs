//! In-process index with exact cosine scoring. Used by tests and by the
//! server when no Qdrant instance is configured.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use interior_core::traits::VectorIndex;
use interior_core::types::{Candidate, Filters, ImageMetadata, NamedVectors, Point, VectorField, WeightVector};
use interior_core::{Error, Result};

use crate::filter::{matches_payload, validate_filters};
use crate::schema::point_id;

pub struct InMemoryIndex {
    dim: usize,
    points: RwLock<BTreeMap<u64, Point>>,
}

impl InMemoryIndex {
    pub fn new(dim: usize) -> Self {
        Self { dim, points: RwLock::new(BTreeMap::new()) }
    }

    pub async fn len(&self) -> usize {
        self.points.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.points.read().await.is_empty()
    }

    fn check_dim(&self, field: VectorField, v: &[f32]) -> Result<()> {
        if v.len() == self.dim {
            Ok(())
        } else {
            Err(Error::InvalidQuery(format!("{field} vector has {} dimensions, expected {}", v.len(), self.dim)))
        }
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    (dot / (na * nb)).clamp(0.0, 1.0)
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn search(
        &self,
        vectors: &NamedVectors,
        weights: &WeightVector,
        filters: &Filters,
        limit: usize,
    ) -> Result<Vec<Candidate>> {
        validate_filters(filters)?;
        let fields: Vec<(VectorField, &Vec<f32>, f32)> = vectors
            .iter()
            .map(|(f, v)| (*f, v, weights.get(*f)))
            .filter(|(_, _, w)| *w > 0.0)
            .collect();
        for (field, v, _) in &fields {
            self.check_dim(*field, v)?;
        }
        let total: f32 = fields.iter().map(|(_, _, w)| w).sum();
        if total <= 0.0 || limit == 0 {
            return Ok(Vec::new());
        }

        let points = self.points.read().await;
        let mut scored: Vec<(String, f32, &Point)> = points
            .values()
            .filter(|p| matches_payload(filters, &p.payload))
            .map(|p| {
                let score: f32 = fields
                    .iter()
                    .map(|(field, q, w)| p.vectors.get(field).map_or(0.0, |v| w * cosine(q, v)))
                    .sum::<f32>()
                    / total;
                (p.id.to_string(), score, p)
            })
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        scored.truncate(limit);
        Ok(scored.into_iter().map(|(id, score, p)| crate::to_candidate(id, score, &p.payload)).collect())
    }

    async fn upsert(&self, points: &[Point]) -> Result<()> {
        for p in points {
            for (field, v) in &p.vectors {
                self.check_dim(*field, v)?;
            }
        }
        let mut store = self.points.write().await;
        for p in points {
            store.insert(p.id, p.clone());
        }
        tracing::debug!(count = points.len(), total = store.len(), "upserted points in memory");
        Ok(())
    }

    async fn retrieve(&self, image_id: &str) -> Result<Option<ImageMetadata>> {
        let store = self.points.read().await;
        Ok(store.get(&point_id(image_id)).map(|p| ImageMetadata::from_payload(&p.payload)))
    }

    async fn scroll(&self, limit: usize) -> Result<Vec<ImageMetadata>> {
        let store = self.points.read().await;
        Ok(store.values().take(limit).map(|p| ImageMetadata::from_payload(&p.payload)).collect())
    }
}
