//! Qdrant REST gateway.
//!
//! Weighted multi-vector search is one `search/batch` request with a search
//! per positively weighted named vector; scores are fused client-side (see
//! `fusion`).

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;

use interior_core::config::QdrantSettings;
use interior_core::traits::VectorIndex;
use interior_core::types::{Candidate, Filters, ImageMetadata, NamedVectors, Payload, Point, VectorField, WeightVector};
use interior_core::{Error, Result};

use crate::filter::to_qdrant_filter;
use crate::fusion::{fuse, FieldHit};
use crate::schema::{collection_config, point_id, KEYWORD_INDEX_FIELDS};

pub struct QdrantIndex {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    collection: String,
    dim: usize,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    status: ErrorStatus,
}

#[derive(Debug, Deserialize)]
struct ErrorStatus {
    error: String,
}

/// Qdrant point ids are unsigned integers or UUID strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PointIdValue {
    Num(u64),
    Uuid(String),
}

impl fmt::Display for PointIdValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointIdValue::Num(n) => write!(f, "{n}"),
            PointIdValue::Uuid(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ScoredPoint {
    pub id: PointIdValue,
    pub score: f32,
    #[serde(default)]
    pub payload: Option<Payload>,
}

#[derive(Debug, Deserialize)]
pub struct Record {
    pub id: PointIdValue,
    #[serde(default)]
    pub payload: Option<Payload>,
}

#[derive(Debug, Deserialize)]
struct ScrollResult {
    points: Vec<Record>,
}

#[derive(Debug, Deserialize)]
struct CollectionsResult {
    collections: Vec<CollectionDescription>,
}

#[derive(Debug, Deserialize)]
struct CollectionDescription {
    name: String,
}

impl QdrantIndex {
    pub fn new(settings: &QdrantSettings, dim: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::IndexUnavailable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: settings.url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone().filter(|k| !k.is_empty()),
            collection: settings.collection.clone(),
            dim,
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn collection_url(&self, path: &str) -> String {
        format!("{}/collections/{}{}", self.base_url, self.collection, path)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let req = self.client.request(method, url);
        match &self.api_key {
            Some(key) => req.header("api-key", key),
            None => req,
        }
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder, filtered: bool) -> Result<T> {
        let response = req
            .send()
            .await
            .map_err(|e| Error::IndexUnavailable(format!("request to {} failed: {e}", self.base_url)))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.status.error)
                .unwrap_or(body);
            return Err(if filtered && status == StatusCode::BAD_REQUEST {
                Error::InvalidFilter(message)
            } else {
                Error::IndexUnavailable(format!("qdrant returned {status}: {message}"))
            });
        }
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| Error::IndexUnavailable(format!("malformed qdrant response: {e}")))?;
        Ok(envelope.result)
    }

    /// Create the collection and its payload indexes when missing.
    /// Returns `true` when the collection was created.
    pub async fn ensure_collection(&self) -> Result<bool> {
        let url = format!("{}/collections", self.base_url);
        let existing: CollectionsResult = self.send(self.request(Method::GET, &url), false).await?;
        if existing.collections.iter().any(|c| c.name == self.collection) {
            tracing::info!(collection = %self.collection, "collection already exists");
            return Ok(false);
        }
        let _: Value = self
            .send(self.request(Method::PUT, &self.collection_url("")).json(&collection_config(self.dim)), false)
            .await?;
        for field in KEYWORD_INDEX_FIELDS {
            let body = json!({ "field_name": field, "field_schema": "keyword" });
            let req = self.request(Method::PUT, &self.collection_url("/index")).json(&body);
            if let Err(e) = self.send::<Value>(req, false).await {
                tracing::warn!(field, error = %e, "payload index not created");
            }
        }
        tracing::info!(collection = %self.collection, dim = self.dim, "collection created");
        Ok(true)
    }

    fn check_dim(&self, field: VectorField, v: &[f32]) -> Result<()> {
        if v.len() == self.dim {
            Ok(())
        } else {
            Err(Error::InvalidQuery(format!("{field} vector has {} dimensions, expected {}", v.len(), self.dim)))
        }
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn search(
        &self,
        vectors: &NamedVectors,
        weights: &WeightVector,
        filters: &Filters,
        limit: usize,
    ) -> Result<Vec<Candidate>> {
        let filter = to_qdrant_filter(filters)?;
        let fields: Vec<(VectorField, &Vec<f32>)> =
            vectors.iter().filter(|(f, _)| weights.get(**f) > 0.0).map(|(f, v)| (*f, v)).collect();
        if fields.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let mut searches = Vec::with_capacity(fields.len());
        for (field, vector) in &fields {
            self.check_dim(*field, vector)?;
            let mut search = json!({
                "vector": { "name": field.as_str(), "vector": vector },
                "limit": limit,
                "with_payload": true,
                "with_vector": false,
            });
            if let Some(filter) = &filter {
                search["filter"] = filter.clone();
            }
            searches.push(search);
        }

        let req = self
            .request(Method::POST, &self.collection_url("/points/search/batch"))
            .json(&json!({ "searches": searches }));
        let batches: Vec<Vec<ScoredPoint>> = self.send(req, filter.is_some()).await?;
        if batches.len() != fields.len() {
            return Err(Error::IndexUnavailable(format!(
                "qdrant answered {} of {} searches",
                batches.len(),
                fields.len()
            )));
        }

        let per_field = fields
            .into_iter()
            .zip(batches)
            .map(|((field, _), points)| {
                let hits = points
                    .into_iter()
                    .map(|p| FieldHit {
                        point_id: p.id.to_string(),
                        score: p.score.clamp(0.0, 1.0),
                        payload: p.payload.unwrap_or_default(),
                    })
                    .collect();
                (field, hits)
            })
            .collect();
        let fused = fuse(per_field, weights, limit);
        tracing::debug!(collection = %self.collection, hits = fused.len(), "qdrant search complete");
        Ok(fused.into_iter().map(|h| crate::to_candidate(h.point_id, h.score, &h.payload)).collect())
    }

    async fn upsert(&self, points: &[Point]) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }
        let mut body = Vec::with_capacity(points.len());
        for p in points {
            let mut named = serde_json::Map::new();
            for (field, v) in &p.vectors {
                self.check_dim(*field, v)?;
                named.insert(field.as_str().to_string(), json!(v));
            }
            body.push(json!({ "id": p.id, "vector": named, "payload": p.payload }));
        }
        let req = self
            .request(Method::PUT, &self.collection_url("/points"))
            .query(&[("wait", "true")])
            .json(&json!({ "points": body }));
        let _: Value = self.send(req, false).await?;
        tracing::info!(count = points.len(), collection = %self.collection, "upserted points");
        Ok(())
    }

    async fn retrieve(&self, image_id: &str) -> Result<Option<ImageMetadata>> {
        let body = json!({ "ids": [point_id(image_id)], "with_payload": true, "with_vector": false });
        let req = self.request(Method::POST, &self.collection_url("/points")).json(&body);
        let records: Vec<Record> = self.send(req, false).await?;
        Ok(records.into_iter().next().map(|r| ImageMetadata::from_payload(&r.payload.unwrap_or_default())))
    }

    async fn scroll(&self, limit: usize) -> Result<Vec<ImageMetadata>> {
        let body = json!({ "limit": limit, "with_payload": true, "with_vector": false });
        let req = self.request(Method::POST, &self.collection_url("/points/scroll")).json(&body);
        let page: ScrollResult = self.send(req, false).await?;
        Ok(page
            .points
            .into_iter()
            .map(|r| ImageMetadata::from_payload(&r.payload.unwrap_or_default()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_search_response_parses() {
        let body = r#"{"result":[[{"id":42,"version":1,"score":0.91,"payload":{"image_id":"img_1","room_type":"bedroom"}}],
                                [{"id":"5c56c793-69f3-4fbf-87e6-c4bf54c28c26","version":3,"score":0.4}]],
                       "status":"ok","time":0.002}"#;
        let env: Envelope<Vec<Vec<ScoredPoint>>> = serde_json::from_str(body).unwrap();
        assert_eq!(env.result[0][0].id.to_string(), "42");
        assert_eq!(env.result[1][0].id.to_string(), "5c56c793-69f3-4fbf-87e6-c4bf54c28c26");
        assert!(env.result[1][0].payload.is_none());
    }

    #[test]
    fn error_envelope_parses() {
        let e: ErrorEnvelope =
            serde_json::from_str(r#"{"status":{"error":"Bad request: wrong filter"},"time":0.0}"#).unwrap();
        assert_eq!(e.status.error, "Bad request: wrong filter");
    }

    #[test]
    fn urls_are_built_from_trimmed_base() {
        let settings = QdrantSettings { url: "http://localhost:6333/".into(), ..QdrantSettings::default() };
        let index = QdrantIndex::new(&settings, 4).unwrap();
        assert_eq!(
            index.collection_url("/points/search/batch"),
            "http://localhost:6333/collections/interior_images/points/search/batch"
        );
    }

    #[tokio::test]
    async fn wrong_dimension_fails_before_any_request() {
        let index = QdrantIndex::new(&QdrantSettings { url: "http://127.0.0.1:9".into(), ..QdrantSettings::default() }, 4)
            .unwrap();
        let mut vectors = NamedVectors::new();
        vectors.insert(VectorField::PrimarySearch, vec![0.0; 3]);
        let err = index.search(&vectors, &WeightVector::default(), &Filters::new(), 5).await.unwrap_err();
        assert!(matches!(err, Error::InvalidQuery(_)));
    }
}
