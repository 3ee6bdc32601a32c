//! OpenAI-compatible `/embeddings` client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use interior_core::config::EmbeddingSettings;
use interior_core::traits::Embedder;
use interior_core::{Error, Result};

const MAX_ERROR_BODY: usize = 300;

pub struct OpenAiEmbedder {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    dim: usize,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: EmbeddingInput<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum EmbeddingInput<'a> {
    Single(&'a str),
    Batch(&'a [String]),
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingResponse {
    pub data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingData {
    #[serde(default)]
    pub index: usize,
    pub embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    pub fn new(settings: &EmbeddingSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::EmbeddingFailure(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", settings.api_base.trim_end_matches('/')),
            api_key: settings.api_key.clone().filter(|k| !k.is_empty()),
            model: settings.model.clone(),
            dim: settings.dimension,
        })
    }

    async fn request(&self, input: EmbeddingInput<'_>, expected: usize) -> Result<Vec<Vec<f32>>> {
        let mut req = self.client.post(&self.endpoint).json(&EmbeddingRequest { model: &self.model, input });
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let response = req
            .send()
            .await
            .map_err(|e| Error::EmbeddingFailure(format!("request to {} failed: {e}", self.endpoint)))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::EmbeddingFailure(format!(
                "provider returned {status}: {}",
                truncate(&body, MAX_ERROR_BODY)
            )));
        }
        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::EmbeddingFailure(format!("malformed provider response: {e}")))?;
        parse_embeddings(body, expected, self.dim)
    }
}

/// Orders embeddings by their `index` and checks count and dimension.
pub fn parse_embeddings(mut body: EmbeddingResponse, expected: usize, dim: usize) -> Result<Vec<Vec<f32>>> {
    if body.data.len() != expected {
        return Err(Error::EmbeddingFailure(format!(
            "expected {expected} embeddings, provider returned {}",
            body.data.len()
        )));
    }
    body.data.sort_by_key(|d| d.index);
    body.data
        .into_iter()
        .map(|d| {
            if d.embedding.len() == dim {
                Ok(d.embedding)
            } else {
                Err(Error::EmbeddingFailure(format!(
                    "expected {dim}-dimensional embedding, got {}",
                    d.embedding.len()
                )))
            }
        })
        .collect()
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        tracing::debug!(model = %self.model, chars = text.len(), "embedding text");
        let mut out = self.request(EmbeddingInput::Single(text), 1).await?;
        out.pop().ok_or_else(|| Error::EmbeddingFailure("provider returned no embedding".into()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        tracing::debug!(model = %self.model, count = texts.len(), "embedding batch");
        self.request(EmbeddingInput::Batch(texts), texts.len()).await
    }
}
