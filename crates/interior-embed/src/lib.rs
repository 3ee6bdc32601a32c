//! interior-embed
//!
//! Embedding Gateway implementations. `OpenAiEmbedder` calls a remote
//! OpenAI-compatible API; `FakeEmbedder` is deterministic and offline.
//! Set `APP_USE_FAKE_EMBEDDINGS=1` (or `embedding.use_fake`) to select the fake.

pub mod fake;
pub mod openai;

use std::sync::Arc;

use interior_core::config::EmbeddingSettings;
use interior_core::traits::Embedder;
use interior_core::Result;

pub use fake::FakeEmbedder;
pub use openai::OpenAiEmbedder;

fn fake_requested_by_env() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

pub fn get_default_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    if settings.use_fake || fake_requested_by_env() {
        tracing::info!(dim = settings.dimension, "using FakeEmbedder");
        return Ok(Arc::new(FakeEmbedder::new(settings.dimension)));
    }
    tracing::info!(model = %settings.model, api_base = %settings.api_base, "using OpenAI-compatible embedder");
    Ok(Arc::new(OpenAiEmbedder::new(settings)?))
}
