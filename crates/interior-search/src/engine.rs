use std::sync::Arc;

use interior_core::config::SearchSettings;
use interior_core::traits::{Embedder, VectorIndex};
use interior_core::types::{FilterConfig, Filters, ImageMetadata, PartialWeights, Query, RankedResult, WeightVector};
use interior_core::{Error, Result};

use crate::format::Suggestions;
use crate::intent::IntentDetector;
use crate::query::QueryPlan;
use crate::relevance::RelevanceFilter;

/// Number of points sampled for search suggestions.
pub const SUGGESTION_SAMPLE: usize = 100;

/// Query building, weighted index search and relevance filtering over
/// injected gateways.
pub struct ImageSearchEngine {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    filter: RelevanceFilter,
    intents: IntentDetector,
    default_weights: WeightVector,
    overfetch_factor: usize,
}

impl ImageSearchEngine {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self {
            embedder,
            index,
            filter: RelevanceFilter::default(),
            intents: IntentDetector::default(),
            default_weights: WeightVector::default(),
            overfetch_factor: 3,
        }
    }

    pub fn from_settings(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>, settings: &SearchSettings) -> Result<Self> {
        settings.default_weights.validate().map_err(|e| Error::InvalidConfig(e.to_string()))?;
        Ok(Self::new(embedder, index)
            .with_filter_config(settings.filter_config())?
            .with_default_weights(settings.default_weights)
            .with_overfetch(settings.overfetch_factor))
    }

    pub fn with_filter_config(mut self, config: FilterConfig) -> Result<Self> {
        self.filter = RelevanceFilter::new(config)?;
        Ok(self)
    }

    pub fn with_intents(mut self, intents: IntentDetector) -> Self {
        self.intents = intents;
        self
    }

    pub fn with_default_weights(mut self, weights: WeightVector) -> Self {
        self.default_weights = weights;
        self
    }

    pub fn with_overfetch(mut self, factor: usize) -> Self {
        self.overfetch_factor = factor.max(1);
        self
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// Search for up to `limit` images.
    ///
    /// Argument errors (`InvalidLimit`, `InvalidQuery`) are raised before any
    /// gateway call. Gateway errors propagate unchanged.
    pub async fn search(
        &self,
        query: &Query,
        limit: usize,
        filters: &Filters,
        weights: Option<&PartialWeights>,
    ) -> Result<RankedResult> {
        if limit == 0 {
            return Err(Error::InvalidLimit(0));
        }
        let plan = QueryPlan::new(query, weights, self.default_weights)?;
        let intent = self.intents.detect(&query.intent_text()).map(str::to_string);

        let vectors = plan.embed(self.embedder.as_ref()).await?;
        let fetch = limit.saturating_mul(self.overfetch_factor);
        let raw = self.index.search(&vectors, &plan.weights, filters, fetch).await?;
        tracing::debug!(limit, fetch, raw = raw.len(), intent = ?intent, "index returned candidates");

        self.filter.apply(raw, intent, limit)
    }

    pub async fn get_image(&self, image_id: &str) -> Result<ImageMetadata> {
        self.index
            .retrieve(image_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("image '{image_id}'")))
    }

    pub async fn suggestions(&self) -> Result<Suggestions> {
        let sample = self.index.scroll(SUGGESTION_SAMPLE).await?;
        Ok(Suggestions::from_sample(&sample))
    }
}
