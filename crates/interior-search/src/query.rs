//! Multi-vector query building: resolve per-field texts and weights, then
//! embed each distinct text once.

use futures::future::try_join_all;

use interior_core::traits::Embedder;
use interior_core::types::{NamedVectors, PartialWeights, Query, VectorField, WeightVector};
use interior_core::{Error, Result};

/// Validated texts and effective weights for one search. Building a plan
/// performs no I/O.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub texts: Vec<(VectorField, String)>,
    pub weights: WeightVector,
}

impl QueryPlan {
    /// `weights == None` selects `defaults`; explicit weights leave
    /// unspecified fields at 0.
    pub fn new(query: &Query, weights: Option<&PartialWeights>, defaults: WeightVector) -> Result<Self> {
        let texts = query.resolve();
        if texts.is_empty() {
            return Err(Error::InvalidQuery("query must contain non-empty text".into()));
        }
        let weights = weights.map_or(defaults, WeightVector::from_partial);
        weights.validate()?;
        if texts.iter().all(|(field, _)| weights.get(*field) == 0.0) {
            return Err(Error::InvalidQuery("every queried field has weight 0".into()));
        }
        Ok(Self { texts, weights })
    }

    /// Distinct texts in first-seen field order.
    pub fn distinct_texts(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::with_capacity(self.texts.len());
        for (_, text) in &self.texts {
            if !out.contains(&text.as_str()) {
                out.push(text);
            }
        }
        out
    }

    /// Embed every distinct text concurrently and map the vectors back onto
    /// their fields. The first failure cancels the remaining calls.
    pub async fn embed(&self, embedder: &dyn Embedder) -> Result<NamedVectors> {
        let distinct = self.distinct_texts();
        let embeddings = try_join_all(distinct.iter().map(|text| embedder.embed(text))).await?;
        let mut vectors = NamedVectors::new();
        for (field, text) in &self.texts {
            let slot = distinct.iter().position(|t| t == text).unwrap_or_default();
            if let Some(v) = embeddings.get(slot) {
                vectors.insert(*field, v.clone());
            }
        }
        tracing::debug!(fields = vectors.len(), embed_calls = distinct.len(), "query vectors built");
        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_text_is_deduplicated() {
        let plan = QueryPlan::new(&Query::text("modern bedroom"), None, WeightVector::default()).unwrap();
        assert_eq!(plan.texts.len(), 3);
        assert_eq!(plan.distinct_texts(), vec!["modern bedroom"]);
    }

    #[test]
    fn explicit_weights_zero_the_rest() {
        let q = Query::text("teak").with_field(VectorField::ObjectFocus, "teak wood chair");
        let w = PartialWeights { object_focus: Some(1.0), ..PartialWeights::default() };
        let plan = QueryPlan::new(&q, Some(&w), WeightVector::default()).unwrap();
        assert_eq!(plan.weights.primary_search, 0.0);
        assert_eq!(plan.distinct_texts(), vec!["teak", "teak wood chair"]);
    }

    #[test]
    fn empty_or_unweighted_queries_fail() {
        assert!(matches!(QueryPlan::new(&Query::default(), None, WeightVector::default()), Err(Error::InvalidQuery(_))));
        let q = Query::default().with_field(VectorField::SemanticDesc, "calm");
        let w = PartialWeights { primary_search: Some(1.0), ..PartialWeights::default() };
        assert!(matches!(QueryPlan::new(&q, Some(&w), WeightVector::default()), Err(Error::InvalidQuery(_))));
        let neg = PartialWeights { semantic_desc: Some(-1.0), ..PartialWeights::default() };
        assert!(matches!(QueryPlan::new(&q, Some(&neg), WeightVector::default()), Err(Error::InvalidQuery(_))));
    }
}
