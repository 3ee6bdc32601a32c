//! Two-tier relevance filter and intent-aware re-ranking.

use interior_core::types::{Candidate, FilterConfig, RankedResult};
use interior_core::{Error, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct RelevanceFilter {
    config: FilterConfig,
}

fn is_exact_match(candidate: &Candidate, intent: Option<&str>) -> bool {
    match (intent, candidate.category()) {
        (Some(intent), Some(category)) => category.trim().to_lowercase() == intent.to_lowercase(),
        _ => false,
    }
}

impl RelevanceFilter {
    pub fn new(config: FilterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Threshold a candidate must reach given the detected intent.
    /// - category matches intent: `exact_match_threshold`
    /// - intent detected, category differs: `high_relevance_threshold`
    /// - no intent: `min_relevance_threshold`
    pub fn threshold_for(&self, candidate: &Candidate, intent: Option<&str>) -> f32 {
        if is_exact_match(candidate, intent) {
            self.config.exact_match_threshold
        } else if intent.is_some() {
            self.config.high_relevance_threshold
        } else {
            self.config.min_relevance_threshold
        }
    }

    /// Filter, put intent matches first (score descending within each group,
    /// stable otherwise) and truncate to `limit`.
    pub fn apply(&self, raw: Vec<Candidate>, intent: Option<String>, limit: usize) -> Result<RankedResult> {
        if limit == 0 {
            return Err(Error::InvalidLimit(0));
        }
        let total = raw.len();
        let mut kept: Vec<(bool, Candidate)> = raw
            .into_iter()
            .filter(|c| c.score >= self.threshold_for(c, intent.as_deref()))
            .map(|c| (is_exact_match(&c, intent.as_deref()), c))
            .collect();
        kept.sort_by(|(a_exact, a), (b_exact, b)| b_exact.cmp(a_exact).then_with(|| b.score.total_cmp(&a.score)));
        kept.truncate(limit);

        let results: Vec<Candidate> = kept.into_iter().map(|(_, c)| c).collect();
        let min_score = results.iter().map(|c| c.score).reduce(f32::min);
        let max_score = results.iter().map(|c| c.score).reduce(f32::max);
        tracing::debug!(raw = total, kept = results.len(), intent = ?intent, "relevance filter applied");
        Ok(RankedResult { results, detected_intent: intent, min_score, max_score })
    }
}
