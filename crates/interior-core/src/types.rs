//! Domain types shared by the query builder, the gateways and the formatter.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};

/// Raw point payload as stored in the vector index.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// One of the three independently indexed embedding vectors of an image.
///
/// - `PrimarySearch`: coarse room / theme / regional style
/// - `SemanticDesc`: free-text description and cultural context
/// - `ObjectFocus`: furniture, materials, colors and features
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorField {
    PrimarySearch,
    SemanticDesc,
    ObjectFocus,
}

impl VectorField {
    pub const ALL: [VectorField; 3] = [
        VectorField::PrimarySearch,
        VectorField::SemanticDesc,
        VectorField::ObjectFocus,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            VectorField::PrimarySearch => "primary_search",
            VectorField::SemanticDesc => "semantic_desc",
            VectorField::ObjectFocus => "object_focus",
        }
    }
}

impl fmt::Display for VectorField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query vectors keyed by field; ordered so iteration is deterministic.
pub type NamedVectors = BTreeMap<VectorField, Vec<f32>>;

/// Query text per vector field.
///
/// `text` is the fallback applied to every field that carries no text of its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub primary_search: Option<String>,
    #[serde(default)]
    pub semantic_desc: Option<String>,
    #[serde(default)]
    pub object_focus: Option<String>,
}

impl Query {
    /// A query with only the fallback text set.
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()), ..Self::default() }
    }

    pub fn with_field(mut self, field: VectorField, text: impl Into<String>) -> Self {
        let slot = match field {
            VectorField::PrimarySearch => &mut self.primary_search,
            VectorField::SemanticDesc => &mut self.semantic_desc,
            VectorField::ObjectFocus => &mut self.object_focus,
        };
        *slot = Some(text.into());
        self
    }

    pub fn field(&self, field: VectorField) -> Option<&str> {
        match field {
            VectorField::PrimarySearch => self.primary_search.as_deref(),
            VectorField::SemanticDesc => self.semantic_desc.as_deref(),
            VectorField::ObjectFocus => self.object_focus.as_deref(),
        }
    }

    fn fallback(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// Trimmed text for every field after applying the fallback, in field order.
    /// Fields that resolve to an empty string are omitted.
    pub fn resolve(&self) -> Vec<(VectorField, String)> {
        let fallback = self.fallback();
        VectorField::ALL
            .iter()
            .filter_map(|&field| {
                let own = self.field(field).map(str::trim).filter(|t| !t.is_empty());
                own.or(fallback).map(|t| (field, t.to_string()))
            })
            .collect()
    }

    /// Text used for intent detection: the fallback text when present,
    /// otherwise the non-empty field texts joined in field order.
    pub fn intent_text(&self) -> String {
        if let Some(text) = self.fallback() {
            return text.to_string();
        }
        VectorField::ALL
            .iter()
            .filter_map(|&f| self.field(f).map(str::trim).filter(|t| !t.is_empty()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Weights as supplied by a caller. Unspecified fields weigh 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialWeights {
    #[serde(default)]
    pub primary_search: Option<f32>,
    #[serde(default)]
    pub semantic_desc: Option<f32>,
    #[serde(default)]
    pub object_focus: Option<f32>,
}

/// Effective non-negative per-field weights. They need not sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightVector {
    pub primary_search: f32,
    pub semantic_desc: f32,
    pub object_focus: f32,
}

impl Default for WeightVector {
    fn default() -> Self {
        Self { primary_search: 0.5, semantic_desc: 0.3, object_focus: 0.2 }
    }
}

impl WeightVector {
    pub fn from_partial(partial: &PartialWeights) -> Self {
        Self {
            primary_search: partial.primary_search.unwrap_or(0.0),
            semantic_desc: partial.semantic_desc.unwrap_or(0.0),
            object_focus: partial.object_focus.unwrap_or(0.0),
        }
    }

    pub fn get(&self, field: VectorField) -> f32 {
        match field {
            VectorField::PrimarySearch => self.primary_search,
            VectorField::SemanticDesc => self.semantic_desc,
            VectorField::ObjectFocus => self.object_focus,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (VectorField, f32)> + '_ {
        VectorField::ALL.iter().map(move |&f| (f, self.get(f)))
    }

    /// Rejects negative or non-finite weights.
    pub fn validate(&self) -> Result<()> {
        for (field, weight) in self.iter() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(Error::InvalidQuery(format!(
                    "weight for {field} must be a non-negative number, got {weight}"
                )));
            }
        }
        Ok(())
    }
}

/// A single payload value a filter can match against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatchValue {
    Bool(bool),
    Integer(i64),
    Keyword(String),
}

/// Filter condition for one payload field: an exact value or any of a set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Any(Vec<MatchValue>),
    One(MatchValue),
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::One(MatchValue::Keyword(value.to_string()))
    }
}

impl From<Vec<&str>> for FilterValue {
    fn from(values: Vec<&str>) -> Self {
        FilterValue::Any(values.into_iter().map(|v| MatchValue::Keyword(v.to_string())).collect())
    }
}

/// Payload field name → condition. All conditions must hold.
pub type Filters = BTreeMap<String, FilterValue>;

/// Cultural context recorded for an image by the analysis model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CulturalContext {
    pub traditional_elements: Vec<String>,
    pub modern_adaptations: Vec<String>,
    pub cultural_significance: Option<String>,
}

/// Deserialize `T`, falling back to its default when the value has the wrong shape.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "ignoring mistyped payload field");
        T::default()
    }))
}

/// Typed view of an indexed image payload. Every field is optional; the
/// formatter decides what an absent field renders as. A field of the wrong
/// type reads as absent without affecting the others.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageMetadata {
    #[serde(deserialize_with = "lenient")]
    pub image_id: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub image_url: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub room_type: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub design_theme: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub regional_style: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub space_utilization: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub budget_category: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub space_type: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub functionality: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub colors: Vec<String>,
    #[serde(deserialize_with = "lenient")]
    pub materials: Vec<String>,
    #[serde(deserialize_with = "lenient")]
    pub primary_features: Vec<String>,
    #[serde(deserialize_with = "lenient")]
    pub object_types: Vec<String>,
    #[serde(deserialize_with = "lenient")]
    pub object_features: Vec<String>,
    #[serde(deserialize_with = "lenient")]
    pub search_tags: Vec<String>,
    #[serde(deserialize_with = "lenient")]
    pub indian_specific: CulturalContext,
    #[serde(deserialize_with = "lenient")]
    pub confidence_scores: BTreeMap<String, serde_json::Value>,
    #[serde(deserialize_with = "lenient")]
    pub created_at: Option<String>,
}

impl ImageMetadata {
    /// Lenient conversion: mistyped fields fall back to their defaults, and a
    /// payload that still does not fit yields the default record with the
    /// image id preserved when readable.
    pub fn from_payload(payload: &Payload) -> Self {
        match serde_json::from_value(serde_json::Value::Object(payload.clone())) {
            Ok(meta) => meta,
            Err(e) => {
                tracing::warn!(error = %e, "payload does not match image schema");
                Self {
                    image_id: payload.get("image_id").and_then(|v| v.as_str()).map(str::to_string),
                    ..Self::default()
                }
            }
        }
    }
}

/// One scored item returned by the vector index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub score: f32,
    pub metadata: ImageMetadata,
}

impl Candidate {
    /// Room / category label of the candidate.
    pub fn category(&self) -> Option<&str> {
        self.metadata.room_type.as_deref()
    }
}

/// A point written to the vector index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub id: u64,
    pub vectors: NamedVectors,
    pub payload: Payload,
}

/// Relevance thresholds of the two-tier filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Required score for a candidate whose category differs from the detected intent.
    pub high_relevance_threshold: f32,
    /// Absolute floor when the candidate does not match the detected intent.
    pub min_relevance_threshold: f32,
    /// Required score for a candidate whose category matches the detected intent.
    pub exact_match_threshold: f32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self { high_relevance_threshold: 0.85, min_relevance_threshold: 0.75, exact_match_threshold: 0.70 }
    }
}

impl FilterConfig {
    pub fn validate(&self) -> Result<()> {
        let all = [self.exact_match_threshold, self.min_relevance_threshold, self.high_relevance_threshold];
        if all.iter().any(|t| !(0.0..=1.0).contains(t)) {
            return Err(Error::InvalidConfig(format!("relevance thresholds must lie in [0, 1]: {self:?}")));
        }
        if self.exact_match_threshold > self.min_relevance_threshold
            || self.min_relevance_threshold > self.high_relevance_threshold
        {
            return Err(Error::InvalidConfig(format!(
                "thresholds must satisfy exact ({}) <= min ({}) <= high ({})",
                self.exact_match_threshold, self.min_relevance_threshold, self.high_relevance_threshold
            )));
        }
        Ok(())
    }
}

/// Filtered, re-ranked and truncated search output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub results: Vec<Candidate>,
    pub detected_intent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_score: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_score: Option<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_fills_missing_fields() {
        let q = Query::text("modern bedroom").with_field(VectorField::ObjectFocus, "wooden bed");
        let resolved = q.resolve();
        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved[0], (VectorField::PrimarySearch, "modern bedroom".to_string()));
        assert_eq!(resolved[2], (VectorField::ObjectFocus, "wooden bed".to_string()));
        assert_eq!(q.intent_text(), "modern bedroom");
    }

    #[test]
    fn blank_fields_are_omitted() {
        let q = Query { text: Some("   ".into()), semantic_desc: Some("warm lighting".into()), ..Query::default() };
        assert_eq!(q.resolve(), vec![(VectorField::SemanticDesc, "warm lighting".to_string())]);
        assert!(Query::default().resolve().is_empty());
    }

    #[test]
    fn partial_weights_default_to_zero() {
        let w = WeightVector::from_partial(&PartialWeights { object_focus: Some(0.6), ..PartialWeights::default() });
        assert_eq!(w.get(VectorField::PrimarySearch), 0.0);
        assert_eq!(w.get(VectorField::ObjectFocus), 0.6);
        assert!(WeightVector { primary_search: -0.1, ..w }.validate().is_err());
    }

    #[test]
    fn filter_values_deserialize_untagged() {
        let f: Filters = serde_json::from_str(r#"{"room_type":"bedroom","colors":["white","brown"]}"#).unwrap();
        assert_eq!(f["room_type"], FilterValue::from("bedroom"));
        assert_eq!(f["colors"], FilterValue::from(vec!["white", "brown"]));
    }

    #[test]
    fn threshold_ordering_is_enforced() {
        assert!(FilterConfig::default().validate().is_ok());
        let bad = FilterConfig { exact_match_threshold: 0.8, ..FilterConfig::default() };
        assert!(matches!(bad.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn malformed_payload_keeps_image_id() {
        let payload: Payload = serde_json::from_str(r#"{"image_id":"img_7","colors":"not-a-list"}"#).unwrap();
        let meta = ImageMetadata::from_payload(&payload);
        assert_eq!(meta.image_id.as_deref(), Some("img_7"));
        assert!(meta.colors.is_empty());
    }

    #[test]
    fn mistyped_field_leaves_room_type_intact() {
        let payload: Payload = serde_json::from_str(
            r#"{"image_id":"img_8","room_type":"bedroom","colors":"white","budget_category":3,
                "indian_specific":"none","materials":["teak"]}"#,
        )
        .unwrap();
        let meta = ImageMetadata::from_payload(&payload);
        assert_eq!(meta.room_type.as_deref(), Some("bedroom"));
        assert_eq!(meta.materials, vec!["teak".to_string()]);
        assert!(meta.colors.is_empty());
        assert!(meta.budget_category.is_none());
        assert_eq!(meta.indian_specific, CulturalContext::default());
    }
}
