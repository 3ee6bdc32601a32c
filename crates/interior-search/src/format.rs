//! Response shapes for search hits and suggestions.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use interior_core::types::{Candidate, ImageMetadata, RankedResult};

/// Rendered in place of an absent scalar field.
pub const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagGroups {
    pub colors: Vec<String>,
    pub materials: Vec<String>,
    pub features: Vec<String>,
    pub objects: Vec<String>,
    pub search: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CulturalContextView {
    pub traditional_elements: Vec<String>,
    pub modern_adaptations: Vec<String>,
    pub cultural_significance: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageHit {
    pub image_id: String,
    pub image_url: String,
    pub score: f32,
    pub room_type: String,
    pub design_theme: String,
    pub regional_style: String,
    pub budget_category: String,
    pub space_type: String,
    pub tags: TagGroups,
    pub cultural_context: CulturalContextView,
    pub confidence: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<ImageHit>,
    pub total: usize,
    pub detected_intent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_score: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_score: Option<f32>,
}

fn or_unknown(v: Option<&String>) -> String {
    v.map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .unwrap_or(UNKNOWN)
        .to_string()
}

pub fn format_candidate(candidate: &Candidate) -> ImageHit {
    let m = &candidate.metadata;
    let image_id = m.image_id.clone().filter(|s| !s.is_empty()).unwrap_or_else(|| candidate.id.clone());
    ImageHit {
        image_id,
        image_url: or_unknown(m.image_url.as_ref()),
        score: candidate.score,
        room_type: or_unknown(m.room_type.as_ref()),
        design_theme: or_unknown(m.design_theme.as_ref()),
        regional_style: or_unknown(m.regional_style.as_ref()),
        budget_category: or_unknown(m.budget_category.as_ref()),
        space_type: or_unknown(m.space_type.as_ref()),
        tags: TagGroups {
            colors: m.colors.clone(),
            materials: m.materials.clone(),
            features: m.primary_features.clone(),
            objects: m.object_types.clone(),
            search: m.search_tags.clone(),
        },
        cultural_context: CulturalContextView {
            traditional_elements: m.indian_specific.traditional_elements.clone(),
            modern_adaptations: m.indian_specific.modern_adaptations.clone(),
            cultural_significance: or_unknown(m.indian_specific.cultural_significance.as_ref()),
        },
        // non-numeric confidence entries are dropped
        confidence: m
            .confidence_scores
            .iter()
            .filter_map(|(k, v)| v.as_f64().map(|f| (k.clone(), f)))
            .collect(),
    }
}

pub fn format_ranked(ranked: &RankedResult) -> SearchResponse {
    let results: Vec<ImageHit> = ranked.results.iter().map(format_candidate).collect();
    SearchResponse {
        total: results.len(),
        results,
        detected_intent: ranked.detected_intent.clone(),
        min_score: ranked.min_score,
        max_score: ranked.max_score,
    }
}

/// Distinct filter values observed in a sample of indexed images.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Suggestions {
    pub room_types: Vec<String>,
    pub design_themes: Vec<String>,
    pub budget_categories: Vec<String>,
    pub space_types: Vec<String>,
}

impl Suggestions {
    pub fn from_sample(sample: &[ImageMetadata]) -> Self {
        fn distinct<'a>(values: impl Iterator<Item = &'a Option<String>>) -> Vec<String> {
            values
                .flatten()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        }
        Self {
            room_types: distinct(sample.iter().map(|m| &m.room_type)),
            design_themes: distinct(sample.iter().map(|m| &m.design_theme)),
            budget_categories: distinct(sample.iter().map(|m| &m.budget_category)),
            space_types: distinct(sample.iter().map(|m| &m.space_type)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_fields_render_as_defaults() {
        let hit = format_candidate(&Candidate { id: "42".into(), score: 0.8, metadata: ImageMetadata::default() });
        assert_eq!(hit.image_id, "42");
        assert_eq!(hit.room_type, UNKNOWN);
        assert_eq!(hit.cultural_context.cultural_significance, UNKNOWN);
        assert!(hit.tags.colors.is_empty());
        assert!(hit.confidence.is_empty());
    }

    #[test]
    fn tags_and_confidence_are_grouped() {
        let mut meta = ImageMetadata {
            image_id: Some("img_9".into()),
            room_type: Some("kitchen".into()),
            colors: vec!["white".into()],
            object_types: vec!["stove".into()],
            ..ImageMetadata::default()
        };
        meta.confidence_scores.insert("room".into(), json!(0.93));
        meta.confidence_scores.insert("note".into(), json!("n/a"));
        let hit = format_candidate(&Candidate { id: "1".into(), score: 0.9, metadata: meta });
        assert_eq!(hit.image_id, "img_9");
        assert_eq!(hit.tags.objects, vec!["stove"]);
        assert_eq!(hit.confidence.len(), 1);
        assert!((hit.confidence["room"] - 0.93).abs() < 1e-9);
    }

    #[test]
    fn suggestions_are_distinct_and_sorted() {
        let sample = vec![
            ImageMetadata { room_type: Some("kitchen".into()), design_theme: Some("modern".into()), ..ImageMetadata::default() },
            ImageMetadata { room_type: Some("bedroom".into()), design_theme: Some("modern".into()), ..ImageMetadata::default() },
            ImageMetadata { room_type: Some(String::new()), ..ImageMetadata::default() },
        ];
        let s = Suggestions::from_sample(&sample);
        assert_eq!(s.room_types, vec!["bedroom", "kitchen"]);
        assert_eq!(s.design_themes, vec!["modern"]);
        assert!(s.space_types.is_empty());
    }
}
