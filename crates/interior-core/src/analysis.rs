//! Image-analysis records produced by the vision model and consumed by ingestion.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageAnalysis {
    pub image_id: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub description: String,
    pub ai_generated_tags: AiTags,
    #[serde(default)]
    pub confidence_scores: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub metadata: AnalysisMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiTags {
    pub room: String,
    pub theme: String,
    #[serde(default)]
    pub primary_features: Vec<String>,
    #[serde(default)]
    pub objects: Vec<DetectedObject>,
    #[serde(default)]
    pub visual_attributes: VisualAttributes,
    #[serde(default)]
    pub indian_context: RegionalContext,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedObject {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub features: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualAttributes {
    pub colors: Vec<String>,
    pub materials: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionalContext {
    pub regional_style: String,
    pub space_utilization: String,
    pub cultural_significance: String,
    pub traditional_elements: Vec<String>,
    pub modern_adaptations: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisMetadata {
    pub budget_indicator: String,
    pub space_type: String,
    pub functionality: String,
    pub tags: Vec<String>,
}
