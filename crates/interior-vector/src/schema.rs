use serde_json::{json, Value};
use std::hash::Hasher;
use twox_hash::XxHash64;

use interior_core::types::VectorField;

pub const EMBEDDING_DIM: usize = 1536;
pub const DEFAULT_COLLECTION: &str = "interior_images";

/// Payload fields that get a keyword index for fast filtering.
pub const KEYWORD_INDEX_FIELDS: [&str; 4] = ["room_type", "design_theme", "budget_category", "space_type"];

/// Collection body with one cosine vector per named field.
pub fn collection_config(dim: usize) -> Value {
    let vectors: serde_json::Map<String, Value> = VectorField::ALL
        .iter()
        .map(|f| (f.as_str().to_string(), json!({ "size": dim, "distance": "Cosine" })))
        .collect();
    json!({
        "vectors": vectors,
        "optimizers_config": { "default_segment_number": 2 },
        "replication_factor": 1,
    })
}

/// Stable numeric point id for an image id.
pub fn point_id(image_id: &str) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(image_id.as_bytes());
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_has_three_cosine_vectors() {
        let cfg = collection_config(EMBEDDING_DIM);
        for name in ["primary_search", "semantic_desc", "object_focus"] {
            assert_eq!(cfg["vectors"][name]["size"], 1536);
            assert_eq!(cfg["vectors"][name]["distance"], "Cosine");
        }
    }

    #[test]
    fn point_ids_are_stable_and_distinct() {
        assert_eq!(point_id("img_001"), point_id("img_001"));
        assert_ne!(point_id("img_001"), point_id("img_002"));
    }
}
