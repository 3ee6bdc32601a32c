use std::collections::HashMap;

use interior_core::types::{Payload, VectorField, WeightVector};

/// A hit from a single named-vector search.
#[derive(Debug, Clone)]
pub struct FieldHit {
    pub point_id: String,
    pub score: f32,
    pub payload: Payload,
}

#[derive(Debug, Clone)]
pub struct FusedHit {
    pub point_id: String,
    pub score: f32,
    pub payload: Payload,
}

/// Weighted mean of per-field scores: Σ wᵢ·sᵢ / Σ wᵢ over the searched fields.
/// A point absent from a field's hits contributes 0 for that field. Output is
/// ordered by fused score descending, then point id, and truncated to `limit`.
pub fn fuse(per_field: Vec<(VectorField, Vec<FieldHit>)>, weights: &WeightVector, limit: usize) -> Vec<FusedHit> {
    let total: f32 = per_field.iter().map(|(f, _)| weights.get(*f)).sum();
    if total <= 0.0 {
        return Vec::new();
    }
    let mut by_id: HashMap<String, FusedHit> = HashMap::new();
    for (field, hits) in per_field {
        let w = weights.get(field) / total;
        for hit in hits {
            by_id
                .entry(hit.point_id.clone())
                .and_modify(|fused| fused.score += w * hit.score)
                .or_insert(FusedHit { point_id: hit.point_id, score: w * hit.score, payload: hit.payload });
        }
    }
    let mut fused: Vec<FusedHit> = by_id.into_values().collect();
    fused.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.point_id.cmp(&b.point_id)));
    fused.truncate(limit);
    fused
}
