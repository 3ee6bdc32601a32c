#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod filter;
pub mod fusion;
pub mod memory;
pub mod qdrant;
pub mod schema;
pub mod writer;

pub use memory::InMemoryIndex;
pub use qdrant::QdrantIndex;
pub use writer::{ImageIndexer, IndexStats};

use interior_core::types::{Candidate, ImageMetadata, Payload};

/// Candidate ids are the stored image id, falling back to the point id.
pub(crate) fn to_candidate(point_id: String, score: f32, payload: &Payload) -> Candidate {
    let metadata = ImageMetadata::from_payload(payload);
    let id = metadata.image_id.clone().unwrap_or(point_id);
    Candidate { id, score: score.clamp(0.0, 1.0), metadata }
}
