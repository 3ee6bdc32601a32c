use std::sync::Arc;

use interior_core::traits::{Embedder, VectorIndex};
use interior_core::types::{Filters, FilterValue, NamedVectors, VectorField, WeightVector};
use interior_embed::FakeEmbedder;
use interior_vector::{ImageIndexer, InMemoryIndex};
use serde_json::json;

fn record(id: &str, room: &str, theme: &str, objects: &[&str]) -> serde_json::Value {
    json!({
        "image_id": id,
        "image_url": format!("https://cdn.example.com/{id}.jpg"),
        "description": format!("a {theme} {room}"),
        "ai_generated_tags": {
            "room": room,
            "theme": theme,
            "objects": objects.iter().map(|o| json!({ "type": o })).collect::<Vec<_>>(),
            "visual_attributes": { "colors": ["white"], "materials": ["wood"] }
        },
        "metadata": { "budget_indicator": "mid-range", "space_type": "apartment" }
    })
}

#[tokio::test]
async fn index_then_search_in_memory() -> anyhow::Result<()> {
    let embedder = Arc::new(FakeEmbedder::new(256));
    let index = Arc::new(InMemoryIndex::new(256));
    let indexer = ImageIndexer::new(index.clone(), embedder.clone()).with_batch_size(2);

    let records = vec![
        record("img_bed", "bedroom", "modern", &["bed", "wardrobe"]),
        record("img_kitchen", "kitchen", "traditional", &["stove"]),
        record("img_bath", "bathroom", "minimalist", &["sink"]),
        json!({ "image_id": "broken" }),
    ];
    let stats = indexer.index_records(records).await?;
    assert_eq!(stats.indexed, 3);
    assert_eq!(stats.skipped, 1);
    assert_eq!(index.len().await, 3);

    let mut vectors = NamedVectors::new();
    for field in VectorField::ALL {
        vectors.insert(field, embedder.embed("modern bedroom bed").await?);
    }
    let hits = index.search(&vectors, &WeightVector::default(), &Filters::new(), 3).await?;
    assert_eq!(hits[0].id, "img_bed");
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    assert_eq!(hits[0].metadata.room_type.as_deref(), Some("bedroom"));

    let mut filters = Filters::new();
    filters.insert("room_type".into(), FilterValue::from("kitchen"));
    let hits = index.search(&vectors, &WeightVector::default(), &filters, 3).await?;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "img_kitchen");

    let meta = index.retrieve("img_bath").await?.expect("stored");
    assert_eq!(meta.budget_category.as_deref(), Some("mid-range"));
    assert!(meta.search_tags.contains(&"sink".to_string()));
    Ok(())
}
