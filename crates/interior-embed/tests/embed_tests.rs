use interior_core::config::EmbeddingSettings;
use interior_embed::{get_default_embedder, FakeEmbedder};

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[tokio::test]
async fn fake_embedder_shapes_and_determinism() {
    let settings = EmbeddingSettings { use_fake: true, ..EmbeddingSettings::default() };
    let embedder = get_default_embedder(&settings).expect("embedder");
    let texts = vec!["modern bedroom".to_string(), "modern bedroom".to_string()];
    let embs = embedder.embed_batch(&texts).await.expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 1536, "embedding dim follows settings");

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn shared_tokens_raise_similarity() {
    let e = FakeEmbedder::new(1536);
    let base = e.embed_sync("wooden bed wardrobe");
    let near = e.embed_sync("Wooden bed");
    let far = e.embed_sync("marble bathroom sink");
    assert!(cosine(&base, &near) > cosine(&base, &far));
    assert!((cosine(&near, &e.embed_sync("wooden BED")) - 1.0).abs() < 1e-5, "tokens are case-folded");
}
