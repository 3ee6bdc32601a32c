//! `QdrantIndex` against a local stand-in for the Qdrant REST API.

use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use interior_core::config::QdrantSettings;
use interior_core::traits::VectorIndex;
use interior_core::types::{FilterValue, Filters, NamedVectors, VectorField, WeightVector};
use interior_core::Error;
use interior_vector::QdrantIndex;

const DIM: usize = 4;

/// Behaviour is keyed on the collection name so one server covers every case.
async fn search_batch(Path(collection): Path<String>, Json(body): Json<Value>) -> Response {
    let searches = body["searches"].as_array().cloned().unwrap_or_default();
    let filtered = searches.iter().any(|s| s.get("filter").is_some());
    match collection.as_str() {
        "strict_filters" if filtered => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "status": { "error": "Bad request: Index required but not found for \"price\"" }, "time": 0.0 })),
        )
            .into_response(),
        "strict_filters" => (StatusCode::BAD_REQUEST, Json(json!({ "status": { "error": "Bad request" } }))).into_response(),
        "overloaded" => (StatusCode::SERVICE_UNAVAILABLE, "try again later").into_response(),
        "short_answer" => Json(json!({ "result": [[]], "status": "ok", "time": 0.0 })).into_response(),
        _ => {
            let batches: Vec<Value> = searches
                .iter()
                .map(|s| match s["vector"]["name"].as_str() {
                    Some("primary_search") => json!([
                        { "id": 11, "version": 0, "score": 0.9, "payload": { "image_id": "bed1", "room_type": "bedroom" } },
                        { "id": 22, "version": 0, "score": 0.5, "payload": { "image_id": "kit1", "room_type": "kitchen" } },
                    ]),
                    Some("semantic_desc") => json!([
                        { "id": 22, "version": 0, "score": 1.0, "payload": { "image_id": "kit1", "room_type": "kitchen" } },
                    ]),
                    _ => json!([]),
                })
                .collect();
            Json(json!({ "result": batches, "status": "ok", "time": 0.001 })).into_response()
        }
    }
}

async fn stub_qdrant() -> String {
    let app = Router::new().route("/collections/{collection}/points/search/batch", post(search_batch));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn index(url: &str, collection: &str) -> QdrantIndex {
    let settings = QdrantSettings { url: url.to_string(), collection: collection.to_string(), ..QdrantSettings::default() };
    QdrantIndex::new(&settings, DIM).unwrap()
}

fn vectors() -> NamedVectors {
    VectorField::ALL.iter().map(|&f| (f, vec![0.5; DIM])).collect()
}

fn room_filter() -> Filters {
    Filters::from([("room_type".to_string(), FilterValue::from("bedroom"))])
}

#[tokio::test]
async fn batch_results_are_fused_by_weight() {
    let url = stub_qdrant().await;
    let weights = WeightVector { primary_search: 0.6, semantic_desc: 0.4, object_focus: 0.0 };
    let hits = index(&url, "interior_images").search(&vectors(), &weights, &Filters::new(), 10).await.unwrap();

    let ids: Vec<&str> = hits.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["kit1", "bed1"]);
    assert!((hits[0].score - (0.6 * 0.5 + 0.4 * 1.0)).abs() < 1e-5);
    assert!((hits[1].score - 0.6 * 0.9).abs() < 1e-5);
    assert_eq!(hits[1].category(), Some("bedroom"));
}

#[tokio::test]
async fn fused_results_respect_limit() {
    let url = stub_qdrant().await;
    let hits = index(&url, "interior_images")
        .search(&vectors(), &WeightVector::default(), &Filters::new(), 1)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "kit1");
}

#[tokio::test]
async fn bad_request_on_filtered_search_is_invalid_filter() {
    let url = stub_qdrant().await;
    let err = index(&url, "strict_filters")
        .search(&vectors(), &WeightVector::default(), &room_filter(), 5)
        .await
        .unwrap_err();
    match err {
        Error::InvalidFilter(message) => assert!(message.contains("Index required"), "{message}"),
        other => panic!("expected InvalidFilter, got {other:?}"),
    }
}

#[tokio::test]
async fn bad_request_without_filter_is_index_unavailable() {
    let url = stub_qdrant().await;
    let err = index(&url, "strict_filters")
        .search(&vectors(), &WeightVector::default(), &Filters::new(), 5)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::IndexUnavailable(_)), "{err:?}");
}

#[tokio::test]
async fn server_errors_are_index_unavailable() {
    let url = stub_qdrant().await;
    let err = index(&url, "overloaded")
        .search(&vectors(), &WeightVector::default(), &room_filter(), 5)
        .await
        .unwrap_err();
    match err {
        Error::IndexUnavailable(message) => assert!(message.contains("503"), "{message}"),
        other => panic!("expected IndexUnavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_batch_entries_are_rejected() {
    let url = stub_qdrant().await;
    let err = index(&url, "short_answer")
        .search(&vectors(), &WeightVector::default(), &Filters::new(), 5)
        .await
        .unwrap_err();
    match err {
        Error::IndexUnavailable(message) => assert!(message.contains("1 of 3"), "{message}"),
        other => panic!("expected IndexUnavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_server_is_index_unavailable() {
    let err = index("http://127.0.0.1:9", "interior_images")
        .search(&vectors(), &WeightVector::default(), &Filters::new(), 5)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::IndexUnavailable(_)), "{err:?}");
}
