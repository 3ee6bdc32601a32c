use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;

use interior_core::types::{FilterValue, Filters, PartialWeights, Query as SearchQuery, VectorField};
use interior_core::Error;
use interior_search::format_ranked;

use super::error::ApiError;
use super::state::ApiState;

type ApiResult = Result<Json<Value>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
    pub limit: Option<i64>,
}

/// Body of `POST /api/images/search`. `query` is the fallback text for any
/// field without its own text.
#[derive(Debug, Default, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub primary_search: Option<String>,
    #[serde(default)]
    pub semantic_desc: Option<String>,
    #[serde(default)]
    pub object_focus: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
    /// Kept raw so a malformed condition surfaces as `InvalidFilter`.
    #[serde(default)]
    pub filters: Option<Value>,
    #[serde(default)]
    pub weights: Option<PartialWeights>,
}

impl SearchRequest {
    fn to_query(&self) -> SearchQuery {
        let mut q = SearchQuery { text: self.query.clone(), ..SearchQuery::default() };
        for (field, text) in [
            (VectorField::PrimarySearch, &self.primary_search),
            (VectorField::SemanticDesc, &self.semantic_desc),
            (VectorField::ObjectFocus, &self.object_focus),
        ] {
            if let Some(text) = text {
                q = q.with_field(field, text.clone());
            }
        }
        q
    }

    fn filters(&self) -> Result<Filters, Error> {
        let entries = match &self.filters {
            None | Some(Value::Null) => return Ok(Filters::new()),
            Some(Value::Object(entries)) => entries,
            Some(other) => return Err(Error::InvalidFilter(format!("filters must be an object, got {other}"))),
        };
        entries
            .iter()
            .map(|(key, value)| {
                let condition = FilterValue::deserialize(value).map_err(|_| {
                    Error::InvalidFilter(format!(
                        "filter '{key}' must be a string, integer, boolean or an array of those, got {value}"
                    ))
                })?;
                Ok((key.clone(), condition))
            })
            .collect()
    }
}

/// Bound a gateway call by the request timeout. Elapsing drops the future
/// and with it any in-flight embedding or index request.
async fn bounded<T>(state: &ApiState, fut: impl Future<Output = Result<T, Error>>) -> Result<T, ApiError> {
    match tokio::time::timeout(state.request_timeout, fut).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(_) => Err(ApiError::Timeout(state.request_timeout)),
    }
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "interior-image-search" }))
}

pub async fn api_info() -> Json<Value> {
    Json(json!({
        "name": "Interior Image Search API",
        "endpoints": {
            "GET /health": "Liveness check",
            "GET /api/images": "All images in the catalog",
            "GET /api/images/search?query=&limit=": "Search with a single query text",
            "POST /api/images/search": "Search with per-field texts, filters and weights",
            "GET /api/images/suggestions": "Distinct room types, themes, budgets and space types",
            "GET /api/images/{id}": "Stored metadata for one image",
        },
        "examples": {
            "Search for modern living rooms": "GET /api/images/search?query=modern living room&limit=5",
            "Object-focused search": {
                "POST /api/images/search": {
                    "query": "wooden furniture",
                    "object_focus": "teak wood chair brass handles",
                    "weights": { "object_focus": 0.7, "primary_search": 0.3 },
                    "filters": { "room_type": "living room" },
                    "limit": 5
                }
            }
        }
    }))
}

pub async fn list_images(State(state): State<Arc<ApiState>>) -> ApiResult {
    let reader = state.catalog.clone();
    let images = tokio::task::spawn_blocking(move || reader.read_all())
        .await
        .map_err(|e| Error::Catalog(format!("catalog task failed: {e}")))??;
    Ok(Json(json!({
        "success": true,
        "data": images,
        "message": "Images retrieved successfully",
    })))
}

pub async fn search_get(
    State(state): State<Arc<ApiState>>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult {
    let Query(params) = params.map_err(|e| Error::InvalidQuery(e.body_text()))?;
    let request = SearchRequest { query: params.query, limit: params.limit, ..SearchRequest::default() };
    run_search(&state, &request).await
}

pub async fn search_post(
    State(state): State<Arc<ApiState>>,
    request: Result<Json<SearchRequest>, JsonRejection>,
) -> ApiResult {
    let Json(request) = request.map_err(|e| Error::InvalidQuery(e.body_text()))?;
    run_search(&state, &request).await
}

async fn run_search(state: &ApiState, request: &SearchRequest) -> ApiResult {
    let limit = state.resolve_limit(request.limit)?;
    let query = request.to_query();
    let filters = request.filters()?;
    let ranked = bounded(state, state.engine.search(&query, limit, &filters, request.weights.as_ref())).await?;
    let response = format_ranked(&ranked);
    let message = format!("Found {} matching images", response.total);
    Ok(Json(json!({
        "success": true,
        "data": response,
        "query": query.intent_text(),
        "message": message,
    })))
}

pub async fn suggestions(State(state): State<Arc<ApiState>>) -> ApiResult {
    let data = bounded(&state, state.engine.suggestions()).await?;
    Ok(Json(json!({ "success": true, "data": data, "message": "Suggestions retrieved successfully" })))
}

pub async fn get_image(State(state): State<Arc<ApiState>>, Path(id): Path<String>) -> ApiResult {
    let data = bounded(&state, state.engine.get_image(&id)).await?;
    Ok(Json(json!({ "success": true, "data": data, "message": "Image retrieved successfully" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use std::time::Duration;

    use interior_core::catalog::CatalogReader;
    use interior_core::config::SearchSettings;
    use interior_embed::FakeEmbedder;
    use interior_search::ImageSearchEngine;
    use interior_vector::{ImageIndexer, InMemoryIndex};

    async fn state(csv: &std::path::Path) -> Arc<ApiState> {
        let embedder = Arc::new(FakeEmbedder::new(128));
        let index = Arc::new(InMemoryIndex::new(128));
        let records = vec![
            json!({ "image_id": "bed1", "image_url": "https://cdn.example.com/bed1.jpg", "description": "modern bedroom",
                    "ai_generated_tags": { "room": "Bedroom", "theme": "Modern" },
                    "metadata": { "budget_indicator": "Premium", "space_type": "Apartment" } }),
            json!({ "image_id": "kit1", "description": "rustic kitchen",
                    "ai_generated_tags": { "room": "Kitchen", "theme": "Rustic" } }),
        ];
        ImageIndexer::new(index.clone(), embedder.clone()).index_records(records).await.unwrap();
        let engine = ImageSearchEngine::new(embedder, index);
        let settings = SearchSettings { default_limit: 5, max_limit: 20, ..SearchSettings::default() };
        Arc::new(ApiState::new(engine, CatalogReader::new(csv), &settings, Duration::from_secs(5)))
    }

    #[tokio::test]
    async fn get_search_returns_envelope() {
        let st = state(std::path::Path::new("missing.csv")).await;
        let params = SearchParams { query: Some("modern bedroom".into()), limit: Some(3) };
        let Json(body) = search_get(State(st), Ok(Query(params))).await.unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["detected_intent"], "bedroom");
        assert_eq!(body["data"]["results"][0]["image_id"], "bed1");
        assert_eq!(body["data"]["results"][0]["budget_category"], "premium");
        assert_eq!(body["message"], "Found 1 matching images");
    }

    #[tokio::test]
    async fn bad_arguments_map_to_400() {
        let st = state(std::path::Path::new("missing.csv")).await;
        let err = search_get(State(st.clone()), Ok(Query(SearchParams { query: Some("   ".into()), limit: None })))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let err = search_get(State(st.clone()), Ok(Query(SearchParams { query: Some("kitchen".into()), limit: Some(-2) })))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Core(Error::InvalidLimit(-2))));

        let request: SearchRequest = serde_json::from_value(json!({ "query": "kitchen", "filters": { "room_type": [] } })).unwrap();
        let err = search_post(State(st), Ok(Json(request))).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    async fn error_body(err: ApiError) -> (StatusCode, Value) {
        let response = axum::response::IntoResponse::into_response(err);
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn malformed_filter_values_are_invalid_filter() {
        let st = state(std::path::Path::new("missing.csv")).await;
        for filters in [json!({ "price": 1.5 }), json!({ "room_type": { "eq": "kitchen" } }), json!(["kitchen"])] {
            let request: SearchRequest = serde_json::from_value(json!({ "query": "bedroom", "filters": filters })).unwrap();
            let err = search_post(State(st.clone()), Ok(Json(request))).await.unwrap_err();
            let (status, body) = error_body(err).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["success"], false);
            assert_eq!(body["error"], "InvalidFilter");
        }
    }

    #[tokio::test]
    async fn unparsable_query_string_is_a_json_400() {
        let st = state(std::path::Path::new("missing.csv")).await;
        let uri: axum::http::Uri = "/api/images/search?query=kitchen&limit=abc".parse().unwrap();
        let err = search_get(State(st), Query::try_from_uri(&uri)).await.unwrap_err();
        let (status, body) = error_body(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "InvalidQuery");
    }

    #[tokio::test]
    async fn post_search_with_fields_and_filters() {
        let st = state(std::path::Path::new("missing.csv")).await;
        let request: SearchRequest = serde_json::from_value(json!({
            "primary_search": "rustic kitchen",
            "weights": { "primary_search": 1.0 },
            "filters": { "room_type": "kitchen" },
            "limit": 500
        }))
        .unwrap();
        let Json(body) = search_post(State(st), Ok(Json(request))).await.unwrap();
        assert_eq!(body["data"]["total"], 1);
        assert_eq!(body["data"]["results"][0]["image_id"], "kit1");
        assert_eq!(body["data"]["results"][0]["image_url"], "unknown");
    }

    #[tokio::test]
    async fn image_lookup_suggestions_and_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("images.csv");
        std::fs::write(&csv, "image_id,image_url\nbed1,https://cdn.example.com/bed1.jpg\n").unwrap();
        let st = state(&csv).await;

        let Json(body) = get_image(State(st.clone()), Path("bed1".into())).await.unwrap();
        assert_eq!(body["data"]["room_type"], "bedroom");
        let err = get_image(State(st.clone()), Path("nope".into())).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let Json(body) = suggestions(State(st.clone())).await.unwrap();
        assert_eq!(body["data"]["room_types"], json!(["bedroom", "kitchen"]));
        assert_eq!(body["data"]["budget_categories"], json!(["premium"]));

        let Json(body) = list_images(State(st)).await.unwrap();
        assert_eq!(body["data"][0]["image_id"], "bed1");
    }

    #[tokio::test]
    async fn missing_catalog_is_a_server_error() {
        let st = state(std::path::Path::new("/nonexistent/images.csv")).await;
        let err = list_images(State(st)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
