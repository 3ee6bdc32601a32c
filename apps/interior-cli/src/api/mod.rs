//! HTTP server setup: router and API routes.

pub mod error;
pub mod handlers;
pub mod state;

use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

pub use state::ApiState;

pub fn router(state: Arc<ApiState>) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    let image_routes = Router::new()
        .route("/", get(handlers::list_images))
        .route("/search", get(handlers::search_get).post(handlers::search_post))
        .route("/suggestions", get(handlers::suggestions))
        .route("/{id}", get(handlers::get_image));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api", get(handlers::api_info))
        .nest("/api/images", image_routes)
        .layer(cors)
        .with_state(state)
}

/// Serve until ctrl-c.
pub async fn serve(bind: SocketAddr, state: Arc<ApiState>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(%bind, "HTTP server listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
        })
        .await?;
    Ok(())
}
