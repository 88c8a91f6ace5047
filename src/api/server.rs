//! API router and server

use super::routes::{profile, root, search};
use crate::provider::TwelveDataClient;
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared state for route handlers
#[derive(Clone)]
pub(crate) struct ApiState {
    pub provider: Arc<TwelveDataClient>,
}

/// Build the application router
pub fn router(provider: Arc<TwelveDataClient>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/profile/:symbol", get(profile))
        .route("/search/:keyword", get(search))
        .with_state(ApiState { provider })
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve the API until ctrl-c
pub async fn serve(addr: SocketAddr, provider: Arc<TwelveDataClient>) -> anyhow::Result<()> {
    let app = router(provider);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Received shutdown signal");
        })
        .await?;

    Ok(())
}
