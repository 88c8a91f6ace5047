//! Route handlers
//!
//! Provider failures come back as `{"error": ...}` bodies rather than
//! HTTP error statuses, matching the lookup API's existing consumers.

use super::server::ApiState;
use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

/// `GET /`
pub(crate) async fn root() -> Json<Value> {
    Json(json!({ "message": "Welcome to the Stock Profile API!" }))
}

/// `GET /profile/:symbol`
pub(crate) async fn profile(
    State(state): State<ApiState>,
    Path(symbol): Path<String>,
) -> Json<Value> {
    match state.provider.profile(&symbol).await {
        Ok(body) => Json(body),
        Err(e) => {
            tracing::warn!(symbol, error = %e, "Profile lookup failed");
            Json(json!({ "error": e.to_string() }))
        }
    }
}

/// `GET /search/:keyword`
pub(crate) async fn search(
    State(state): State<ApiState>,
    Path(keyword): Path<String>,
) -> Json<Value> {
    match state.provider.symbol_search(&keyword).await {
        Ok(body) => Json(body),
        Err(e) => {
            tracing::warn!(keyword, error = %e, "Symbol search failed");
            Json(json!({ "error": e.to_string() }))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::api::router;
    use crate::provider::{ProviderConfig, TwelveDataClient};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_router() -> axum::Router {
        let provider = Arc::new(TwelveDataClient::new(ProviderConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: "key".to_string(),
            timeout: Duration::from_millis(200),
        }));
        router(provider)
    }

    #[tokio::test]
    async fn test_root_returns_welcome() {
        let response = test_router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Welcome to the Stock Profile API!");
    }

    #[tokio::test]
    async fn test_profile_provider_failure_maps_to_error_body() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/profile/AAPL")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_search_provider_failure_maps_to_error_body() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/search/tata")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"].is_string());
    }
}
