//! Liveness and fallback endpoints

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

/// Routes mounted at the root
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}

/// Routes mounted under /api
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new().route("/ping", get(ping))
}

async fn health() -> &'static str {
    "ok"
}

#[derive(Serialize)]
struct PingResponse {
    message: String,
}

/// GET /api/ping
async fn ping(State(state): State<Arc<AppState>>) -> Json<PingResponse> {
    Json(PingResponse {
        message: state.ping_message.clone(),
    })
}

#[derive(Serialize)]
pub struct NotFoundResponse {
    error: &'static str,
}

/// Unknown /api/* paths get JSON instead of the SPA shell
pub async fn api_not_found() -> (StatusCode, Json<NotFoundResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(NotFoundResponse {
            error: "API endpoint not found",
        }),
    )
}

#[cfg(test)]
mod tests {
    use crate::config::test_support::config;
    use crate::{AppState, app};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_app(spa_dir: Option<&std::path::Path>) -> axum::Router {
        let state = AppState::from_config(&config("http://127.0.0.1:9")).unwrap();
        app(Arc::new(state), spa_dir)
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health_and_ping() {
        let response = test_app(None)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ok");

        let response = test_app(None)
            .oneshot(Request::builder().uri("/api/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_text(response).await, r#"{"message":"pong"}"#);
    }

    #[tokio::test]
    async fn test_unknown_api_path_is_json_404() {
        let response = test_app(None)
            .oneshot(Request::builder().uri("/api/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_text(response).await,
            r#"{"error":"API endpoint not found"}"#
        );
    }

    #[tokio::test]
    async fn test_spa_serves_index_for_client_routes() {
        let dir = std::env::temp_dir().join(format!("cosmic-hub-spa-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("index.html"), "<html>cosmic</html>").unwrap();

        let response = test_app(Some(&dir))
            .oneshot(Request::builder().uri("/admin/cms").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "<html>cosmic</html>");

        let response = test_app(Some(&dir))
            .oneshot(Request::builder().uri("/api/unknown").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
