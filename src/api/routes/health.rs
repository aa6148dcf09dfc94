//! GET /api/health

use axum::{routing::get, Json, Router};
use serde_json::json;

use crate::api::server::SharedAppState;

pub fn router() -> Router<SharedAppState> {
    Router::new().route("/api/health", get(handle_health))
}

async fn handle_health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Soltree API is running"
    }))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{app, json_body, send};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = app();
        let response = send(&app, "GET", "/api/health", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
        assert!(response.headers().contains_key("x-correlation-id"));

        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["message"], "Soltree API is running");
    }
}
