use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::registry::Endpoint;
use crate::api::state::AppState;

/// GET / - service banner
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Bible Stories API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Content management for stories, categories, languages, questions and comments",
            "manifest": "/routes"
        }
    }))
}

/// GET /health - storage connectivity check
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.stores.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "storage": state.stores.backend()
                }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "storage unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "storage_error": e.to_string()
                }
            })),
        ),
    }
}

/// GET /routes - every registered route with its permission declaration
pub async fn routes(Extension(manifest): Extension<Arc<Vec<Endpoint>>>) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": manifest.as_ref()
    }))
}
