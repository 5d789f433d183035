use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::AppState;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn health_db(State(state): State<AppState>) -> Response {
    let Some(db) = &state.db else {
        return (StatusCode::OK, Json(json!({ "message": "In-memory storage ready" }))).into_response();
    };

    match db.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": "MongoDB connected successfully" })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "db health check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "MongoDB connection failed" })),
            )
                .into_response()
        }
    }
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}
