// HTTP route handlers for the Arbiter API

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use arbiter_common::types::Submission;
use arbiter_harness::harness;
use std::sync::Arc;
use tracing::{info, warn};

use crate::metrics;
use crate::AppState;

/// POST /submit - Grade a submission and return its verdicts
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Submission>,
) -> Response {
    let language = metrics::language_label(&payload.language);

    match harness::grade(state.backend.as_ref(), &state.languages, &payload).await {
        Ok(result) => {
            let outcome = if result.success {
                "passed"
            } else if result.results.is_empty() {
                "errored"
            } else {
                "failed"
            };
            metrics::record_submission(language, outcome);
            info!(
                language = %language,
                success = result.success,
                passed = result.passed_count(),
                total = result.results.len(),
                "Submission answered"
            );
            (StatusCode::OK, Json(result)).into_response()
        }
        Err(e) => {
            metrics::record_submission(language, "rejected");
            warn!(language = %payload.language, error = %e, "Submission rejected");
            (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// GET /languages - Supported languages and their engine versions
pub async fn list_languages(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.languages.list())
}

/// GET /status - Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /metrics - Prometheus scrape endpoint
pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::render(),
    )
}
