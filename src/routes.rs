use crate::analysis::{now_millis, ScanResult};
use crate::content::AnalyzeRequest;
use crate::error::ApiError;
use crate::state::AppState;
use crate::{introspection, status};
use anyhow::anyhow;
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

pub const MISSING_CONTENT_DETAILS: &str = "Missing required website content data";

pub fn router(state: Arc<AppState>) -> Router {
    let max_body = state.config.server.max_body_bytes;
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status::get_status))
        .route("/api/analyze", post(analyze))
        .route("/api/schema", get(get_schema))
        .layer(DefaultBodyLimit::max(max_body))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                // The browser extension calls from its own origin.
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") })),
    )
}

pub async fn get_schema() -> impl IntoResponse {
    (StatusCode::OK, Json(introspection::scan_result_schema()))
}

pub async fn analyze(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<ScanResult>, ApiError> {
    let Json(request) = payload?;
    let requested = request.provider().map(str::to_string);

    let Some(content) = request.content else {
        return Err(ApiError::InvalidRequest(format!(
            "{MISSING_CONTENT_DETAILS} (content)"
        )));
    };
    if let Some(field) = content.missing_field() {
        return Err(ApiError::InvalidRequest(format!(
            "{MISSING_CONTENT_DETAILS} (content.{field})"
        )));
    }

    let (provider_id, provider) = state.dispatcher.select(requested.as_deref());
    let url = content.url.clone();

    // Run on its own task so a panicking provider becomes a 500 instead of a dropped
    // connection.
    let analysis = match tokio::spawn(async move { provider.analyze(&content).await }).await {
        Ok(Ok(analysis)) => analysis,
        Ok(Err(e)) => {
            return Err(anyhow::Error::new(e)
                .context(format!("provider {provider_id} failed"))
                .into())
        }
        Err(e) => return Err(anyhow!("analysis task for {provider_id} aborted: {e}").into()),
    };

    info!(
        url = %url,
        provider = %provider_id,
        risk = %analysis.risk,
        confidence = analysis.confidence_score,
        "analysis complete"
    );
    Ok(Json(analysis.into_scan(url, now_millis())))
}
