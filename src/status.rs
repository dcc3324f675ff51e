use crate::provider::ProviderId;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

pub async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    // Only include non-secret runtime data.
    let p = &state.config.providers;
    let provider = |id: ProviderId, endpoint: &str, key_env: &str| {
        json!({
            "id": id,
            "endpoint": endpoint,
            "credential_configured": state.secrets.contains(key_env),
        })
    };

    let v = json!({
        "ok": true,
        "version": env!("CARGO_PKG_VERSION"),
        "default_provider": state.dispatcher.default_id(),
        "registered_providers": state.dispatcher.registered(),
        "request_timeout_secs": state.config.request_timeout().as_secs(),
        "max_body_bytes": state.config.server.max_body_bytes,
        "providers": [
            provider(ProviderId::Gemini, &p.gemini.endpoint, &p.gemini.api_key_env),
            provider(ProviderId::Deepseek, &p.deepseek.endpoint, &p.deepseek.api_key_env),
        ],
    });

    (StatusCode::OK, Json(v))
}
