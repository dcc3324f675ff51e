#![allow(dead_code)]

use async_trait::async_trait;
use axum::{body::Body, http::Request, Router};
use http_body_util::BodyExt;
use serde_json::Value;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};
use tower::ServiceExt;
use umbrella_scan::{
    config::Config,
    provider::{AnalysisProvider, Dispatcher, ProviderError, ProviderId},
    routes,
    secrets::EnvFileStore,
    state::AppState,
    AnalysisResult, RiskLevel, WebsiteContent,
};

/// Returns a fixed verdict and counts how often it was asked.
pub struct FixedProvider {
    pub result: AnalysisResult,
    pub calls: AtomicUsize,
}

impl FixedProvider {
    pub fn new(risk: RiskLevel, reason: &str) -> Arc<Self> {
        Arc::new(Self {
            result: AnalysisResult {
                risk,
                reasons: vec![reason.to_string()],
                confidence_score: 0.9,
            },
            calls: AtomicUsize::new(0),
        })
    }

    pub fn with_result(result: AnalysisResult) -> Arc<Self> {
        Arc::new(Self {
            result,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalysisProvider for FixedProvider {
    async fn analyze(&self, _: &WebsiteContent) -> Result<AnalysisResult, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.result.clone())
    }
}

pub struct FailingProvider;

#[async_trait]
impl AnalysisProvider for FailingProvider {
    async fn analyze(&self, _: &WebsiteContent) -> Result<AnalysisResult, ProviderError> {
        Err(ProviderError::Internal("credential store exploded at /etc/secret".into()))
    }
}

pub struct PanickingProvider;

#[async_trait]
impl AnalysisProvider for PanickingProvider {
    async fn analyze(&self, _: &WebsiteContent) -> Result<AnalysisResult, ProviderError> {
        panic!("provider bug");
    }
}

pub fn state_with(dispatcher: Dispatcher, config: Config, secrets: &[(&str, &str)]) -> Arc<AppState> {
    let map: HashMap<String, String> = secrets
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Arc::new(AppState {
        config,
        secrets: Arc::new(EnvFileStore::from_map(map)),
        dispatcher,
    })
}

/// Gemini (default) answers LOW, DeepSeek answers HIGH.
pub fn two_provider_app() -> (Router, Arc<FixedProvider>, Arc<FixedProvider>) {
    let gemini = FixedProvider::new(RiskLevel::Low, "gemini says low");
    let deepseek = FixedProvider::new(RiskLevel::High, "deepseek says high");
    let dispatcher = Dispatcher::new(ProviderId::Gemini, gemini.clone())
        .with(ProviderId::Deepseek, deepseek.clone());
    let app = routes::router(state_with(dispatcher, Config::default(), &[]));
    (app, gemini, deepseek)
}

pub fn analyze_request(body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/analyze")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn send(app: Router, req: Request<Body>) -> (u16, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status().as_u16();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}
