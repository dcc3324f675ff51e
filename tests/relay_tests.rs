//! Client relay against a mocked backend and against a live server.

use serde_json::json;
use std::{sync::Arc, time::Duration};
use umbrella_scan::{
    analysis::{REASON_API_ERROR, REASON_RELAY_FAILED},
    config::Config,
    relay::Relay,
    routes, secrets, startup,
    state::AppState,
    RiskLevel, WebsiteContent,
};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

fn page() -> WebsiteContent {
    WebsiteContent {
        url: "https://bank-secure-login.example".into(),
        title: "Bank".into(),
        text: "Please confirm your card number".into(),
        ..Default::default()
    }
}

fn relay(base: &str, provider: &str) -> Relay {
    Relay::new(base, provider, Duration::from_secs(5)).unwrap()
}

fn assert_local_fallback(scan: &umbrella_scan::ScanResult) {
    assert_eq!(scan.url, "https://bank-secure-login.example");
    assert_eq!(scan.analysis.risk, RiskLevel::Medium);
    assert_eq!(scan.analysis.reasons, vec![REASON_RELAY_FAILED]);
    assert_eq!(scan.analysis.confidence_score, 0.0);
}

#[tokio::test]
async fn relay_returns_backend_result() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analyze"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": "https://bank-secure-login.example",
            "risk": "critical",
            "timestamp": 1_700_000_000_000u64,
            "reasons": ["asks for card number"],
            "confidenceScore": 0.97
        })))
        .mount(&backend)
        .await;

    let scan = relay(&format!("{}/", backend.uri()), "deepseek").analyze(&page()).await;
    assert_eq!(scan.analysis.risk, RiskLevel::Critical);
    assert_eq!(scan.timestamp, 1_700_000_000_000);

    let requests = backend.received_requests().await.unwrap();
    let sent: serde_json::Value = requests[0].body_json().unwrap();
    assert_eq!(sent["config"]["provider"], "deepseek");
    assert_eq!(sent["content"]["url"], "https://bank-secure-login.example");
}

#[tokio::test]
async fn relay_falls_back_on_error_status() {
    for (status, body) in [
        (400, json!({"error": "Invalid request data", "details": "x"})),
        (500, json!({"error": "Server error", "details": "y"})),
    ] {
        let backend = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&backend)
            .await;
        let scan = relay(&backend.uri(), "gemini").analyze(&page()).await;
        assert_local_fallback(&scan);
    }
}

#[tokio::test]
async fn relay_falls_back_on_malformed_reply() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": "https://bank-secure-login.example",
            "risk": "safe",
            "timestamp": 1,
            "reasons": [],
            "confidenceScore": 1.0
        })))
        .mount(&backend)
        .await;
    let scan = relay(&backend.uri(), "gemini").analyze(&page()).await;
    assert_local_fallback(&scan);
}

#[tokio::test]
async fn relay_falls_back_when_backend_is_down() {
    let uri = {
        let server = MockServer::start().await;
        server.uri()
    };
    let scan = relay(&uri, "gemini").analyze(&page()).await;
    assert_local_fallback(&scan);
    assert!(scan.timestamp > 0);
}

/// relay -> live server -> dispatcher -> mocked provider -> normalizer -> relay
#[tokio::test]
async fn relay_through_live_server_to_mocked_provider() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content":
                "{\"risk\":\"HIGH\",\"reasons\":[\"typosquatted domain\"],\"confidenceScore\":0.7}" } }]
        })))
        .mount(&upstream)
        .await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&upstream)
        .await;

    let mut cfg = Config::default();
    cfg.providers.deepseek.endpoint = format!("{}/chat", upstream.uri());
    cfg.providers.gemini.endpoint = format!("{}/generate", upstream.uri());

    let secrets: Arc<dyn secrets::SecretStore> = Arc::new(secrets::EnvFileStore::from_map(
        [("DEEPSEEK_API_KEY".to_string(), "dk".to_string())].into(),
    ));
    let client = startup::build_http_client(&cfg).unwrap();
    let dispatcher = startup::build_dispatcher(&cfg, &secrets, client);
    let app = routes::router(Arc::new(AppState {
        config: cfg,
        secrets,
        dispatcher,
    }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let scan = relay(&base, "deepseek").analyze(&page()).await;
    assert_eq!(scan.analysis.risk, RiskLevel::High);
    assert_eq!(scan.analysis.reasons, vec!["typosquatted domain"]);
    assert_eq!(scan.analysis.confidence_score, 0.7);

    // Gemini (the default) is failing upstream: still a 200 with the degraded verdict.
    let scan = relay(&base, "no-such-provider").analyze(&page()).await;
    assert_eq!(scan.analysis.reasons, vec![REASON_API_ERROR]);
    assert_eq!(scan.analysis.confidence_score, 0.5);
}
