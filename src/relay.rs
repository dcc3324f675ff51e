//! Client side of `POST /api/analyze`.
//!
//! The relay always produces a [`ScanResult`]. When the backend cannot be reached,
//! answers with an error status, or replies with something that is not a scan
//! result, a local fallback with zero confidence is returned instead.

use crate::analysis::ScanResult;
use crate::content::{AnalyzeConfig, WebsiteContent};
use crate::history::RelayConfig;
use crate::introspection::is_valid_scan_result;
use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Longer than the backend's own provider timeout so a degraded backend answer
/// still arrives.
pub const DEFAULT_RELAY_TIMEOUT: Duration = Duration::from_secs(45);

#[derive(Serialize)]
struct RelayRequest<'a> {
    content: &'a WebsiteContent,
    config: AnalyzeConfig,
}

#[derive(Debug, Clone)]
pub struct Relay {
    client: reqwest::Client,
    backend_url: String,
    provider: String,
}

impl Relay {
    pub fn new(backend_url: &str, provider: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            backend_url: backend_url.trim_end_matches('/').to_string(),
            provider: provider.to_string(),
        })
    }

    pub fn from_config(cfg: &RelayConfig, timeout: Duration) -> Result<Self> {
        Self::new(&cfg.backend_url, &cfg.provider, timeout)
    }

    pub fn analyze_url(&self) -> String {
        format!("{}/api/analyze", self.backend_url)
    }

    pub async fn analyze(&self, content: &WebsiteContent) -> ScanResult {
        match self.try_analyze(content).await {
            Ok(scan) => scan,
            Err(e) => {
                warn!(url = %content.url, error = %format!("{e:#}"), "backend analysis failed; using local fallback");
                ScanResult::relay_fallback(&content.url)
            }
        }
    }

    pub async fn try_analyze(&self, content: &WebsiteContent) -> Result<ScanResult> {
        let url = self.analyze_url();
        let body = RelayRequest {
            content,
            config: AnalyzeConfig {
                provider: Some(self.provider.clone()),
            },
        };

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("POST {url}"))?;
        let status = resp.status();
        let reply: Value = resp.json().await.context("parse backend reply")?;
        debug!(%status, "backend replied");

        if !status.is_success() {
            let details = reply
                .get("details")
                .and_then(Value::as_str)
                .unwrap_or_default();
            bail!("backend returned {status}: {details}");
        }
        if !is_valid_scan_result(&reply) {
            bail!("backend reply is not a scan result");
        }
        serde_json::from_value(reply).context("decode scan result")
    }
}
