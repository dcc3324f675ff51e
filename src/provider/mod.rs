//! Provider callers and the dispatcher that picks one per request.
//!
//! Each provider makes exactly one outbound call per analysis. Transport problems
//! (connect, timeout, non-2xx, unreadable body) are absorbed into
//! [`AnalysisResult::api_error`]; only a request that cannot be built at all is
//! reported as a [`ProviderError`].

pub mod deepseek;
pub mod gemini;

use crate::analysis::AnalysisResult;
use crate::content::WebsiteContent;
use crate::normalize::{normalize_body, Envelope};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, sync::Arc};
use thiserror::Error;
use tracing::{debug, info, warn};

pub use deepseek::DeepseekProvider;
pub use gemini::GeminiProvider;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Gemini,
    Deepseek,
}

impl ProviderId {
    pub const ALL: [ProviderId; 2] = [ProviderId::Gemini, ProviderId::Deepseek];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Some(ProviderId::Gemini),
            "deepseek" => Some(ProviderId::Deepseek),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Gemini => "gemini",
            ProviderId::Deepseek => "deepseek",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("could not build provider request: {0}")]
    Request(#[source] reqwest::Error),
    #[error("{0}")]
    Internal(String),
}

#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    async fn analyze(&self, content: &WebsiteContent) -> Result<AnalysisResult, ProviderError>;
}

/// Send one request and normalize whatever comes back.
pub(crate) async fn exchange(
    provider: ProviderId,
    request: reqwest::RequestBuilder,
    envelope: Envelope,
) -> Result<AnalysisResult, ProviderError> {
    let (client, request) = request.build_split();
    let request = request.map_err(ProviderError::Request)?;

    let response = match client.execute(request).await {
        Ok(r) => r,
        Err(e) => {
            warn!(%provider, timeout = e.is_timeout(), connect = e.is_connect(), error = %e,
                "provider call failed");
            return Ok(AnalysisResult::api_error());
        }
    };

    let status = response.status();
    let body = match response.text().await {
        Ok(b) => b,
        Err(e) => {
            warn!(%provider, %status, error = %e, "failed reading provider response");
            return Ok(AnalysisResult::api_error());
        }
    };

    if !status.is_success() {
        warn!(%provider, %status, body = %snippet(&body), "provider returned error status");
        return Ok(AnalysisResult::api_error());
    }

    debug!(%provider, bytes = body.len(), "provider response received");
    Ok(normalize_body(envelope, &body))
}

fn snippet(body: &str) -> &str {
    match body.char_indices().nth(200) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

/// Maps a requested provider id to a registered implementation.
///
/// Unknown, unregistered or absent ids resolve to the default provider.
#[derive(Clone)]
pub struct Dispatcher {
    providers: HashMap<ProviderId, Arc<dyn AnalysisProvider>>,
    default: ProviderId,
    fallback: Arc<dyn AnalysisProvider>,
}

impl Dispatcher {
    pub fn new(default: ProviderId, provider: Arc<dyn AnalysisProvider>) -> Self {
        Self {
            providers: HashMap::from([(default, provider.clone())]),
            default,
            fallback: provider,
        }
    }

    pub fn with(mut self, id: ProviderId, provider: Arc<dyn AnalysisProvider>) -> Self {
        if id == self.default {
            self.fallback = provider.clone();
        }
        self.providers.insert(id, provider);
        self
    }

    pub fn default_id(&self) -> ProviderId {
        self.default
    }

    pub fn registered(&self) -> Vec<ProviderId> {
        let mut ids: Vec<_> = self.providers.keys().copied().collect();
        ids.sort_by_key(|id| id.as_str());
        ids
    }

    pub fn resolve(&self, requested: Option<&str>) -> ProviderId {
        match requested.and_then(ProviderId::parse) {
            Some(id) if self.providers.contains_key(&id) => id,
            _ => {
                if let Some(r) = requested {
                    info!(requested = r, default = %self.default, "unknown provider; using default");
                }
                self.default
            }
        }
    }

    pub fn select(&self, requested: Option<&str>) -> (ProviderId, Arc<dyn AnalysisProvider>) {
        let id = self.resolve(requested);
        let provider = self
            .providers
            .get(&id)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone());
        (id, provider)
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("providers", &self.registered())
            .field("default", &self.default)
            .finish()
    }
}
