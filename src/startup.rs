use crate::config::Config;
use crate::provider::{AnalysisProvider, DeepseekProvider, Dispatcher, GeminiProvider, ProviderId};
use crate::secrets;
use anyhow::{Context, Result};
use std::{path::PathBuf, sync::Arc};
use tracing::{info, warn};

/// Build secrets store.
///
/// If `secrets_file` is provided, secrets resolve from: file -> env.
pub fn build_secrets_store(secrets_file: Option<PathBuf>) -> Result<Arc<dyn secrets::SecretStore>> {
    let secrets: Arc<dyn secrets::SecretStore> = match secrets_file {
        Some(path) => {
            let file_store = secrets::EnvFileStore::load(&path)?;
            info!(path = %path.display(), "loaded secrets file");
            Arc::new(secrets::CompositeStore::new(vec![
                Box::new(file_store),
                Box::new(secrets::EnvStore),
            ]))
        }
        None => Arc::new(secrets::EnvStore),
    };
    Ok(secrets)
}

/// One client shared by every provider, carrying the per-call timeout.
pub fn build_http_client(cfg: &Config) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(cfg.request_timeout())
        .user_agent(concat!("umbrella-scan/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")
}

/// Look up a provider credential. Absence is not fatal: calls go out without
/// credentials and end in the transport fallback.
fn credential(secrets: &Arc<dyn secrets::SecretStore>, provider: ProviderId, key: &str) -> Option<String> {
    let value = secrets.get(key);
    if value.is_none() {
        warn!(%provider, env = key, "API key not found; calls to this provider will fail");
    }
    value
}

pub fn default_provider(cfg: &Config) -> ProviderId {
    ProviderId::parse(&cfg.analysis.default_provider).unwrap_or_else(|| {
        warn!(
            "Unknown analysis.default_provider={}; using gemini",
            cfg.analysis.default_provider
        );
        ProviderId::Gemini
    })
}

pub fn build_dispatcher(
    cfg: &Config,
    secrets: &Arc<dyn secrets::SecretStore>,
    client: reqwest::Client,
) -> Dispatcher {
    let p = &cfg.providers;
    let gemini = Arc::new(GeminiProvider::new(
        client.clone(),
        &p.gemini,
        credential(secrets, ProviderId::Gemini, &p.gemini.api_key_env),
    ));
    let deepseek = Arc::new(DeepseekProvider::new(
        client,
        &p.deepseek,
        credential(secrets, ProviderId::Deepseek, &p.deepseek.api_key_env),
    ));

    let default = default_provider(cfg);
    info!(
        "providers: gemini={} deepseek={} ({}); default={}",
        p.gemini.endpoint, p.deepseek.endpoint, p.deepseek.model, default
    );

    let chosen: Arc<dyn AnalysisProvider> = match default {
        ProviderId::Gemini => gemini.clone(),
        ProviderId::Deepseek => deepseek.clone(),
    };
    Dispatcher::new(default, chosen)
        .with(ProviderId::Gemini, gemini)
        .with(ProviderId::Deepseek, deepseek)
}
