use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, net::SocketAddr, path::Path, time::Duration};
use tracing::warn;

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
/// Upper bound on a single provider call.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const DEEPSEEK_ENDPOINT: &str = "https://api.deepseek.com/v1/chat/completions";
pub const DEEPSEEK_MODEL: &str = "deepseek-chat";
pub const GEMINI_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub analysis: AnalysisConfig,
    pub providers: ProvidersConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: String,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Provider used when a request names none or an unknown one.
    pub default_provider: String,
    pub request_timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_provider: "gemini".to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ProvidersConfig {
    pub deepseek: DeepseekConfig,
    pub gemini: GeminiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DeepseekConfig {
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    /// Secret-store key holding the bearer token.
    pub api_key_env: String,
}

impl Default for DeepseekConfig {
    fn default() -> Self {
        Self {
            endpoint: DEEPSEEK_ENDPOINT.to_string(),
            model: DEEPSEEK_MODEL.to_string(),
            temperature: 0.2,
            api_key_env: "DEEPSEEK_API_KEY".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GeminiConfig {
    pub endpoint: String,
    pub api_key_env: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: GEMINI_ENDPOINT.to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed reading config file: {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("invalid config file: {}", path.display()))
    }

    /// Load `path` if given (defaults otherwise), then apply environment overrides.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut cfg = match path {
            Some(p) => Self::load(p)?,
            None => Self::default(),
        };
        cfg.apply_env();
        Ok(cfg)
    }

    pub fn apply_env(&mut self) {
        fn var(name: &str) -> Option<String> {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        if let Some(port) = var("PORT") {
            match port.parse::<u16>() {
                Ok(port) => self.server.bind = with_port(&self.server.bind, port),
                Err(_) => warn!("ignoring invalid PORT={}", port),
            }
        }
        if let Some(p) = var("UMBRELLA_DEFAULT_PROVIDER") {
            self.analysis.default_provider = p;
        }
        if let Some(t) = var("UMBRELLA_REQUEST_TIMEOUT_SECS") {
            match t.parse::<u64>() {
                Ok(secs) if secs > 0 => self.analysis.request_timeout_secs = secs,
                _ => warn!("ignoring invalid UMBRELLA_REQUEST_TIMEOUT_SECS={}", t),
            }
        }
        if let Some(e) = var("DEEPSEEK_ENDPOINT") {
            self.providers.deepseek.endpoint = e;
        }
        if let Some(e) = var("GEMINI_ENDPOINT") {
            self.providers.gemini.endpoint = e;
        }
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server
            .bind
            .parse()
            .with_context(|| format!("invalid server.bind address: {}", self.server.bind))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.analysis.request_timeout_secs.max(1))
    }
}

fn with_port(bind: &str, port: u16) -> String {
    match bind.rsplit_once(':') {
        Some((host, _)) => format!("{host}:{port}"),
        None => format!("{bind}:{port}"),
    }
}
