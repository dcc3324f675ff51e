use super::{exchange, AnalysisProvider, ProviderError, ProviderId};
use crate::analysis::AnalysisResult;
use crate::config::GeminiConfig;
use crate::content::WebsiteContent;
use crate::normalize::Envelope;
use crate::prompt;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, instrument};

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<GenerateContent>,
}

#[derive(Debug, Serialize)]
struct GenerateContent {
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
struct TextPart {
    text: String,
}

/// Generate-content provider. The model answers in free text that should contain
/// a JSON object somewhere in `candidates[0].content.parts[0].text`.
pub struct GeminiProvider {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl GeminiProvider {
    pub fn new(client: Client, cfg: &GeminiConfig, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint: cfg.endpoint.clone(),
            api_key,
        }
    }
}

#[async_trait]
impl AnalysisProvider for GeminiProvider {
    #[instrument(skip_all, fields(provider = "gemini", url = %content.url))]
    async fn analyze(&self, content: &WebsiteContent) -> Result<AnalysisResult, ProviderError> {
        let text = prompt::generate_prompt(content);
        debug!(prompt_chars = text.chars().count(), "calling generate content");

        let body = GenerateRequest {
            contents: vec![GenerateContent {
                parts: vec![TextPart { text }],
            }],
        };

        let mut req = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            req = req.header("x-goog-api-key", key.as_str());
        }
        exchange(ProviderId::Gemini, req, Envelope::GenerateContent).await
    }
}
