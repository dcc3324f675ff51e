use super::{exchange, AnalysisProvider, ProviderError, ProviderId};
use crate::analysis::AnalysisResult;
use crate::config::DeepseekConfig;
use crate::content::WebsiteContent;
use crate::normalize::Envelope;
use crate::prompt;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, instrument};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Chat-completion provider. The verdict arrives as a JSON string in
/// `choices[0].message.content`.
pub struct DeepseekProvider {
    client: Client,
    endpoint: String,
    model: String,
    temperature: f32,
    api_key: Option<String>,
}

impl DeepseekProvider {
    pub fn new(client: Client, cfg: &DeepseekConfig, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            temperature: cfg.temperature,
            api_key,
        }
    }
}

#[async_trait]
impl AnalysisProvider for DeepseekProvider {
    #[instrument(skip_all, fields(provider = "deepseek", url = %content.url))]
    async fn analyze(&self, content: &WebsiteContent) -> Result<AnalysisResult, ProviderError> {
        let user = prompt::chat_user_message(content);
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: prompt::SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user,
                },
            ],
            temperature: self.temperature,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };
        debug!(model = %self.model, prompt_chars = user.chars().count(), "calling chat completion");

        let mut req = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        exchange(ProviderId::Deepseek, req, Envelope::ChatCompletion).await
    }
}
