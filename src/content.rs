use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Page content captured by the extension.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct WebsiteContent {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub links: Vec<String>,
    /// Passed through untouched.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl WebsiteContent {
    /// Name of the first required field that is empty, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.url.is_empty() {
            Some("url")
        } else if self.text.is_empty() {
            Some("text")
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AnalyzeConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

/// Body of `POST /api/analyze`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub content: Option<WebsiteContent>,
    #[serde(default)]
    pub config: Option<AnalyzeConfig>,
}

impl AnalyzeRequest {
    pub fn new(content: WebsiteContent, provider: Option<String>) -> Self {
        Self {
            content: Some(content),
            config: Some(AnalyzeConfig { provider }),
        }
    }

    pub fn provider(&self) -> Option<&str> {
        self.config.as_ref().and_then(|c| c.provider.as_deref())
    }
}
