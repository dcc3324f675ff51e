use crate::risk::RiskLevel;
use serde::{Deserialize, Serialize};

pub const REASON_UNPARSEABLE: &str = "Unable to parse AI response properly";
pub const REASON_DECODE_ERROR: &str = "Error parsing AI analysis";
pub const REASON_API_ERROR: &str = "Failed to analyze website due to API error";
pub const REASON_NONE_PROVIDED: &str = "No specific reasons provided";
pub const REASON_RELAY_FAILED: &str = "Failed to analyze website content";

/// Confidence used whenever the provider's answer is missing or ambiguous.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Canonical, provider-independent verdict.
///
/// `reasons` is never empty once a value leaves the normalizer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub risk: RiskLevel,
    pub reasons: Vec<String>,
    pub confidence_score: f64,
}

impl AnalysisResult {
    /// Degraded verdict: medium risk, default confidence, one explanatory reason.
    pub fn fallback(reason: &str) -> Self {
        Self {
            risk: RiskLevel::Medium,
            reasons: vec![reason.to_string()],
            confidence_score: DEFAULT_CONFIDENCE,
        }
    }

    pub fn unparseable() -> Self {
        Self::fallback(REASON_UNPARSEABLE)
    }

    pub fn decode_error() -> Self {
        Self::fallback(REASON_DECODE_ERROR)
    }

    pub fn api_error() -> Self {
        Self::fallback(REASON_API_ERROR)
    }

    pub fn into_scan(self, url: impl Into<String>, timestamp: u64) -> ScanResult {
        ScanResult {
            url: url.into(),
            timestamp,
            analysis: self,
        }
    }
}

/// Analysis result stamped with the page URL and the time it was produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanResult {
    pub url: String,
    /// Unix epoch milliseconds.
    pub timestamp: u64,
    #[serde(flatten)]
    pub analysis: AnalysisResult,
}

impl ScanResult {
    /// Locally synthesized result for when the backend could not be reached.
    ///
    /// Zero confidence means "no data"; the backend's 0.5 means "the model answered
    /// but the answer was unusable".
    pub fn relay_fallback(url: impl Into<String>) -> Self {
        AnalysisResult {
            risk: RiskLevel::Medium,
            reasons: vec![REASON_RELAY_FAILED.to_string()],
            confidence_score: 0.0,
        }
        .into_scan(url, now_millis())
    }
}

pub fn now_millis() -> u64 {
    let nanos = time::OffsetDateTime::now_utc().unix_timestamp_nanos();
    u64::try_from(nanos / 1_000_000).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scan_result_wire_shape_is_flat_camel_case() {
        let scan = AnalysisResult {
            risk: RiskLevel::Low,
            reasons: vec!["a".into()],
            confidence_score: 0.8,
        }
        .into_scan("https://example.com", 1_700_000_000_000);

        let v = serde_json::to_value(&scan).unwrap();
        assert_eq!(
            v,
            json!({
                "url": "https://example.com",
                "timestamp": 1_700_000_000_000u64,
                "risk": "low",
                "reasons": ["a"],
                "confidenceScore": 0.8
            })
        );
    }

    #[test]
    fn backend_and_relay_fallbacks_differ_in_confidence() {
        assert_eq!(AnalysisResult::api_error().confidence_score, 0.5);
        let relay = ScanResult::relay_fallback("https://x.test");
        assert_eq!(relay.analysis.confidence_score, 0.0);
        assert_eq!(relay.analysis.risk, RiskLevel::Medium);
        assert_eq!(relay.analysis.reasons, vec![REASON_RELAY_FAILED.to_string()]);
        assert!(relay.timestamp > 0);
    }
}
