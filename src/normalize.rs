//! Provider response normalization.
//!
//! Every function here is total: malformed, missing or surprising provider output
//! ends in a well-formed [`AnalysisResult`], never in an error. Callers can treat
//! normalization as infallible.

use crate::analysis::{AnalysisResult, DEFAULT_CONFIDENCE, REASON_NONE_PROVIDED};
use crate::risk::RiskLevel;
use serde_json::Value;
use tracing::warn;

/// Where the model's text lives inside a provider envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    /// `choices[0].message.content` holds a JSON document.
    ChatCompletion,
    /// `candidates[0].content.parts[0].text` holds free text with a JSON object inside.
    GenerateContent,
}

impl Envelope {
    /// Pull the model's text out of a decoded response body.
    ///
    /// Returns `None` when the path is absent, not a string, or empty.
    pub fn payload<'a>(&self, body: &'a Value) -> Option<&'a str> {
        let text = match self {
            Envelope::ChatCompletion => body
                .pointer("/choices/0/message/content")
                .and_then(Value::as_str),
            Envelope::GenerateContent => body
                .pointer("/candidates/0/content/parts/0/text")
                .and_then(Value::as_str),
        };
        text.filter(|t| !t.is_empty())
    }

    /// The slice of the payload expected to hold the JSON verdict.
    pub fn locate<'a>(&self, payload: &'a str) -> Option<&'a str> {
        match self {
            Envelope::ChatCompletion => Some(payload),
            Envelope::GenerateContent => locate_json_object(payload),
        }
    }
}

/// Span from the first `{` to the last `}` that follows it.
///
/// The span is not checked for balance; a bad span fails later at decode time.
pub fn locate_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Normalize a raw provider response body.
///
/// `body` is the undecoded HTTP body; a body that is not JSON at all is treated the
/// same as an envelope without a payload.
pub fn normalize_body(envelope: Envelope, body: &str) -> AnalysisResult {
    let decoded = serde_json::from_str::<Value>(body).unwrap_or(Value::Null);
    normalize_envelope(envelope, &decoded)
}

pub fn normalize_envelope(envelope: Envelope, body: &Value) -> AnalysisResult {
    let Some(payload) = envelope.payload(body) else {
        warn!(?envelope, "provider response carried no text payload");
        return AnalysisResult::unparseable();
    };
    let Some(candidate) = envelope.locate(payload) else {
        warn!(?envelope, "no JSON object found in provider text");
        return AnalysisResult::unparseable();
    };
    normalize_verdict(candidate)
}

/// Decode a verdict document and validate it field by field.
pub fn normalize_verdict(json_text: &str) -> AnalysisResult {
    match serde_json::from_str::<Value>(json_text) {
        Ok(Value::Object(fields)) => AnalysisResult {
            risk: RiskLevel::coerce(fields.get("risk").and_then(Value::as_str)),
            reasons: validate_reasons(fields.get("reasons")),
            confidence_score: fields
                .get("confidenceScore")
                .and_then(Value::as_f64)
                .unwrap_or(DEFAULT_CONFIDENCE),
        },
        Ok(other) => {
            warn!(kind = json_kind(&other), "verdict is not a JSON object");
            AnalysisResult::decode_error()
        }
        Err(e) => {
            warn!(error = %e, "failed to decode verdict JSON");
            AnalysisResult::decode_error()
        }
    }
}

// Only a non-empty list made entirely of strings is kept.
fn validate_reasons(value: Option<&Value>) -> Vec<String> {
    let reasons: Option<Vec<String>> = value.and_then(Value::as_array).and_then(|items| {
        items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect()
    });

    match reasons {
        Some(list) if !list.is_empty() => list,
        _ => vec![REASON_NONE_PROVIDED.to_string()],
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
