use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde_json::json;

/// Schema for the body returned by `POST /api/analyze`.
pub fn scan_result_schema() -> serde_json::Value {
    json!({
      "$schema": "http://json-schema.org/draft-07/schema#",
      "title": "ScanResult",
      "type": "object",
      "required": ["url", "risk", "timestamp", "reasons", "confidenceScore"],
      "properties": {
        "url": {"type": "string"},
        "risk": {"type": "string", "enum": ["safe", "low", "medium", "high", "critical"]},
        "timestamp": {"type": "integer", "minimum": 0},
        "reasons": {"type": "array", "items": {"type": "string"}, "minItems": 1},
        "confidenceScore": {"type": "number"}
      }
    })
}

static SCAN_RESULT_VALIDATOR: Lazy<JSONSchema> = Lazy::new(|| {
    JSONSchema::compile(&scan_result_schema()).expect("scan result schema must compile")
});

pub fn is_valid_scan_result(value: &serde_json::Value) -> bool {
    SCAN_RESULT_VALIDATOR.is_valid(value)
}

pub fn json_error(status: StatusCode, msg: &str, details: &str) -> Response {
    let body = json!({
        "error": msg,
        "details": details,
    });
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_accepts_result_and_rejects_empty_reasons() {
        let ok = json!({
            "url": "https://a.test", "risk": "high", "timestamp": 1,
            "reasons": ["x"], "confidenceScore": 0.3
        });
        assert!(is_valid_scan_result(&ok));

        let mut bad = ok.clone();
        bad["reasons"] = json!([]);
        assert!(!is_valid_scan_result(&bad));

        let mut bad = ok;
        bad["risk"] = json!("HIGH");
        assert!(!is_valid_scan_result(&bad));
    }
}
