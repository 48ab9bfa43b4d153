//! Response formatting for both invocation modes.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::dispatch::{ErrorKind, ExecutionResult};

/// Output format requested by a headless caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    #[default]
    Text,
    Json,
}

impl ResponseFormat {
    /// Parse a `format` parameter. Anything unrecognised is text.
    pub fn parse(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.parse().ok()).unwrap_or_default()
    }
}

impl FromStr for ResponseFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(ResponseFormat::Text),
            "json" => Ok(ResponseFormat::Json),
            other => Err(format!("unknown format '{}'", other)),
        }
    }
}

/// Styling hint for the result panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Success,
    Failure,
}

/// Result as shown in the interactive view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultPanel {
    pub tone: Tone,
    /// Pretty-printed JSON.
    pub body: String,
}

/// A complete headless HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl HeadlessResponse {
    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const APPLICATION_JSON: &str = "application/json";

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Render a result for the interactive result panel.
pub fn format_interactive(result: &ExecutionResult) -> ResultPanel {
    match result {
        ExecutionResult::Success { payload } => ResultPanel {
            tone: Tone::Success,
            body: pretty(payload),
        },
        ExecutionResult::Failure(failure) => {
            let mut error = json!({
                "error": failure.message,
                "kind": failure.kind.as_str(),
            });
            if let Some(detail) = &failure.detail {
                error["detail"] = Value::String(detail.clone());
            }
            ResultPanel {
                tone: Tone::Failure,
                body: pretty(&error),
            }
        }
    }
}

/// HTTP status for a result.
pub fn status_for(result: &ExecutionResult) -> u16 {
    match result.failure_info().map(|f| f.kind) {
        None => 200,
        Some(ErrorKind::Validation) => 400,
        Some(ErrorKind::NotFound) => 404,
        Some(ErrorKind::Execution) => 500,
    }
}

/// Render a result as a headless response body.
pub fn format_headless(result: &ExecutionResult, format: ResponseFormat) -> HeadlessResponse {
    let status = status_for(result);
    match format {
        ResponseFormat::Json => {
            let body = match result {
                ExecutionResult::Success { payload } => pretty(payload),
                failure => serde_json::to_value(failure)
                    .map(|v| pretty(&v))
                    .unwrap_or_default(),
            };
            HeadlessResponse {
                status,
                content_type: APPLICATION_JSON,
                body,
            }
        }
        ResponseFormat::Text => {
            let body = match result {
                ExecutionResult::Success {
                    payload: Value::String(s),
                } => s.clone(),
                ExecutionResult::Success { payload } => payload.to_string(),
                ExecutionResult::Failure(f) => format!("{}: {}", f.kind.as_str(), f.message),
            };
            HeadlessResponse {
                status,
                content_type: TEXT_PLAIN,
                body,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success() -> ExecutionResult {
        ExecutionResult::success(json!({ "sin": 0.707, "cos": 0.707 }))
    }

    #[test]
    fn test_parse_format() {
        assert_eq!(ResponseFormat::parse(Some("json")), ResponseFormat::Json);
        assert_eq!(ResponseFormat::parse(Some("JSON")), ResponseFormat::Json);
        assert_eq!(ResponseFormat::parse(Some("xml")), ResponseFormat::Text);
        assert_eq!(ResponseFormat::parse(None), ResponseFormat::Text);
    }

    #[test]
    fn test_headless_json_success() {
        let response = format_headless(&success(), ResponseFormat::Json);
        assert_eq!(response.status, 200);
        assert_eq!(response.content_type, "application/json");
        let parsed: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(parsed, json!({ "sin": 0.707, "cos": 0.707 }));
        assert!(response.body.contains('\n'));
    }

    #[test]
    fn test_headless_text_success() {
        let response = format_headless(&success(), ResponseFormat::Text);
        assert_eq!(response.body, r#"{"sin":0.707,"cos":0.707}"#);

        let response = format_headless(&ExecutionResult::success(json!("ok")), ResponseFormat::Text);
        assert_eq!(response.body, "ok");
        assert!(response.content_type.starts_with("text/plain"));
    }

    #[test]
    fn test_headless_failure_statuses() {
        let cases = [
            (ErrorKind::Validation, 400),
            (ErrorKind::NotFound, 404),
            (ErrorKind::Execution, 500),
        ];
        for (kind, status) in cases {
            let result = ExecutionResult::failure(kind, "bad", None);
            let response = format_headless(&result, ResponseFormat::Text);
            assert_eq!(response.status, status);
            assert!(!response.is_success());
            assert_eq!(response.body, format!("{}: bad", kind.as_str()));
        }
    }

    #[test]
    fn test_headless_json_failure_is_envelope() {
        let result = ExecutionResult::not_found("warp");
        let response = format_headless(&result, ResponseFormat::Json);
        let parsed: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(parsed["ok"], json!(false));
        assert_eq!(parsed["kind"], json!("NotFoundError"));
    }

    #[test]
    fn test_interactive_panels() {
        let panel = format_interactive(&success());
        assert_eq!(panel.tone, Tone::Success);
        assert!(panel.body.contains("\"sin\": 0.707"));

        let failure = ExecutionResult::failure(
            ErrorKind::Execution,
            "division by zero",
            Some("trace".to_string()),
        );
        let panel = format_interactive(&failure);
        assert_eq!(panel.tone, Tone::Failure);
        let parsed: Value = serde_json::from_str(&panel.body).unwrap();
        assert_eq!(
            parsed,
            json!({ "error": "division by zero", "kind": "ExecutionError", "detail": "trace" })
        );
    }
}
