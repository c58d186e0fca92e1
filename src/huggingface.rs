use async_trait::async_trait;
use serde::Serialize;

use crate::config::GenerationParams;
use crate::error::{Error, Result};

pub const DEFAULT_INFERENCE_BASE: &str = "https://api-inference.huggingface.co";

pub fn model_endpoint(base_url: &str, model: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    format!("{base_url}/models/{model}")
}

/// One remote summarization call against a named model. Failures come back
/// as `UpstreamUnavailable`, `UpstreamRejected`, `UnusableResponse` or
/// `Network`; see [`Error::is_retryable`].
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    async fn summarize(
        &self,
        model: &str,
        input: &str,
        params: &GenerationParams,
    ) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: &'a GenerationParams,
    options: InferenceOptions,
}

#[derive(Debug, Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
    use_cache: bool,
}

pub struct HuggingFaceClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    wait_for_model: bool,
}

impl HuggingFaceClient {
    pub fn new(http: reqwest::Client, base_url: &str, api_key: &str, wait_for_model: bool) -> Self {
        Self {
            http,
            base_url: base_url.to_owned(),
            api_key: api_key.to_owned(),
            wait_for_model,
        }
    }
}

#[async_trait]
impl InferenceBackend for HuggingFaceClient {
    async fn summarize(
        &self,
        model: &str,
        input: &str,
        params: &GenerationParams,
    ) -> Result<String> {
        let endpoint = model_endpoint(&self.base_url, model);
        let body = InferenceRequest {
            inputs: input,
            parameters: params,
            options: InferenceOptions {
                wait_for_model: self.wait_for_model,
                use_cache: true,
            },
        };

        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_failure)?;

        let status = response.status();
        let raw = response.text().await.map_err(transport_failure)?;
        if !status.is_success() {
            let message = parse_error_message(&raw).unwrap_or(raw);
            return Err(status_failure(status.as_u16(), message));
        }

        let value: serde_json::Value = serde_json::from_str(&raw)
            .map_err(|err| Error::UnusableResponse(format!("parse response: {err}")))?;
        extract_summary_text(&value)
    }
}

fn transport_failure(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Network(format!("timed out: {err}"))
    } else {
        Error::Network(err.to_string())
    }
}

fn status_failure(status: u16, message: String) -> Error {
    match status {
        500 | 502 | 503 | 504 => Error::UpstreamUnavailable { status, message },
        _ => Error::UpstreamRejected { status, message },
    }
}

fn parse_error_message(raw_json: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw_json).ok()?;
    match value.get("error")? {
        serde_json::Value::String(message) => Some(message.clone()),
        other => other.get("message")?.as_str().map(str::to_owned),
    }
}

/// Accepts `[{"summary_text": ..}]`, `{"summary_text": ..}` and the
/// `generated_text` variant some text2text models return.
fn extract_summary_text(value: &serde_json::Value) -> Result<String> {
    let item = match value {
        serde_json::Value::Array(items) => items.first(),
        other => Some(other),
    };
    let text = item
        .and_then(|item| {
            item.get("summary_text")
                .or_else(|| item.get("generated_text"))
        })
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::UnusableResponse("missing `summary_text` in response".into()))?;

    if text.trim().is_empty() {
        return Err(Error::UnusableResponse("summary text is empty".into()));
    }
    Ok(text.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;

    #[test]
    fn endpoint_joins_base_and_model() {
        assert_eq!(
            model_endpoint("https://api-inference.huggingface.co/", "facebook/bart-large-cnn"),
            "https://api-inference.huggingface.co/models/facebook/bart-large-cnn"
        );
    }

    #[test]
    fn extracts_summary_from_known_shapes() {
        let list = serde_json::json!([{ "summary_text": "A summary." }]);
        assert_eq!(extract_summary_text(&list).unwrap(), "A summary.");

        let object = serde_json::json!({ "summary_text": "Object form." });
        assert_eq!(extract_summary_text(&object).unwrap(), "Object form.");

        let generated = serde_json::json!([{ "generated_text": "Generated." }]);
        assert_eq!(extract_summary_text(&generated).unwrap(), "Generated.");

        let empty = serde_json::json!([{ "summary_text": "  " }]);
        assert!(matches!(
            extract_summary_text(&empty),
            Err(Error::UnusableResponse(_))
        ));
        assert!(extract_summary_text(&serde_json::json!([])).is_err());
    }

    #[test]
    fn parses_error_messages() {
        assert_eq!(
            parse_error_message(r#"{"error":"Model is currently loading","estimated_time":20.0}"#)
                .as_deref(),
            Some("Model is currently loading")
        );
        assert_eq!(
            parse_error_message(r#"{"error":{"message":"bad input"}}"#).as_deref(),
            Some("bad input")
        );
        assert_eq!(parse_error_message("plain text"), None);
    }

    #[test]
    fn statuses_map_to_upstream_errors() {
        let unavailable = status_failure(503, "Model is currently loading".into());
        assert!(matches!(
            unavailable,
            Error::UpstreamUnavailable { status: 503, .. }
        ));
        assert!(unavailable.is_retryable());
        assert_eq!(unavailable.failure_kind(), Some(FailureKind::ServiceUnavailable));

        let rejected = status_failure(400, "bad input".into());
        assert!(matches!(rejected, Error::UpstreamRejected { status: 400, .. }));
        assert!(!rejected.is_retryable());

        let limited = status_failure(429, "slow down".into());
        assert!(!limited.is_retryable());
        assert_eq!(limited.failure_kind(), Some(FailureKind::RateLimited));

        assert!(!status_failure(501, String::new()).is_retryable());
    }
}
