//! Best-effort caption download. Any failure here means "no transcript";
//! the caller falls back to the description.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::retry::{Sleeper, backoff_delay};
use crate::text;
use crate::youtube::VideoId;

pub const DEFAULT_CAPTIONS_BASE: &str = "https://www.youtube.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionSegment {
    pub start_ms: u64,
    pub duration_ms: u64,
    pub text: String,
}

pub struct CaptionClient {
    http: reqwest::Client,
    base_url: String,
    language: String,
    attempts: u32,
    backoff: Duration,
    sleeper: Arc<dyn Sleeper>,
}

enum AttemptError {
    Retryable(String),
    Final(String),
}

impl CaptionClient {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        language: &str,
        attempts: u32,
        backoff: Duration,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            language: language.to_owned(),
            attempts: attempts.max(1),
            backoff,
            sleeper,
        }
    }

    /// Fetches caption segments, retrying transport errors and 5xx responses.
    /// Returns `None` when the video has no captions or every attempt failed.
    pub async fn fetch_segments(&self, video_id: &VideoId) -> Option<Vec<CaptionSegment>> {
        for attempt in 1..=self.attempts {
            match self.fetch_once(video_id).await {
                Ok(segments) if segments.is_empty() => {
                    tracing::debug!(%video_id, "caption track is empty");
                    return None;
                }
                Ok(segments) => return Some(segments),
                Err(AttemptError::Final(reason)) => {
                    tracing::debug!(%video_id, %reason, "captions unavailable");
                    return None;
                }
                Err(AttemptError::Retryable(reason)) => {
                    tracing::warn!(
                        %video_id,
                        attempt,
                        attempts = self.attempts,
                        %reason,
                        "caption fetch failed"
                    );
                    if attempt < self.attempts {
                        let delay = backoff_delay(self.backoff, attempt, self.backoff * 8);
                        self.sleeper.sleep(delay).await;
                    }
                }
            }
        }
        None
    }

    async fn fetch_once(&self, video_id: &VideoId) -> Result<Vec<CaptionSegment>, AttemptError> {
        let endpoint = url::Url::parse_with_params(
            &format!("{}/api/timedtext", self.base_url),
            &[
                ("v", video_id.as_str()),
                ("lang", self.language.as_str()),
                ("fmt", "json3"),
            ],
        )
        .map_err(|err| AttemptError::Final(format!("build captions url: {err}")))?;

        let response = self
            .http
            .get(endpoint)
            .send()
            .await
            .map_err(|err| AttemptError::Retryable(err.to_string()))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(AttemptError::Retryable(format!("status {status}")));
        }
        if !status.is_success() {
            return Err(AttemptError::Final(format!("status {status}")));
        }

        let raw = response
            .text()
            .await
            .map_err(|err| AttemptError::Retryable(err.to_string()))?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        parse_json3(&raw).map_err(|err| AttemptError::Final(format!("parse captions: {err}")))
    }
}

#[derive(Debug, Deserialize)]
struct Json3 {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Json3Event {
    #[serde(default)]
    t_start_ms: u64,
    #[serde(default)]
    d_duration_ms: u64,
    #[serde(default)]
    segs: Vec<Json3Seg>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

pub fn parse_json3(raw: &str) -> serde_json::Result<Vec<CaptionSegment>> {
    let doc: Json3 = serde_json::from_str(raw)?;
    Ok(doc
        .events
        .into_iter()
        .filter_map(|event| {
            let joined: String = event.segs.iter().map(|seg| seg.utf8.as_str()).collect();
            let text = text::collapse_whitespace(&joined);
            (!text.is_empty()).then_some(CaptionSegment {
                start_ms: event.t_start_ms,
                duration_ms: event.d_duration_ms,
                text,
            })
        })
        .collect())
}

/// Joins segments into plain text with fillers and annotations removed.
pub fn transcript_text(segments: &[CaptionSegment]) -> String {
    let joined = segments
        .iter()
        .map(|seg| seg.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    text::clean_transcript(&joined)
}
