use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::summarize::SummaryResult;
use crate::youtube::{TextSource, VideoRecord};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizeRequest {
    /// Missing or null reads as empty and fails the length check.
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizeResponse {
    pub summary: String,
    pub paragraphs: Vec<String>,
    pub model: String,
    pub degraded: bool,
}

impl From<SummaryResult> for SummarizeResponse {
    fn from(result: SummaryResult) -> Self {
        Self {
            paragraphs: result.paragraphs(),
            summary: result.text,
            model: result.model,
            degraded: result.degraded,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRequest {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VideoResponse {
    pub request_id: Uuid,
    pub video: VideoRecord,
    pub source: TextSource,
    pub summary: String,
    pub paragraphs: Vec<String>,
    pub model: String,
    pub degraded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
