use std::fmt;

use serde::Serialize;

/// Classification of a failed call to the summarization provider.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    RateLimited,
    ServiceUnavailable,
    Upstream,
    Network,
}

impl FailureKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => Self::RateLimited,
            500 | 502 | 503 | 504 => Self::ServiceUnavailable,
            _ => Self::Upstream,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::ServiceUnavailable => "service_unavailable",
            Self::Upstream => "upstream_error",
            Self::Network => "network_error",
        }
    }

    fn user_message(self) -> &'static str {
        match self {
            Self::RateLimited => {
                "The summarization service is rate limiting requests. Please wait a moment and try again."
            }
            Self::ServiceUnavailable => {
                "The summarization model is still loading. Please try again in a minute."
            }
            Self::Upstream => "Failed to generate summary. Please try again.",
            Self::Network => {
                "Could not reach the summarization service. Check your connection and try again."
            }
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("insufficient content: {len} characters, need at least {min}")]
    InsufficientContent { len: usize, min: usize },

    #[error("video not found: {video_id}")]
    NotFound { video_id: String },

    #[error("quota exceeded: {message}")]
    QuotaExceeded { message: String },

    #[error("fetch video data: {message}")]
    UnknownFetch { message: String },

    #[error("upstream unavailable ({status}): {message}")]
    UpstreamUnavailable { status: u16, message: String },

    #[error("upstream rejected request ({status}): {message}")]
    UpstreamRejected { status: u16, message: String },

    #[error("unusable upstream response: {0}")]
    UnusableResponse(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("all {attempts} summarization attempts failed, last failure: {last}")]
    AllAttemptsExhausted { last: FailureKind, attempts: usize },

    #[error("missing API key: {env_var} is not set")]
    MissingApiKey { env_var: &'static str },

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether the same request is worth sending again: server-side trouble
    /// and transport errors. Anything the provider rejected is not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::UpstreamUnavailable { status, .. } => matches!(status, 500 | 502 | 503 | 504),
            Self::Network(_) => true,
            _ => false,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::UpstreamUnavailable { .. } => Some(FailureKind::ServiceUnavailable),
            Self::UpstreamRejected { status, .. } => Some(FailureKind::from_status(*status)),
            Self::UnusableResponse(_) => Some(FailureKind::Upstream),
            Self::Network(_) => Some(FailureKind::Network),
            Self::AllAttemptsExhausted { last, .. } => Some(*last),
            _ => None,
        }
    }

    /// HTTP status the web app answers with for this failure.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) | Self::InsufficientContent { .. } => 400,
            Self::NotFound { .. } => 404,
            Self::QuotaExceeded { .. } => 429,
            Self::UnknownFetch { .. } | Self::MissingApiKey { .. } | Self::Config(_) => 500,
            other => match other.failure_kind() {
                Some(FailureKind::RateLimited) => 429,
                Some(FailureKind::ServiceUnavailable) => 503,
                Some(FailureKind::Network) => 502,
                Some(FailureKind::Upstream) | None => 500,
            },
        }
    }

    /// One actionable sentence per failure class, safe to show in the UI.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput(reason) => {
                format!("{reason}. Please check your input and try again.")
            }
            Self::InsufficientContent { .. } => {
                "Not enough text to summarize. Try a video with a longer description or captions."
                    .to_owned()
            }
            Self::NotFound { .. } => "Video not found. Please check the URL.".to_owned(),
            Self::QuotaExceeded { .. } => {
                "The YouTube API quota has been exceeded. Please wait a moment and try again."
                    .to_owned()
            }
            Self::UnknownFetch { .. } => {
                "Failed to fetch video data. Please check your YouTube URL.".to_owned()
            }
            Self::MissingApiKey { .. } | Self::Config(_) => {
                "The server is not configured correctly. Please try again later.".to_owned()
            }
            other => other
                .failure_kind()
                .unwrap_or(FailureKind::Upstream)
                .user_message()
                .to_owned(),
        }
    }
}
