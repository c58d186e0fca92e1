//! Video resolution: URL -> id -> metadata record (with an optional transcript).

use std::fmt;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::captions::{self, CaptionClient};
use crate::config::ResolverConfig;
use crate::error::{Error, Result};
use crate::format::group_thousands;
use crate::retry::Sleeper;
use crate::text;

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
pub const VIDEO_ID_LEN: usize = 11;

static URL_SHAPES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:youtu\.be/|/v/|/u/\w/|embed/|shorts/|live/|watch\?v=|[?&]v=)([^#&?/\s]*)",
    )
    .unwrap()
});
static ISO_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$").unwrap()
});
static CHAPTER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\[(]?((?:\d{1,2}:)?\d{1,2}:\d{2})[\])]?\s*(?:[-–—:|]\s*)?(\S.*?)\s*$")
        .unwrap()
});

/// An 11-character YouTube video identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub fn parse(candidate: &str) -> Option<Self> {
        let valid = candidate.len() == VIDEO_ID_LEN
            && candidate
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        valid.then(|| Self(candidate.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Finds the video id in any of the usual YouTube URL shapes. Never fails:
/// input without an 11-character candidate yields `None`.
pub fn extract_video_id(url: &str) -> Option<VideoId> {
    URL_SHAPES
        .captures_iter(url)
        .filter_map(|caps| caps.get(1))
        .find_map(|m| VideoId::parse(m.as_str()))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    #[serde(default = "zero")]
    pub view_count: String,
    #[serde(default = "zero")]
    pub like_count: String,
    #[serde(default = "zero")]
    pub comment_count: String,
}

fn zero() -> String {
    "0".to_owned()
}

impl Default for Statistics {
    fn default() -> Self {
        Self {
            view_count: zero(),
            like_count: zero(),
            comment_count: zero(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Chapter {
    pub time: String,
    pub seconds: u32,
    pub title: String,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    Transcript,
    Description,
}

#[derive(Debug, Clone, Serialize)]
pub struct VideoRecord {
    pub video_id: VideoId,
    pub title: String,
    /// Composite of metadata, description, chapters and tags.
    pub description: String,
    pub raw_description: String,
    pub channel_title: String,
    pub published_at: Option<DateTime<Utc>>,
    pub duration: String,
    pub tags: Vec<String>,
    pub statistics: Statistics,
    pub language: String,
    pub thumbnail_url: Option<String>,
    pub transcript: Option<String>,
    pub chapters: Option<Vec<Chapter>>,
}

impl VideoRecord {
    /// Text handed to the summarizer: the transcript when there is one.
    pub fn summary_input(&self) -> (TextSource, &str) {
        match self.transcript.as_deref() {
            Some(transcript) => (TextSource::Transcript, transcript),
            None => (TextSource::Description, self.description.as_str()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    snippet: Snippet,
    #[serde(default)]
    content_details: Option<ContentDetails>,
    #[serde(default)]
    statistics: Statistics,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    channel_title: String,
    #[serde(default)]
    published_at: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    default_language: Option<String>,
    #[serde(default)]
    default_audio_language: Option<String>,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    medium: Option<Thumbnail>,
    high: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    #[serde(default)]
    duration: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ApiErrorItem>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorItem {
    #[serde(default)]
    reason: String,
}

const QUOTA_REASONS: &[&str] = &[
    "quotaExceeded",
    "rateLimitExceeded",
    "dailyLimitExceeded",
    "userRateLimitExceeded",
    "forbidden",
];

/// Resolves a video id into a [`VideoRecord`] via the Data API, then tries
/// to attach a transcript.
pub struct VideoResolver {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    captions: CaptionClient,
    min_transcript_chars: usize,
}

impl VideoResolver {
    pub fn new(
        http: reqwest::Client,
        api_base: &str,
        api_key: &str,
        captions_base: &str,
        config: &ResolverConfig,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        let captions = CaptionClient::new(
            http.clone(),
            captions_base,
            &config.caption_language,
            config.caption_attempts,
            Duration::from_millis(config.caption_backoff_ms),
            sleeper,
        );
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_owned(),
            api_key: api_key.to_owned(),
            captions,
            min_transcript_chars: config.min_transcript_chars,
        }
    }

    pub async fn fetch_video_data(&self, video_id: &VideoId) -> Result<VideoRecord> {
        let item = self.fetch_item(video_id).await?;
        let mut record = record_from_item(video_id.clone(), item);

        match self.captions.fetch_segments(video_id).await {
            Some(segments) => {
                let transcript = captions::transcript_text(&segments);
                let len = text::char_len(&transcript);
                if len >= self.min_transcript_chars {
                    tracing::info!(%video_id, chars = len, "using caption transcript");
                    record.transcript = Some(transcript);
                } else {
                    tracing::info!(%video_id, chars = len, "transcript too short; using description");
                }
            }
            None => tracing::info!(%video_id, "no captions; using description"),
        }

        Ok(record)
    }

    async fn fetch_item(&self, video_id: &VideoId) -> Result<VideoItem> {
        let endpoint = url::Url::parse_with_params(
            &format!("{}/videos", self.api_base),
            &[
                ("part", "snippet,contentDetails,statistics"),
                ("id", video_id.as_str()),
                ("key", self.api_key.as_str()),
            ],
        )
        .map_err(|err| Error::UnknownFetch {
            message: format!("build metadata url: {err}"),
        })?;

        tracing::debug!(%video_id, "fetching video metadata");
        let response = self
            .http
            .get(endpoint)
            .send()
            .await
            .map_err(|err| Error::UnknownFetch {
                message: format!("request video metadata: {err}"),
            })?;

        let status = response.status();
        let raw = response.text().await.map_err(|err| Error::UnknownFetch {
            message: format!("read video metadata: {err}"),
        })?;
        if !status.is_success() {
            return Err(classify_metadata_error(video_id, status.as_u16(), &raw));
        }

        let list: VideoListResponse =
            serde_json::from_str(&raw).map_err(|err| Error::UnknownFetch {
                message: format!("parse video metadata: {err}"),
            })?;
        list.items
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound {
                video_id: video_id.to_string(),
            })
    }
}

fn classify_metadata_error(video_id: &VideoId, status: u16, raw: &str) -> Error {
    let body = serde_json::from_str::<ApiErrorBody>(raw).ok();
    let message = body
        .as_ref()
        .map(|b| b.error.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("status {status}"));
    let quota_reason = body.as_ref().is_some_and(|b| {
        b.error
            .errors
            .iter()
            .any(|e| QUOTA_REASONS.contains(&e.reason.as_str()))
    });

    match status {
        403 | 429 => Error::QuotaExceeded { message },
        _ if quota_reason => Error::QuotaExceeded { message },
        404 => Error::NotFound {
            video_id: video_id.to_string(),
        },
        _ => Error::UnknownFetch { message },
    }
}

fn record_from_item(video_id: VideoId, item: VideoItem) -> VideoRecord {
    let snippet = item.snippet;
    let language = snippet
        .default_language
        .or(snippet.default_audio_language)
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| "en".to_owned());
    let published_at = snippet
        .published_at
        .as_deref()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.with_timezone(&Utc));
    let duration = item
        .content_details
        .map(|d| format_duration(&d.duration))
        .unwrap_or_default();
    let thumbnail_url = snippet
        .thumbnails
        .medium
        .or(snippet.thumbnails.high)
        .or(snippet.thumbnails.default)
        .map(|t| t.url);
    let chapters = extract_chapters(&snippet.description);

    let mut record = VideoRecord {
        video_id,
        title: snippet.title,
        description: String::new(),
        raw_description: snippet.description,
        channel_title: snippet.channel_title,
        published_at,
        duration,
        tags: snippet.tags,
        statistics: item.statistics,
        language,
        thumbnail_url,
        transcript: None,
        chapters,
    };
    record.description = enriched_description(&record);
    record
}

/// Turns `PT1H2M3S` into `1:02:03` and `PT4M5S` into `4:05`. Anything that
/// does not parse is returned unchanged.
pub fn format_duration(iso: &str) -> String {
    let Some(caps) = ISO_DURATION.captures(iso.trim()) else {
        return iso.to_owned();
    };
    let part = |idx: usize| -> u64 {
        caps.get(idx)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };
    let hours = part(1).saturating_mul(24).saturating_add(part(2));
    let minutes = part(3);
    let seconds = part(4);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

/// Collects `time - title` lines from a description, in order.
pub fn extract_chapters(description: &str) -> Option<Vec<Chapter>> {
    let chapters: Vec<Chapter> = description
        .lines()
        .filter_map(|line| {
            let caps = CHAPTER_LINE.captures(line.trim())?;
            let time = caps.get(1)?.as_str();
            let title = caps.get(2)?.as_str();
            Some(Chapter {
                time: time.to_owned(),
                seconds: timestamp_seconds(time)?,
                title: title.to_owned(),
            })
        })
        .collect();
    (!chapters.is_empty()).then_some(chapters)
}

fn timestamp_seconds(time: &str) -> Option<u32> {
    time.split(':')
        .try_fold(0u32, |acc, part| Some(acc * 60 + part.parse::<u32>().ok()?))
}

fn enriched_description(record: &VideoRecord) -> String {
    let published = record
        .published_at
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "unknown".to_owned());
    let mut out = format!(
        "Title: {}\nChannel: {}\nLanguage: {}\nPublished: {}\nDuration: {}\n\
         Views: {}\nLikes: {}\nComments: {}\n\nDescription:\n{}\n",
        record.title,
        record.channel_title,
        record.language,
        published,
        record.duration,
        group_thousands(&record.statistics.view_count),
        group_thousands(&record.statistics.like_count),
        group_thousands(&record.statistics.comment_count),
        record.raw_description.trim(),
    );
    if let Some(chapters) = &record.chapters {
        out.push_str("\nChapters:\n");
        for chapter in chapters {
            out.push_str(&format!("{} {}\n", chapter.time, chapter.title));
        }
    }
    if record.tags.is_empty() {
        out.push_str("\nTags: No tags\n");
    } else {
        out.push_str(&format!("\nTags: {}\n", record.tags.join(", ")));
    }
    out
}
