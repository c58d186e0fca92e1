use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::Instrument as _;
use uuid::Uuid;

use crate::cli::ApiArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::huggingface::HuggingFaceClient;
use crate::retry::TokioSleeper;
use crate::summarize::{Summarizer, SummaryResult};
use crate::youtube::{self, TextSource, VideoRecord, VideoResolver};

pub const YOUTUBE_API_KEY_ENV: &str = "YOUTUBE_API_KEY";
pub const HUGGING_FACE_API_KEY_ENV: &str = "HUGGING_FACE_API_KEY";

fn require_key<'a>(key: Option<&'a str>, env_var: &'static str) -> Result<&'a str> {
    key.map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or(Error::MissingApiKey { env_var })
}

pub fn http_client(config: &Config) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("ytsum/", env!("CARGO_PKG_VERSION")))
        .timeout(config.request_timeout())
        .build()
        .map_err(|err| Error::Config(format!("build http client: {err}")))
}

/// Summarizer talking to the Hugging Face inference API.
pub fn build_summarizer(
    api: &ApiArgs,
    config: &Config,
    http: reqwest::Client,
) -> Result<Summarizer> {
    let key = require_key(api.hugging_face_api_key.as_deref(), HUGGING_FACE_API_KEY_ENV)?;
    let backend = HuggingFaceClient::new(
        http,
        &api.inference_base,
        key,
        config.summarizer.wait_for_model,
    );
    Ok(Summarizer::new(
        Arc::new(backend),
        Arc::new(TokioSleeper),
        config.summarizer.clone(),
    ))
}

pub fn build_resolver(
    api: &ApiArgs,
    config: &Config,
    http: reqwest::Client,
) -> Result<VideoResolver> {
    let key = require_key(api.youtube_api_key.as_deref(), YOUTUBE_API_KEY_ENV)?;
    Ok(VideoResolver::new(
        http,
        &api.youtube_api_base,
        key,
        &api.captions_base,
        &config.resolver,
        Arc::new(TokioSleeper),
    ))
}

/// Everything one submission knows about itself. Replaces ambient UI state.
#[derive(Debug, Clone, Serialize)]
pub struct RequestContext {
    pub request_id: Uuid,
    pub url: String,
    pub loading: bool,
    pub error: Option<String>,
    pub video: Option<VideoRecord>,
    pub source: Option<TextSource>,
    pub summary: Option<SummaryResult>,
}

impl RequestContext {
    pub fn new(url: &str) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            url: url.trim().to_owned(),
            loading: true,
            error: None,
            video: None,
            source: None,
            summary: None,
        }
    }
}

pub struct Pipeline {
    resolver: VideoResolver,
    summarizer: Summarizer,
}

impl Pipeline {
    pub fn new(resolver: VideoResolver, summarizer: Summarizer) -> Self {
        Self {
            resolver,
            summarizer,
        }
    }

    /// Both API keys are required up front; a missing one is reported before
    /// any request is made.
    pub fn from_settings(api: &ApiArgs, config: &Config) -> Result<Self> {
        let http = http_client(config)?;
        let resolver = build_resolver(api, config, http.clone())?;
        let summarizer = build_summarizer(api, config, http)?;
        Ok(Self::new(resolver, summarizer))
    }

    pub fn summarizer(&self) -> &Summarizer {
        &self.summarizer
    }

    /// Resolves the video, picks the summary input and summarizes it,
    /// recording progress and the outcome on `ctx`.
    pub async fn run(&self, ctx: &mut RequestContext) -> Result<()> {
        let span = tracing::info_span!("submission", request_id = %ctx.request_id);
        let outcome = self.run_inner(ctx).instrument(span).await;
        ctx.loading = false;
        if let Err(err) = &outcome {
            ctx.error = Some(err.user_message());
        }
        outcome
    }

    async fn run_inner(&self, ctx: &mut RequestContext) -> Result<()> {
        let video_id = youtube::extract_video_id(&ctx.url)
            .ok_or_else(|| Error::InvalidInput("Invalid YouTube URL".to_owned()))?;
        tracing::info!(%video_id, "resolving video");

        let record = self.resolver.fetch_video_data(&video_id).await?;
        let (source, input) = record.summary_input();
        let input = input.to_owned();
        ctx.source = Some(source);
        ctx.video = Some(record);

        let summary = self.summarizer.generate_summary(&input).await?;
        tracing::info!(model = %summary.model, degraded = summary.degraded, "submission complete");
        ctx.summary = Some(summary);
        Ok(())
    }
}

/// Proof that a submission was started; compared against the newest one when
/// its result comes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug, Default)]
struct SubmissionState {
    generation: u64,
    latest: Option<RequestContext>,
}

/// Keeps only the most recent submission's result.
#[derive(Debug, Default)]
pub struct Submissions {
    state: Mutex<SubmissionState>,
}

impl Submissions {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SubmissionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts a new submission, superseding any in flight.
    pub fn begin(&self, ctx: &RequestContext) -> Ticket {
        let mut state = self.lock();
        state.generation += 1;
        state.latest = Some(ctx.clone());
        Ticket(state.generation)
    }

    /// Records the finished context if no newer submission has begun.
    /// Returns false when the result was discarded.
    pub fn finish(&self, ticket: Ticket, ctx: RequestContext) -> bool {
        let mut state = self.lock();
        if state.generation != ticket.0 {
            tracing::info!(request_id = %ctx.request_id, "discarding superseded result");
            return false;
        }
        state.latest = Some(ctx);
        true
    }

    pub fn latest(&self) -> Option<RequestContext> {
        self.lock().latest.clone()
    }
}
