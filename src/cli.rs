use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::captions::DEFAULT_CAPTIONS_BASE;
use crate::huggingface::DEFAULT_INFERENCE_BASE;
use crate::youtube::DEFAULT_API_BASE;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(flatten)]
    pub api: ApiArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the video id found in a YouTube URL.
    VideoId(UrlArgs),
    /// Resolve a video and print its record as JSON.
    Video(UrlArgs),
    /// Summarize text given inline or read from a file.
    Summarize(SummarizeArgs),
    /// Resolve a video and print a summary report.
    Run(UrlArgs),
}

/// Credentials, endpoints and tunables shared by the CLI and the web app.
#[derive(Clone, Args)]
pub struct ApiArgs {
    /// YouTube Data API key.
    #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true, global = true)]
    pub youtube_api_key: Option<String>,

    /// Hugging Face inference API token.
    #[arg(long, env = "HUGGING_FACE_API_KEY", hide_env_values = true, global = true)]
    pub hugging_face_api_key: Option<String>,

    #[arg(long, env = "YTSUM_YOUTUBE_API_BASE", default_value = DEFAULT_API_BASE, global = true)]
    pub youtube_api_base: String,

    #[arg(long, env = "YTSUM_CAPTIONS_BASE", default_value = DEFAULT_CAPTIONS_BASE, global = true)]
    pub captions_base: String,

    #[arg(long, env = "YTSUM_INFERENCE_BASE", default_value = DEFAULT_INFERENCE_BASE, global = true)]
    pub inference_base: String,

    /// YAML file overriding models, retry counts, caps and thresholds.
    #[arg(long, env = "YTSUM_CONFIG", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct UrlArgs {
    /// YouTube video URL.
    #[arg(long)]
    pub url: String,
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct SummarizeArgs {
    /// Text to summarize.
    #[arg(long)]
    pub text: Option<String>,

    /// File whose contents are summarized.
    #[arg(long)]
    pub input: Option<PathBuf>,
}

impl std::fmt::Debug for ApiArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |key: &Option<String>| key.as_ref().map(|_| "<redacted>");
        f.debug_struct("ApiArgs")
            .field("youtube_api_key", &redact(&self.youtube_api_key))
            .field("hugging_face_api_key", &redact(&self.hugging_face_api_key))
            .field("youtube_api_base", &self.youtube_api_base)
            .field("captions_base", &self.captions_base)
            .field("inference_base", &self.inference_base)
            .field("config", &self.config)
            .finish()
    }
}
