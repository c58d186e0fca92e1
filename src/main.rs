use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

use ytsum::cli::{ApiArgs, Cli, Command, SummarizeArgs, UrlArgs};
use ytsum::config::Config;
use ytsum::pipeline::{self, Pipeline, RequestContext};
use ytsum::{format, youtube};

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    ytsum::logging::init().context("init logging")?;

    let cli = Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        Command::VideoId(args) => {
            let id = youtube::extract_video_id(&args.url)
                .with_context(|| format!("no video id in `{}`", args.url.trim()))?;
            println!("{id}");
        }
        Command::Video(args) => video(&cli.api, args).await.context("video")?,
        Command::Summarize(args) => summarize(&cli.api, args).await.context("summarize")?,
        Command::Run(args) => run(&cli.api, args).await.context("run")?,
    }

    Ok(())
}

fn load_config(api: &ApiArgs) -> anyhow::Result<Config> {
    Config::load(api.config.as_deref()).context("load config")
}

async fn video(api: &ApiArgs, args: UrlArgs) -> anyhow::Result<()> {
    let config = load_config(api)?;
    let http = pipeline::http_client(&config)?;
    let resolver = pipeline::build_resolver(api, &config, http)?;
    let id = youtube::extract_video_id(&args.url)
        .ok_or_else(|| ytsum::Error::InvalidInput("Invalid YouTube URL".to_owned()))?;
    let record = resolver.fetch_video_data(&id).await?;
    let json = serde_json::to_string_pretty(&record).context("serialize video record")?;
    println!("{json}");
    Ok(())
}

async fn summarize(api: &ApiArgs, args: SummarizeArgs) -> anyhow::Result<()> {
    let text = match (args.text, args.input) {
        (Some(text), _) => text,
        (None, Some(path)) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("read input: {}", path.display()))?,
        (None, None) => anyhow::bail!("either --text or --input is required"),
    };

    let config = load_config(api)?;
    let http = pipeline::http_client(&config)?;
    let summarizer = pipeline::build_summarizer(api, &config, http)?;
    let summary = summarizer.generate_summary(&text).await?;
    tracing::info!(model = %summary.model, degraded = summary.degraded, attempts = summary.attempts, "summarized");
    println!("{}", summary.text);
    Ok(())
}

async fn run(api: &ApiArgs, args: UrlArgs) -> anyhow::Result<()> {
    let config = load_config(api)?;
    let pipeline = Pipeline::from_settings(api, &config)?;
    let mut ctx = RequestContext::new(&args.url);
    pipeline.run(&mut ctx).await?;

    let (Some(record), Some(summary)) = (&ctx.video, &ctx.summary) else {
        anyhow::bail!("pipeline finished without a summary");
    };
    print!("{}", format::report(record, summary));
    Ok(())
}
