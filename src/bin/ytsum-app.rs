use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;

use ytsum::app::{AppState, router};
use ytsum::cli::ApiArgs;
use ytsum::config::Config;
use ytsum::pipeline::Pipeline;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct AppArgs {
    #[arg(long, default_value = "127.0.0.1:8080")]
    addr: SocketAddr,

    /// Static web assets directory (serve if it has an index.html).
    #[arg(long, default_value = "web/dist")]
    web_dir: PathBuf,

    #[command(flatten)]
    api: ApiArgs,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return std::process::ExitCode::FAILURE;
    }
    std::process::ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    ytsum::logging::init()?;

    let args = AppArgs::parse();
    tracing::info!(?args, "starting ytsum-app");

    let config = Config::load(args.api.config.as_deref()).context("load config")?;
    let pipeline = Pipeline::from_settings(&args.api, &config).context("build pipeline")?;
    tracing::info!(
        models = ?config.summarizer.models,
        timeout_secs = config.request_timeout_secs,
        "pipeline ready"
    );

    let app = router(AppState::new(pipeline), Some(args.web_dir.as_path()));

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .map_err(|err| anyhow::anyhow!("bind {}: {err}", args.addr))?;
    tracing::info!(addr = %args.addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
