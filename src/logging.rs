use anyhow::Context as _;

/// Directive used when `RUST_LOG` is unset. Keeps the HTTP stack quiet.
pub const DEFAULT_DIRECTIVE: &str = "info,hyper=warn,reqwest=warn";

pub fn init() -> anyhow::Result<()> {
    init_with(DEFAULT_DIRECTIVE)
}

/// Installs a stderr subscriber filtered by `RUST_LOG`, falling back to
/// `default_directive`.
pub fn init_with(default_directive: &str) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(default_directive))
        .with_context(|| format!("build log filter from `{default_directive}`"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("initialize tracing subscriber: {err}"))?;

    Ok(())
}
