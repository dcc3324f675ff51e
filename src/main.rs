use anyhow::{Context, Result};
use clap::Parser;
use std::{path::PathBuf, sync::Arc};
use tracing::info;
use tracing_subscriber::EnvFilter;
use umbrella_scan::{config::Config, routes, startup, state::AppState};

/// umbrella-server — AI-backed scam/phishing verdicts for the browser extension.
#[derive(Debug, Parser)]
#[command(name = "umbrella-server")]
#[command(version)]
struct Args {
    /// TOML config file (defaults apply when omitted)
    #[arg(long, env = "UMBRELLA_CONFIG")]
    config: Option<PathBuf>,

    /// Private dotenv-style file with provider API keys (checked before the environment)
    #[arg(long, env = "UMBRELLA_SECRETS_FILE")]
    secrets_file: Option<PathBuf>,

    /// Override server.bind
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut cfg = Config::resolve(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        cfg.server.bind = bind;
    }
    let addr = cfg.bind_addr()?;

    let secrets = startup::build_secrets_store(args.secrets_file)?;
    let client = startup::build_http_client(&cfg)?;
    let dispatcher = startup::build_dispatcher(&cfg, &secrets, client);

    info!(
        request_timeout_secs = cfg.request_timeout().as_secs(),
        max_body_bytes = cfg.server.max_body_bytes,
        "configuration loaded"
    );

    let state = Arc::new(AppState {
        config: cfg,
        secrets,
        dispatcher,
    });
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!("umbrella-server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("umbrella-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
