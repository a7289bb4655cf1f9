use anyhow::{Context, Result};
use std::sync::Arc;

use clap::Parser;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use tokio::sync::Mutex;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = pollchat::config::Cli::parse();
    let cmd = cli.command.clone().unwrap_or(pollchat::config::Command::Run);

    match cmd {
        pollchat::config::Command::Run => run_server(cli.config).await,
        pollchat::config::Command::Init => init_documents(&cli.config).map(|_| ()),
    }
}

fn init_documents(
    config: &pollchat::config::Config,
) -> Result<(pollchat::polls::PollStore, pollchat::chat::ChatStore)> {
    let polls = pollchat::polls::PollStore::open(&config.data_dir)
        .with_context(|| format!("open poll document in {}", config.data_dir.display()))?;
    let chat = pollchat::chat::ChatStore::open(&config.data_dir)
        .with_context(|| format!("open chat document in {}", config.data_dir.display()))?;
    Ok((polls, chat))
}

async fn run_server(config: pollchat::config::Config) -> Result<()> {
    let (polls, chat) = init_documents(&config)?;
    let bind = config.bind_addr();

    info!(
        bind = %bind,
        data_dir = %config.data_dir.display(),
        public_dir = %config.public_dir.display(),
        version = pollchat::version::VERSION,
        "starting pollchat"
    );

    let app = pollchat::http::build_router(
        config,
        Arc::new(Mutex::new(polls)),
        Arc::new(Mutex::new(chat)),
    )
    .layer(TraceLayer::new_for_http())
    .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("bind {bind}"))?;
    info!("Server is running on http://localhost:{}", bind.port());
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).compact().init();
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down");
}
