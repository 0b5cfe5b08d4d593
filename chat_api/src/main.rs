use std::{net::SocketAddr, path::PathBuf};

use anyhow::Context;
use chat_api::{create_router, AppState};
use chat_core::{config, ChatCore};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Topics and messages over HTTP/JSON.
#[derive(Debug, Parser)]
#[command(name = "chatting", version, about)]
struct Cli {
    /// Path to config.json. Created with defaults if missing.
    #[arg(long, env = "CHATTING_CONFIG")]
    config: Option<PathBuf>,

    /// Overrides `database_url` from the config file.
    #[arg(long, env = "CHATTING_DATABASE_URL")]
    database_url: Option<String>,

    /// Overrides `bind_addr` from the config file.
    #[arg(long, env = "CHATTING_BIND_ADDR")]
    bind: Option<SocketAddr>,

    /// Log every SQL statement.
    #[arg(long)]
    log_statements: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => config::default_config_path()?,
    };
    let mut config = config::get_or_init(&config_path)
        .await
        .with_context(|| format!("loading {}", config_path.display()))?;

    if let Some(database_url) = cli.database_url {
        config.database_url = database_url;
    }
    if let Some(bind) = cli.bind {
        config.bind_addr = bind;
    }
    config.log_statements |= cli.log_statements;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!(config = %config_path.display(), "starting chatting");

    let core = ChatCore::start(config)
        .await
        .context("failed to start chat core")?;

    let app = create_router(AppState::from(&core));

    let listener = TcpListener::bind(core.config.bind_addr)
        .await
        .with_context(|| format!("binding {}", core.config.bind_addr))?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutting down");
    core.shutdown().await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
