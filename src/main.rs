use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use tripstate::{
    config::{Config, LogFormat},
    core::store::ItineraryStore,
    documents::upload_dir::UploadDir,
    http,
    runtime::handle::spawn_itinerary_store,
    telemetry,
};

/// Itinerary reset and restore service.
#[derive(Debug, Parser)]
#[command(name = "tripstated", version)]
struct Cli {
    /// TOML config file.
    #[arg(long, env = "TRIPSTATE_CONFIG")]
    config: Option<PathBuf>,

    /// Socket address to listen on, overriding the config file.
    #[arg(long)]
    listen: Option<String>,

    /// Port to listen on; replaces the port of the configured address.
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Directory of uploaded documents purged by complete resets.
    #[arg(long)]
    upload_dir: Option<PathBuf>,

    /// Number of reset records kept for restore.
    #[arg(long)]
    history_limit: Option<usize>,

    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

impl Cli {
    fn resolve(self) -> anyhow::Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(listen) = self.listen {
            config.server.listen_addr = listen;
        }
        if let Some(port) = self.port {
            let mut addr = config.listen_addr()?;
            addr.set_port(port);
            config.server.listen_addr = addr.to_string();
        }
        if let Some(dir) = self.upload_dir {
            config.documents.upload_dir = dir;
        }
        if let Some(limit) = self.history_limit {
            config.history.limit = limit;
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse().resolve()?;
    telemetry::init(&config.logging)?;

    let store = ItineraryStore::with_history_limit(config.history.limit);
    let documents = UploadDir::new(&config.documents.upload_dir);
    let handle = spawn_itinerary_store(store, Some(Box::new(documents)), config.runtime_config());

    let addr = config.listen_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(
        %addr,
        upload_dir = %config.documents.upload_dir.display(),
        history_limit = config.history.limit,
        "tripstated listening"
    );

    axum::serve(listener, http::router(handle.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    handle.shutdown().await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(%err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
