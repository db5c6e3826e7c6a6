//! RepoInsight API server
//!
//! Serves the HTTP façade and runs the background worker in the same
//! process.

use repoinsight_config::ApplicationConfig;
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    repoinsight_common::initialize_environment();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    info!("Starting RepoInsight API server...");

    let config = ApplicationConfig::from_env()?;
    info!(
        "Configuration loaded - API {}:{}, database {}",
        config.api.host,
        config.api.port,
        config.database.safe_connection_string()
    );

    let application = repoinsight_api::build(&config).await?;

    // The worker polls the durable queue until shutdown
    let shutdown = CancellationToken::new();
    let worker = application.worker;
    let worker_shutdown = shutdown.clone();
    let worker_task = tokio::spawn(async move { worker.run(worker_shutdown).await });

    let addr: SocketAddr = format!("{}:{}", config.api.host, config.api.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {addr}");

    axum::serve(listener, application.router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    shutdown.cancel();
    let _ = worker_task.await;
    info!("Server stopped");
    Ok(())
}
