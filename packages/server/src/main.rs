use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, bail};
use lab_common::storage::filesystem::FilesystemBlobStore;
use lab_server::config::AppConfig;
use lab_server::database::init_db;
use lab_server::state::AppState;
use lab_server::utils::hash::hash_password;
use tokio::signal;
use tracing::{Level, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `lab-server hash-password <password>` prints a value for
    // `auth.admin_password_hash` and exits.
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Some(command) = args.first() {
        match (command.as_str(), args.get(1)) {
            ("hash-password", Some(password)) => {
                println!("{}", hash_password(password)?);
                return Ok(());
            }
            _ => bail!("usage: lab-server [hash-password <password>]"),
        }
    }

    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = init_db(&config.database.url)
        .await
        .context("Failed to initialize database")?;

    let blob_store = FilesystemBlobStore::new(
        config.storage.blob_dir.clone(),
        config.storage.max_upload_size,
    )
    .await
    .context("Failed to initialize blob store")?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let state = AppState {
        db,
        config,
        blob_store: Arc::new(blob_store),
    };
    let app = lab_server::build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
