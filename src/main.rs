//! Menu Manager - staged menu catalog editing service

use anyhow::Result;
use menu_manager::config::Config;
use menu_manager::http::{router, AppState};
use menu_manager::persistence::FileBlobStore;
use menu_manager::CatalogStore;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let blobs = FileBlobStore::new(&config.data_dir);
    tracing::info!(data_dir = %blobs.dir().display(), persist_drafts = config.persist_drafts, "opening catalog");
    let store = CatalogStore::open(Arc::new(blobs), config.persist_drafts)?;

    let state = AppState::new(store);
    let app = router(state.clone());
    let addr = config.bind_addr();
    tracing::info!("🚀 Menu Manager listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.store.lock().await.flush().await;
    tracing::info!("catalog flushed, shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
