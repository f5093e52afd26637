use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tokio::signal;
use tokio::time::{interval, Duration};
use tracing_subscriber::EnvFilter;
use vitals_storage::memory::MemoryRepository;
use vitals_storage::sqlite::SqliteRepository;
use vitals_storage::Repository;

use vitals_server::app;
use vitals_server::config::ServerConfig;
use vitals_server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("vitals_server=info".parse()?),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/server.toml".to_string());
    let config = ServerConfig::load(&config_path)?;

    tracing::info!(
        addr = %config.listen_addr,
        store_interval = config.store_interval_secs,
        snapshot = %config.snapshot_path,
        db = %config.database_path,
        "vitals-server starting"
    );

    let repo: Arc<dyn Repository> = if config.database_path.is_empty() {
        Arc::new(MemoryRepository::new())
    } else {
        Arc::new(SqliteRepository::open(Path::new(&config.database_path))?)
    };

    let snapshot_path = PathBuf::from(&config.snapshot_path);
    if let Some(parent) = snapshot_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    if config.restore {
        repo.restore(&snapshot_path)?;
        tracing::info!(snapshot = %snapshot_path.display(), "state restored");
    }

    let state = AppState {
        repo: repo.clone(),
        snapshot_path: Arc::new(snapshot_path.clone()),
        sync_dump: config.store_interval_secs == 0,
    };

    // Periodic snapshot loop; in synchronous mode the write handlers dump
    // instead and no background task runs.
    let snapshot_handle = if config.store_interval_secs > 0 {
        let repo = repo.clone();
        let path = snapshot_path.clone();
        let period = Duration::from_secs(config.store_interval_secs);
        Some(tokio::spawn(async move {
            let mut tick = interval(period);
            loop {
                tick.tick().await;
                match repo.dump(&path) {
                    Ok(()) => tracing::debug!(snapshot = %path.display(), "snapshot written"),
                    Err(e) => tracing::error!(error = %e, "snapshot failed"),
                }
            }
        }))
    } else {
        None
    };

    let app = app::build_app(state);
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            signal::ctrl_c().await.ok();
            tracing::info!("shutting down gracefully");
        })
        .await?;

    if let Some(handle) = snapshot_handle {
        handle.abort();
    }

    // Final snapshot so a restart with restore enabled resumes from the
    // latest state.
    if let Err(e) = repo.dump(&snapshot_path) {
        tracing::error!(error = %e, "final snapshot failed");
    } else {
        tracing::info!(snapshot = %snapshot_path.display(), "final snapshot written");
    }
    tracing::info!("server stopped");

    Ok(())
}
