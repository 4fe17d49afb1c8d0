// src/main.rs
// Sync server entry point: HTTP API over the sync engine plus an
// in-process hourly recycle-bin reaper (spec §9: "prefer an internal
// scheduler inside the process that fires every hour").

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use sync_core::config::SyncConfig;
use sync_core::{api, reaper, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let config = SyncConfig::from_env();

    let level = match config.logging.level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).with_ansi(false).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let bind_address = config.bind_address();
    let state = Arc::new(AppState::new(config).await?);

    spawn_reaper(state.clone());

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("sync server listening on {}", bind_address);

    let app = api::create_router(state);
    axum::serve(listener, app).await?;

    Ok(())
}

fn spawn_reaper(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(3600));
        loop {
            interval.tick().await;

            let now = chrono::Utc::now().timestamp_millis();
            let retention_ms = state.config.recycle_bin.operation_retention_days * 24 * 60 * 60 * 1000;
            let cutoff = now - retention_ms;

            if let Err(e) = reaper::sweep(&state.resources, now, cutoff).await {
                error!(error = %e, "scheduled reaper sweep failed");
            }
        }
    });
}
