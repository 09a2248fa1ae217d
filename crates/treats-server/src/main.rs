mod config;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use treats_api::standup::resume_standups;
use treats_api::state::AppStateInner;
use treats_core::Workspace;
use treats_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "treats=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database and restore the last snapshot
    let db = Database::open(&PathBuf::from(&config.db_path))?;
    let workspace = match db.load_snapshot()? {
        Some(row) => {
            info!("Restoring workspace snapshot saved at {}", row.saved_at);
            serde_json::from_str::<Workspace>(&row.body)
                .context("stored workspace snapshot is corrupt")?
        }
        None => {
            info!("No snapshot found, starting with an empty workspace");
            Workspace::new()
        }
    };

    let state = AppStateInner::new(workspace, db, config.jwt_secret, config.session_days);
    let resumed = resume_standups(&state)?;
    if resumed > 0 {
        info!("Resumed {} active standups", resumed);
    }

    let app = treats_api::router(state.clone())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Treats server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let dropped = state.scheduler.cancel_all();
    if dropped > 0 {
        warn!("Shutting down with {} scheduled tasks dropped", dropped);
    }
    info!("Treats server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
