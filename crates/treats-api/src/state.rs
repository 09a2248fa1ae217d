use std::sync::{Arc, Mutex, MutexGuard};

use tracing::error;

use treats_core::Workspace;
use treats_db::Database;

use crate::error::{ApiError, ApiResult};
use crate::scheduler::Scheduler;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    workspace: Mutex<Workspace>,
    /// Held across serialize-and-write so snapshots land in mutation order.
    writer: tokio::sync::Mutex<()>,
    pub db: Arc<Database>,
    pub jwt_secret: String,
    pub session_days: i64,
    pub scheduler: Scheduler,
}

impl AppStateInner {
    pub fn new(workspace: Workspace, db: Database, jwt_secret: String, session_days: i64) -> AppState {
        Arc::new(Self {
            workspace: Mutex::new(workspace),
            writer: tokio::sync::Mutex::new(()),
            db: Arc::new(db),
            jwt_secret,
            session_days,
            scheduler: Scheduler::new(),
        })
    }

    fn lock(&self) -> ApiResult<MutexGuard<'_, Workspace>> {
        self.workspace
            .lock()
            .map_err(|e| ApiError::internal(format!("workspace lock poisoned: {}", e)))
    }

    /// Run a read-only operation against the workspace.
    pub fn read<T, F>(&self, f: F) -> ApiResult<T>
    where
        F: FnOnce(&Workspace) -> treats_core::Result<T>,
    {
        let ws = self.lock()?;
        Ok(f(&ws)?)
    }

    /// Run a mutation under the workspace lock and persist the result.
    ///
    /// Failed operations leave nothing to persist. A failed write is logged
    /// but does not undo the mutation, which is already visible to readers.
    pub async fn mutate<T, F>(&self, f: F) -> ApiResult<T>
    where
        F: FnOnce(&mut Workspace) -> treats_core::Result<T>,
    {
        let _writer = self.writer.lock().await;

        let (value, snapshot) = {
            let mut ws = self.lock()?;
            let value = f(&mut ws)?;
            let snapshot = serde_json::to_string(&*ws).map_err(ApiError::internal)?;
            (value, snapshot)
        };

        let db = self.db.clone();
        match tokio::task::spawn_blocking(move || db.save_snapshot(&snapshot)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("failed to persist workspace snapshot: {:#}", e),
            Err(e) => error!("spawn_blocking join error: {}", e),
        }
        Ok(value)
    }

    /// Drop all state: pending tasks, the in-memory workspace and the stored
    /// snapshot.
    pub async fn reset(&self) -> ApiResult<()> {
        let _writer = self.writer.lock().await;

        let cancelled = self.scheduler.cancel_all();
        self.lock()?.clear();

        let db = self.db.clone();
        tokio::task::spawn_blocking(move || db.clear_snapshot())
            .await
            .map_err(|e| {
                error!("spawn_blocking join error: {}", e);
                ApiError::internal(e)
            })?
            .map_err(ApiError::internal)?;

        tracing::info!(cancelled, "workspace cleared");
        Ok(())
    }
}
