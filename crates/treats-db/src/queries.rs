use crate::Database;
use crate::models::SnapshotRow;
use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;
use tracing::debug;

impl Database {
    /// Replace the stored snapshot with `body`.
    pub fn save_snapshot(&self, body: &str) -> Result<()> {
        let saved_at = Utc::now().to_rfc3339();
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO workspace_snapshot (id, body, saved_at) VALUES (1, ?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET body = excluded.body, saved_at = excluded.saved_at",
                (body, &saved_at),
            )?;
            tx.commit()?;
            Ok(())
        })?;
        debug!(bytes = body.len(), "workspace snapshot saved");
        Ok(())
    }

    pub fn load_snapshot(&self) -> Result<Option<SnapshotRow>> {
        self.with_conn(query_snapshot)
    }

    pub fn clear_snapshot(&self) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute("DELETE FROM workspace_snapshot", [])?;
            Ok(())
        })
    }
}

fn query_snapshot(conn: &Connection) -> Result<Option<SnapshotRow>> {
    let mut stmt = conn.prepare("SELECT body, saved_at FROM workspace_snapshot WHERE id = 1")?;

    let row = stmt
        .query_row([], |row| {
            Ok(SnapshotRow {
                body: row.get(0)?,
                saved_at: row.get(1)?,
            })
        })
        .optional()?;

    Ok(row)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
