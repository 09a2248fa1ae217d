use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- The whole workspace lives in one JSON document. The CHECK pins the
        -- table to a single row.
        CREATE TABLE IF NOT EXISTS workspace_snapshot (
            id          INTEGER PRIMARY KEY CHECK (id = 1),
            body        TEXT NOT NULL,
            saved_at    TEXT NOT NULL
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
