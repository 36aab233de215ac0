use anyhow::{Context, Result};
use rusqlite::Connection as SyncConnection;
use tokio_rusqlite::Connection;

/// Open the async sqlite connection at `path`. The path is a
/// directory (matching the storage layout), the database file lives
/// inside it.
pub async fn async_db(path: &str) -> Result<Connection> {
    let db_file = format!("{}/demos.sqlite", path.trim_end_matches('/'));
    Connection::open(&db_file)
        .await
        .with_context(|| format!("Failed to open db at {}", db_file))
}

pub fn initialize_db(conn: &SyncConnection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS kv (
             key TEXT PRIMARY KEY,
             value TEXT NOT NULL
         );",
    )
}
