//! SQLite bootstrap and the shared connection handle.
//!
//! Responsibilities:
//! - Open file or in-memory connections with the pragmas the API relies on.
//! - Apply schema migrations before any application code touches the data.
//! - Wrap the connection in a thread-safe `SharedDb` for the server.
//!
//! Foreign keys are declared in the schema but the `foreign_keys` pragma is
//! intentionally left at the SQLite default (off): dangling `notes.task_id`
//! references are tolerated, and only the dedicated link operation checks
//! cross-entity ownership.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use rusqlite::Connection;
use tracing::info;

pub mod migrations;

/// Thread-safe handle to the single SQLite connection shared by all
/// request handlers. Lock it only for the synchronous duration of a store
/// call, never across an await point.
#[derive(Clone)]
pub struct SharedDb(pub Arc<Mutex<Connection>>);

impl SharedDb {
    /// Opens (creating if needed) the database file and applies migrations.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("creating database directory {}", dir.display()))?;
            }
        }
        let mut conn = Connection::open(path)
            .with_context(|| format!("opening database at {}", path.display()))?;
        bootstrap_connection(&mut conn)?;
        info!(target: "tasknote::db", "database ready at {}", path.display());
        Ok(Self(Arc::new(Mutex::new(conn))))
    }

    /// Opens an in-memory database with the full schema applied. Test use.
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory().context("opening in-memory database")?;
        bootstrap_connection(&mut conn)?;
        Ok(Self(Arc::new(Mutex::new(conn))))
    }
}

fn bootstrap_connection(conn: &mut Connection) -> Result<()> {
    conn.busy_timeout(Duration::from_secs(5))?;
    // The bundled SQLite build defaults `foreign_keys` to ON; the API contract
    // (dangling `notes.task_id` references tolerated) requires it OFF.
    conn.pragma_update(None, "foreign_keys", false)?;
    migrations::apply_migrations(conn).context("applying schema migrations")?;
    Ok(())
}
