pub mod listing;
pub mod migrations;
pub mod models;
pub mod queries;

use anyhow::{Context, Result, anyhow};
use rusqlite::{ErrorCode, Transaction};
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

pub use migrations::{PUBLIC_ACCOUNT_ID, SYSTEM_ACCOUNT_ID};
pub use rusqlite::Connection;

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database {}", path.display()))?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;
        let db = Self::init(conn)?;

        info!("Database opened at {}", path.display());
        Ok(db)
    }

    /// Private database that disappears with the handle. Used by tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Runs `f` against the shared connection. Each statement commits on
    /// its own.
    pub fn with_conn<F, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&Connection) -> std::result::Result<T, E>,
        E: From<anyhow::Error>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow!("DB lock poisoned: {}", e))?;
        f(&conn)
    }

    /// Runs `f` inside one transaction. It commits only when `f` returns
    /// `Ok`; any error rolls every statement back.
    pub fn with_tx<F, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> std::result::Result<T, E>,
        E: From<anyhow::Error>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| anyhow!("DB lock poisoned: {}", e))?;
        let tx = conn
            .transaction()
            .context("failed to begin transaction")?;
        let value = f(&tx)?;
        tx.commit().context("failed to commit transaction")?;
        Ok(value)
    }
}

/// True when `err` was caused by a UNIQUE or FOREIGN KEY constraint.
pub fn is_constraint_violation(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<rusqlite::Error>())
        .any(|e| e.sqlite_error_code() == Some(ErrorCode::ConstraintViolation))
}
