//! `SQLite` entity store.
//!
//! `SQLite` is the source of truth for persistent deployments. Foreign keys are
//! enforced by the database and referencing rows are removed with
//! `ON DELETE CASCADE`, so deleting a process, interface or change request
//! never leaves dangling join rows.
//!
//! ## Module Structure
//!
//! - `schema` - Database schema (DDL)
//! - `helpers` - Row conversion, column lists, `IN (...)` queries
//! - `entities` - `EntityStore` implementation

mod entities;
mod helpers;
mod schema;

use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tracing::{debug, warn};

use crate::error::Result;
use crate::store::TransactionBody;

pub(crate) use schema::SCHEMA;

/// `SQLite`-backed [`EntityStore`](crate::store::EntityStore).
pub struct SqliteStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open or create the database at `path` and apply the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or the
    /// database cannot be opened.
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::initialize(conn, Some(path.to_path_buf()))
    }

    /// Open a private in-memory database with the full schema.
    ///
    /// # Errors
    ///
    /// Returns an error if `SQLite` cannot allocate the database.
    pub fn open_in_memory() -> Result<Self> {
        Self::initialize(Connection::open_in_memory()?, None)
    }

    fn initialize(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        debug!(path = ?path, "Opened SQLite store");
        Ok(Self { conn, path })
    }

    /// Path of the database file, `None` for in-memory stores.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    fn run_atomically(&mut self, body: &mut TransactionBody<'_>) -> Result<()> {
        // Already inside a transaction: join it.
        if !self.conn.is_autocommit() {
            return body(self);
        }

        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        match body(self) {
            Ok(()) => {
                self.conn.execute_batch("COMMIT")?;
                Ok(())
            }
            Err(e) => {
                if let Err(rollback) = self.conn.execute_batch("ROLLBACK") {
                    warn!(error = %rollback, "Rollback failed after transaction error");
                }
                Err(e)
            }
        }
    }
}
