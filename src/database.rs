use std::fmt;
use std::path::Path;
use std::time::Duration;

use log::{debug, info};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior};

use crate::collate;
use crate::error::AppError;
use crate::schema::{CREATE_SCHEMA_SQL, SCHEMA_VERSION};

pub const DB_FILENAME: &str = "deliverydesk.db";

pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Handle to the SQLite connection pool.
///
/// Opened once at startup and handed to every query call; dropping the last clone
/// closes the pooled connections.
#[derive(Clone)]
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.pool.state();
        f.debug_struct("Database")
            .field("connections", &state.connections)
            .field("idle_connections", &state.idle_connections)
            .finish()
    }
}

impl Database {
    pub fn open(
        db_dir: &Path,
        pool_size: u32,
        connection_timeout: Duration,
    ) -> Result<Self, AppError> {
        if !db_dir.is_dir() {
            return Err(AppError::Error(format!(
                "Database folder '{}' does not exist or is not a directory",
                db_dir.display()
            )));
        }

        let db_path = db_dir.join(DB_FILENAME);
        let manager = SqliteConnectionManager::file(&db_path).with_init(|conn| {
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                row.get::<_, String>(0)
            })?;
            conn.busy_timeout(Duration::from_secs(5))?;
            collate::register(conn)
        });

        let pool = Pool::builder()
            .max_size(pool_size)
            .connection_timeout(connection_timeout)
            .build(manager)?;

        info!("Database opened at: {}", db_path.display());

        let db = Database { pool };
        db.ensure_schema()?;

        Ok(db)
    }

    pub fn get_connection(&self) -> Result<DbConnection, AppError> {
        Ok(self.pool.get()?)
    }

    fn ensure_schema(&self) -> Result<(), AppError> {
        let conn = self.get_connection()?;

        let table_exists: bool = conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name='meta'",
                [],
                |row| row.get::<_, i32>(0),
            )
            .map(|count| count > 0)?;

        if !table_exists {
            debug!("Creating schema version {SCHEMA_VERSION}");
            conn.execute_batch(CREATE_SCHEMA_SQL)?;
            return Ok(());
        }

        let stored_version: Option<String> = conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .optional()?;

        match stored_version.as_deref() {
            Some(SCHEMA_VERSION) => Ok(()),
            Some(v) => Err(AppError::Error(format!(
                "Schema version mismatch: found '{v}', expected '{SCHEMA_VERSION}'"
            ))),
            None => Err(AppError::Error("Schema version missing".to_string())),
        }
    }

    /// Runs `f` inside a deferred transaction. SQLite pins the read snapshot at the
    /// first statement, so every read in `f` sees the same data.
    pub fn read_transaction<T, F>(conn: &mut Connection, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&Transaction) -> Result<T, AppError>,
    {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Runs `f` inside an IMMEDIATE transaction, taking the write lock up front.
    pub fn immediate_transaction<T, F>(conn: &mut Connection, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&Transaction) -> Result<T, AppError>,
    {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use tempfile::TempDir;

    /// Opens a fresh database in a temp directory. Keep the `TempDir` alive for the test.
    pub fn temp_db() -> (TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path(), 4, Duration::from_secs(5)).unwrap();
        (dir, db)
    }
}
