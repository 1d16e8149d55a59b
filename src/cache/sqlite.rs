use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info};

use crate::cache::durable_cache::{decode_payload, DurableCache, CACHE_KEY};
use crate::cache::error::CacheError;
use crate::model::Submission;

/// A SQLite implementation of the DurableCache trait.
///
/// The whole collection lives in one row of a key/value table, written
/// atomically with `INSERT OR REPLACE`, so a crashed writer leaves either
/// the old payload or the new one, never a torn mix.
pub struct SqliteCache {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteCache {
    /// Create a new SqliteCache with the given database path
    pub fn new(db_path: &str) -> Result<Self, CacheError> {
        info!("Opening SQLite cache at path: {db_path}");

        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.exists() {
                debug!("Creating parent directory: {:?}", parent);
                fs::create_dir_all(parent).map_err(|e| {
                    error!("Failed to create directory {parent:?}: {e}");
                    CacheError::OpenError(format!("Failed to create directory: {e}"))
                })?;
            }
        }

        let connection = Connection::open(db_path).map_err(|e| {
            error!("Failed to open SQLite cache at {db_path}: {e}");
            CacheError::OpenError(format!("Failed to open SQLite database: {e}"))
        })?;

        connection
            .execute(
                "CREATE TABLE IF NOT EXISTS cache_entries (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                )",
                [],
            )
            .map_err(|e| {
                error!("Failed to create cache_entries table: {e}");
                CacheError::OpenError(format!("Failed to create cache_entries table: {e}"))
            })?;

        debug!("SQLite cache ready at: {db_path}");
        Ok(SqliteCache {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
        match self.connection.lock() {
            Ok(conn) => Ok(conn),
            Err(_) => {
                error!("Failed to acquire cache lock");
                Err(CacheError::Locked)
            }
        }
    }

    /// Stores a raw payload under the cache key, bypassing serialization
    #[cfg(test)]
    pub fn put_raw(&self, raw: &str) -> Result<(), CacheError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO cache_entries (key, value) VALUES (?1, ?2)",
            params![CACHE_KEY, raw],
        )
        .map_err(|e| CacheError::OperationError(format!("Failed to store raw payload: {e}")))?;
        Ok(())
    }
}

impl DurableCache for SqliteCache {
    fn load(&self) -> Result<Option<Vec<Submission>>, CacheError> {
        let conn = self.lock()?;

        let raw: Option<String> = conn
            .query_row(
                "SELECT value FROM cache_entries WHERE key = ?1",
                params![CACHE_KEY],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| {
                error!("Failed to read cache entry: {e}");
                CacheError::OperationError(format!("Failed to read cache entry: {e}"))
            })?;

        match raw {
            Some(raw) => Ok(decode_payload(&raw)),
            None => {
                debug!("No cached collection under key: {CACHE_KEY}");
                Ok(None)
            }
        }
    }

    fn save(&self, records: &[Submission]) -> Result<(), CacheError> {
        let payload = serde_json::to_string(records)?;
        let conn = self.lock()?;

        conn.execute(
            "INSERT OR REPLACE INTO cache_entries (key, value) VALUES (?1, ?2)",
            params![CACHE_KEY, payload],
        )
        .map_err(|e| {
            error!("Failed to write cache entry: {e}");
            CacheError::OperationError(format!("Failed to write cache entry: {e}"))
        })?;

        debug!("Cached {} records under key: {CACHE_KEY}", records.len());
        Ok(())
    }
}
