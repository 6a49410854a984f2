//! SQLite-backed simulation store for local development and tests.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use crate::schema::SCHEMA_SQL;
use crate::store::SimulationStore;
use crate::types::*;
use gist_core::{Error, Result};

/// SQLite store holding the `simulations` table.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteStore {
    /// Open or create the store at `db_path`.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        if let Some(dir) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| Error::Database(e.to_string()))?;
        }

        let conn = Connection::open(&db_path).map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| Error::Database(e.to_string()))?;

        let store = Self::with_connection(conn, db_path)?;
        info!(
            "SqliteStore initialized: {} simulations, path={}",
            store.count_simulations()?,
            store.db_path.display()
        );
        Ok(store)
    }

    /// Open a private in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::Database(e.to_string()))?;
        Self::with_connection(conn, PathBuf::from(":memory:"))
    }

    fn with_connection(conn: Connection, db_path: PathBuf) -> Result<Self> {
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Insert a simulation. Returns the new id.
    pub fn add_simulation(&self, new: &NewSimulation) -> Result<i64> {
        let json = serde_json::to_string(&new.json)?;
        let now = chrono::Utc::now().to_rfc3339();

        let conn = self.conn.lock();
        let id = conn
            .prepare_cached(
                "INSERT INTO simulations (created_at, json, from_ai, parent_id, title, description)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .insert(params![
                now,
                json,
                new.from_ai,
                new.parent_id,
                new.title,
                new.description
            ])
            .map_err(|e| Error::Database(e.to_string()))?;
        debug!("Inserted simulation {} (parent={:?})", id, new.parent_id);
        Ok(id)
    }

    /// Get a simulation by id.
    pub fn find_simulation(&self, id: i64) -> Result<Option<SimulationRecord>> {
        let conn = self.conn.lock();
        let row = conn
            .prepare_cached(
                "SELECT id, created_at, json, from_ai, parent_id, title, description, changes_made
                 FROM simulations WHERE id = ?1",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![id], Self::row_to_record)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(row)
    }

    /// Get only the configuration document of a simulation.
    pub fn find_simulation_json(&self, id: i64) -> Result<Option<serde_json::Value>> {
        let conn = self.conn.lock();
        let text: Option<String> = conn
            .prepare_cached("SELECT json FROM simulations WHERE id = ?1")
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![id], |row| row.get(0))
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        match text {
            Some(t) => Ok(Some(serde_json::from_str(&t)?)),
            None => Ok(None),
        }
    }

    /// Overwrite the `changes_made` column. Returns false if the id is unknown.
    pub fn set_changes_made(&self, id: i64, changes_made: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let count = conn
            .execute(
                "UPDATE simulations SET changes_made = ?1 WHERE id = ?2",
                params![changes_made, id],
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(count > 0)
    }

    pub fn count_simulations(&self) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM simulations", [], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))
    }

    fn row_to_record(row: &Row<'_>) -> rusqlite::Result<SimulationRecord> {
        let json_text: String = row.get(2)?;
        let json = serde_json::from_str(&json_text).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok(SimulationRecord {
            id: row.get(0)?,
            created_at: row.get(1)?,
            json,
            from_ai: row.get(3)?,
            parent_id: row.get(4)?,
            title: row.get(5)?,
            description: row.get(6)?,
            changes_made: row.get(7)?,
        })
    }
}

#[async_trait]
impl SimulationStore for SqliteStore {
    async fn get_simulation(&self, id: i64) -> Result<Option<SimulationRecord>> {
        self.find_simulation(id)
    }

    async fn get_simulation_json(&self, id: i64) -> Result<Option<serde_json::Value>> {
        self.find_simulation_json(id)
    }

    async fn update_changes_made(&self, id: i64, changes_made: &str) -> Result<bool> {
        self.set_changes_made(id, changes_made)
    }

    async fn insert_simulation(&self, new: NewSimulation) -> Result<i64> {
        self.add_simulation(&new)
    }
}
