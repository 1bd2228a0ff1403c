//! SQLite backend.
//!
//! A single `entity` table with an autoincrement primary key, so deleted
//! ids are never handed out again.

use std::path::{Path, PathBuf};

use dbperf_core::{Entity, Executable, IdAllocation};
use rusqlite::{params, params_from_iter, Connection, Row};

use crate::error::Error;
use crate::storage;

/// Database file below the storage path.
const DB_FILE: &str = "test.db";

/// SQLite accepts at most this many bound variables per statement
/// (SQLITE_MAX_VARIABLE_NUMBER in older builds).
const MAX_VARIABLES: usize = 999;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS entity (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        text TEXT NOT NULL,
        float64 REAL NOT NULL,
        int32 INTEGER NOT NULL,
        int64 INTEGER NOT NULL
    );
"#;

const INSERT: &str = "INSERT INTO entity (text, float64, int32, int64) VALUES (?1, ?2, ?3, ?4)";

const UPSERT: &str =
    "INSERT OR REPLACE INTO entity (id, text, float64, int32, int64) VALUES (?1, ?2, ?3, ?4, ?5)";

const SELECT: &str = "SELECT id, text, float64, int32, int64 FROM entity";

/// SQLite backend for benchmarks.
pub struct SqliteBackend {
    path: PathBuf,
    conn: Option<Connection>,
    /// A transaction opened by `put_async` is waiting for its commit.
    async_pending: bool,
}

impl SqliteBackend {
    /// Create a backend storing its database file below `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            conn: None,
            async_pending: false,
        }
    }

    /// Storage directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn conn(&self) -> Result<&Connection, Error> {
        self.conn.as_ref().ok_or(Error::NotOpen)
    }

    fn conn_mut(&mut self) -> Result<&mut Connection, Error> {
        self.conn.as_mut().ok_or(Error::NotOpen)
    }

    /// Insert a new row or overwrite an existing one, writing back the
    /// assigned id.
    fn save(conn: &Connection, item: &mut Entity) -> Result<(), Error> {
        if item.id == 0 {
            conn.prepare_cached(INSERT)?
                .execute(params![&item.text, item.float64, item.int32, item.int64])?;
            item.id = conn.last_insert_rowid() as u64;
        } else {
            conn.prepare_cached(UPSERT)?.execute(params![
                item.id as i64,
                &item.text,
                item.float64,
                item.int32,
                item.int64
            ])?;
        }
        Ok(())
    }

    fn query(&self, filter: &str, args: impl rusqlite::Params) -> Result<Vec<Entity>, Error> {
        let sql = format!("{} {} ORDER BY id", SELECT, filter);
        let mut stmt = self.conn()?.prepare_cached(&sql)?;
        let items = stmt
            .query_map(args, row_to_entity)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }
}

fn row_to_entity(row: &Row<'_>) -> rusqlite::Result<Entity> {
    Ok(Entity {
        id: row.get::<_, i64>(0)? as u64,
        text: row.get(1)?,
        float64: row.get(2)?,
        int32: row.get(3)?,
        int64: row.get(4)?,
    })
}

impl Executable for SqliteBackend {
    type Error = Error;

    fn name(&self) -> &str {
        "sqlite"
    }

    fn id_allocation(&self) -> IdAllocation {
        IdAllocation::Dense
    }

    fn init(&mut self) -> Result<(), Error> {
        storage::reset_dir(&self.path)?;
        let conn = Connection::open(self.path.join(DB_FILE))?;
        conn.execute_batch(SCHEMA)?;
        tracing::debug!(path = %self.path.display(), "sqlite database opened");
        self.conn = Some(conn);
        self.async_pending = false;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Error> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| e)?;
        }
        self.async_pending = false;
        storage::remove_dir(&self.path)?;
        Ok(())
    }

    fn size(&self) -> Result<u64, Error> {
        Ok(storage::file_size(&self.path.join(DB_FILE))?)
    }

    fn remove_all(&mut self) -> Result<(), Error> {
        self.conn()?.execute("DELETE FROM entity", [])?;
        Ok(())
    }

    fn remove_bulk(&mut self, items: &[Entity]) -> Result<(), Error> {
        let tx = self.conn_mut()?.transaction()?;
        for chunk in items.chunks(MAX_VARIABLES) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!("DELETE FROM entity WHERE id IN ({})", placeholders);
            tx.execute(&sql, params_from_iter(chunk.iter().map(|e| e.id as i64)))?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Writes are collected in one open transaction until
    /// `await_async_completion` commits it.
    fn put_async(&mut self, item: &mut Entity) -> Result<(), Error> {
        let begin = !self.async_pending;
        let conn = self.conn()?;
        if begin {
            conn.execute_batch("BEGIN")?;
        }

        if let Err(e) = Self::save(conn, item) {
            if let Err(rollback) = conn.execute_batch("ROLLBACK") {
                tracing::warn!(error = %rollback, "rollback of async transaction failed");
            }
            self.async_pending = false;
            return Err(e);
        }

        self.async_pending = true;
        Ok(())
    }

    fn await_async_completion(&mut self) -> Result<(), Error> {
        if self.async_pending {
            self.async_pending = false;
            self.conn()?.execute_batch("COMMIT")?;
        }
        Ok(())
    }

    fn put_bulk(&mut self, items: &mut [Entity]) -> Result<(), Error> {
        let tx = self.conn_mut()?.transaction()?;
        for item in items.iter_mut() {
            Self::save(&tx, item)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<Entity>, Error> {
        self.query("", [])
    }

    fn query_id_between(&self, min: u64, max: u64) -> Result<Vec<Entity>, Error> {
        self.query("WHERE id BETWEEN ?1 AND ?2", params![min as i64, max as i64])
    }

    /// `LIKE` ignores ASCII case, so compare the leading characters instead.
    fn query_string_prefix(&self, prefix: &str) -> Result<Vec<Entity>, Error> {
        self.query("WHERE substr(text, 1, length(?1)) = ?1", params![prefix])
    }
}
