//! rusqlite-backed session.
//!
//! Transactions are explicit (`BEGIN`/`COMMIT`/`ROLLBACK`) so the sweep
//! controls exactly which statements share a scope.

use std::path::Path;

use log::debug;
use rusqlite::{Connection, OpenFlags};

use super::dialect::{quote_identifier, quote_literal};
use super::records::{RemovableObject, StoreError};
use super::session::Session;

/// Special path opening a private in-memory database.
pub const MEMORY_PATH: &str = ":memory:";

/// Session over a single SQLite connection.
pub struct SqliteSession {
    conn: Connection,
}

impl std::fmt::Debug for SqliteSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteSession")
            .field("path", &self.conn.path())
            .finish_non_exhaustive()
    }
}

impl SqliteSession {
    /// Open an existing database file.
    ///
    /// The file is never created: a missing database is a connection error,
    /// not an empty store.
    pub fn open(path: &Path, read_only: bool) -> Result<Self, StoreError> {
        if path.as_os_str() == MEMORY_PATH {
            return Ok(Self::from_connection(Connection::open_in_memory()?));
        }

        let mode = if read_only {
            OpenFlags::SQLITE_OPEN_READ_ONLY
        } else {
            OpenFlags::SQLITE_OPEN_READ_WRITE
        };
        let flags = mode | OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = Connection::open_with_flags(path, flags)
            .map_err(|e| StoreError::new(format!("Failed to open {}: {}", path.display(), e)))?;
        debug!("Opened SQLite database {} (read_only: {})", path.display(), read_only);
        Ok(Self::from_connection(conn))
    }

    /// Wrap an already open connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Attach another database file under `schema`.
    pub fn attach(&mut self, schema: &str, path: &Path) -> Result<(), StoreError> {
        let sql = format!(
            "ATTACH DATABASE {} AS {}",
            quote_literal(&path.to_string_lossy()),
            quote_identifier(schema)
        );
        self.conn
            .execute_batch(&sql)
            .map_err(|e| StoreError::new(format!("Failed to attach {} as {}: {}", path.display(), schema, e)))?;
        debug!("Attached {} as schema {}", path.display(), schema);
        Ok(())
    }

    /// Borrow the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl Session for SqliteSession {
    fn query_objects(&mut self, sql: &str) -> Result<Vec<RemovableObject>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let column_count = stmt.column_count();

        let rows = stmt.query_map([], |row| {
            let schema: Option<String> = row.get(0)?;
            let name: String = row.get(1)?;
            let catalog: Option<String> = if column_count > 2 { row.get(2)? } else { None };
            Ok(RemovableObject {
                catalog,
                schema: schema.unwrap_or_default(),
                name,
            })
        })?;

        let mut objects = Vec::new();
        for row in rows {
            objects.push(row?);
        }

        Ok(objects)
    }

    fn execute(&mut self, sql: &str) -> Result<(), StoreError> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    fn begin(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch("BEGIN")?;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}
