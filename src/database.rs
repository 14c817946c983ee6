use std::{fs, path::Path};

use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use crate::store::TodoStorage;

pub const TODOS_KEY: &str = "todos";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("could not serialize todos: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Key/value storage backed by a single SQLite table.
pub struct SqliteStorage {
    conn: Connection,
    key: String,
}

impl SqliteStorage {
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.is_dir() {
                fs::create_dir_all(dir)
                    .map_err(|err| StorageError::Unavailable(err.to_string()))?;
            }
        }
        let conn = match Connection::open(path) {
            Ok(conn) => conn,
            Err(err) => {
                error!(
                    "event=db_open module=database status=error path={} error={}",
                    path.display(),
                    err
                );
                return Err(err.into());
            }
        };
        init_db(&conn)?;
        info!(
            "event=db_open module=database status=ok path={}",
            path.display()
        );
        Ok(SqliteStorage {
            conn,
            key: TODOS_KEY.to_string(),
        })
    }

    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        init_db(&conn)?;
        Ok(SqliteStorage {
            conn,
            key: TODOS_KEY.to_string(),
        })
    }
}

fn init_db(conn: &Connection) -> StorageResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS storage (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        params![],
    )?;

    Ok(())
}

impl TodoStorage for SqliteStorage {
    fn read(&self) -> StorageResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM storage WHERE key = ?1",
                params![self.key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write(&mut self, value: &str) -> StorageResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO storage (key, value) VALUES (?1, ?2)",
            params![self.key, value],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_reads_as_none() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        assert_eq!(storage.read().unwrap(), None);
    }

    #[test]
    fn write_replaces_previous_value() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        storage.write("[1]").unwrap();
        storage.write("[2]").unwrap();
        assert_eq!(storage.read().unwrap().as_deref(), Some("[2]"));
    }

    #[test]
    fn keys_are_independent() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        storage.write("first").unwrap();
        let storage = SqliteStorage {
            key: "other".to_string(),
            ..storage
        };
        assert_eq!(storage.read().unwrap(), None);
    }
}
