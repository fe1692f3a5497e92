use crate::domain::error::ScoreError;
use crate::domain::traits::{KeyValueStore, StorageArea};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tokio_rusqlite::Connection;

pub async fn init_database(db_path: &Path) -> Result<Connection, ScoreError> {
    let db = Connection::open(db_path.to_path_buf()).await?;
    create_schema(&db).await?;
    Ok(db)
}

/// Non-durable database, for tests and dry runs.
pub async fn init_memory_database() -> Result<Connection, ScoreError> {
    let db = Connection::open_in_memory().await?;
    create_schema(&db).await?;
    Ok(db)
}

async fn create_schema(db: &Connection) -> Result<(), ScoreError> {
    db.call(|conn| {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS storage (
                area TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL,
                PRIMARY KEY (area, key)
            )",
            [],
        )?;

        Ok::<_, rusqlite::Error>(())
    })
    .await?;

    Ok(())
}

/// SQLite-backed [`KeyValueStore`]; values are stored as JSON text.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(
        &self,
        area: StorageArea,
        keys: &[String],
    ) -> Result<HashMap<String, Value>, ScoreError> {
        use rusqlite::OptionalExtension;
        use tokio_rusqlite::params;

        if keys.is_empty() {
            return Ok(HashMap::new());
        }

        let keys = keys.to_vec();
        let rows = self
            .conn
            .call(move |conn| {
                let mut stmt =
                    conn.prepare("SELECT value FROM storage WHERE area = ? AND key = ?")?;
                let mut rows = Vec::with_capacity(keys.len());
                for key in keys {
                    let raw: Option<String> = stmt
                        .query_row(params![area.as_str(), key], |row| row.get(0))
                        .optional()?;
                    if let Some(raw) = raw {
                        rows.push((key, raw));
                    }
                }
                Ok::<_, rusqlite::Error>(rows)
            })
            .await?;

        let mut found = HashMap::with_capacity(rows.len());
        for (key, raw) in rows {
            match serde_json::from_str::<Value>(&raw) {
                Ok(value) => {
                    found.insert(key, value);
                }
                // Left out so the caller sees it as absent
                Err(e) => tracing::warn!(key = %key, error = %e, "unreadable stored value"),
            }
        }
        Ok(found)
    }

    async fn set(&self, area: StorageArea, items: Vec<(String, Value)>) -> Result<(), ScoreError> {
        use tokio_rusqlite::params;

        if items.is_empty() {
            return Ok(());
        }

        let now = chrono::Utc::now().timestamp_millis();
        let prepared = items
            .into_iter()
            .map(|(key, value)| Ok((key, serde_json::to_string(&value)?)))
            .collect::<Result<Vec<_>, ScoreError>>()?;

        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare(
                        "INSERT OR REPLACE INTO storage (area, key, value, updated_at)
                         VALUES (?, ?, ?, ?)",
                    )?;
                    for (key, raw) in prepared {
                        stmt.execute(params![area.as_str(), key, raw, now])?;
                    }
                }
                tx.commit()?;
                Ok::<_, rusqlite::Error>(())
            })
            .await?;

        Ok(())
    }

    async fn remove(&self, area: StorageArea, keys: &[String]) -> Result<(), ScoreError> {
        use tokio_rusqlite::params;

        if keys.is_empty() {
            return Ok(());
        }

        let keys = keys.to_vec();
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare("DELETE FROM storage WHERE area = ? AND key = ?")?;
                    for key in keys {
                        stmt.execute(params![area.as_str(), key])?;
                    }
                }
                tx.commit()?;
                Ok::<_, rusqlite::Error>(())
            })
            .await?;

        Ok(())
    }

    async fn count(&self, area: StorageArea) -> Result<usize, ScoreError> {
        use tokio_rusqlite::params;

        let count: i64 = self
            .conn
            .call(move |conn| {
                conn.query_row(
                    "SELECT COUNT(*) FROM storage WHERE area = ?",
                    params![area.as_str()],
                    |row| row.get(0),
                )
            })
            .await?;

        Ok(count as usize)
    }
}
