use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};
use tokio::sync::broadcast;

use crate::app::{LisuError, Result};
use crate::domain::{HistoryKey, ReadingHistoryEntry, ReadingPosition, ServerBookmark};
use crate::store::{LibraryStore, StoreChange};

const CHANGE_CAPACITY: usize = 64;

pub struct SqliteStore {
    conn: Mutex<Connection>,
    changes: broadcast::Sender<StoreChange>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        let store = Self {
            conn: Mutex::new(conn),
            changes,
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.conn()?;

        conn.execute("PRAGMA foreign_keys = ON", [])?;
        migrations
            .to_latest(&mut conn)
            .map_err(|e| LisuError::Migration(e.to_string()))?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            LisuError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn publish(&self, change: StoreChange) {
        // No receivers is fine.
        let _ = self.changes.send(change);
    }

    // Fixed-width UTC so ORDER BY on the text column is chronological.
    fn format_datetime(dt: &DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| s.parse::<DateTime<Utc>>().ok())
    }

    fn server_from_row(row: &Row<'_>) -> rusqlite::Result<ServerBookmark> {
        Ok(ServerBookmark {
            id: row.get(0)?,
            name: row.get(1)?,
            address: row.get(2)?,
            position: row.get(3)?,
        })
    }

    fn history_from_row(row: &Row<'_>) -> rusqlite::Result<ReadingHistoryEntry> {
        Ok(ReadingHistoryEntry {
            key: HistoryKey {
                server_id: row.get(0)?,
                provider_id: row.get(1)?,
                manga_id: row.get(2)?,
            },
            title: row.get(3)?,
            thumbnail: row.get(4)?,
            last_read_at: row
                .get::<_, String>(5)
                .ok()
                .and_then(|s| Self::parse_datetime(&s))
                .unwrap_or_else(Utc::now),
            position: ReadingPosition {
                collection: row.get(6)?,
                chapter: row.get(7)?,
                page: row.get(8)?,
            },
        })
    }
}

impl LibraryStore for SqliteStore {
    fn get_servers(&self) -> Result<Vec<ServerBookmark>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT id, name, address, position FROM servers ORDER BY position, id",
        )?;

        let servers = stmt
            .query_map([], Self::server_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(servers)
    }

    fn get_server(&self, id: i64) -> Result<Option<ServerBookmark>> {
        let conn = self.conn()?;

        let result = conn
            .query_row(
                "SELECT id, name, address, position FROM servers WHERE id = ?1",
                params![id],
                Self::server_from_row,
            )
            .optional()?;

        Ok(result)
    }

    fn add_server(&self, name: &str, address: &str) -> Result<i64> {
        let id = {
            let conn = self.conn()?;
            conn.execute(
                "INSERT INTO servers (name, address, position)
                 VALUES (?1, ?2, (SELECT COALESCE(MAX(position) + 1, 0) FROM servers))",
                params![name, address],
            )?;
            conn.last_insert_rowid()
        };

        tracing::debug!("Added server {} ({}) as {}", name, address, id);
        self.publish(StoreChange::Servers);
        Ok(id)
    }

    fn update_server(&self, server: &ServerBookmark) -> Result<()> {
        let changed = self.conn()?.execute(
            "UPDATE servers SET name = ?1, address = ?2, position = ?3 WHERE id = ?4",
            params![server.name, server.address, server.position, server.id],
        )?;

        if changed == 0 {
            return Err(LisuError::ServerNotFound(server.id));
        }

        self.publish(StoreChange::Servers);
        Ok(())
    }

    fn delete_server(&self, id: i64) -> Result<()> {
        let deleted = self
            .conn()?
            .execute("DELETE FROM servers WHERE id = ?1", params![id])?;

        if deleted > 0 {
            tracing::debug!("Deleted server {}", id);
            self.publish(StoreChange::Servers);
            self.publish(StoreChange::History { server_id: id });
        }
        Ok(())
    }

    fn move_server(&self, id: i64, position: usize) -> Result<()> {
        {
            let mut conn = self.conn()?;
            let tx = conn.transaction()?;

            let mut ids = {
                let mut stmt = tx.prepare("SELECT id FROM servers ORDER BY position, id")?;
                let ids = stmt
                    .query_map([], |row| row.get::<_, i64>(0))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                ids
            };

            let current = ids
                .iter()
                .position(|&other| other == id)
                .ok_or(LisuError::ServerNotFound(id))?;
            ids.remove(current);
            ids.insert(position.min(ids.len()), id);

            for (index, server_id) in ids.iter().enumerate() {
                tx.execute(
                    "UPDATE servers SET position = ?1 WHERE id = ?2",
                    params![index as i64, server_id],
                )?;
            }

            tx.commit()?;
        }

        self.publish(StoreChange::Servers);
        Ok(())
    }

    fn get_history(&self, server_id: i64) -> Result<Vec<ReadingHistoryEntry>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT server_id, provider_id, manga_id, title, thumbnail, last_read_at, collection, chapter, page
             FROM reading_history WHERE server_id = ?1 ORDER BY last_read_at DESC",
        )?;

        let entries = stmt
            .query_map(params![server_id], Self::history_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    fn get_history_entry(&self, key: &HistoryKey) -> Result<Option<ReadingHistoryEntry>> {
        let conn = self.conn()?;

        let result = conn
            .query_row(
                "SELECT server_id, provider_id, manga_id, title, thumbnail, last_read_at, collection, chapter, page
                 FROM reading_history WHERE server_id = ?1 AND provider_id = ?2 AND manga_id = ?3",
                params![key.server_id, key.provider_id, key.manga_id],
                Self::history_from_row,
            )
            .optional()?;

        Ok(result)
    }

    fn insert_history(&self, entry: &ReadingHistoryEntry) -> Result<()> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO reading_history
             (server_id, provider_id, manga_id, title, thumbnail, last_read_at, collection, chapter, page)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                entry.key.server_id,
                entry.key.provider_id,
                entry.key.manga_id,
                entry.title,
                entry.thumbnail,
                Self::format_datetime(&entry.last_read_at),
                entry.position.collection,
                entry.position.chapter,
                entry.position.page
            ],
        )?;

        self.publish(StoreChange::History {
            server_id: entry.key.server_id,
        });
        Ok(())
    }

    fn update_reading_position(
        &self,
        key: &HistoryKey,
        position: &ReadingPosition,
        read_at: DateTime<Utc>,
    ) -> Result<()> {
        let changed = self.conn()?.execute(
            "UPDATE reading_history SET collection = ?1, chapter = ?2, page = ?3, last_read_at = ?4
             WHERE server_id = ?5 AND provider_id = ?6 AND manga_id = ?7",
            params![
                position.collection,
                position.chapter,
                position.page,
                Self::format_datetime(&read_at),
                key.server_id,
                key.provider_id,
                key.manga_id
            ],
        )?;

        if changed == 0 {
            return Err(LisuError::HistoryNotFound(key.to_string()));
        }

        self.publish(StoreChange::History {
            server_id: key.server_id,
        });
        Ok(())
    }

    fn clear_history(&self, server_id: i64) -> Result<usize> {
        let deleted = self.conn()?.execute(
            "DELETE FROM reading_history WHERE server_id = ?1",
            params![server_id],
        )?;

        tracing::info!("Cleared {} history entries for server {}", deleted, server_id);
        self.publish(StoreChange::History { server_id });
        Ok(deleted)
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}
