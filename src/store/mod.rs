pub mod live;
pub mod sqlite;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use crate::app::Result;
use crate::domain::{HistoryKey, ReadingHistoryEntry, ReadingPosition, ServerBookmark};

pub use live::LiveQuery;
pub use sqlite::SqliteStore;

/// Published after every successful mutation so live queries can refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    Servers,
    History { server_id: i64 },
}

pub trait LibraryStore {
    // Server bookmarks
    fn get_servers(&self) -> Result<Vec<ServerBookmark>>;
    fn get_server(&self, id: i64) -> Result<Option<ServerBookmark>>;
    fn add_server(&self, name: &str, address: &str) -> Result<i64>;
    fn update_server(&self, server: &ServerBookmark) -> Result<()>;
    fn delete_server(&self, id: i64) -> Result<()>;
    fn move_server(&self, id: i64, position: usize) -> Result<()>;

    // Reading history
    fn get_history(&self, server_id: i64) -> Result<Vec<ReadingHistoryEntry>>;
    fn get_history_entry(&self, key: &HistoryKey) -> Result<Option<ReadingHistoryEntry>>;
    fn insert_history(&self, entry: &ReadingHistoryEntry) -> Result<()>;
    fn update_reading_position(
        &self,
        key: &HistoryKey,
        position: &ReadingPosition,
        read_at: DateTime<Utc>,
    ) -> Result<()>;
    fn clear_history(&self, server_id: i64) -> Result<usize>;

    // Change notification
    fn subscribe(&self) -> broadcast::Receiver<StoreChange>;
}
