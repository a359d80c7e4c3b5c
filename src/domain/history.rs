use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifies a reading-history entry: one manga of one provider, as seen
/// through one server bookmark.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HistoryKey {
    pub server_id: i64,
    pub provider_id: String,
    pub manga_id: String,
}

impl HistoryKey {
    pub fn new(server_id: i64, provider_id: impl Into<String>, manga_id: impl Into<String>) -> Self {
        Self {
            server_id,
            provider_id: provider_id.into(),
            manga_id: manga_id.into(),
        }
    }
}

impl fmt::Display for HistoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.server_id, self.provider_id, self.manga_id)
    }
}

/// Where to resume reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingPosition {
    pub collection: String,
    pub chapter: String,
    pub page: u32,
}

impl ReadingPosition {
    pub fn new(collection: impl Into<String>, chapter: impl Into<String>, page: u32) -> Self {
        Self {
            collection: collection.into(),
            chapter: chapter.into(),
            page,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingHistoryEntry {
    pub key: HistoryKey,
    pub title: String,
    pub thumbnail: Option<String>,
    pub last_read_at: DateTime<Utc>,
    pub position: ReadingPosition,
}

impl ReadingHistoryEntry {
    pub fn new(key: HistoryKey, title: String, position: ReadingPosition) -> Self {
        Self {
            key,
            title,
            thumbnail: None,
            last_read_at: Utc::now(),
            position,
        }
    }

    /// Short human form of the resume position, e.g. `Vol. 1 / Ch. 3 p.12`.
    pub fn display_position(&self) -> String {
        let page = self.position.page;
        if self.position.collection.is_empty() {
            format!("{} p.{}", self.position.chapter, page)
        } else {
            format!(
                "{} / {} p.{}",
                self.position.collection, self.position.chapter, page
            )
        }
    }
}
