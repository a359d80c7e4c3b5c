pub mod history;
pub mod manga;
pub mod server;

pub use history::{HistoryKey, ReadingHistoryEntry, ReadingPosition};
pub use manga::{FilterOptions, Manga, Provider, ProviderFilter};
pub use server::ServerBookmark;
