//! # lisu
//!
//! Client core for a self-hosted manga library: browse the providers of a
//! remote manga server, keep server bookmarks, and remember where you
//! stopped reading.
//!
//! ## Architecture
//!
//! ```text
//! Remote → PageSource → PagedList → caller
//!                                   ↘ LibraryStore (bookmarks, history)
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! # Bookmark a server
//! lisu server add Home http://192.168.1.2:8080
//!
//! # Browse a provider
//! lisu providers
//! lisu popular manhuaren --pages 2
//! lisu latest manhuaren --option type=ongoing
//!
//! # Reading history
//! lisu read manhuaren one-piece "Ch. 1000" --page 12
//! lisu history
//! ```

/// Application context and error types.
///
/// The [`AppContext`](app::AppContext) struct wires together config, store
/// and the per-server remote.
pub mod app;

/// Command-line interface using clap.
pub mod cli;

/// Configuration loaded from `~/.config/lisu/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`ServerBookmark`](domain::ServerBookmark): a saved server
/// - [`ReadingHistoryEntry`](domain::ReadingHistoryEntry): resume position per manga
/// - [`Manga`](domain::Manga), [`Provider`](domain::Provider): server JSON shapes
pub mod domain;

/// Success/failure wrapper with chaining hooks.
pub mod outcome;

/// Paginated remote lists with a single-flight cursor.
pub mod paging;

/// Byte counting and fractional download progress.
pub mod progress;

/// HTTP access to a manga server.
///
/// - [`Remote`](remote::Remote): async trait for the server API
/// - [`HttpRemote`](remote::HttpRemote): reqwest-based implementation
pub mod remote;

/// SQLite persistence layer.
///
/// - [`LibraryStore`](store::LibraryStore): trait defining storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
/// - [`LiveQuery`](store::LiveQuery): re-runs a query when the store changes
pub mod store;
