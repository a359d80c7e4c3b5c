pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "lisu")]
#[command(about = "Browse manga servers and keep track of your reading", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/lisu/config.toml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage server bookmarks
    Server {
        #[command(subcommand)]
        action: ServerAction,
    },
    /// List the providers hosted by a server
    Providers {
        /// Server bookmark id (defaults to library.default_server)
        #[arg(short, long)]
        server: Option<i64>,
    },
    /// Show a provider's popular list
    Popular {
        provider: String,

        /// Number of pages to load
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        pages: u32,

        #[arg(short, long)]
        server: Option<i64>,
    },
    /// Show a provider's latest updates
    Latest {
        provider: String,

        /// Filter option as name=value, may be repeated
        #[arg(short, long = "option")]
        options: Vec<String>,

        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        pages: u32,

        #[arg(short, long)]
        server: Option<i64>,
    },
    /// Search a provider
    Search {
        provider: String,
        keywords: String,

        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        pages: u32,

        #[arg(short, long)]
        server: Option<i64>,
    },
    /// Record where you stopped reading a manga
    Read {
        provider: String,
        manga: String,
        chapter: String,

        #[arg(long, default_value_t = 0)]
        page: u32,

        #[arg(long, default_value = "")]
        collection: String,

        #[arg(short, long)]
        server: Option<i64>,
    },
    /// Show reading history, most recent first
    History {
        #[arg(short, long)]
        server: Option<i64>,
    },
    /// Forget all reading history for a server
    ClearHistory {
        #[arg(short, long)]
        server: Option<i64>,
    },
    /// Download a file (e.g. a page image) from a server
    Download {
        /// Absolute URL, or path relative to the server address
        url: String,
        output: PathBuf,

        #[arg(short, long)]
        server: Option<i64>,
    },
}

#[derive(Subcommand)]
pub enum ServerAction {
    /// List bookmarks in display order
    List,
    /// Add a bookmark
    Add { name: String, address: String },
    /// Rename a bookmark
    Rename { id: i64, name: String },
    /// Remove a bookmark and its history
    Remove { id: i64 },
    /// Move a bookmark to a new position (0 = first)
    Move { id: i64, position: usize },
}
