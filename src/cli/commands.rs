use std::path::Path;
use std::sync::Arc;

use chrono::Utc;

use crate::app::{AppContext, LisuError, Result};
use crate::domain::{FilterOptions, HistoryKey, Manga, ReadingHistoryEntry, ReadingPosition};
use crate::paging::{self, PageLoad, PagedList};
use crate::remote::Remote;
use crate::store::LibraryStore;

pub fn list_servers(ctx: &AppContext) -> Result<()> {
    let servers = ctx.store.get_servers()?;

    if servers.is_empty() {
        println!("No servers. Add one with `lisu server add <name> <address>`");
        return Ok(());
    }

    for server in servers {
        println!(
            "{:>3}  {:<20} {}",
            server.id,
            server.display_name(),
            server.address
        );
    }

    Ok(())
}

pub fn add_server(ctx: &AppContext, name: &str, address: &str) -> Result<()> {
    url::Url::parse(address)?;
    let id = ctx.store.add_server(name, address)?;
    println!("Added server {}: {}", id, address);
    Ok(())
}

pub fn rename_server(ctx: &AppContext, id: i64, name: &str) -> Result<()> {
    let mut server = ctx
        .store
        .get_server(id)?
        .ok_or(LisuError::ServerNotFound(id))?;
    server.name = name.to_string();
    ctx.store.update_server(&server)?;
    println!("Renamed server {} to {}", id, name);
    Ok(())
}

pub fn remove_server(ctx: &AppContext, id: i64) -> Result<()> {
    let server = ctx
        .store
        .get_server(id)?
        .ok_or(LisuError::ServerNotFound(id))?;
    ctx.store.delete_server(id)?;
    println!("Removed server: {}", server.display_name());
    Ok(())
}

pub fn move_server(ctx: &AppContext, id: i64, position: usize) -> Result<()> {
    ctx.store.move_server(id, position)?;
    list_servers(ctx)
}

pub async fn list_providers(ctx: &AppContext, server_id: Option<i64>) -> Result<()> {
    let server = ctx.resolve_server(server_id)?;
    let remote = ctx.remote_for(&server)?;

    let providers = remote.get_provider_list().await?;
    if providers.is_empty() {
        println!("{} hosts no providers", server.display_name());
        return Ok(());
    }

    for provider in providers {
        let search = if provider.is_searchable { "search" } else { "" };
        println!(
            "{:<24} {:<30} {:<5} {:<6} {}",
            provider.id,
            provider.name,
            provider.lang,
            search,
            provider.display_filters()
        );
    }

    Ok(())
}

pub async fn popular(
    ctx: &AppContext,
    server_id: Option<i64>,
    provider: &str,
    pages: u32,
) -> Result<()> {
    let remote = shared_remote(ctx, server_id)?;
    browse(paging::popular(remote, provider), pages).await
}

pub async fn latest(
    ctx: &AppContext,
    server_id: Option<i64>,
    provider: &str,
    options: &[String],
    pages: u32,
) -> Result<()> {
    let options = FilterOptions::from_pairs(options)?;
    let remote = shared_remote(ctx, server_id)?;
    browse(paging::latest(remote, provider, options), pages).await
}

pub async fn search(
    ctx: &AppContext,
    server_id: Option<i64>,
    provider: &str,
    keywords: &str,
    pages: u32,
) -> Result<()> {
    let remote = shared_remote(ctx, server_id)?;
    browse(paging::search(remote, provider, keywords), pages).await
}

fn shared_remote(ctx: &AppContext, server_id: Option<i64>) -> Result<paging::sources::SharedRemote> {
    let server = ctx.resolve_server(server_id)?;
    Ok(Arc::new(ctx.remote_for(&server)?))
}

/// Loads up to `pages` pages and prints everything accumulated. A failure
/// on a later page still prints the pages that did load.
async fn browse(list: PagedList<Manga>, pages: u32) -> Result<()> {
    let mut result = list.load_result().await;
    for _ in 1..pages {
        if !matches!(result, PageLoad::Loaded { .. }) {
            break;
        }
        result = list.fetch_more_result().await;
    }

    let items = list.items();
    for (index, manga) in items.iter().enumerate() {
        println!(
            "{:>4}  {:<40} {:<24} {}",
            index + 1,
            manga.title,
            manga.id,
            manga.display_authors()
        );
    }

    match result {
        PageLoad::Failed(failure) => Err(failure.into()),
        PageLoad::Exhausted => {
            println!("-- end of list ({} items) --", items.len());
            Ok(())
        }
        _ => Ok(()),
    }
}

pub async fn record_reading(
    ctx: &AppContext,
    server_id: Option<i64>,
    provider: &str,
    manga_id: &str,
    position: ReadingPosition,
) -> Result<()> {
    let server = ctx.resolve_server(server_id)?;
    let key = HistoryKey::new(server.id, provider, manga_id);

    if ctx.store.get_history_entry(&key)?.is_some() {
        ctx.store
            .update_reading_position(&key, &position, Utc::now())?;
    } else {
        let remote = ctx.remote_for(&server)?;
        let manga = remote.get_manga(provider, manga_id).await?;

        let mut entry = ReadingHistoryEntry::new(key, manga.title, position);
        entry.thumbnail = manga.thumbnail;
        ctx.store.insert_history(&entry)?;
    }

    println!("Saved position for {}/{}", provider, manga_id);
    Ok(())
}

pub fn show_history(ctx: &AppContext, server_id: Option<i64>) -> Result<()> {
    let server = ctx.resolve_server(server_id)?;
    let entries = ctx.store.get_history(server.id)?;

    if entries.is_empty() {
        println!("No reading history for {}", server.display_name());
        return Ok(());
    }

    for entry in entries {
        println!(
            "{}  {:<40} {:<16} {}",
            entry.last_read_at.format("%Y-%m-%d %H:%M"),
            entry.title,
            entry.key.provider_id,
            entry.display_position()
        );
    }

    Ok(())
}

pub fn clear_history(ctx: &AppContext, server_id: Option<i64>) -> Result<()> {
    let server = ctx.resolve_server(server_id)?;
    let count = ctx.store.clear_history(server.id)?;
    println!("Cleared {} entries from {}", count, server.display_name());
    Ok(())
}

pub async fn download(
    ctx: &AppContext,
    server_id: Option<i64>,
    url: &str,
    output: &Path,
) -> Result<()> {
    let server = ctx.resolve_server(server_id)?;
    let remote = ctx.remote_for(&server)?;

    let download = remote.open_download(url).await?;

    let mut file = tokio::fs::File::create(output).await?;
    let saved = download
        .save(&mut file, |progress| {
            eprint!("\r{:>3.0}%", progress * 100.0);
        })
        .await;
    eprintln!();

    let written = match saved {
        Ok(written) => written,
        Err(e) => {
            drop(file);
            if let Err(remove) = tokio::fs::remove_file(output).await {
                tracing::warn!("Failed to remove partial {}: {}", output.display(), remove);
            }
            return Err(e);
        }
    };

    println!("Saved {} bytes to {}", written, output.display());
    Ok(())
}
