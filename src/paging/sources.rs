use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::domain::{FilterOptions, Manga};
use crate::outcome::Outcome;
use crate::paging::{PageSource, PagedList};
use crate::remote::Remote;

pub type SharedRemote = Arc<dyn Remote + Send + Sync>;

pub struct PopularSource {
    remote: SharedRemote,
    provider_id: String,
}

impl PopularSource {
    pub fn new(remote: SharedRemote, provider_id: impl Into<String>) -> Self {
        Self {
            remote,
            provider_id: provider_id.into(),
        }
    }
}

#[async_trait]
impl PageSource<Manga> for PopularSource {
    async fn fetch_page(&self, page: u32) -> Outcome<Vec<Manga>> {
        self.remote
            .get_popular_manga_list(&self.provider_id, page)
            .await
            .into()
    }
}

pub struct LatestSource {
    remote: SharedRemote,
    provider_id: String,
    options: FilterOptions,
}

impl LatestSource {
    pub fn new(remote: SharedRemote, provider_id: impl Into<String>, options: FilterOptions) -> Self {
        Self {
            remote,
            provider_id: provider_id.into(),
            options,
        }
    }
}

#[async_trait]
impl PageSource<Manga> for LatestSource {
    async fn fetch_page(&self, page: u32) -> Outcome<Vec<Manga>> {
        self.remote
            .get_latest_manga_list(&self.provider_id, page, &self.options)
            .await
            .into()
    }
}

pub struct SearchSource {
    remote: SharedRemote,
    provider_id: String,
    keywords: String,
}

impl SearchSource {
    pub fn new(remote: SharedRemote, provider_id: impl Into<String>, keywords: impl Into<String>) -> Self {
        Self {
            remote,
            provider_id: provider_id.into(),
            keywords: keywords.into(),
        }
    }
}

#[async_trait]
impl PageSource<Manga> for SearchSource {
    async fn fetch_page(&self, page: u32) -> Outcome<Vec<Manga>> {
        self.remote
            .search_manga_list(&self.provider_id, page, &self.keywords)
            .await
            .into()
    }
}

/// Adapts a plain `page -> future` function.
pub struct FnSource<F> {
    fetch: F,
}

impl<F> FnSource<F> {
    pub fn new(fetch: F) -> Self {
        Self { fetch }
    }
}

#[async_trait]
impl<T, F> PageSource<T> for FnSource<F>
where
    T: Send + 'static,
    F: Fn(u32) -> BoxFuture<'static, Outcome<Vec<T>>> + Send + Sync,
{
    async fn fetch_page(&self, page: u32) -> Outcome<Vec<T>> {
        (self.fetch)(page).await
    }
}

pub fn popular(remote: SharedRemote, provider_id: impl Into<String>) -> PagedList<Manga> {
    PagedList::new(PopularSource::new(remote, provider_id))
}

pub fn latest(
    remote: SharedRemote,
    provider_id: impl Into<String>,
    options: FilterOptions,
) -> PagedList<Manga> {
    PagedList::new(LatestSource::new(remote, provider_id, options))
}

pub fn search(
    remote: SharedRemote,
    provider_id: impl Into<String>,
    keywords: impl Into<String>,
) -> PagedList<Manga> {
    PagedList::new(SearchSource::new(remote, provider_id, keywords))
}
