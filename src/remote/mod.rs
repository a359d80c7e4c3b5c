pub mod http_remote;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::{FilterOptions, Manga, Provider};

pub use http_remote::{Download, HttpRemote};

/// Remote manga server. Page numbers are 1-based.
#[async_trait]
pub trait Remote {
    async fn get_provider_list(&self) -> Result<Vec<Provider>>;

    async fn get_popular_manga_list(&self, provider_id: &str, page: u32) -> Result<Vec<Manga>>;

    async fn get_latest_manga_list(
        &self,
        provider_id: &str,
        page: u32,
        options: &FilterOptions,
    ) -> Result<Vec<Manga>>;

    async fn search_manga_list(
        &self,
        provider_id: &str,
        page: u32,
        keywords: &str,
    ) -> Result<Vec<Manga>>;

    async fn get_manga(&self, provider_id: &str, manga_id: &str) -> Result<Manga>;
}
