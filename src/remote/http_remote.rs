use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use url::Url;

use crate::app::{LisuError, Result};
use crate::config::RemoteConfig;
use crate::domain::{FilterOptions, Manga, Provider};
use crate::progress::ProgressTracker;
use crate::remote::Remote;

pub struct HttpRemote {
    client: Client,
    base: Url,
}

impl HttpRemote {
    pub fn new(address: &str, config: &RemoteConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            base: Self::parse_base(address)?,
        })
    }

    fn parse_base(address: &str) -> Result<Url> {
        let mut base = Url::parse(address)?;
        if base.cannot_be_a_base() {
            return Err(LisuError::Other(format!("Not a server address: {}", address)));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(base)
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| LisuError::Other(format!("Not a server address: {}", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) fn provider_list_url(&self) -> Result<Url> {
        self.endpoint(&["api", "provider"])
    }

    pub(crate) fn popular_url(&self, provider_id: &str, page: u32) -> Result<Url> {
        let mut url = self.endpoint(&["api", "provider", provider_id, "popular"])?;
        url.query_pairs_mut().append_pair("page", &page.to_string());
        Ok(url)
    }

    pub(crate) fn latest_url(
        &self,
        provider_id: &str,
        page: u32,
        options: &FilterOptions,
    ) -> Result<Url> {
        let mut url = self.endpoint(&["api", "provider", provider_id, "latest"])?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("page", &page.to_string());
            for (name, value) in options.iter() {
                query.append_pair(name, value);
            }
        }
        Ok(url)
    }

    pub(crate) fn search_url(&self, provider_id: &str, page: u32, keywords: &str) -> Result<Url> {
        let mut url = self.endpoint(&["api", "provider", provider_id, "search"])?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("keywords", keywords);
        Ok(url)
    }

    pub(crate) fn manga_url(&self, provider_id: &str, manga_id: &str) -> Result<Url> {
        self.endpoint(&["api", "provider", provider_id, "manga", manga_id])
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LisuError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Resolves a download target. Absolute URLs are used as given; anything
    /// else is a path under the server address, even with a leading `/`.
    pub(crate) fn download_url(&self, target: &str) -> Result<Url> {
        match Url::parse(target) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                Ok(self.base.join(target.trim_start_matches('/'))?)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Sends the request for `target` and checks the status. Nothing is read
    /// from the body yet, so callers can prepare a sink only once the server
    /// has answered.
    pub async fn open_download(&self, target: &str) -> Result<Download> {
        let url = self.download_url(target)?;
        tracing::debug!("Downloading {}", url);

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LisuError::Status {
                url: url.to_string(),
                status,
            });
        }

        Ok(Download { url, response })
    }

    /// Streams `target` into `sink`, reporting progress to `listener`.
    /// Returns the number of bytes written.
    pub async fn download<W, L>(&self, target: &str, sink: &mut W, listener: L) -> Result<u64>
    where
        W: AsyncWrite + Unpin + Send,
        L: FnMut(f64) + Send,
    {
        self.open_download(target).await?.save(sink, listener).await
    }
}

/// A response whose status was accepted and whose body is still unread.
pub struct Download {
    url: Url,
    response: Response,
}

impl Download {
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub async fn save<W, L>(mut self, sink: &mut W, listener: L) -> Result<u64>
    where
        W: AsyncWrite + Unpin + Send,
        L: FnMut(f64) + Send,
    {
        let total = self
            .response
            .content_length()
            .and_then(|n| i64::try_from(n).ok())
            .unwrap_or(-1);
        let mut tracker = ProgressTracker::new(total, listener);

        while let Some(chunk) = self.response.chunk().await? {
            sink.write_all(&chunk).await?;
            tracker.record(chunk.len());
        }
        sink.flush().await?;

        tracing::info!("Downloaded {} bytes from {}", tracker.bytes_read(), self.url);
        Ok(tracker.bytes_read())
    }
}

#[async_trait]
impl Remote for HttpRemote {
    async fn get_provider_list(&self) -> Result<Vec<Provider>> {
        self.get_json(self.provider_list_url()?).await
    }

    async fn get_popular_manga_list(&self, provider_id: &str, page: u32) -> Result<Vec<Manga>> {
        self.get_json(self.popular_url(provider_id, page)?).await
    }

    async fn get_latest_manga_list(
        &self,
        provider_id: &str,
        page: u32,
        options: &FilterOptions,
    ) -> Result<Vec<Manga>> {
        self.get_json(self.latest_url(provider_id, page, options)?)
            .await
    }

    async fn search_manga_list(
        &self,
        provider_id: &str,
        page: u32,
        keywords: &str,
    ) -> Result<Vec<Manga>> {
        self.get_json(self.search_url(provider_id, page, keywords)?)
            .await
    }

    async fn get_manga(&self, provider_id: &str, manga_id: &str) -> Result<Manga> {
        self.get_json(self.manga_url(provider_id, manga_id)?).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    fn remote(address: &str) -> HttpRemote {
        HttpRemote::new(address, &RemoteConfig::default()).unwrap()
    }

    /// Serves a single canned response and returns the server address.
    async fn serve_once(content_type: &'static str, body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                content_type,
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(&body).await.unwrap();
            socket.flush().await.unwrap();
        });

        format!("http://{}", addr)
    }

    pub(crate) async fn serve_status_once(status: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await.unwrap();
            let head = format!(
                "HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                status
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.flush().await.unwrap();
        });

        format!("http://{}", addr)
    }

    #[test]
    fn test_base_gets_trailing_slash() {
        let r = remote("http://192.168.1.2:8080/lisu");
        assert_eq!(r.base().as_str(), "http://192.168.1.2:8080/lisu/");
    }

    #[test]
    fn test_rejects_non_base_address() {
        assert!(HttpRemote::new("mailto:someone@example.com", &RemoteConfig::default()).is_err());
        assert!(HttpRemote::new("not a url", &RemoteConfig::default()).is_err());
    }

    #[test]
    fn test_popular_url() {
        let r = remote("http://localhost:8080");
        assert_eq!(
            r.popular_url("manhuaren", 2).unwrap().as_str(),
            "http://localhost:8080/api/provider/manhuaren/popular?page=2"
        );
    }

    #[test]
    fn test_latest_url_with_options() {
        let r = remote("http://localhost:8080/");
        let options = FilterOptions::from_pairs(["type=ongoing", "region=jp"]).unwrap();
        assert_eq!(
            r.latest_url("manhuaren", 1, &options).unwrap().as_str(),
            "http://localhost:8080/api/provider/manhuaren/latest?page=1&region=jp&type=ongoing"
        );
    }

    #[test]
    fn test_search_url_encodes_keywords() {
        let r = remote("http://localhost:8080");
        assert_eq!(
            r.search_url("p", 1, "one piece").unwrap().as_str(),
            "http://localhost:8080/api/provider/p/search?page=1&keywords=one+piece"
        );
    }

    #[test]
    fn test_manga_url_escapes_segments() {
        let r = remote("http://localhost:8080/lisu/");
        assert_eq!(
            r.manga_url("p", "a/b").unwrap().as_str(),
            "http://localhost:8080/lisu/api/provider/p/manga/a%2Fb"
        );
    }

    #[test]
    fn test_download_url_stays_under_server_path() {
        let r = remote("http://h:8080/lisu");
        assert_eq!(
            r.download_url("/images/cover.jpg").unwrap().as_str(),
            "http://h:8080/lisu/images/cover.jpg"
        );
        assert_eq!(
            r.download_url("images/cover.jpg").unwrap().as_str(),
            "http://h:8080/lisu/images/cover.jpg"
        );
        assert_eq!(
            r.download_url("https://cdn.example.com/p/1.jpg").unwrap().as_str(),
            "https://cdn.example.com/p/1.jpg"
        );
    }

    #[tokio::test]
    async fn test_open_download_rejects_error_status() {
        let address = serve_status_once("404 Not Found").await;

        let err = remote(&address).open_download("missing.jpg").await.err().unwrap();
        assert!(matches!(
            err,
            LisuError::Status { status, .. } if status == reqwest::StatusCode::NOT_FOUND
        ));
    }

    #[tokio::test]
    async fn test_get_popular_manga_list() {
        let body = br#"[
            {"id": "1", "providerId": "p", "title": "First"},
            {"id": "2", "providerId": "p", "title": "Second", "authors": ["A"]}
        ]"#
        .to_vec();
        let address = serve_once("application/json", body).await;

        let list = remote(&address).get_popular_manga_list("p", 1).await.unwrap();
        let titles: Vec<&str> = list.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second"]);
    }

    #[tokio::test]
    async fn test_malformed_json_is_error() {
        let address = serve_once("application/json", b"{not json".to_vec()).await;

        let err = remote(&address).get_provider_list().await.unwrap_err();
        assert!(matches!(err, LisuError::Json(_)));
    }

    #[tokio::test]
    async fn test_download_reports_progress() {
        let body = vec![42u8; 4096];
        let address = serve_once("image/jpeg", body.clone()).await;

        let mut reported = Vec::new();
        let mut sink = Vec::new();
        let written = remote(&address)
            .download("/images/cover.jpg", &mut sink, |p| reported.push(p))
            .await
            .unwrap();

        assert_eq!(written, 4096);
        assert_eq!(sink, body);
        assert!(!reported.is_empty());
        assert!(reported.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*reported.last().unwrap(), 1.0);
    }
}
