use crate::Result;
use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::{Client, header::CONTENT_TYPE, redirect::Policy};
use tracing::{debug, info};

/// Body and metadata of a single remote GET.
#[derive(Debug, Clone)]
pub struct FetchedContent {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl FetchedContent {
    /// A 2xx response that declared its content type.
    pub fn is_usable(&self) -> bool {
        (200..300).contains(&self.status) && self.content_type.is_some()
    }
}

#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedContent>;
}

/// Splits `url` into `(host, path)` at the first `/` after the scheme
/// separator. Without such a slash the whole URL is the host and the path is
/// `/`.
pub fn split_url(url: &str) -> (&str, &str) {
    let search_from = url.find("://").map_or(0, |i| i + 3);
    match url[search_from..].find('/') {
        Some(offset) => url.split_at(search_from + offset),
        None => (url, "/"),
    }
}

/// Single-shot GET client: no retries, no redirect following.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder().redirect(Policy::none()).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl RemoteFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedContent> {
        let (host, path) = split_url(url);
        debug!("Fetching {} from {}", path, host);

        let response = self.client.get(format!("{host}{path}")).send().await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?;

        info!(
            "Status: {} Content-Type: {}",
            status,
            content_type.as_deref().unwrap_or("<none>")
        );

        Ok(FetchedContent {
            status,
            content_type,
            body,
        })
    }
}
