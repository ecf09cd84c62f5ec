// src/fetch/mod.rs

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

pub mod urls;
pub mod zips;

#[cfg(test)]
pub(crate) mod fake;

pub use urls::UrlTemplates;

/// Where archives and documents come from. The HTTP implementation is
/// [`HttpSource`]; tests plug in an in-memory one.
#[async_trait]
pub trait DisclosureSource: Send + Sync {
    /// Raw bytes of the yearly ZIP archive.
    async fn fetch_archive(&self, year: &str) -> Result<Vec<u8>>;

    /// Raw bytes of one filer's document.
    async fn fetch_document(&self, year: &str, doc_id: &str) -> Result<Vec<u8>>;
}

/// Plain GETs against the configured URL templates.
pub struct HttpSource {
    client: Client,
    urls: UrlTemplates,
}

impl HttpSource {
    pub fn new(client: Client, urls: UrlTemplates) -> Self {
        Self { client, urls }
    }
}

#[async_trait]
impl DisclosureSource for HttpSource {
    async fn fetch_archive(&self, year: &str) -> Result<Vec<u8>> {
        let url = self.urls.archive_url(year)?;
        get_bytes(&self.client, &url).await
    }

    async fn fetch_document(&self, year: &str, doc_id: &str) -> Result<Vec<u8>> {
        let url = self.urls.document_url(year, doc_id)?;
        get_bytes(&self.client, &url).await
    }
}

/// GET `url` and return the body whatever the status. A non-success status
/// is only logged; the body is still handed back.
async fn get_bytes(client: &Client, url: &Url) -> Result<Vec<u8>> {
    debug!("Fetching bytes from {}", url);
    let resp = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("GET {} failed", url))?;

    let status = resp.status();
    if !status.is_success() {
        warn!(%url, %status, "non-success status, keeping body anyway");
    }

    let bytes = resp
        .bytes()
        .await
        .with_context(|| format!("reading body from {}", url))?;
    Ok(bytes.to_vec())
}
