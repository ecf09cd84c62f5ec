// src/fetch/urls.rs
use anyhow::{Context, Result};
use url::Url;

use crate::config::{Config, DOC_ID_PLACEHOLDER, YEAR_PLACEHOLDER};

/// The two endpoint templates, rendered per year / per document.
#[derive(Debug, Clone)]
pub struct UrlTemplates {
    archive: String,
    document: String,
}

impl UrlTemplates {
    pub fn new(archive: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            archive: archive.into(),
            document: document.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.archive_url, &config.document_url)
    }

    /// URL of the yearly ZIP holding the XML manifest.
    pub fn archive_url(&self, year: &str) -> Result<Url> {
        let raw = self.archive.replace(YEAR_PLACEHOLDER, year);
        Url::parse(&raw).with_context(|| format!("parsing archive URL {}", raw))
    }

    /// URL of a single filer's PDF.
    pub fn document_url(&self, year: &str, doc_id: &str) -> Result<Url> {
        let raw = self
            .document
            .replace(YEAR_PLACEHOLDER, year)
            .replace(DOC_ID_PLACEHOLDER, doc_id);
        Url::parse(&raw).with_context(|| format!("parsing document URL {}", raw))
    }
}
