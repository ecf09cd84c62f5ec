// src/download.rs
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info, instrument, warn};

use crate::fetch::DisclosureSource;
use crate::index::{FilingIndex, FilingRow, DOC_ID_COLUMN, YEAR_COLUMN};

/// What happened to a single index row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    /// The document was already on disk.
    Skipped,
    Downloaded { bytes: usize },
    /// The fetch failed; nothing was written.
    Unavailable,
}

/// Per-run tallies. `failed` covers both unavailable documents and rows that errored.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DownloadReport {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl DownloadReport {
    pub fn total(&self) -> usize {
        self.downloaded + self.skipped + self.failed
    }
}

/// `{base_dir}/{state}/{doc_id}.pdf`
pub fn document_path(base_dir: impl AsRef<Path>, state: &str, doc_id: &str) -> PathBuf {
    base_dir.as_ref().join(state).join(format!("{}.pdf", doc_id))
}

/// Fetch one document. Errors are logged and turned into `None` so a bad
/// document never stops the rest of the index.
pub async fn download_document<S>(source: &S, doc_id: &str, year: &str) -> Option<Vec<u8>>
where
    S: DisclosureSource + ?Sized,
{
    info!("Downloading {} - {}", year, doc_id);
    match source.fetch_document(year, doc_id).await {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            error!(year, doc_id, error = ?e, "document fetch failed");
            None
        }
    }
}

/// Handle a single row: make the state dir, skip if the PDF exists, otherwise fetch and write it.
pub async fn download_row<S>(source: &S, row: FilingRow<'_>, base_dir: &Path) -> Result<RowOutcome>
where
    S: DisclosureSource + ?Sized,
{
    let doc_id = row
        .doc_id()
        .ok_or_else(|| anyhow!("row has no {} value", DOC_ID_COLUMN))?;
    let state = row.state();

    let state_dir = base_dir.join(state);
    fs::create_dir_all(&state_dir)
        .await
        .with_context(|| format!("creating {}", state_dir.display()))?;

    let dest = document_path(base_dir, state, doc_id);
    if fs::try_exists(&dest)
        .await
        .with_context(|| format!("checking {}", dest.display()))?
    {
        debug!(doc_id, path = %dest.display(), "already downloaded");
        return Ok(RowOutcome::Skipped);
    }

    let year = row
        .year()
        .ok_or_else(|| anyhow!("row {} has no {} value", doc_id, YEAR_COLUMN))?;

    match download_document(source, doc_id, year).await {
        Some(bytes) => {
            fs::write(&dest, &bytes)
                .await
                .with_context(|| format!("writing {}", dest.display()))?;
            Ok(RowOutcome::Downloaded { bytes: bytes.len() })
        }
        None => Ok(RowOutcome::Unavailable),
    }
}

/// Walk the whole index in order. A failing row is logged and counted, never fatal.
#[instrument(level = "info", skip(source, index, base_dir), fields(base = %base_dir.display(), rows = index.len()))]
pub async fn download_documents<S>(source: &S, index: &FilingIndex, base_dir: &Path) -> DownloadReport
where
    S: DisclosureSource + ?Sized,
{
    let mut report = DownloadReport::default();

    for (i, row) in index.rows().enumerate() {
        match download_row(source, row, base_dir).await {
            Ok(RowOutcome::Skipped) => report.skipped += 1,
            Ok(RowOutcome::Downloaded { bytes }) => {
                debug!(row = i, doc_id = ?row.doc_id(), bytes, "saved");
                report.downloaded += 1;
            }
            Ok(RowOutcome::Unavailable) => {
                warn!(row = i, doc_id = ?row.doc_id(), "Failed to download");
                report.failed += 1;
            }
            Err(e) => {
                error!(row = i, error = ?e, "row failed");
                report.failed += 1;
            }
        }
    }

    report
}
