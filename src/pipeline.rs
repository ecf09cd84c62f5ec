// src/pipeline.rs
use anyhow::{Context, Result};
use std::path::Path;
use std::time::Instant;
use tokio::fs;
use tracing::{debug, info, instrument};

use crate::download::{download_documents, DownloadReport};
use crate::fetch::{zips, DisclosureSource};
use crate::index::{parse_manifest, FilingIndex};

pub const INDEX_FILE: &str = "index.csv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearReport {
    pub year: String,
    /// Rows in the year's index.
    pub entries: usize,
    pub downloads: DownloadReport,
}

/// Download the year's archive into `year_dir`, pull out the XML manifest and
/// parse it into an index.
#[instrument(level = "info", skip(source, year_dir), fields(dir = %year_dir.display()))]
pub async fn retrieve_index<S>(source: &S, year: &str, year_dir: &Path) -> Result<FilingIndex>
where
    S: DisclosureSource + ?Sized,
{
    let bytes = source
        .fetch_archive(year)
        .await
        .with_context(|| format!("downloading {} archive", year))?;
    let zip_path = zips::save_archive(&bytes, year_dir, year).await?;
    info!(path = %zip_path.display(), bytes = bytes.len(), "saved archive");

    // ZIP reading is blocking I/O
    let (name, xml) = tokio::task::spawn_blocking({
        let zip_path = zip_path.clone();
        move || zips::read_manifest(&zip_path)
    })
    .await
    .context("manifest reader task failed")??;
    debug!(entry = %name, bytes = xml.len(), "found manifest");

    parse_manifest(&xml).with_context(|| format!("parsing manifest {}", name))
}

/// Everything for one year: archive, `index.csv`, then the documents.
/// An `Err` means the year stopped early; files already written are left in place.
#[instrument(level = "info", skip(source, base_dir))]
pub async fn run_year<S>(source: &S, year: &str, base_dir: &Path) -> Result<YearReport>
where
    S: DisclosureSource + ?Sized,
{
    info!("Downloading {}", year);
    let start = Instant::now();

    let year_dir = base_dir.join(year);
    fs::create_dir_all(&year_dir)
        .await
        .with_context(|| format!("creating {}", year_dir.display()))?;

    let index = retrieve_index(source, year, &year_dir).await?;
    info!("{} entries to download", index.len());

    index.write_csv(year_dir.join(INDEX_FILE))?;

    let downloads = download_documents(source, &index, &year_dir).await;
    info!(
        downloaded = downloads.downloaded,
        skipped = downloads.skipped,
        failed = downloads.failed,
        elapsed = ?start.elapsed(),
        "finished {}",
        year
    );

    Ok(YearReport {
        year: year.to_string(),
        entries: index.len(),
        downloads,
    })
}
