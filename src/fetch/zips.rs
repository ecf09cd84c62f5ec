use anyhow::{anyhow, Context, Result};
use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use tokio::fs;
use zip::ZipArchive;

/// Upper bound on how much of an entry's declared size is reserved up front.
const PREALLOC_LIMIT: u64 = 16 * 1024 * 1024;

/// `{year_dir}/{year}FD.zip`
pub fn archive_path(year_dir: impl AsRef<Path>, year: &str) -> PathBuf {
    year_dir.as_ref().join(format!("{}FD.zip", year))
}

/// Write the downloaded archive bytes under `year_dir`, replacing any earlier copy.
/// Returns the full path of the saved file.
pub async fn save_archive(
    bytes: &[u8],
    year_dir: impl AsRef<Path>,
    year: &str,
) -> Result<PathBuf> {
    let year_dir = year_dir.as_ref();
    fs::create_dir_all(year_dir)
        .await
        .with_context(|| format!("creating {}", year_dir.display()))?;

    let dest_path = archive_path(year_dir, year);
    fs::write(&dest_path, bytes)
        .await
        .with_context(|| format!("writing archive {}", dest_path.display()))?;

    Ok(dest_path)
}

/// Open the ZIP at `zip_path` and return the name and contents of its manifest.
pub fn read_manifest(zip_path: impl AsRef<Path>) -> Result<(String, Vec<u8>)> {
    let zip_path = zip_path.as_ref();
    let file = File::open(zip_path)
        .with_context(|| format!("Failed to open ZIP file: {:?}", zip_path))?;
    let mut archive = ZipArchive::new(file)
        .with_context(|| format!("Failed to read ZIP archive: {:?}", zip_path))?;
    find_manifest(&mut archive)
}

/// The manifest is the first entry, in archive order, whose name contains `.xml`.
pub fn find_manifest<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<(String, Vec<u8>)> {
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .with_context(|| format!("reading ZIP entry #{}", i))?;
        let name = entry.name().to_string();
        if !name.contains(".xml") {
            continue;
        }

        let mut buf = Vec::with_capacity(capacity_hint(entry.size()));
        entry
            .read_to_end(&mut buf)
            .with_context(|| format!("decompressing {}", name))?;
        return Ok((name, buf));
    }

    Err(anyhow!(
        "no .xml entry among {} archive entries",
        archive.len()
    ))
}

/// The size in a ZIP header is untrusted; only reserve up to [`PREALLOC_LIMIT`].
fn capacity_hint(declared: u64) -> usize {
    declared.min(PREALLOC_LIMIT) as usize
}
