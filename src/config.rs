// src/config.rs

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const YEAR_PLACEHOLDER: &str = "{year}";
pub const DOC_ID_PLACEHOLDER: &str = "{doc_id}";

const DEFAULT_ARCHIVE_URL: &str =
    "https://disclosures-clerk.house.gov/public_disc/financial-pdfs/{year}FD.ZIP";
const DEFAULT_DOCUMENT_URL: &str =
    "https://disclosures-clerk.house.gov/public_disc/financial-pdfs/{year}/{doc_id}.pdf";

/// Runtime settings: where to save things and where to fetch them from.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the saved tree; each year gets `{base_dir}/{year}`.
    pub base_dir: PathBuf,
    /// Yearly archive URL, with a `{year}` placeholder.
    pub archive_url: String,
    /// Per-filer document URL, with `{year}` and `{doc_id}` placeholders.
    pub document_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("./saves"),
            archive_url: DEFAULT_ARCHIVE_URL.to_string(),
            document_url: DEFAULT_DOCUMENT_URL.to_string(),
        }
    }
}

impl Config {
    /// Load from a YAML (`.yaml`/`.yml`) or JSON file. Keys that are left out keep
    /// their defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let config: Config = match ext {
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("parsing YAML config {}", path.display()))?,
            _ => serde_json::from_str(&contents)
                .with_context(|| format!("parsing JSON config {}", path.display()))?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from_path(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.archive_url.contains(YEAR_PLACEHOLDER) {
            bail!(
                "archive_url {:?} is missing the {} placeholder",
                self.archive_url,
                YEAR_PLACEHOLDER
            );
        }
        if !self.document_url.contains(DOC_ID_PLACEHOLDER) {
            bail!(
                "document_url {:?} is missing the {} placeholder",
                self.document_url,
                DOC_ID_PLACEHOLDER
            );
        }
        Ok(())
    }
}

/// Split a `--years` value like `"2019, 2020"` into trimmed, non-empty years.
pub fn parse_years(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|y| !y.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_are_valid() {
        let cfg = Config::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.base_dir, PathBuf::from("./saves"));
    }

    #[test]
    fn yaml_overrides_only_given_keys() -> Result<()> {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile()?;
        writeln!(file, "base_dir: /tmp/fd")?;

        let cfg = Config::load(Some(file.path()))?;
        assert_eq!(cfg.base_dir, PathBuf::from("/tmp/fd"));
        assert_eq!(cfg.archive_url, DEFAULT_ARCHIVE_URL);
        Ok(())
    }

    #[test]
    fn json_config_is_parsed() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(
            file,
            r#"{{"archive_url": "http://localhost/{{year}}.zip", "document_url": "http://localhost/{{year}}/{{doc_id}}"}}"#
        )?;

        let cfg = Config::load_from_path(file.path())?;
        assert_eq!(cfg.archive_url, "http://localhost/{year}.zip");
        assert_eq!(cfg.document_url, "http://localhost/{year}/{doc_id}");
        Ok(())
    }

    #[test]
    fn years_are_trimmed_and_empties_dropped() {
        assert_eq!(parse_years("2019"), ["2019"]);
        assert_eq!(parse_years(" 2019, 2020 ,,2021"), ["2019", "2020", "2021"]);
        assert!(parse_years(" , ").is_empty());
    }

    #[test]
    fn template_without_placeholder_is_rejected() {
        let cfg = Config {
            document_url: "http://localhost/static.pdf".to_string(),
            ..Config::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("{doc_id}"));
    }
}
