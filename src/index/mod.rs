// src/index/mod.rs
use anyhow::{Context, Result};
use std::{fs::File, io::Write, path::Path};
use tracing::debug;

pub mod xml;

pub use xml::{parse_manifest, parse_members};

pub const DOC_ID_COLUMN: &str = "DocID";
pub const YEAR_COLUMN: &str = "Year";
pub const STATE_DST_COLUMN: &str = "StateDst";

/// Stand-in state-district code for filers whose manifest entry has none.
pub const DEFAULT_STATE_DST: &str = "ZZ00";

/// One `Member` element: tag name → text, in the order tags first appeared.
/// `None` means the child element was present but had no text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilingRecord {
    fields: Vec<(String, Option<String>)>,
}

impl FilingRecord {
    /// Set `tag`; a repeated tag overwrites the earlier value but keeps its position.
    pub fn insert(&mut self, tag: impl Into<String>, value: Option<String>) {
        let tag = tag.into();
        match self.fields.iter_mut().find(|(t, _)| *t == tag) {
            Some((_, v)) => *v = value,
            None => self.fields.push((tag, value)),
        }
    }

    /// `None` if the tag never appeared, `Some(None)` if it appeared empty.
    pub fn get(&self, tag: &str) -> Option<Option<&str>> {
        self.fields
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, v)| v.as_deref())
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(t, _)| t.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, Option<V>)> for FilingRecord {
    fn from_iter<I: IntoIterator<Item = (K, Option<V>)>>(iter: I) -> Self {
        let mut record = FilingRecord::default();
        for (k, v) in iter {
            record.insert(k, v.map(Into::into));
        }
        record
    }
}

/// A year's filings as a table. Columns are the union of every record's tags;
/// each row has exactly one cell per column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilingIndex {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl FilingIndex {
    /// Build the table, computing the full column set before filling rows.
    pub fn from_records(records: Vec<FilingRecord>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in &records {
            for tag in record.tags() {
                if !columns.iter().any(|c| c == tag) {
                    columns.push(tag.to_string());
                }
            }
        }

        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|c| record.get(c).flatten().map(str::to_string))
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = FilingRow<'_>> {
        self.rows.iter().map(move |cells| FilingRow {
            columns: &self.columns,
            cells,
        })
    }

    /// Overwrite `path` with the table as CSV: header row, then one line per
    /// filer with missing cells left empty. A manifest with no `Member`
    /// elements has no columns, so the file is left empty.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file =
            File::create(path).with_context(|| format!("creating index {}", path.display()))?;
        self.write_csv_to(file)
            .with_context(|| format!("writing index {}", path.display()))?;
        debug!(path = %path.display(), rows = self.len(), "wrote index");
        Ok(())
    }

    pub fn write_csv_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        if !self.columns.is_empty() {
            wtr.write_record(&self.columns)?;
            for row in &self.rows {
                wtr.write_record(row.iter().map(|c| c.as_deref().unwrap_or("")))?;
            }
        }
        wtr.flush()?;
        Ok(())
    }
}

/// Borrowed view of one table row.
#[derive(Debug, Clone, Copy)]
pub struct FilingRow<'a> {
    columns: &'a [String],
    cells: &'a [Option<String>],
}

impl<'a> FilingRow<'a> {
    /// Cell value, or `None` when the column is unknown or the cell is missing.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let idx = self.columns.iter().position(|c| c == column)?;
        let cells: &'a [Option<String>] = self.cells;
        cells[idx].as_deref()
    }

    pub fn doc_id(&self) -> Option<&'a str> {
        self.get(DOC_ID_COLUMN)
    }

    pub fn year(&self) -> Option<&'a str> {
        self.get(YEAR_COLUMN)
    }

    /// State-district code, falling back to [`DEFAULT_STATE_DST`] when missing or empty.
    pub fn state_dst(&self) -> &'a str {
        match self.get(STATE_DST_COLUMN) {
            Some(s) if !s.is_empty() => s,
            _ => DEFAULT_STATE_DST,
        }
    }

    /// First two characters of the state-district code.
    pub fn state(&self) -> &'a str {
        let dst = self.state_dst();
        let end = dst.char_indices().nth(2).map_or(dst.len(), |(i, _)| i);
        &dst[..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[(&str, Option<&str>)]) -> FilingRecord {
        fields.iter().map(|(k, v)| (*k, v.map(str::to_string))).collect()
    }

    #[test]
    fn columns_are_union_in_first_seen_order() {
        let index = FilingIndex::from_records(vec![
            record(&[("A", Some("x")), ("B", Some("y"))]),
            record(&[("A", Some("z")), ("C", Some("w"))]),
        ]);

        assert_eq!(index.columns(), ["A", "B", "C"]);
        assert_eq!(index.len(), 2);

        let rows: Vec<_> = index.rows().collect();
        assert_eq!(rows[0].get("A"), Some("x"));
        assert_eq!(rows[0].get("B"), Some("y"));
        assert_eq!(rows[0].get("C"), None);
        assert_eq!(rows[1].get("B"), None);
        assert_eq!(rows[1].get("C"), Some("w"));
        assert_eq!(rows[1].get("Nope"), None);
    }

    #[test]
    fn repeated_tag_keeps_last_value() {
        let mut r = FilingRecord::default();
        r.insert("A", Some("first".to_string()));
        r.insert("B", None);
        r.insert("A", Some("second".to_string()));

        assert_eq!(r.len(), 2);
        assert_eq!(r.get("A"), Some(Some("second")));
        assert_eq!(r.get("B"), Some(None));
        assert_eq!(r.get("C"), None);
        assert_eq!(r.tags().collect::<Vec<_>>(), ["A", "B"]);
    }

    #[test]
    fn state_defaults_when_missing_or_empty() {
        let index = FilingIndex::from_records(vec![
            record(&[("DocID", Some("D1")), ("StateDst", Some("CA05"))]),
            record(&[("DocID", Some("D2")), ("StateDst", None)]),
            record(&[("DocID", Some("D3")), ("StateDst", Some(""))]),
            record(&[("DocID", Some("D4"))]),
            record(&[("DocID", Some("D5")), ("StateDst", Some("X"))]),
        ]);

        let states: Vec<_> = index.rows().map(|r| r.state()).collect();
        assert_eq!(states, ["CA", "ZZ", "ZZ", "ZZ", "X"]);

        let row = index.rows().nth(1).unwrap();
        assert_eq!(row.state_dst(), DEFAULT_STATE_DST);
    }

    #[test]
    fn state_defaults_without_column() {
        let index = FilingIndex::from_records(vec![record(&[("DocID", Some("D1"))])]);
        let row = index.rows().next().unwrap();
        assert_eq!(row.state(), "ZZ");
        assert_eq!(row.doc_id(), Some("D1"));
        assert_eq!(row.year(), None);
    }

    #[test]
    fn csv_has_header_and_empty_missing_cells() -> Result<()> {
        let index = FilingIndex::from_records(vec![
            record(&[("DocID", Some("D1")), ("Year", Some("2019")), ("StateDst", Some("CA05"))]),
            record(&[("DocID", Some("D2")), ("Year", Some("2019"))]),
            record(&[("Last", Some("Smith, Jr.")), ("DocID", Some("D3"))]),
        ]);

        let mut out = Vec::new();
        index.write_csv_to(&mut out)?;
        let text = String::from_utf8(out)?;

        assert_eq!(
            text,
            "DocID,Year,StateDst,Last\nD1,2019,CA05,\nD2,2019,,\nD3,,,\"Smith, Jr.\"\n"
        );
        Ok(())
    }

    #[test]
    fn csv_for_empty_index_is_empty() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("index.csv");
        std::fs::write(&path, "DocID\nD1\n")?;

        FilingIndex::from_records(Vec::new()).write_csv(&path)?;

        assert!(path.is_file());
        assert_eq!(std::fs::read_to_string(&path)?, "");
        Ok(())
    }

    #[test]
    fn csv_is_overwritten() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("index.csv");
        std::fs::write(&path, "stale,content\n1,2\n3,4\n")?;

        let index = FilingIndex::from_records(vec![record(&[("DocID", Some("D1"))])]);
        index.write_csv(&path)?;

        assert_eq!(std::fs::read_to_string(&path)?, "DocID\nD1\n");
        Ok(())
    }
}
