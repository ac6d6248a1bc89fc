//! Tabular file formats and URL list input
//!
//! Every tabular artifact the harvester reads or writes is CSV, TSV or an
//! Excel workbook, chosen by file extension. Workbooks are read from their
//! first worksheet; only `.xlsx` can be written.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use calamine::{open_workbook_auto, Reader};
use serde::Serialize;
use tracing::{debug, info};

use crate::errors::{ConfigError, ConfigResult};

const READABLE: &str = "csv, tsv, txt (tab separated), xlsx or xls";
const WRITABLE: &str = "csv, tsv, txt (tab separated) or xlsx";

/// Format of a tabular file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabularFormat {
    Csv,
    Tsv,
    Xlsx,
    /// Legacy workbook, readable only
    Xls,
}

impl TabularFormat {
    /// Pick the format from the file extension
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(TabularFormat::Csv),
            "tsv" | "txt" => Ok(TabularFormat::Tsv),
            "xlsx" | "xlsm" => Ok(TabularFormat::Xlsx),
            "xls" => Ok(TabularFormat::Xls),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
                expected: READABLE,
            }),
        }
    }

    /// Format for an output file; legacy workbooks cannot be written
    pub fn for_output(path: &Path) -> ConfigResult<Self> {
        match Self::from_path(path) {
            Ok(TabularFormat::Xls) | Err(_) => Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
                expected: WRITABLE,
            }),
            Ok(format) => Ok(format),
        }
    }

    pub fn is_workbook(&self) -> bool {
        matches!(self, TabularFormat::Xlsx | TabularFormat::Xls)
    }

    pub fn delimiter(&self) -> u8 {
        match self {
            TabularFormat::Tsv => b'\t',
            _ => b',',
        }
    }

    /// Reader for delimited formats; ragged rows are tolerated
    pub fn reader_builder(&self, has_headers: bool) -> csv::ReaderBuilder {
        let mut builder = csv::ReaderBuilder::new();
        builder
            .delimiter(self.delimiter())
            .has_headers(has_headers)
            .flexible(true);
        builder
    }

    pub fn writer_builder(&self) -> csv::WriterBuilder {
        let mut builder = csv::WriterBuilder::new();
        builder.delimiter(self.delimiter());
        builder
    }
}

fn unreadable(path: &Path, error: impl fmt::Display) -> ConfigError {
    ConfigError::Unreadable {
        path: path.to_path_buf(),
        reason: error.to_string(),
    }
}

/// Read every row of a tabular file as text, header row included
///
/// Workbooks contribute their first worksheet. Numeric cells are rendered
/// the way `f64` displays, so `5000.0` reads as `5000`.
pub fn read_rows(path: &Path) -> ConfigResult<Vec<Vec<String>>> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let format = TabularFormat::from_path(path)?;

    if format.is_workbook() {
        let mut workbook = open_workbook_auto(path).map_err(|e| unreadable(path, e))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| unreadable(path, "workbook has no worksheets"))?
            .map_err(|e| unreadable(path, e))?;
        return Ok(range
            .rows()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect());
    }

    let mut reader = format
        .reader_builder(false)
        .from_path(path)
        .map_err(|e| unreadable(path, e))?;
    reader
        .records()
        .map(|record| {
            record
                .map(|r| r.iter().map(str::to_string).collect())
                .map_err(|e| unreadable(path, e))
        })
        .collect()
}

/// Column of a URL list holding the links
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum UrlColumn {
    /// Zero-based position
    Index(usize),
    /// Header name, matched ignoring case
    Name(String),
}

impl Default for UrlColumn {
    fn default() -> Self {
        UrlColumn::Index(0)
    }
}

impl FromStr for UrlColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("column must be an index or a header name".to_string());
        }
        Ok(match s.parse::<usize>() {
            Ok(index) => UrlColumn::Index(index),
            Err(_) => UrlColumn::Name(s.to_string()),
        })
    }
}

impl fmt::Display for UrlColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlColumn::Index(index) => write!(f, "{}", index),
            UrlColumn::Name(name) => f.write_str(name),
        }
    }
}

/// Read candidate URLs from one column of a tabular file
///
/// With a column index, a first row whose cell is not a URL is taken as a
/// header and skipped. With a column name, the first row is the header.
/// Only cells starting with `http` are kept; duplicates are dropped keeping
/// the first occurrence.
pub fn read_url_list(path: &Path, column: &UrlColumn) -> ConfigResult<Vec<String>> {
    let rows = read_rows(path)?;

    let (index, skip) = match column {
        UrlColumn::Index(index) => (*index, 0),
        UrlColumn::Name(name) => {
            let index = rows
                .first()
                .and_then(|header| {
                    header
                        .iter()
                        .position(|cell| cell.trim().eq_ignore_ascii_case(name))
                })
                .ok_or_else(|| ConfigError::MissingColumn {
                    path: path.to_path_buf(),
                    column: name.clone(),
                })?;
            (index, 1)
        }
    };

    let mut urls = Vec::new();
    let mut seen = HashSet::new();

    for (row, cells) in rows.iter().enumerate().skip(skip) {
        let cell = cells.get(index).map(|c| c.trim()).unwrap_or_default();

        if !cell.starts_with("http") {
            if row == 0 {
                debug!("Skipping header row of {}", path.display());
            }
            continue;
        }
        if seen.insert(cell.to_string()) {
            urls.push(cell.to_string());
        }
    }

    if urls.is_empty() {
        return Err(ConfigError::NoUrls {
            path: path.to_path_buf(),
        });
    }

    info!(
        "Read {} URLs from column {} of {}",
        urls.len(),
        column,
        path.display()
    );
    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn write_workbook(dir: &TempDir, name: &str, rows: &[&[&str]]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                sheet.write_string(r as u32, c as u16, *value).unwrap();
            }
        }
        workbook.save(&path).unwrap();
        path
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            TabularFormat::from_path(Path::new("a.CSV")).unwrap(),
            TabularFormat::Csv
        );
        assert_eq!(
            TabularFormat::from_path(Path::new("a.txt")).unwrap(),
            TabularFormat::Tsv
        );
        assert_eq!(
            TabularFormat::from_path(Path::new("a.xlsx")).unwrap(),
            TabularFormat::Xlsx
        );
        assert!(matches!(
            TabularFormat::from_path(Path::new("a.json")),
            Err(ConfigError::UnsupportedFormat { .. })
        ));
        assert!(TabularFormat::from_path(Path::new("noextension")).is_err());
    }

    #[test]
    fn test_output_formats() {
        assert_eq!(
            TabularFormat::for_output(Path::new("out.xlsx")).unwrap(),
            TabularFormat::Xlsx
        );
        assert!(TabularFormat::for_output(Path::new("out.xls")).is_err());
        assert!(TabularFormat::for_output(Path::new("out.json")).is_err());
    }

    #[test]
    fn test_url_column_parsing() {
        assert_eq!("2".parse::<UrlColumn>().unwrap(), UrlColumn::Index(2));
        assert_eq!(
            " Link ".parse::<UrlColumn>().unwrap(),
            UrlColumn::Name("Link".to_string())
        );
        assert!("".parse::<UrlColumn>().is_err());
    }

    #[test]
    fn test_read_url_list_skips_header_and_duplicates() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "urls.tsv",
            "URL\tnote\nhttps://a.test/1\tx\nnot a url\ty\nhttps://a.test/2\nhttps://a.test/1\tdup\n",
        );

        let urls = read_url_list(&path, &UrlColumn::default()).unwrap();
        assert_eq!(urls, vec!["https://a.test/1", "https://a.test/2"]);
    }

    #[test]
    fn test_read_url_list_by_index_and_name() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "urls.csv", "id,link\n1,https://a.test/1\n");

        assert_eq!(
            read_url_list(&path, &UrlColumn::Index(1)).unwrap(),
            vec!["https://a.test/1"]
        );
        assert_eq!(
            read_url_list(&path, &UrlColumn::Name("LINK".to_string())).unwrap(),
            vec!["https://a.test/1"]
        );
        assert!(matches!(
            read_url_list(&path, &UrlColumn::Name("url".to_string())),
            Err(ConfigError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_read_url_list_from_workbook() {
        let dir = TempDir::new().unwrap();
        let path = write_workbook(
            &dir,
            "urls.xlsx",
            &[
                &["AG Number", "URL"],
                &["2020-00001", "https://a.test/1"],
                &["2020-00002", "https://a.test/2"],
            ],
        );

        assert_eq!(
            read_url_list(&path, &UrlColumn::Name("url".to_string())).unwrap(),
            vec!["https://a.test/1", "https://a.test/2"]
        );
        assert_eq!(
            read_url_list(&path, &UrlColumn::Index(1)).unwrap().len(),
            2
        );
    }

    #[test]
    fn test_read_url_list_errors() {
        let dir = TempDir::new().unwrap();

        let missing = dir.path().join("missing.tsv");
        assert!(matches!(
            read_url_list(&missing, &UrlColumn::default()),
            Err(ConfigError::NotFound { .. })
        ));

        let empty = write_file(&dir, "empty.tsv", "URL\nnothing here\n");
        assert!(matches!(
            read_url_list(&empty, &UrlColumn::default()),
            Err(ConfigError::NoUrls { .. })
        ));

        let corrupt = write_file(&dir, "urls.xlsx", "not a workbook");
        assert!(matches!(
            read_url_list(&corrupt, &UrlColumn::default()),
            Err(ConfigError::Unreadable { .. })
        ));

        let json = write_file(&dir, "urls.json", "[]");
        assert!(matches!(
            read_url_list(&json, &UrlColumn::default()),
            Err(ConfigError::UnsupportedFormat { .. })
        ));
    }
}
