//! Output writer
//!
//! Records are flattened into the fixed, versioned column layout and written
//! as CSV, TSV or an `.xlsx` workbook. Monetary columns are coerced to plain
//! numbers so that the file can be summed directly and re-read as a
//! comparison snapshot; workbooks store them as numeric cells.
//!
//! Files are written to a temporary sibling first and renamed into place, so
//! an interrupted run never leaves a truncated output behind.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use rust_xlsxwriter::Workbook;
use tracing::{debug, info};

use super::models::{Category, Record};
use super::tabular::TabularFormat;
use crate::constants::{columns, files};
use crate::errors::{OutputError, OutputResult};

/// Column names of the fixed layout, without extras or status
pub fn column_layout() -> Vec<String> {
    let mut layout = vec![columns::LINK.to_string()];

    let mut sections = vec![Category::Main, Category::CivilComplaint];
    for kind in [
        Category::Settlement as fn(u8) -> Category,
        Category::CorrectedSettlement,
        Category::Judgment,
    ] {
        sections.extend((1..=columns::MAX_REPEATED_SECTIONS).map(kind));
    }

    for category in sections {
        layout.extend(
            category
                .layout_fields()
                .iter()
                .map(|field| category.column_name(field)),
        );
    }
    layout
}

/// True when values of `column` hold amounts of money
pub fn is_monetary_column(column: &str) -> bool {
    let lower = column.to_lowercase();
    columns::MONETARY_KEYWORDS
        .iter()
        .any(|keyword| lower.contains(keyword))
}

/// Render a currency string as a plain number
///
/// `$`, `,` and spaces are stripped. Values that do not parse as a finite
/// number are returned unchanged.
pub fn coerce_monetary(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    if cleaned.is_empty() {
        return String::new();
    }
    match cleaned.parse::<f64>() {
        Ok(number) if number.is_finite() => number.to_string(),
        _ => value.to_string(),
    }
}

/// Value of `column` as it is written to output
pub fn normalize_value(column: &str, value: &str) -> String {
    let trimmed = value.trim();
    if is_monetary_column(column) {
        coerce_monetary(trimmed)
    } else {
        trimmed.to_string()
    }
}

/// Full header for a set of records
///
/// Columns outside the fixed layout are appended in sorted order.
fn header_for(records: &[Record], include_status: bool) -> Vec<String> {
    let mut header = column_layout();
    let known: BTreeSet<&str> = header.iter().map(String::as_str).collect();
    let extras: BTreeSet<String> = records
        .iter()
        .flat_map(|r| r.flat_fields().map(|(column, _)| column))
        .filter(|column| !known.contains(column.as_str()))
        .collect();
    if !extras.is_empty() {
        debug!("Appending {} columns outside the fixed layout", extras.len());
    }
    header.extend(extras);
    if include_status {
        header.push(columns::STATUS.to_string());
    }
    header
}

fn row_for(record: &Record, header: &[String]) -> Vec<String> {
    let values: HashMap<String, &str> = record.flat_fields().collect();
    header
        .iter()
        .map(|column| {
            if column == columns::LINK {
                record.link().to_string()
            } else if column == columns::STATUS {
                record.status().map(|s| s.to_string()).unwrap_or_default()
            } else {
                values
                    .get(column)
                    .map(|value| normalize_value(column, value))
                    .unwrap_or_default()
            }
        })
        .collect()
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(files::TEMP_FILE_SUFFIX);
    PathBuf::from(name)
}

/// Check that `path` names a format records can be written in
pub fn check_output_path(path: &Path) -> OutputResult<TabularFormat> {
    TabularFormat::for_output(path).map_err(|_| OutputError::UnsupportedFormat {
        path: path.to_path_buf(),
    })
}

fn write_delimited(
    format: TabularFormat,
    path: &Path,
    header: &[String],
    rows: &[Vec<String>],
) -> OutputResult<()> {
    let mut writer = format.writer_builder().from_path(path)?;
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_workbook(path: &Path, header: &[String], rows: &[Vec<String>]) -> OutputResult<()> {
    let limit = || OutputError::SheetLimit {
        rows: rows.len() + 1,
        columns: header.len(),
    };
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (r, row) in std::iter::once(header).chain(rows.iter().map(Vec::as_slice)).enumerate() {
        let r = u32::try_from(r).map_err(|_| limit())?;
        for (c, value) in row.iter().enumerate() {
            let c = u16::try_from(c).map_err(|_| limit())?;
            let numeric = (r > 0 && is_monetary_column(&header[usize::from(c)]))
                .then(|| value.parse::<f64>().ok())
                .flatten()
                .filter(|number| number.is_finite());
            match numeric {
                Some(number) => sheet.write_number(r, c, number)?,
                None if value.is_empty() => continue,
                None => sheet.write_string(r, c, value)?,
            };
        }
    }

    workbook.save(path)?;
    Ok(())
}

/// Write `records` to `path`, atomically
///
/// The format follows the extension (`.csv`, `.tsv`, `.txt`, `.xlsx`). With
/// `include_status` a trailing status column is written.
pub fn write_records(
    path: &Path,
    records: &[Record],
    include_status: bool,
) -> OutputResult<PathBuf> {
    let format = check_output_path(path)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let header = header_for(records, include_status);
    let rows: Vec<Vec<String>> = records.iter().map(|r| row_for(r, &header)).collect();
    let temp_path = temp_path_for(path);

    let written = match format {
        TabularFormat::Xlsx => write_workbook(&temp_path, &header, &rows),
        _ => write_delimited(format, &temp_path, &header, &rows),
    };

    if let Err(e) = written {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e);
    }

    if let Err(e) = std::fs::rename(&temp_path, path) {
        debug!("Rename of {} failed: {}", temp_path.display(), e);
        let _ = std::fs::remove_file(&temp_path);
        return Err(OutputError::AtomicOperationFailed {
            temp_path,
            final_path: path.to_path_buf(),
        });
    }

    info!(
        "Wrote {} records ({} columns, layout v{}) to {}",
        records.len(),
        header.len(),
        columns::LAYOUT_VERSION,
        path.display()
    );
    Ok(path.to_path_buf())
}

/// Announce a finished artifact
///
/// Delivery beyond the log is left to whoever watches the output path.
pub fn notify(path: &Path, records: usize) {
    info!(
        "Output ready: {} ({} records)",
        path.display(),
        records
    );
}
