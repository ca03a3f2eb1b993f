//! Persistence writer: CSV and XLSX output for retrieved tables.
//!
//! Both formats write a header row with the table's columns in order and no
//! row-index column. Writes overwrite the destination and are not atomic.
//! Saving the empty sentinel, or a table with no rows, writes nothing and
//! leaves any existing file untouched.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::data::{Retrieved, Table, Value};

/// UTF-8 byte-order mark.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Largest sheet an XLSX file can hold.
const XLSX_MAX_ROWS: usize = 1_048_576;
const XLSX_MAX_COLUMNS: usize = 16_384;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XLSX error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("table of {rows} rows x {columns} columns does not fit in a worksheet")]
    SheetTooLarge { rows: usize, columns: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Comma-separated text.
    Csv,
    /// Office Open XML spreadsheet.
    Xlsx,
}

impl OutputFormat {
    /// `.xlsx`/`.xls` are spreadsheets; everything else is CSV.
    ///
    /// A `.xls` path still receives Office Open XML content, not the legacy
    /// binary format, so spreadsheet tools may warn that the extension does
    /// not match when opening it.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("xlsx") | Some("xls") => OutputFormat::Xlsx,
            _ => OutputFormat::Csv,
        }
    }
}

/// Text encoding for CSV output. Spreadsheets ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    /// UTF-8 prefixed with a byte-order mark, so spreadsheet tools detect it.
    #[default]
    Utf8Bom,
    Utf8,
}

/// Where and how to save one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceTarget {
    path: PathBuf,
    format: OutputFormat,
    encoding: TextEncoding,
}

impl PersistenceTarget {
    /// Format inferred from the extension, BOM-prefixed UTF-8.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = OutputFormat::from_path(&path);
        Self {
            path,
            format,
            encoding: TextEncoding::default(),
        }
    }

    pub fn csv(path: impl Into<PathBuf>) -> Self {
        Self::new(path).with_format(OutputFormat::Csv)
    }

    pub fn xlsx(path: impl Into<PathBuf>) -> Self {
        Self::new(path).with_format(OutputFormat::Xlsx)
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Written { path: PathBuf, rows: usize },
    /// The result had no rows; nothing was written.
    Skipped,
}

/// Save a retrieval result to `target`. The sentinel, or any result with
/// zero rows, is skipped.
pub fn save(result: &Retrieved, target: &PersistenceTarget) -> Result<SaveOutcome, PersistError> {
    let Some(table) = result.table().filter(|t| !t.is_empty()) else {
        tracing::info!(path = %target.path.display(), "result is empty, nothing saved");
        return Ok(SaveOutcome::Skipped);
    };

    match target.format {
        OutputFormat::Csv => {
            let bytes = export_csv(table, target.encoding)?;
            std::fs::write(&target.path, bytes).map_err(|source| PersistError::Io {
                path: target.path.clone(),
                source,
            })?;
        }
        OutputFormat::Xlsx => write_xlsx(table, &target.path)?,
    }

    tracing::info!(path = %target.path.display(), rows = table.len(), "saved table");
    Ok(SaveOutcome::Written {
        path: target.path.clone(),
        rows: table.len(),
    })
}

/// Save as BOM-prefixed CSV.
pub fn save_csv(result: &Retrieved, path: impl Into<PathBuf>) -> Result<SaveOutcome, PersistError> {
    save(result, &PersistenceTarget::csv(path))
}

/// Save as an XLSX workbook.
pub fn save_xlsx(result: &Retrieved, path: impl Into<PathBuf>) -> Result<SaveOutcome, PersistError> {
    save(result, &PersistenceTarget::xlsx(path))
}

// ─── CSV ────────────────────────────────────────────────────────────

/// Render a table as CSV bytes: optional BOM, header row, one line per row.
pub fn export_csv(table: &Table, encoding: TextEncoding) -> Result<Vec<u8>, PersistError> {
    let mut buf = Vec::new();
    if encoding == TextEncoding::Utf8Bom {
        buf.extend_from_slice(UTF8_BOM);
    }

    let mut wtr = csv::Writer::from_writer(buf);
    wtr.write_record(table.columns())?;
    for row in table.rows() {
        wtr.write_record(row.iter().map(Value::to_string))?;
    }

    wtr.into_inner().map_err(|e| PersistError::Io {
        path: PathBuf::new(),
        source: e.into_error(),
    })
}

// ─── XLSX ───────────────────────────────────────────────────────────

fn write_xlsx(table: &Table, path: &Path) -> Result<(), PersistError> {
    use rust_xlsxwriter::Workbook;

    let (rows, columns) = (table.len(), table.columns().len());
    if rows + 1 > XLSX_MAX_ROWS || columns > XLSX_MAX_COLUMNS {
        return Err(PersistError::SheetTooLarge { rows, columns });
    }

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (c, name) in table.columns().iter().enumerate() {
        sheet.write_string(0, c as u16, name)?;
    }

    for (r, row) in table.rows().iter().enumerate() {
        let r = (r + 1) as u32;
        for (c, cell) in row.iter().enumerate() {
            let c = c as u16;
            match cell {
                Value::Text(s) => {
                    sheet.write_string(r, c, s)?;
                }
                Value::Number(n) if n.is_finite() => {
                    sheet.write_number(r, c, *n)?;
                }
                Value::Date(_) => {
                    sheet.write_string(r, c, cell.to_string())?;
                }
                Value::Number(_) | Value::Null => {}
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bars() -> Table {
        let mut t = Table::new(["日期", "收盘", "备注"]);
        t.push_row(vec![
            Value::Date(NaiveDate::from_ymd_opt(2023, 1, 3).unwrap()),
            Value::Number(7.17),
            Value::from("含逗号, 的文本"),
        ])
        .unwrap();
        t.push_row(vec![
            Value::Date(NaiveDate::from_ymd_opt(2023, 1, 4).unwrap()),
            Value::Number(7.2),
            Value::Null,
        ])
        .unwrap();
        t
    }

    #[test]
    fn csv_starts_with_bom_and_has_no_index_column() {
        let bytes = export_csv(&bars(), TextEncoding::Utf8Bom).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));

        let text = std::str::from_utf8(&bytes[UTF8_BOM.len()..]).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "日期,收盘,备注");
        assert_eq!(lines[1], "2023-01-03,7.17,\"含逗号, 的文本\"");
        assert_eq!(lines[2], "2023-01-04,7.2,");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn plain_utf8_has_no_bom() {
        let bytes = export_csv(&bars(), TextEncoding::Utf8).unwrap();
        assert!(bytes.starts_with("日期".as_bytes()));
    }

    #[test]
    fn format_inferred_from_extension() {
        assert_eq!(OutputFormat::from_path(Path::new("a.xlsx")), OutputFormat::Xlsx);
        assert_eq!(OutputFormat::from_path(Path::new("a.XLSX")), OutputFormat::Xlsx);
        assert_eq!(OutputFormat::from_path(Path::new("a.csv")), OutputFormat::Csv);
        assert_eq!(OutputFormat::from_path(Path::new("noext")), OutputFormat::Csv);
        let t = PersistenceTarget::new("out.xls");
        assert_eq!(t.format(), OutputFormat::Xlsx);
        assert_eq!(t.encoding(), TextEncoding::Utf8Bom);
    }

    #[test]
    fn plain_encoding_target_writes_no_bom() {
        let dir = tempfile::tempdir().unwrap();
        let target = PersistenceTarget::new(dir.path().join("plain.csv"))
            .with_encoding(TextEncoding::Utf8);
        assert_eq!(target.encoding(), TextEncoding::Utf8);

        save(&Retrieved::from(bars()), &target).unwrap();
        let bytes = std::fs::read(target.path()).unwrap();
        assert!(bytes.starts_with("日期,收盘,备注".as_bytes()));
    }

    #[test]
    fn xls_path_gets_workbook_content() {
        let dir = tempfile::tempdir().unwrap();
        let target = PersistenceTarget::new(dir.path().join("legacy.xls"));
        save(&Retrieved::from(bars()), &target).unwrap();
        assert!(std::fs::read(target.path()).unwrap().starts_with(b"PK"));
    }

    #[test]
    fn explicit_format_overrides_extension() {
        let t = PersistenceTarget::csv("report.xlsx");
        assert_eq!(t.format(), OutputFormat::Csv);
    }
}
