// 📄 Sheet Reader - uploaded bytes → first worksheet as raw cells
//
// Workbooks (.xlsx/.xlsm/.xlsb/.xls/.ods) go through calamine, .csv through
// the csv crate. Only the first worksheet is read, and nothing is coerced:
// the row mapper decides what a cell means.

use crate::dates::{date_string_to_day_count, DateCode};
use crate::error::{Error, Result};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use log::debug;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Cursor;
use std::path::Path;

// ============================================================================
// CELL
// ============================================================================

/// One raw spreadsheet value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// Blank cells and whitespace-only text count as empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) | Cell::Bool(_) => false,
        }
    }

    /// Raw text, for header matching. Numbers are not text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Trimmed, non-empty text of a textual cell.
    pub fn trimmed_text(&self) -> Option<String> {
        self.as_text()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// Value as stored in a text column: numbers lose a trailing ".0" so a
    /// zip typed as 37064 and one typed as "37064" compare equal.
    pub fn to_field_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(_) => self.trimmed_text(),
            Cell::Number(n) if n.is_finite() => Some(n.to_string()),
            Cell::Number(_) => None,
            Cell::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
        }
    }

    /// Numbers, or text that reads as an amount ("$1,250.00" → 1250.0).
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Text(s) => {
                let cleaned: String = s
                    .trim()
                    .chars()
                    .filter(|c| *c != '$' && *c != ',')
                    .collect();
                cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
            }
            _ => None,
        }
    }

    /// Run the cell through the day-count translator.
    pub fn to_date_code(&self) -> DateCode {
        match self {
            Cell::Number(n) if n.is_finite() => DateCode::Serial(*n),
            Cell::Text(s) => date_string_to_day_count(s),
            _ => DateCode::Invalid,
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::String(s) => Cell::Text(s.clone()),
            Data::Bool(b) => Cell::Bool(*b),
            // date-formatted cells keep their serial, like an unformatted read
            Data::DateTime(dt) => Cell::Number(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::Error(_) | Data::Empty => Cell::Empty,
        }
    }
}

/// Number of populated cells in a row.
pub fn populated_cells(row: &[Cell]) -> usize {
    row.iter().filter(|cell| !cell.is_empty()).count()
}

// ============================================================================
// SHEET
// ============================================================================

/// The first worksheet of an upload, row by row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        Sheet {
            name: name.into(),
            rows,
        }
    }

    /// Read an upload held in memory. The file name only picks CSV vs workbook.
    pub fn from_bytes(bytes: &[u8], file_name: &str) -> Result<Sheet> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Self::from_csv(bytes, file_name),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Self::from_workbook(bytes),
            other => Err(Error::unsupported(format!(
                "{} (extension '{}')",
                file_name, other
            ))),
        }
    }

    pub fn from_path(path: &Path) -> Result<Sheet> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        Self::from_bytes(&bytes, file_name)
    }

    fn from_workbook(bytes: &[u8]) -> Result<Sheet> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
        let name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or(Error::EmptyWorkbook)?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or(Error::EmptyWorkbook)??;

        let rows: Vec<Vec<Cell>> = range
            .rows()
            .map(|row| row.iter().map(Cell::from).collect())
            .collect();

        debug!("Read {} rows from worksheet '{}'", rows.len(), name);
        Ok(Sheet { name, rows })
    }

    fn from_csv(bytes: &[u8], file_name: &str) -> Result<Sheet> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes);

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let row = record
                .iter()
                .map(|field| {
                    let field = field.trim_start_matches('\u{feff}');
                    if field.is_empty() {
                        Cell::Empty
                    } else {
                        Cell::text(field)
                    }
                })
                .collect();
            rows.push(row);
        }

        let name = Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("csv")
            .to_string();

        debug!("Read {} rows from CSV '{}'", rows.len(), file_name);
        Ok(Sheet { name, rows })
    }
}

/// SHA-256 of an upload, recorded with every reconciliation.
pub fn upload_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_emptiness() {
        assert!(Cell::Empty.is_empty());
        assert!(Cell::text("   ").is_empty());
        assert!(!Cell::text("x").is_empty());
        assert!(!Cell::Number(0.0).is_empty());
        assert_eq!(
            populated_cells(&[Cell::Empty, Cell::text("a"), Cell::Number(1.0), Cell::text(" ")]),
            2
        );
    }

    #[test]
    fn test_field_text_normalizes_numbers() {
        assert_eq!(Cell::Number(37064.0).to_field_text().as_deref(), Some("37064"));
        assert_eq!(Cell::text(" 37064 ").to_field_text().as_deref(), Some("37064"));
        assert_eq!(Cell::Number(12.5).to_field_text().as_deref(), Some("12.5"));
        assert_eq!(Cell::text("  ").to_field_text(), None);
    }

    #[test]
    fn test_to_number_reads_amounts() {
        assert_eq!(Cell::text("$1,250.00").to_number(), Some(1250.0));
        assert_eq!(Cell::Number(45.0).to_number(), Some(45.0));
        assert_eq!(Cell::text("paid").to_number(), None);
        assert_eq!(Cell::Empty.to_number(), None);
    }

    #[test]
    fn test_to_date_code() {
        assert_eq!(Cell::Number(40180.0).to_date_code(), DateCode::Serial(40180.0));
        assert_eq!(Cell::text("01/02/2010").to_date_code(), DateCode::Serial(40180.0));
        assert_eq!(Cell::Bool(true).to_date_code(), DateCode::Invalid);
        assert_eq!(Cell::Empty.to_date_code(), DateCode::Invalid);
    }

    #[test]
    fn test_csv_upload() {
        let bytes = b"\xef\xbb\xbfPlayerID,Last Name,First Name\n,Doe,Jane\n";
        let sheet = Sheet::from_bytes(bytes, "tn_export.csv").unwrap();

        assert_eq!(sheet.name, "tn_export");
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0][0], Cell::text("PlayerID"));
        assert_eq!(sheet.rows[1][0], Cell::Empty);
        assert_eq!(sheet.rows[1][2], Cell::text("Jane"));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = Sheet::from_bytes(b"hello", "notes.txt").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFile(_)));
    }

    #[test]
    fn test_upload_digest() {
        let digest = upload_digest(b"roster");
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, upload_digest(b"roster"));
        assert_ne!(digest, upload_digest(b"roster2"));
    }
}
