use calamine::{open_workbook, Data, Reader, Xlsx};
use csv::ReaderBuilder;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("input file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("unsupported spreadsheet format: .{extension}")]
    UnsupportedFormat { extension: String },

    #[error("no data found in {}", .path.display())]
    EmptySheet { path: PathBuf },

    #[error("failed to read workbook: {0}")]
    Workbook(#[from] calamine::XlsxError),

    #[error("failed to read csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single spreadsheet cell, typed as far as the source format allows.
/// CSV input is all text; xlsx keeps the workbook's numeric typing.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Cell content as trimmed text, or None for an empty cell.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => Some(s.trim().to_string()),
            Cell::Number(n) => Some(n.to_string()),
            Cell::Bool(b) => Some(b.to_string()),
        }
    }

    /// Cell content as a finite number, if it parses as one.
    /// Text goes through the usual statement cleanup: plain and non-breaking
    /// spaces, currency symbols, and a decimal comma instead of a dot.
    pub fn as_number(&self) -> Option<f64> {
        let parsed = match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => {
                let cleaned: String = s
                    .chars()
                    .filter(|&c| !matches!(c, ' ' | '\u{A0}' | '€' | '$' | '£'))
                    .map(|c| if c == ',' { '.' } else { c })
                    .collect();
                if cleaned.is_empty() {
                    None
                } else {
                    cleaned.parse::<f64>().ok()
                }
            }
            Cell::Empty | Cell::Bool(_) => None,
        };
        parsed.filter(|n| n.is_finite())
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty | Data::Error(_) => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Float(f) => Cell::Number(*f),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Bool(b) => Cell::Bool(*b),
            // Dates and durations stay textual so they never pass for amounts
            other => Cell::Text(other.to_string()),
        }
    }
}

/// Tabular in-memory form of the input file: original headers, untouched,
/// and one row of cells per data row. Every row has `headers.len()` cells.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// Read a spreadsheet file into a [`RawTable`]. The first worksheet row
/// (xlsx) or the csv header record supplies the column headers; fully empty
/// data rows are skipped.
pub fn load_table<P: AsRef<Path>>(path: P) -> Result<RawTable, IngestError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "xlsx" | "xlsm" => load_xlsx(path),
        "csv" => load_csv(path),
        _ => Err(IngestError::UnsupportedFormat { extension }),
    }
}

fn load_xlsx(path: &Path) -> Result<RawTable, IngestError> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| IngestError::EmptySheet {
            path: path.to_path_buf(),
        })?;
    let range = workbook.worksheet_range(&sheet_name)?;

    let mut rows_iter = range.rows();
    let headers: Vec<String> = match rows_iter.next() {
        Some(header_row) => header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect(),
        None => {
            return Err(IngestError::EmptySheet {
                path: path.to_path_buf(),
            })
        }
    };

    let mut rows = Vec::new();
    for row in rows_iter {
        if row.iter().all(|cell| matches!(cell, Data::Empty)) {
            continue;
        }
        rows.push(shape_row(row.iter().map(Cell::from), headers.len()));
    }

    Ok(RawTable { headers, rows })
}

fn load_csv(path: &Path) -> Result<RawTable, IngestError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.is_empty() {
        return Err(IngestError::EmptySheet {
            path: path.to_path_buf(),
        });
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        let cells = record.iter().map(|field| {
            let trimmed = field.trim();
            if trimmed.is_empty() {
                Cell::Empty
            } else {
                Cell::Text(trimmed.to_string())
            }
        });
        rows.push(shape_row(cells, headers.len()));
    }

    Ok(RawTable { headers, rows })
}

/// Pad short rows with empty cells and drop cells past the header width.
fn shape_row(cells: impl Iterator<Item = Cell>, width: usize) -> Vec<Cell> {
    let mut row: Vec<Cell> = cells.take(width).collect();
    row.resize(width, Cell::Empty);
    row
}
