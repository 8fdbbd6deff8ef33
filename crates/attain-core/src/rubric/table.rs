//! Raw tabular input: a header row plus typed cells, read either from a
//! spreadsheet workbook or from delimited text.

use crate::errors::{AttainError, AttainResult};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods"];

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Types a text cell the way a spreadsheet reader would: numeric text is
    /// a number, whitespace-only text is empty.
    pub fn from_text(raw: &str) -> Self {
        let s = raw.trim();
        if s.is_empty() {
            return Cell::Empty;
        }
        match s.parse::<f64>() {
            Ok(n) if n.is_finite() => Cell::Number(n),
            _ => Cell::Text(s.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Text rendering used for matching. Integral numbers lose their
    /// fractional part so `1.0` matches a script's `"1"`.
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
            Cell::Text(s) => s.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&Cell::Empty)
    }
}

pub fn is_workbook(file_name: &str) -> bool {
    let lower = file_name.to_ascii_lowercase();
    WORKBOOK_EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(&format!(".{ext}")))
}

/// Reads a rubric upload, choosing the decoder from the file name.
pub fn read_table(file_name: &str, bytes: &[u8]) -> AttainResult<RawTable> {
    if is_workbook(file_name) {
        read_workbook(bytes)
    } else {
        read_delimited(bytes)
    }
}

pub fn read_delimited(bytes: &[u8]) -> AttainResult<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| AttainError::InvalidInput(format!("invalid rubric file: {e}")))?
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|e| AttainError::InvalidInput(format!("invalid rubric file: {e}")))?;
        rows.push(record.iter().map(Cell::from_text).collect());
    }

    Ok(RawTable { headers, rows })
}

pub fn read_workbook(bytes: &[u8]) -> AttainResult<RawTable> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| AttainError::InvalidInput(format!("invalid rubric file: {e}")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AttainError::InvalidInput("rubric workbook has no worksheets".into()))?
        .map_err(|e| AttainError::InvalidInput(format!("invalid rubric file: {e}")))?;

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header_row) => header_row
            .iter()
            .map(|c| workbook_cell(c).as_text())
            .collect(),
        None => Vec::new(),
    };
    let rows = rows
        .map(|r| r.iter().map(workbook_cell).collect())
        .collect();

    Ok(RawTable { headers, rows })
}

fn workbook_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Number(if *b { 1.0 } else { 0.0 }),
        Data::String(s) => Cell::from_text(s),
        Data::Error(_) => Cell::Empty,
        other => Cell::Text(other.to_string()),
    }
}
