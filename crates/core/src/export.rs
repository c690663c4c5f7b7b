//! CSV export of search results.
//!
//! Output is a header row of human-readable column names followed by one row
//! per record. Every cell is quoted as text so spreadsheet tooling never
//! reinterprets values (leading zeros in tax ids, dates).

use serde_json::Value;

use crate::types::Date;

/// MIME type attached to export payloads.
pub const CSV_MIME_TYPE: &str = "text/csv";

/// One projected column: the record field and its header label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportColumn {
    pub field: &'static str,
    pub header: &'static str,
}

impl ExportColumn {
    pub const fn new(field: &'static str, header: &'static str) -> Self {
        Self { field, header }
    }
}

/// Quote a cell, doubling embedded quotes.
fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Render a JSON value as cell text. Values are written as stored; nothing
/// is re-validated at export time.
fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Build CSV text from JSON object records, projected to `columns`.
pub fn build_csv(columns: &[ExportColumn], records: &[Value]) -> String {
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(
        columns
            .iter()
            .map(|c| quote(c.header))
            .collect::<Vec<_>>()
            .join(","),
    );

    for record in records {
        let row: Vec<String> = columns
            .iter()
            .map(|c| quote(&cell_text(record.get(c.field))))
            .collect();
        lines.push(row.join(","));
    }

    lines.join("\n")
}

/// Parse CSV text back into rows of cells, honoring quoted cells that
/// contain commas, doubled quotes or line breaks.
pub fn parse_csv(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    cell.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                cell.push(ch);
            }
        } else {
            match ch {
                '"' => in_quotes = true,
                ',' => row.push(std::mem::take(&mut cell)),
                '\n' => {
                    row.push(std::mem::take(&mut cell));
                    rows.push(std::mem::take(&mut row));
                }
                '\r' => {}
                _ => cell.push(ch),
            }
        }
    }

    if !cell.is_empty() || !row.is_empty() {
        row.push(cell);
        rows.push(row);
    }
    rows
}

/// File name for an export of `entity` produced on `date`, e.g.
/// `clientes_20261016.csv`.
pub fn export_filename(entity: &str, date: Date) -> String {
    format!("{entity}_{}.csv", date.format("%Y%m%d"))
}
