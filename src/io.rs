//! CSV ingestion into [`Table`]
//!
//! Supports plain single-header exports and the two-row ticker/field header
//! layout written by common market-data downloaders, including the optional
//! third row that only names the index column.

use crate::errors::{AnalysisError, Result};
use crate::table::{ColumnData, ColumnLabel, IndexValue, Table, parse_datetime};
use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Cell contents read as missing, compared case-insensitively
pub const NA_MARKERS: &[&str] = &[
    "NA", "N/A", "#N/A", "#N/A N/A", "#NA", "<NA>", "NaN", "-NaN", "NULL", "None", "1.#IND",
    "-1.#IND", "1.#QNAN", "-1.#QNAN",
];

/// Whether a trimmed cell stands for a missing value
pub fn is_missing_marker(cell: &str) -> bool {
    cell.is_empty() || NA_MARKERS.iter().any(|marker| marker.eq_ignore_ascii_case(cell))
}

/// Number of header rows preceding the data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderRows {
    #[default]
    Single,
    Double,
}

/// CSV layout options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvOptions {
    pub header_rows: HeaderRows,
    /// Column position holding the row index; `None` keeps every field as a
    /// column and numbers the rows instead
    pub index_column: Option<usize>,
    pub delimiter: u8,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            header_rows: HeaderRows::Single,
            index_column: Some(0),
            delimiter: b',',
        }
    }
}

impl CsvOptions {
    pub fn double_header() -> Self {
        Self {
            header_rows: HeaderRows::Double,
            ..Self::default()
        }
    }

    pub fn without_index(mut self) -> Self {
        self.index_column = None;
        self
    }
}

/// Read a CSV file into a table
pub fn read_csv_path<P: AsRef<Path>>(path: P, options: &CsvOptions) -> Result<Table> {
    let file = std::fs::File::open(path.as_ref())?;
    debug!(path = %path.as_ref().display(), "reading csv");
    read_csv(std::io::BufReader::new(file), options)
}

/// Read CSV data from any reader into a table
pub fn read_csv<R: Read>(reader: R, options: &CsvOptions) -> Result<Table> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(options.delimiter)
        .from_reader(reader);

    let mut records = Vec::new();
    for result in csv_reader.records() {
        records.push(result?);
    }

    let header_count = match options.header_rows {
        HeaderRows::Single => 1,
        HeaderRows::Double => 2,
    };
    if records.len() < header_count {
        return Err(AnalysisError::insufficient(format!(
            "expected {} header row(s), found {}",
            header_count,
            records.len()
        )));
    }

    let data_rows: Vec<StringRecord> = records.split_off(header_count);
    let headers = records;
    let width = headers.iter().map(StringRecord::len).max().unwrap_or(0);

    let mut index_name = options
        .index_column
        .and_then(|i| headers.first().and_then(|h| h.get(i)))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let mut rows = data_rows.as_slice();
    if let Some(first) = rows.first()
        && is_index_name_row(first, options.index_column)
    {
        index_name = options
            .index_column
            .and_then(|i| first.get(i))
            .map(|s| s.trim().to_string());
        rows = &rows[1..];
    }

    let index: Vec<IndexValue> = match options.index_column {
        Some(i) => rows
            .iter()
            .map(|row| match row.get(i).map(str::trim) {
                Some(raw) if !is_missing_marker(raw) => IndexValue::Text(raw.to_string()),
                _ => IndexValue::Missing,
            })
            .collect(),
        None => (0..rows.len()).map(|n| IndexValue::Text(n.to_string())).collect(),
    };

    let mut table = Table::new(index);
    if let Some(name) = index_name {
        table = table.with_index_name(name);
    }

    for position in 0..width {
        if Some(position) == options.index_column {
            continue;
        }
        let label = header_label(&headers, position);
        let cells: Vec<Option<&str>> = rows
            .iter()
            .map(|row| row.get(position).map(str::trim).filter(|s| !is_missing_marker(s)))
            .collect();
        table.push_column(label, infer_column(&cells))?;
    }

    debug!(
        rows = table.len(),
        columns = table.columns().len(),
        "csv loaded"
    );
    Ok(table)
}

fn header_label(headers: &[StringRecord], position: usize) -> ColumnLabel {
    let parts: Vec<String> = headers
        .iter()
        .map(|h| h.get(position).unwrap_or("").to_string())
        .collect();
    match parts.len() {
        1 => ColumnLabel::Flat(parts.into_iter().next().unwrap_or_default()),
        _ => ColumnLabel::Multi(parts),
    }
}

/// A row naming only the index column (every other field empty)
fn is_index_name_row(row: &StringRecord, index_column: Option<usize>) -> bool {
    let Some(i) = index_column else {
        return false;
    };
    let Some(name) = row.get(i).map(str::trim) else {
        return false;
    };
    !name.is_empty()
        && parse_datetime(name).is_none()
        && row
            .iter()
            .enumerate()
            .all(|(pos, field)| pos == i || field.trim().is_empty())
}

fn infer_column(cells: &[Option<&str>]) -> ColumnData {
    let parsed: Option<Vec<Option<f64>>> = cells
        .iter()
        .map(|cell| match cell {
            None => Some(None),
            Some(raw) => raw.parse::<f64>().ok().map(|v| Some(v).filter(|v| !v.is_nan())),
        })
        .collect();

    match parsed {
        Some(values) => ColumnData::Numeric(values),
        None => ColumnData::Text(cells.iter().map(|c| c.map(str::to_string)).collect()),
    }
}
