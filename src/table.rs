//! In-memory labeled table: a date-like row index plus named columns
//!
//! Column labels may be flat strings or multi-part tuples (as produced by
//! two-row CSV headers). Operations never mutate a table in place; anything
//! that renames or derives columns returns a new `Table`.

use crate::errors::{AnalysisError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fmt;

/// Label identifying a column
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnLabel {
    /// Single string name
    Flat(String),
    /// Multi-part name, e.g. `("USDEUR=X", "Close")`
    Multi(Vec<String>),
}

impl ColumnLabel {
    pub fn flat(name: impl Into<String>) -> Self {
        ColumnLabel::Flat(name.into())
    }

    pub fn pair(first: impl Into<String>, second: impl Into<String>) -> Self {
        ColumnLabel::Multi(vec![first.into(), second.into()])
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, ColumnLabel::Multi(_))
    }

    /// Flat name if this label has already been flattened
    pub fn as_flat(&self) -> Option<&str> {
        match self {
            ColumnLabel::Flat(name) => Some(name),
            ColumnLabel::Multi(_) => None,
        }
    }
}

impl fmt::Display for ColumnLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnLabel::Flat(name) => write!(f, "{}", name),
            ColumnLabel::Multi(parts) => write!(f, "({})", parts.join(", ")),
        }
    }
}

impl From<&str> for ColumnLabel {
    fn from(name: &str) -> Self {
        ColumnLabel::Flat(name.to_string())
    }
}

impl From<String> for ColumnLabel {
    fn from(name: String) -> Self {
        ColumnLabel::Flat(name)
    }
}

impl From<(&str, &str)> for ColumnLabel {
    fn from((first, second): (&str, &str)) -> Self {
        ColumnLabel::pair(first, second)
    }
}

/// Column values; `None` marks a missing cell
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(values) => values.len(),
            ColumnData::Text(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_numeric(&self) -> Option<&[Option<f64>]> {
        match self {
            ColumnData::Numeric(values) => Some(values),
            ColumnData::Text(_) => None,
        }
    }
}

impl From<Vec<f64>> for ColumnData {
    fn from(values: Vec<f64>) -> Self {
        ColumnData::Numeric(values.into_iter().map(Some).collect())
    }
}

impl From<Vec<Option<f64>>> for ColumnData {
    fn from(values: Vec<Option<f64>>) -> Self {
        ColumnData::Numeric(values)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub label: ColumnLabel,
    pub data: ColumnData,
}

/// Row index value
#[derive(Debug, Clone, PartialEq)]
pub enum IndexValue {
    DateTime(NaiveDateTime),
    Text(String),
    Missing,
}

impl IndexValue {
    /// Interpret as a date/time; unparseable text becomes `None`
    pub fn to_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            IndexValue::DateTime(dt) => Some(*dt),
            IndexValue::Text(raw) => parse_datetime(raw),
            IndexValue::Missing => None,
        }
    }
}

impl fmt::Display for IndexValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexValue::DateTime(dt) => write!(f, "{}", dt),
            IndexValue::Text(raw) => write!(f, "{}", raw),
            IndexValue::Missing => write!(f, "NaT"),
        }
    }
}

impl From<NaiveDateTime> for IndexValue {
    fn from(dt: NaiveDateTime) -> Self {
        IndexValue::DateTime(dt)
    }
}

impl From<NaiveDate> for IndexValue {
    fn from(date: NaiveDate) -> Self {
        IndexValue::DateTime(date.and_time(chrono::NaiveTime::MIN))
    }
}

impl From<&str> for IndexValue {
    fn from(raw: &str) -> Self {
        IndexValue::Text(raw.to_string())
    }
}

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%:z"];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Parse a date/time string, keeping the wall-clock time of offset-aware values
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, format) {
            return Some(dt.naive_local());
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .map(|date| date.and_time(chrono::NaiveTime::MIN))
}

/// Labeled 2D dataset with a date/time-like row index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    index_name: Option<String>,
    index: Vec<IndexValue>,
    columns: Vec<Column>,
}

impl Table {
    /// Create an empty table over the given row index
    pub fn new(index: Vec<IndexValue>) -> Self {
        Self {
            index_name: None,
            index,
            columns: Vec::new(),
        }
    }

    /// Build a table indexed by date/time values
    pub fn from_datetimes(index: impl IntoIterator<Item = NaiveDateTime>) -> Self {
        Self::new(index.into_iter().map(IndexValue::DateTime).collect())
    }

    pub fn with_index_name(mut self, name: impl Into<String>) -> Self {
        self.index_name = Some(name.into());
        self
    }

    /// Builder-style column append
    pub fn with_column(
        mut self,
        label: impl Into<ColumnLabel>,
        data: impl Into<ColumnData>,
    ) -> Result<Self> {
        self.push_column(label.into(), data.into())?;
        Ok(self)
    }

    /// Append a column; its length must match the index
    pub fn push_column(&mut self, label: ColumnLabel, data: ColumnData) -> Result<()> {
        if data.len() != self.index.len() {
            return Err(AnalysisError::ShapeMismatch {
                message: format!(
                    "column {} has {} values but the index has {} rows",
                    label,
                    data.len(),
                    self.index.len()
                ),
            });
        }
        self.columns.push(Column { label, data });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &[IndexValue] {
        &self.index
    }

    pub fn index_name(&self) -> Option<&str> {
        self.index_name.as_deref()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn labels(&self) -> impl Iterator<Item = &ColumnLabel> {
        self.columns.iter().map(|c| &c.label)
    }

    /// Display names of all columns, in order
    pub fn column_names(&self) -> Vec<String> {
        self.labels().map(ToString::to_string).collect()
    }

    /// Look up a column by flat name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.label.as_flat() == Some(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Numeric values of a column
    pub fn numeric(&self, name: &str) -> Result<&[Option<f64>]> {
        let column = self
            .column(name)
            .ok_or_else(|| AnalysisError::column_not_found(name))?;
        column
            .data
            .as_numeric()
            .ok_or_else(|| AnalysisError::NonNumericColumn {
                column: name.to_string(),
            })
    }

    /// Index coerced to date/time values; unparseable entries become `None`
    pub fn datetime_index(&self) -> Vec<Option<NaiveDateTime>> {
        self.index.iter().map(IndexValue::to_datetime).collect()
    }

    /// Index as date/time values, failing on the first unparseable entry
    pub fn require_datetime_index(&self) -> Result<Vec<NaiveDateTime>> {
        self.index
            .iter()
            .enumerate()
            .map(|(row, value)| {
                value.to_datetime().ok_or_else(|| AnalysisError::InvalidIndex {
                    row,
                    value: value.to_string(),
                })
            })
            .collect()
    }

    /// Same rows and data, with every column label passed through `f`
    pub fn map_labels<F>(&self, mut f: F) -> Table
    where
        F: FnMut(&ColumnLabel) -> ColumnLabel,
    {
        let columns = self
            .columns
            .iter()
            .map(|column| Column {
                label: f(&column.label),
                data: column.data.clone(),
            })
            .collect();

        Table {
            index_name: self.index_name.clone(),
            index: self.index.clone(),
            columns,
        }
    }

    /// Copy of this table with a numeric column added (or replaced)
    pub fn with_numeric(&self, name: &str, values: Vec<Option<f64>>) -> Result<Table> {
        let mut table = self.clone();
        table.columns.retain(|c| c.label.as_flat() != Some(name));
        table.push_column(ColumnLabel::flat(name), ColumnData::Numeric(values))?;
        Ok(table)
    }

    /// Copy of this table whose row index is taken from the named column
    pub fn set_index(&self, name: &str) -> Result<Table> {
        let position = self
            .columns
            .iter()
            .position(|c| c.label.as_flat() == Some(name))
            .ok_or_else(|| AnalysisError::column_not_found(name))?;

        let index = match &self.columns[position].data {
            ColumnData::Text(values) => values
                .iter()
                .map(|v| match v {
                    Some(raw) => IndexValue::Text(raw.clone()),
                    None => IndexValue::Missing,
                })
                .collect(),
            ColumnData::Numeric(_) => {
                return Err(AnalysisError::invalid_parameter(format!(
                    "column '{}' is numeric and cannot become a date index",
                    name
                )));
            }
        };

        let mut columns = self.columns.clone();
        columns.remove(position);

        Ok(Table {
            index_name: Some(name.to_string()),
            index,
            columns,
        })
    }
}
