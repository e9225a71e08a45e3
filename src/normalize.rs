//! Column normalization
//!
//! Flattens multi-part column labels into single names and aligns the
//! date-like column name across sources: daily downloads call it `Date`,
//! intraday ones `Datetime`.

use crate::table::{ColumnLabel, Table};
use tracing::debug;

/// Canonical name for the date/time column
pub const DATETIME: &str = "Datetime";

const DATE: &str = "Date";

/// Return a copy of `table` whose column labels are all flat strings.
///
/// 1. A column whose (first) label element is `Date` is renamed to `Datetime`.
/// 2. Multi-part labels starting with `Datetime` become `Datetime`; all other
///    multi-part labels are joined with `_` and trimmed.
///
/// Flat labels pass through unchanged, so the operation is idempotent.
pub fn normalize_columns(table: &Table) -> Table {
    debug!(columns = table.columns().len(), "normalizing column labels");
    table.map_labels(|label| ColumnLabel::Flat(flatten_label(&rename_date(label))))
}

/// Flat name for a single label, per the rules of [`normalize_columns`]
pub fn flatten_label(label: &ColumnLabel) -> String {
    match label {
        ColumnLabel::Flat(name) => name.clone(),
        ColumnLabel::Multi(parts) if parts.first().map(String::as_str) == Some(DATETIME) => {
            DATETIME.to_string()
        }
        ColumnLabel::Multi(parts) => parts.join("_").trim().to_string(),
    }
}

fn rename_date(label: &ColumnLabel) -> ColumnLabel {
    match label {
        ColumnLabel::Flat(name) if name == DATE => ColumnLabel::flat(DATETIME),
        ColumnLabel::Multi(parts) if parts.first().map(String::as_str) == Some(DATE) => {
            let mut parts = parts.clone();
            parts[0] = DATETIME.to_string();
            ColumnLabel::Multi(parts)
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{ColumnData, IndexValue};

    fn table_with(labels: Vec<ColumnLabel>) -> Table {
        let mut table = Table::new(vec![IndexValue::Text("0".into())]);
        for label in labels {
            table.push_column(label, ColumnData::Numeric(vec![Some(1.0)])).unwrap();
        }
        table
    }

    #[test]
    fn test_tuple_columns_are_joined() {
        let table = table_with(vec![
            ColumnLabel::pair("Close", "USDEUR"),
            ColumnLabel::pair("Datetime", ""),
            ColumnLabel::pair("Volume", "BTC-EUR"),
        ]);
        let normalized = normalize_columns(&table);
        assert_eq!(
            normalized.column_names(),
            vec!["Close_USDEUR", "Datetime", "Volume_BTC-EUR"]
        );
    }

    #[test]
    fn test_date_becomes_datetime() {
        let table = table_with(vec![
            ColumnLabel::pair("Date", ""),
            ColumnLabel::pair("Close", "GBPEUR"),
        ]);
        let normalized = normalize_columns(&table);
        let names = normalized.column_names();
        assert!(!names.iter().any(|n| n == "Date"));
        assert!(names.iter().any(|n| n == "Datetime"));

        let flat = table_with(vec![ColumnLabel::flat("Date"), ColumnLabel::flat("Close")]);
        assert_eq!(normalize_columns(&flat).column_names(), vec!["Datetime", "Close"]);
    }

    #[test]
    fn test_trailing_empty_part_is_trimmed() {
        let table = table_with(vec![ColumnLabel::Multi(vec![" Close".into(), "".into()])]);
        assert_eq!(normalize_columns(&table).column_names(), vec!["Close_"]);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let table = table_with(vec![
            ColumnLabel::pair("Close", "USDEUR"),
            ColumnLabel::pair("Date", ""),
            ColumnLabel::flat("already_flat"),
        ]);
        let once = normalize_columns(&table);
        let twice = normalize_columns(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_input_is_not_mutated() {
        let table = table_with(vec![ColumnLabel::pair("Close", "USDEUR")]);
        let _ = normalize_columns(&table);
        assert!(table.labels().all(ColumnLabel::is_multi));
    }
}
