//! Non-fatal warnings raised while analysing a table
//!
//! Callers pass a [`Diagnostics`] sink into every operation that can skip
//! data. Nothing here touches global logger state: [`TracingDiagnostics`]
//! forwards to whatever `tracing` subscriber the caller installed, and
//! [`CollectedDiagnostics`] keeps warnings in memory for inspection.

use serde::Serialize;
use std::cell::RefCell;
use std::fmt;

/// A single non-fatal condition
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A requested column does not exist in the table
    MissingColumn { column: String, operation: String },
    /// An index value could not be read as a date/time and was treated as missing
    UnparseableIndex { row: usize, value: String },
    /// A chart had nothing to draw for the requested selection
    EmptySelection { operation: String, detail: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MissingColumn { column, operation } => {
                write!(f, "{}: column '{}' not found in the table", operation, column)
            }
            Diagnostic::UnparseableIndex { row, value } => {
                write!(f, "index value {:?} at row {} is not a date/time", value, row)
            }
            Diagnostic::EmptySelection { operation, detail } => {
                write!(f, "{}: {}", operation, detail)
            }
        }
    }
}

/// Sink for non-fatal diagnostics
pub trait Diagnostics {
    fn report(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to `tracing` at WARN level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn report(&self, diagnostic: Diagnostic) {
        tracing::warn!(target: "ratescope::diagnostics", "{}", diagnostic);
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentDiagnostics;

impl Diagnostics for SilentDiagnostics {
    fn report(&self, _diagnostic: Diagnostic) {}
}

/// Records diagnostics in memory
#[derive(Debug, Default)]
pub struct CollectedDiagnostics {
    entries: RefCell<Vec<Diagnostic>>,
}

impl CollectedDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Names of all columns reported missing, in report order
    pub fn missing_columns(&self) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter_map(|d| match d {
                Diagnostic::MissingColumn { column, .. } => Some(column.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Diagnostics for CollectedDiagnostics {
    fn report(&self, diagnostic: Diagnostic) {
        self.entries.borrow_mut().push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collected_diagnostics() {
        let sink = CollectedDiagnostics::new();
        assert!(sink.is_empty());

        sink.report(Diagnostic::MissingColumn {
            column: "XYZ_Close".into(),
            operation: "describe".into(),
        });
        sink.report(Diagnostic::UnparseableIndex {
            row: 3,
            value: "n/a".into(),
        });

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.missing_columns(), vec!["XYZ_Close".to_string()]);
    }

    #[test]
    fn test_display_mentions_column() {
        let diagnostic = Diagnostic::MissingColumn {
            column: "USDEUR_Close".into(),
            operation: "describe".into(),
        };
        assert_eq!(
            diagnostic.to_string(),
            "describe: column 'USDEUR_Close' not found in the table"
        );
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let json = serde_json::to_value(Diagnostic::UnparseableIndex {
            row: 1,
            value: "x".into(),
        })
        .unwrap();
        assert_eq!(json["kind"], "unparseable_index");
        assert_eq!(json["row"], 1);
    }
}
