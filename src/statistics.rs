//! Descriptive statistics per column
//!
//! Median, mean, sample standard deviation and range over the non-missing
//! values of each requested column, labelled with a source string and a
//! human-readable description looked up from a caller-supplied
//! [`DescriptionTable`].

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::table::Table;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, OrderStatistics, Statistics};
use tracing::debug;

const FALLBACK_TEMPLATE: &str = "Statistics for {column}";

/// Keyword → description rule; matches when the keyword is a substring of the column name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptionRule {
    pub keyword: String,
    pub description: String,
}

impl DescriptionRule {
    pub fn new(keyword: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            description: description.into(),
        }
    }
}

/// Ordered description rules plus a fallback template; first match wins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptionTable {
    #[serde(default)]
    pub rules: Vec<DescriptionRule>,
    /// `{column}` is replaced by the column name
    #[serde(default = "default_fallback")]
    pub fallback: String,
}

fn default_fallback() -> String {
    FALLBACK_TEMPLATE.to_string()
}

impl Default for DescriptionTable {
    fn default() -> Self {
        Self {
            rules: vec![
                DescriptionRule::new("USDEUR", "Exchange rate of USD to EUR"),
                DescriptionRule::new("GBPEUR", "Exchange rate of GBP to EUR"),
                DescriptionRule::new("BTC-EUR", "Exchange rate of BTC to EUR"),
            ],
            fallback: default_fallback(),
        }
    }
}

impl DescriptionTable {
    /// Table with no rules: every column gets the fallback
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            fallback: default_fallback(),
        }
    }

    pub fn with_rule(mut self, keyword: impl Into<String>, description: impl Into<String>) -> Self {
        self.rules.push(DescriptionRule::new(keyword, description));
        self
    }

    pub fn describe(&self, column: &str) -> String {
        self.rules
            .iter()
            .find(|rule| column.contains(rule.keyword.as_str()))
            .map(|rule| rule.description.clone())
            .unwrap_or_else(|| self.fallback.replace("{column}", column))
    }
}

/// Summary statistics of one series; NaN where undefined
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub median: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub range: f64,
}

impl Summary {
    /// Summarize the non-missing values
    pub fn of(values: &[Option<f64>]) -> Self {
        let present: Vec<f64> = values
            .iter()
            .flatten()
            .copied()
            .filter(|v| !v.is_nan())
            .collect();
        Self::of_present(present)
    }

    fn of_present(present: Vec<f64>) -> Self {
        let count = present.len();
        if count == 0 {
            return Self {
                count,
                median: f64::NAN,
                mean: f64::NAN,
                std_dev: f64::NAN,
                range: f64::NAN,
            };
        }

        let mean = present.iter().mean();
        let std_dev = present.iter().std_dev();
        let range = Statistics::max(present.iter()) - Statistics::min(present.iter());
        let median = Data::new(present).median();

        Self {
            count,
            median,
            mean,
            std_dev,
            range,
        }
    }
}

/// One row of a statistics report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsRecord {
    pub column: String,
    pub source: String,
    pub description: String,
    pub median: f64,
    pub mean: f64,
    pub standard_deviation: f64,
    pub range: f64,
}

/// Records in the order the columns were requested
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatisticsReport {
    pub records: Vec<StatisticsRecord>,
}

impl StatisticsReport {
    pub const COLUMNS: [&'static str; 7] = [
        "column",
        "source",
        "description",
        "median",
        "mean",
        "standardDeviation",
        "range",
    ];

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, column: &str) -> Option<&StatisticsRecord> {
        self.records.iter().find(|r| r.column == column)
    }

    /// Report as a polars DataFrame, one row per record
    #[cfg(feature = "dataframe")]
    pub fn to_dataframe(&self) -> crate::errors::Result<polars::prelude::DataFrame> {
        use polars::prelude::*;

        let text = |f: fn(&StatisticsRecord) -> &str| -> Vec<String> {
            self.records.iter().map(|r| f(r).to_string()).collect()
        };
        let numbers = |f: fn(&StatisticsRecord) -> f64| -> Vec<f64> {
            self.records.iter().map(f).collect()
        };

        let df = DataFrame::new(vec![
            Column::new("column".into(), text(|r| r.column.as_str())),
            Column::new("source".into(), text(|r| r.source.as_str())),
            Column::new("description".into(), text(|r| r.description.as_str())),
            Column::new("median".into(), numbers(|r| r.median)),
            Column::new("mean".into(), numbers(|r| r.mean)),
            Column::new("standardDeviation".into(), numbers(|r| r.standard_deviation)),
            Column::new("range".into(), numbers(|r| r.range)),
        ])?;
        Ok(df)
    }

    /// Report as a printable text table
    pub fn to_text_table(&self) -> comfy_table::Table {
        let mut table = comfy_table::Table::new();
        table.load_preset(comfy_table::presets::UTF8_FULL);
        table.set_header(Self::COLUMNS.to_vec());
        for record in &self.records {
            table.add_row(vec![
                record.column.clone(),
                record.source.clone(),
                record.description.clone(),
                format!("{:.4}", record.median),
                format!("{:.4}", record.mean),
                format!("{:.4}", record.standard_deviation),
                format!("{:.4}", record.range),
            ]);
        }
        table
    }
}

/// Computes [`StatisticsReport`]s
#[derive(Debug, Clone, Default)]
pub struct StatisticsCollector {
    descriptions: DescriptionTable,
}

impl StatisticsCollector {
    pub fn new(descriptions: DescriptionTable) -> Self {
        Self { descriptions }
    }

    pub fn descriptions(&self) -> &DescriptionTable {
        &self.descriptions
    }

    /// Describe each requested column present in `table`.
    ///
    /// Absent columns are reported to `diagnostics` and skipped. Text columns
    /// have no numeric values and produce NaN statistics.
    pub fn describe<S: AsRef<str>>(
        &self,
        table: &Table,
        columns: &[S],
        source: &str,
        diagnostics: &dyn Diagnostics,
    ) -> StatisticsReport {
        let mut records = Vec::with_capacity(columns.len());

        for column in columns.iter().map(AsRef::as_ref) {
            let Some(found) = table.column(column) else {
                diagnostics.report(Diagnostic::MissingColumn {
                    column: column.to_string(),
                    operation: "describe".to_string(),
                });
                continue;
            };

            let summary = match found.data.as_numeric() {
                Some(values) => Summary::of(values),
                None => Summary::of_present(Vec::new()),
            };

            records.push(StatisticsRecord {
                column: column.to_string(),
                source: source.to_string(),
                description: self.descriptions.describe(column),
                median: summary.median,
                mean: summary.mean,
                standard_deviation: summary.std_dev,
                range: summary.range,
            });
        }

        debug!(
            requested = columns.len(),
            described = records.len(),
            source,
            "descriptive statistics computed"
        );
        StatisticsReport { records }
    }
}
