//! Chart models
//!
//! Each `*_chart` function turns analysis input into a plain data model that
//! [`super::ChartExporter`] can draw. Nothing in this file touches a drawing
//! backend, so every model can be inspected in tests.

use super::layouts::{TimeAxisFormat, axis_position};
use super::styles::{BLUE, GREEN, ORANGE, RED};
use crate::analysis::{VolatilityTable, correlation_matrix, rolling_mean, seasonal_decompose};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::errors::{AnalysisError, Result};
use crate::forecast::Forecast;
use crate::table::Table;
use chrono::NaiveDateTime;
use plotters::style::RGBColor;

/// Substring identifying close-price columns
pub const CLOSE_MARKER: &str = "_Close";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Solid,
    Dashed,
}

/// One line on a time axis
#[derive(Debug, Clone)]
pub struct ChartSeries {
    pub label: String,
    pub points: Vec<(NaiveDateTime, f64)>,
    pub kind: LineKind,
    /// Fixed color; palette order when unset
    pub color: Option<RGBColor>,
}

impl ChartSeries {
    pub fn new(label: impl Into<String>, points: Vec<(NaiveDateTime, f64)>) -> Self {
        Self {
            label: label.into(),
            points,
            kind: LineKind::Solid,
            color: None,
        }
    }

    pub fn dashed(mut self) -> Self {
        self.kind = LineKind::Dashed;
        self
    }

    pub fn colored(mut self, color: RGBColor) -> Self {
        self.color = Some(color);
        self
    }
}

/// Lines sharing a date/time x axis
#[derive(Debug, Clone)]
pub struct LineChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub legend_title: Option<String>,
    pub time_format: TimeAxisFormat,
    pub series: Vec<ChartSeries>,
}

impl LineChart {
    pub fn new(
        title: impl Into<String>,
        x_label: impl Into<String>,
        y_label: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            legend_title: None,
            time_format: TimeAxisFormat::Date,
            series: Vec::new(),
        }
    }

    pub fn series(&self, label: &str) -> Option<&ChartSeries> {
        self.series.iter().find(|s| s.label == label)
    }

    /// Axis positions spanned by all points, `None` when nothing is drawn
    pub fn x_bounds(&self) -> Option<(f64, f64)> {
        bounds(self.series.iter().flat_map(|s| s.points.iter().map(|(dt, _)| axis_position(dt))))
    }

    pub fn y_bounds(&self) -> Option<(f64, f64)> {
        bounds(self.series.iter().flat_map(|s| s.points.iter().map(|(_, v)| *v)))
    }

    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|s| s.points.is_empty())
    }
}

/// Vertically stacked line charts under one title
#[derive(Debug, Clone)]
pub struct PanelChart {
    pub title: String,
    pub panels: Vec<LineChart>,
}

/// Annotated square matrix
#[derive(Debug, Clone)]
pub struct Heatmap {
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl Heatmap {
    /// Cell text, two decimals
    pub fn annotation(&self, row: usize, col: usize) -> String {
        match self.values.get(row).and_then(|r| r.get(col)).copied().flatten() {
            Some(value) => format!("{:.2}", value),
            None => "nan".to_string(),
        }
    }
}

/// One bar per category for a single series
#[derive(Debug, Clone)]
pub struct BarGroup {
    pub label: String,
    pub values: Vec<Option<f64>>,
}

/// Grouped bars over labelled categories
#[derive(Debug, Clone)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub legend_title: Option<String>,
    pub categories: Vec<String>,
    pub groups: Vec<BarGroup>,
}

impl BarChart {
    /// Largest bar height, 0 when every value is missing
    pub fn max_value(&self) -> f64 {
        self.groups
            .iter()
            .flat_map(|g| g.values.iter().flatten())
            .fold(0.0_f64, |acc, v| acc.max(*v))
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Index coerced to date-times, reporting every value that does not parse
fn time_axis(table: &Table, diagnostics: &dyn Diagnostics) -> Vec<Option<NaiveDateTime>> {
    let parsed = table.datetime_index();
    for (row, (raw, dt)) in table.index().iter().zip(&parsed).enumerate() {
        if dt.is_none() {
            diagnostics.report(Diagnostic::UnparseableIndex {
                row,
                value: raw.to_string(),
            });
        }
    }
    parsed
}

/// Rows where both the timestamp and the value are present
fn points(
    axis: &[Option<NaiveDateTime>],
    values: impl IntoIterator<Item = Option<f64>>,
) -> Vec<(NaiveDateTime, f64)> {
    axis.iter()
        .zip(values)
        .filter_map(|(dt, v)| Some(((*dt)?, v?)))
        .collect()
}

/// Every `_Close` column against the index.
///
/// Index values that are not date-times are reported and their rows left
/// out of the lines.
pub fn close_price_chart(table: &Table, title: &str, diagnostics: &dyn Diagnostics) -> LineChart {
    let axis = time_axis(table, diagnostics);

    let mut chart = LineChart::new(title, "Datetime", "Normalised Close Price");
    chart.legend_title = Some("Currency Pairs".to_string());
    chart.time_format = TimeAxisFormat::infer(&axis);

    for column in table.columns() {
        let Some(name) = column.label.as_flat() else {
            continue;
        };
        if !name.contains(CLOSE_MARKER) {
            continue;
        }
        match column.data.as_numeric() {
            Some(values) => chart
                .series
                .push(ChartSeries::new(name, points(&axis, values.iter().copied()))),
            None => diagnostics.report(Diagnostic::EmptySelection {
                operation: "close_price_chart".to_string(),
                detail: format!("column '{}' is not numeric and was skipped", name),
            }),
        }
    }

    if chart.series.is_empty() {
        diagnostics.report(Diagnostic::EmptySelection {
            operation: "close_price_chart".to_string(),
            detail: format!("no column name contains '{}'", CLOSE_MARKER),
        });
    }
    chart
}

/// Pearson correlation heatmap over `columns`
pub fn correlation_heatmap<S: AsRef<str>>(
    table: &Table,
    columns: &[S],
    title: &str,
) -> Result<Heatmap> {
    let matrix = correlation_matrix(table, columns)?;
    Ok(Heatmap {
        title: title.to_string(),
        labels: matrix.labels,
        values: matrix.values,
    })
}

/// Each column overlaid with one dashed trailing mean per window
pub fn rolling_average_chart<S: AsRef<str>>(
    table: &Table,
    columns: &[S],
    windows: &[usize],
    title: &str,
    diagnostics: &dyn Diagnostics,
) -> Result<LineChart> {
    let series = columns
        .iter()
        .map(|c| table.numeric(c.as_ref()).map(|values| (c.as_ref(), values)))
        .collect::<Result<Vec<_>>>()?;

    let axis = time_axis(table, diagnostics);
    let mut chart = LineChart::new(title, "Datetime", "Close Price");
    chart.legend_title = Some("Currency Pairs".to_string());
    chart.time_format = TimeAxisFormat::infer(&axis);

    for (name, values) in series {
        chart
            .series
            .push(ChartSeries::new(
                format!("{} Original", name),
                points(&axis, values.iter().copied()),
            ));
        for &window in windows {
            let rolled = rolling_mean(values, window)?;
            chart.series.push(
                ChartSeries::new(
                    format!("{} {}-Day Rolling", name, window),
                    points(&axis, rolled),
                )
                .dashed(),
            );
        }
    }
    Ok(chart)
}

/// Observed, trend, seasonal and residual panels for one column
pub fn decomposition_chart(
    table: &Table,
    column: &str,
    period: usize,
    title: &str,
    diagnostics: &dyn Diagnostics,
) -> Result<PanelChart> {
    let values = table.numeric(column)?;
    let decomposition = seasonal_decompose(values, period)?;
    let axis = time_axis(table, diagnostics);
    let time_format = TimeAxisFormat::infer(&axis);

    let panel = |name: &str, y_label: &str, color: RGBColor, data: Vec<Option<f64>>| {
        let mut chart = LineChart::new(format!("{} - {}", column, name), "Datetime", y_label);
        chart.time_format = time_format;
        chart.series.push(ChartSeries::new(name, points(&axis, data)).colored(color));
        chart
    };

    let panels = vec![
        panel(
            "Original",
            "Value",
            BLUE,
            decomposition.observed.iter().map(|v| Some(*v)).collect(),
        ),
        panel("Trend", "Trend", ORANGE, decomposition.trend.clone()),
        panel(
            "Seasonal",
            "Seasonal",
            GREEN,
            decomposition.seasonal.iter().map(|v| Some(*v)).collect(),
        ),
        panel("Residuals", "Residuals", RED, decomposition.residual.clone()),
    ];

    Ok(PanelChart {
        title: format!("{} for {}", title, column),
        panels,
    })
}

/// Grouped bars, one category per volatility bucket
pub fn volatility_chart(volatility: &VolatilityTable, title: &str) -> Result<BarChart> {
    if volatility.columns.is_empty() {
        return Err(AnalysisError::insufficient("volatility table has no columns"));
    }
    Ok(BarChart {
        title: format!("{} Volatility (Normalized Data)", title),
        x_label: "Time".to_string(),
        y_label: "Standard Deviation (Normalized)".to_string(),
        legend_title: Some("Currency".to_string()),
        categories: volatility
            .buckets
            .iter()
            .map(|b| b.format("%Y-%m-%d").to_string())
            .collect(),
        groups: volatility
            .columns
            .iter()
            .zip(&volatility.values)
            .map(|(label, values)| BarGroup {
                label: label.clone(),
                values: values.clone(),
            })
            .collect(),
    })
}

/// Historical data, fitted line and forecast on one axis
pub fn forecast_chart(forecast: &Forecast) -> LineChart {
    let mut chart = LineChart::new(
        format!("{} Forecast with Regression Line", forecast.column),
        "Date",
        "Close Price",
    );
    let axis: Vec<Option<NaiveDateTime>> =
        forecast.history.iter().map(|(dt, _)| Some(*dt)).collect();
    chart.time_format = TimeAxisFormat::infer(&axis);
    chart.series = vec![
        ChartSeries::new("Historical Data", forecast.history.clone()).colored(BLUE),
        ChartSeries::new("Regression Line (Historical Data)", forecast.fitted.clone())
            .dashed()
            .colored(GREEN),
        ChartSeries::new("Forecasted Data", forecast.forecast.clone())
            .dashed()
            .colored(RED),
    ];
    chart
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{VolatilityPeriod, grouped_volatility};
    use crate::diagnostics::{CollectedDiagnostics, SilentDiagnostics};
    use crate::forecast::forecast_linear;
    use crate::table::IndexValue;
    use chrono::{Duration, NaiveDate};

    fn day(d: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::days(d)
    }

    fn rates(n: i64) -> Table {
        Table::from_datetimes((0..n).map(day))
            .with_column(
                "USDEUR_Close",
                (0..n).map(|i| 1.0 + i as f64 * 0.01).collect::<Vec<f64>>(),
            )
            .unwrap()
            .with_column(
                "GBPEUR_Close",
                (0..n).map(|i| 1.2 - i as f64 * 0.01).collect::<Vec<f64>>(),
            )
            .unwrap()
            .with_column("USDEUR_Volume", vec![100.0; n as usize])
            .unwrap()
    }

    #[test]
    fn test_close_chart_selects_close_columns() {
        let diagnostics = CollectedDiagnostics::new();
        let chart = close_price_chart(&rates(5), "Close Prices", &diagnostics);

        let labels: Vec<&str> = chart.series.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["USDEUR_Close", "GBPEUR_Close"]);
        assert_eq!(chart.x_label, "Datetime");
        assert_eq!(chart.y_label, "Normalised Close Price");
        assert_eq!(chart.legend_title.as_deref(), Some("Currency Pairs"));
        assert_eq!(chart.time_format, TimeAxisFormat::Date);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_close_chart_drops_unparseable_rows() {
        let table = Table::new(vec![
            IndexValue::from(day(0)),
            IndexValue::Text("not a date".into()),
            IndexValue::from(day(0) + Duration::minutes(30)),
        ])
        .with_column("BTC-EUR_Close", vec![1.0, 2.0, 3.0])
        .unwrap();

        let diagnostics = CollectedDiagnostics::new();
        let chart = close_price_chart(&table, "Close Prices", &diagnostics);

        assert_eq!(chart.series[0].points.len(), 2);
        assert_eq!(chart.time_format, TimeAxisFormat::DateTime);
        assert_eq!(
            diagnostics.entries(),
            vec![Diagnostic::UnparseableIndex {
                row: 1,
                value: "not a date".to_string()
            }]
        );
    }

    #[test]
    fn test_close_chart_without_close_columns_reports() {
        let table = Table::from_datetimes([day(0)]).with_column("Open", vec![1.0]).unwrap();
        let diagnostics = CollectedDiagnostics::new();
        let chart = close_price_chart(&table, "Close Prices", &diagnostics);
        assert!(chart.series.is_empty());
        assert!(chart.is_empty());
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_heatmap_annotations() {
        let columns = ["USDEUR_Close", "GBPEUR_Close"];
        let heatmap = correlation_heatmap(&rates(10), &columns, "Correlation").unwrap();
        assert_eq!(heatmap.annotation(0, 0), "1.00");
        assert_eq!(heatmap.annotation(0, 1), "-1.00");
        assert_eq!(heatmap.annotation(5, 5), "nan");
    }

    #[test]
    fn test_rolling_chart_labels_and_warmup() {
        let chart = rolling_average_chart(
            &rates(40),
            &["USDEUR_Close"],
            &[7, 30],
            "Rolling",
            &SilentDiagnostics,
        )
        .unwrap();

        let labels: Vec<&str> = chart.series.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "USDEUR_Close Original",
                "USDEUR_Close 7-Day Rolling",
                "USDEUR_Close 30-Day Rolling"
            ]
        );
        assert_eq!(chart.series[0].points.len(), 40);
        assert_eq!(chart.series[1].points.len(), 34);
        assert_eq!(chart.series[2].points.len(), 11);
        assert_eq!(chart.series[1].kind, LineKind::Dashed);
        assert_eq!(chart.series[1].points[0].0, day(6));
    }

    #[test]
    fn test_rolling_chart_missing_column() {
        let err = rolling_average_chart(
            &rates(5),
            &["ETH-EUR_Close"],
            &[2],
            "Rolling",
            &SilentDiagnostics,
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::ColumnNotFound { .. }));
    }

    #[test]
    fn test_decomposition_panels() {
        let chart = decomposition_chart(
            &rates(30),
            "USDEUR_Close",
            4,
            "Seasonal Decomposition",
            &SilentDiagnostics,
        )
        .unwrap();
        assert_eq!(chart.title, "Seasonal Decomposition for USDEUR_Close");
        let titles: Vec<&str> = chart.panels.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "USDEUR_Close - Original",
                "USDEUR_Close - Trend",
                "USDEUR_Close - Seasonal",
                "USDEUR_Close - Residuals"
            ]
        );
        assert_eq!(chart.panels[0].series[0].points.len(), 30);
        // period / 2 trend points are missing at each end
        assert_eq!(chart.panels[1].series[0].points.len(), 26);
    }

    #[test]
    fn test_volatility_chart_categories() {
        let table = rates(45);
        let volatility = grouped_volatility(
            &table,
            &["USDEUR_Close"],
            VolatilityPeriod::Monthly,
            &SilentDiagnostics,
        )
        .unwrap();
        let chart = volatility_chart(&volatility, "USDEUR").unwrap();

        assert_eq!(chart.title, "USDEUR Volatility (Normalized Data)");
        assert_eq!(chart.categories, vec!["2024-01-31", "2024-02-29"]);
        assert_eq!(chart.groups.len(), 1);
        assert!(chart.max_value() > 0.0);
    }

    #[test]
    fn test_forecast_chart_series() {
        let forecast = forecast_linear(&rates(10), "USDEUR_Close", 5).unwrap();
        let chart = forecast_chart(&forecast);

        assert_eq!(chart.title, "USDEUR_Close Forecast with Regression Line");
        assert_eq!(chart.series("Historical Data").unwrap().points.len(), 10);
        assert_eq!(
            chart.series("Regression Line (Historical Data)").unwrap().kind,
            LineKind::Dashed
        );
        let predicted = chart.series("Forecasted Data").unwrap();
        assert_eq!(predicted.points.len(), 5);
        assert_eq!(predicted.color, Some(RED));

        let (x0, x1) = chart.x_bounds().unwrap();
        assert_eq!(x0, axis_position(&day(0)));
        assert_eq!(x1, axis_position(&day(14)));
    }
}
