//! End-to-end checks: CSV on disk through normalization, statistics,
//! analysis, chart preparation and forecasting.

use ratescope::diagnostics::{CollectedDiagnostics, Diagnostic, SilentDiagnostics};
use ratescope::visualization::{
    TimeAxisFormat, close_price_chart, correlation_heatmap, decomposition_chart, forecast_chart,
    rolling_average_chart, volatility_chart,
};
use ratescope::{
    AnalysisError, CsvOptions, DescriptionTable, StatisticsCollector, VolatilityPeriod,
    forecast_linear, grouped_volatility, normalize_columns, read_csv_path,
};
use std::fmt::Write as _;
use std::io::Write;

/// Two-row header export with a trailing index-name row, 60 daily rows
fn write_rates_csv() -> tempfile::NamedTempFile {
    let mut body = String::new();
    body.push_str("Ticker,USDEUR=X,GBPEUR=X,BTC-EUR,USDEUR=X\n");
    body.push_str("Price,Close,Close,Close,Volume\n");
    body.push_str("Date,,,,\n");
    for day in 0..60 {
        let date =
            chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(day);
        let usd = 0.90 + 0.001 * day as f64;
        let gbp = 1.17 - 0.0005 * day as f64;
        let btc = 40000.0 + 100.0 * day as f64 + if day % 2 == 0 { 250.0 } else { -250.0 };
        writeln!(
            body,
            "{},{:.4},{:.4},{:.1},{}",
            date.format("%Y-%m-%d"),
            usd,
            gbp,
            btc,
            1000 + day
        )
        .unwrap();
    }

    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(body.as_bytes()).unwrap();
    file
}

fn load() -> ratescope::Table {
    let file = write_rates_csv();
    let raw = read_csv_path(file.path(), &CsvOptions::double_header()).unwrap();
    normalize_columns(&raw)
}

#[test]
fn test_csv_to_normalized_columns() {
    let table = load();
    assert_eq!(table.len(), 60);
    assert_eq!(table.index_name(), Some("Date"));
    assert_eq!(
        table.column_names(),
        vec!["USDEUR=X_Close", "GBPEUR=X_Close", "BTC-EUR_Close", "USDEUR=X_Volume"]
    );
}

#[test]
fn test_statistics_report_with_missing_column() {
    let table = load();
    let diagnostics = CollectedDiagnostics::new();
    let collector = StatisticsCollector::new(DescriptionTable::default());

    let report = collector.describe(
        &table,
        &["USDEUR=X_Close", "BTC-EUR_Close", "ETH-EUR_Close"],
        "yfinance",
        &diagnostics,
    );

    assert_eq!(report.len(), 2);
    assert_eq!(diagnostics.missing_columns(), vec!["ETH-EUR_Close"]);

    let btc = report.get("BTC-EUR_Close").unwrap();
    assert_eq!(btc.description, "Exchange rate of BTC to EUR");
    assert_eq!(btc.source, "yfinance");

    let usd = report.get("USDEUR=X_Close").unwrap();
    assert_eq!(usd.description, "Exchange rate of USD to EUR");
    assert!((usd.range - 0.059).abs() < 1e-9);
    assert!((usd.median - 0.9295).abs() < 1e-9);
}

#[test]
fn test_charts_from_loaded_table() {
    let table = load();
    let diagnostics = CollectedDiagnostics::new();

    let close = close_price_chart(&table, "Close Prices", &diagnostics);
    assert_eq!(close.series.len(), 3);
    assert_eq!(close.time_format, TimeAxisFormat::Date);
    assert!(diagnostics.is_empty());

    let pair = ["USDEUR=X_Close", "GBPEUR=X_Close"];
    let heatmap = correlation_heatmap(&table, &pair, "Correlation").unwrap();
    assert_eq!(heatmap.annotation(0, 1), "-1.00");

    let btc = ["BTC-EUR_Close"];
    let rolling =
        rolling_average_chart(&table, &btc, &[7, 30], "Rolling", &SilentDiagnostics).unwrap();
    assert_eq!(rolling.series.len(), 3);
    assert_eq!(rolling.series[2].points.len(), 31);

    let title = "Seasonal Decomposition";
    let panels =
        decomposition_chart(&table, "BTC-EUR_Close", 2, title, &SilentDiagnostics).unwrap();
    assert_eq!(panels.panels.len(), 4);
    // Alternating +/-250 is picked up as the seasonal component
    let seasonal = &panels.panels[2].series[0].points;
    assert!((seasonal[0].1.abs() - 250.0).abs() < 1e-6);
}

#[test]
fn test_monthly_volatility_chart() {
    let table = load();
    let volatility = grouped_volatility(
        &table,
        &["USDEUR=X_Close", "GBPEUR=X_Close"],
        VolatilityPeriod::Monthly,
        &SilentDiagnostics,
    )
    .unwrap();

    // 60 days from 2024-01-01 end on 2024-02-29
    assert_eq!(volatility.buckets.len(), 2);
    let chart = volatility_chart(&volatility, "Monthly").unwrap();
    assert_eq!(chart.title, "Monthly Volatility (Normalized Data)");
    assert_eq!(chart.categories, vec!["2024-01-31", "2024-02-29"]);
    assert_eq!(chart.groups[1].label, "GBPEUR=X_Close");
}

#[test]
fn test_forecast_pipeline() {
    let table = load();
    let forecast = forecast_linear(&table, "USDEUR=X_Close", 30).unwrap();

    assert!((forecast.trend.slope - 0.001).abs() < 1e-6);
    assert_eq!(forecast.forecast.len(), 30);
    assert_eq!(
        forecast.forecast[0].0.date(),
        chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    );
    // Day 89 on the fitted line
    assert!((forecast.forecast[29].1 - (0.90 + 0.089)).abs() < 1e-4);

    let chart = forecast_chart(&forecast);
    assert_eq!(chart.series.len(), 3);
    assert!(!table.contains(ratescope::forecast::DAYS_SINCE_START));
}

#[test]
fn test_unparseable_index_paths() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    let csv = "Date,USDEUR_Close\n2024-01-01 09:30,0.91\nsoon,0.92\n2024-01-01 10:30,0.93";
    writeln!(file, "{csv}").unwrap();
    let table = normalize_columns(&read_csv_path(file.path(), &CsvOptions::default()).unwrap());

    let diagnostics = CollectedDiagnostics::new();
    let chart = close_price_chart(&table, "Close Prices", &diagnostics);
    assert_eq!(chart.series[0].points.len(), 2);
    assert_eq!(chart.time_format, TimeAxisFormat::DateTime);
    assert!(matches!(
        diagnostics.entries().as_slice(),
        [Diagnostic::UnparseableIndex { row: 1, .. }]
    ));

    assert!(matches!(
        forecast_linear(&table, "USDEUR_Close", 5),
        Err(AnalysisError::InvalidIndex { row: 1, .. })
    ));
}
