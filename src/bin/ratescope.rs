//! Exchange-rate analysis driver
//!
//! Loads a CSV of rate series, normalizes its columns and runs one analysis.
//!
//! Usage:
//! ```text
//! ratescope --input data/rates.csv --double-header stats
//! ratescope --input data/rates.csv --double-header rolling USDEUR=X_Close --window 7 --window 30
//! ratescope --input data/rates.csv --format svg forecast BTC-EUR_Close --days 60
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ratescope::diagnostics::TracingDiagnostics;
use ratescope::visualization::{
    self, ChartExporter, ChartStyle, OutputFormat, Render, close_price_chart, correlation_heatmap,
    decomposition_chart, forecast_chart, rolling_average_chart, volatility_chart,
};
use ratescope::{
    AnalysisConfig, CsvOptions, StatisticsCollector, Table, VolatilityPeriod, forecast_linear,
    grouped_volatility, normalize_columns, read_csv_path,
};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Exploratory analysis of exchange-rate time series")]
struct Cli {
    /// Input CSV file; the first column is the row index
    #[arg(short, long)]
    input: PathBuf,

    /// The file has two header rows (ticker and field)
    #[arg(long)]
    double_header: bool,

    /// Settings file (TOML, JSON or YAML)
    #[arg(short, long, env = "RATESCOPE_CONFIG")]
    config: Option<PathBuf>,

    /// Directory for chart files
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Chart file format, overriding the settings file
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Median, mean, standard deviation and range per column
    Stats {
        /// Columns to describe (default: every `_Close` column)
        columns: Vec<String>,
        /// Data source recorded with each row
        #[arg(long, default_value = "yfinance")]
        source: String,
        /// Also write the report as CSV
        #[arg(long)]
        csv_out: Option<PathBuf>,
    },
    /// Every close-price column against time
    Close {
        #[arg(long, default_value = "Close Prices")]
        title: String,
    },
    /// Pairwise correlation heatmap
    Correlation {
        /// Columns to correlate (default: every `_Close` column)
        columns: Vec<String>,
        #[arg(long, default_value = "Correlation Heatmap")]
        title: String,
    },
    /// Series overlaid with trailing rolling means
    Rolling {
        /// Columns to plot (default: every `_Close` column)
        columns: Vec<String>,
        /// Window size in rows; repeatable
        #[arg(short, long = "window")]
        windows: Vec<usize>,
        #[arg(long, default_value = "Rolling Averages")]
        title: String,
    },
    /// Additive trend/seasonal/residual decomposition
    Decompose {
        column: String,
        #[arg(short, long)]
        period: Option<usize>,
        #[arg(long, default_value = "Seasonal Decomposition")]
        title: String,
    },
    /// Standard deviation per calendar period as grouped bars
    Volatility {
        /// Columns to compare (default: every `_Close` column)
        columns: Vec<String>,
        #[arg(short, long, value_enum)]
        period: Option<PeriodArg>,
        /// Chart title prefix (default: the period name)
        #[arg(long)]
        title: Option<String>,
    },
    /// Linear trend fitted over elapsed days and extrapolated
    Forecast {
        column: String,
        /// Days to extrapolate past the last row
        #[arg(short, long)]
        days: Option<usize>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Png,
    Svg,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Png => OutputFormat::Png,
            FormatArg::Svg => OutputFormat::Svg,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PeriodArg {
    Daily,
    Weekly,
    Monthly,
}

impl From<PeriodArg> for VolatilityPeriod {
    fn from(arg: PeriodArg) -> Self {
        match arg {
            PeriodArg::Daily => VolatilityPeriod::Daily,
            PeriodArg::Weekly => VolatilityPeriod::Weekly,
            PeriodArg::Monthly => VolatilityPeriod::Monthly,
        }
    }
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

/// Requested columns, or every close-price column when none were named
fn close_columns(table: &Table, requested: Vec<String>) -> Vec<String> {
    if !requested.is_empty() {
        return requested;
    }
    table
        .column_names()
        .into_iter()
        .filter(|name| name.contains(visualization::charts::CLOSE_MARKER))
        .collect()
}

struct Charts {
    exporter: ChartExporter,
    output_dir: PathBuf,
}

impl Charts {
    fn write<C: Render>(&self, chart: &C, name: &str) -> Result<()> {
        let path = self
            .exporter
            .export(chart, &self.output_dir.join(name))
            .with_context(|| format!("failed to render {}", name))?;
        println!("📊 {}", path.display());
        Ok(())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::load(path)
            .with_context(|| format!("cannot load settings from {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    if let Some(format) = cli.format {
        config.charts.format = format.into();
    }

    let options = if cli.double_header {
        CsvOptions::double_header()
    } else {
        CsvOptions::default()
    };
    let raw = read_csv_path(&cli.input, &options)
        .with_context(|| format!("cannot read {}", cli.input.display()))?;
    let table = normalize_columns(&raw);
    info!(rows = table.len(), columns = table.columns().len(), "table loaded");

    fs::create_dir_all(&cli.output_dir)
        .with_context(|| format!("cannot create {}", cli.output_dir.display()))?;
    let charts = Charts {
        exporter: ChartExporter::new(
            config.charts.layout(),
            ChartStyle::default(),
            config.charts.format,
        ),
        output_dir: cli.output_dir.clone(),
    };
    let diagnostics = TracingDiagnostics;

    match cli.command {
        Command::Stats {
            columns,
            source,
            csv_out,
        } => {
            let columns = close_columns(&table, columns);
            let report = StatisticsCollector::new(config.descriptions.clone())
                .describe(&table, &columns, &source, &diagnostics);
            println!("{}", report.to_text_table());

            if let Some(path) = csv_out {
                write_report_csv(&report, &path)?;
                println!("📁 {}", path.display());
            }
        }
        Command::Close { title } => {
            let chart = close_price_chart(&table, &title, &diagnostics);
            charts.write(&chart, "close_prices")?;
        }
        Command::Correlation { columns, title } => {
            let columns = close_columns(&table, columns);
            let heatmap = correlation_heatmap(&table, &columns, &title)?;
            charts.write(&heatmap, "correlation_heatmap")?;
        }
        Command::Rolling {
            columns,
            windows,
            title,
        } => {
            let columns = close_columns(&table, columns);
            let windows = if windows.is_empty() {
                config.rolling_windows.clone()
            } else {
                windows
            };
            let chart = rolling_average_chart(&table, &columns, &windows, &title, &diagnostics)?;
            charts.write(&chart, "rolling_averages")?;
        }
        Command::Decompose {
            column,
            period,
            title,
        } => {
            let period = period.unwrap_or(config.decomposition_period);
            let chart = decomposition_chart(&table, &column, period, &title, &diagnostics)?;
            charts.write(&chart, &format!("decomposition_{}", column))?;
        }
        Command::Volatility {
            columns,
            period,
            title,
        } => {
            let columns = close_columns(&table, columns);
            let period = period.map(Into::into).unwrap_or(config.volatility_period);
            let volatility = grouped_volatility(&table, &columns, period, &diagnostics)?;
            let title = title.unwrap_or_else(|| period.label().to_string());
            let chart = volatility_chart(&volatility, &title)?;
            charts.write(&chart, "volatility")?;
        }
        Command::Forecast { column, days } => {
            let days = days.unwrap_or(config.forecast_days);
            let forecast = forecast_linear(&table, &column, days)?;
            println!(
                "{}: slope {:.6}/day, intercept {:.6}",
                forecast.column, forecast.trend.slope, forecast.trend.intercept
            );
            if let Some((date, value)) = forecast.forecast.last() {
                println!("  {} → {:.6}", date.format("%Y-%m-%d"), value);
            }
            charts.write(&forecast_chart(&forecast), &format!("forecast_{}", column))?;
        }
    }

    Ok(())
}

#[cfg(feature = "dataframe")]
fn write_report_csv(report: &ratescope::StatisticsReport, path: &Path) -> Result<()> {
    use polars::prelude::{CsvWriter, SerWriter};

    let mut frame = report.to_dataframe()?;
    let mut file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    CsvWriter::new(&mut file).finish(&mut frame)?;
    Ok(())
}

#[cfg(not(feature = "dataframe"))]
fn write_report_csv(_report: &ratescope::StatisticsReport, _path: &Path) -> Result<()> {
    anyhow::bail!("CSV export needs the `dataframe` feature")
}
