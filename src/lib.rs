//! # Ratescope
//!
//! Exploratory analysis of exchange-rate time series (fiat pairs and crypto
//! against a base currency).
//!
//! ## Quick Start
//!
//! ```rust
//! use ratescope::{StatisticsCollector, Table, forecast_linear, normalize_columns};
//! use ratescope::diagnostics::SilentDiagnostics;
//! use chrono::{Duration, NaiveDate};
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
//! let table = Table::from_datetimes((0..10).map(|d| start + Duration::days(d)))
//!     .with_column(("USDEUR=X", "Close"), vec![0.91, 0.92, 0.92, 0.93, 0.94, 0.93, 0.95, 0.96, 0.96, 0.97])
//!     .unwrap();
//!
//! // ("USDEUR=X", "Close") becomes "USDEUR=X_Close"
//! let table = normalize_columns(&table);
//!
//! let report = StatisticsCollector::default()
//!     .describe(&table, &["USDEUR=X_Close"], "yfinance", &SilentDiagnostics);
//! println!("{}", report.to_text_table());
//!
//! let forecast = forecast_linear(&table, "USDEUR=X_Close", 30).unwrap();
//! assert_eq!(forecast.forecast.len(), 30);
//! ```
//!
//! ## Operations
//!
//! - **Normalization**: multi-level headers flattened to `first_second`,
//!   `Date` renamed to `Datetime`
//! - **Statistics**: median, mean, sample standard deviation and range per
//!   column, with descriptions from a caller-supplied keyword table
//! - **Analysis**: rolling means, pairwise correlation, additive seasonal
//!   decomposition, grouped volatility
//! - **Charts**: close prices, correlation heatmap, rolling overlays,
//!   decomposition panels, volatility bars, forecasts (PNG or SVG)
//! - **Forecast**: least-squares linear trend over elapsed days
//!
//! No operation mutates its input table. Non-fatal problems (missing
//! columns, unparseable timestamps) go to a [`diagnostics::Diagnostics`]
//! sink supplied by the caller.

pub mod analysis;
pub mod config;
pub mod diagnostics;
pub mod errors;
pub mod forecast;
pub mod io;
pub mod normalize;
pub mod statistics;
pub mod table;
pub mod visualization;

// Re-export commonly used types for convenience
pub use analysis::{
    CorrelationMatrix, Decomposition, VolatilityPeriod, VolatilityTable, correlation_matrix,
    grouped_volatility, rolling_mean, seasonal_decompose,
};
pub use config::AnalysisConfig;
pub use errors::{AnalysisError, Result};
pub use forecast::{Forecast, LinearTrend, forecast_linear, with_days_since_start};
pub use io::{CsvOptions, HeaderRows, read_csv, read_csv_path};
pub use normalize::normalize_columns;
pub use statistics::{DescriptionTable, StatisticsCollector, StatisticsRecord, StatisticsReport};
pub use table::{ColumnData, ColumnLabel, IndexValue, Table};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
