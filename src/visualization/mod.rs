//! Exchange-rate charts
//!
//! Chart preparation is separated from drawing: the functions in [`charts`]
//! build plain models from tables and analysis results, and
//! [`ChartExporter`] draws those models to PNG or SVG files with `plotters`.
//!
//! ```rust,no_run
//! use ratescope::diagnostics::TracingDiagnostics;
//! use ratescope::visualization::{ChartExporter, ChartLayout, ChartStyle, OutputFormat, close_price_chart};
//! # fn run(table: &ratescope::Table) -> ratescope::Result<()> {
//! let chart = close_price_chart(table, "Close Prices", &TracingDiagnostics);
//! let exporter = ChartExporter::new(ChartLayout::default(), ChartStyle::default(), OutputFormat::Svg);
//! exporter.export(&chart, std::path::Path::new("close_prices"))?;
//! # Ok(())
//! # }
//! ```

pub mod charts;
pub mod export;
pub mod layouts;
pub mod styles;

pub use charts::{
    BarChart, BarGroup, ChartSeries, Heatmap, LineChart, LineKind, PanelChart, close_price_chart,
    correlation_heatmap, decomposition_chart, forecast_chart, rolling_average_chart,
    volatility_chart,
};
pub use export::{ChartExporter, OutputFormat, Render};
pub use layouts::{ChartLayout, Margins, TimeAxisFormat};
pub use styles::{ChartStyle, ColorScheme};

/// Default chart width in pixels
pub const DEFAULT_WIDTH: u32 = 1200;
/// Default chart height in pixels
pub const DEFAULT_HEIGHT: u32 = 600;
