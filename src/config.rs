//! Analysis settings loaded from TOML/JSON/YAML files
//!
//! The library never reads configuration on its own: callers load an
//! [`AnalysisConfig`] and hand the relevant pieces to each operation.

use crate::analysis::VolatilityPeriod;
use crate::errors::Result;
use crate::forecast::DEFAULT_FORECAST_DAYS;
use crate::statistics::DescriptionTable;
use crate::visualization::{ChartLayout, OutputFormat};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Column description rules
    pub descriptions: DescriptionTable,
    pub charts: ChartSettings,
    /// Rolling-average window sizes
    pub rolling_windows: Vec<usize>,
    /// Seasonal decomposition period
    pub decomposition_period: usize,
    pub volatility_period: VolatilityPeriod,
    /// Days to extrapolate in forecasts
    pub forecast_days: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            descriptions: DescriptionTable::default(),
            charts: ChartSettings::default(),
            rolling_windows: vec![7, 30],
            decomposition_period: 12,
            volatility_period: VolatilityPeriod::Monthly,
            forecast_days: DEFAULT_FORECAST_DAYS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartSettings {
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            width: crate::visualization::DEFAULT_WIDTH,
            height: crate::visualization::DEFAULT_HEIGHT,
            format: OutputFormat::Png,
        }
    }
}

impl ChartSettings {
    pub fn layout(&self) -> ChartLayout {
        ChartLayout {
            width: self.width,
            height: self.height,
            ..ChartLayout::default()
        }
    }
}

impl AnalysisConfig {
    /// Load settings from a file; the format follows the file extension.
    /// `RATESCOPE__*` environment variables override file values (nested
    /// keys joined by `__`, e.g. `RATESCOPE__CHARTS__FORMAT=svg`). Keys set
    /// nowhere keep their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix("RATESCOPE").separator("__"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}
